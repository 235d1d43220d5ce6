use std::io::ErrorKind;

use thiserror::Error;

/// Anything that can go wrong reading or writing the emulator socket protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("{0}")]
    GenericIO(#[from] std::io::Error),

    #[error("Failed to decode frame: {0}")]
    Decode(serde_json::Error),

    #[error("Failed to encode command: {0}")]
    Encode(serde_json::Error),

    #[error("Frame exceeded the {limit} byte limit before it was complete")]
    FrameTooLarge { limit: usize },

    #[error("Connection closed in the middle of a frame ({buffered} bytes buffered)")]
    TruncatedFrame { buffered: usize },
}

impl ProtocolError {
    /// True for read timeouts and interrupted reads, which the transport uses as a
    /// poll point rather than a failure.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ProtocolError::GenericIO(e)
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted)
        )
    }
}
