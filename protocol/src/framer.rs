//! Splits the inbound byte stream into JSON frames.
//!
//! The emulator writes one bare JSON object per tick with no length prefix or
//! delimiter. Rather than trusting that each `read` returns exactly one object, we
//! buffer bytes and let the JSON grammar itself mark where a frame ends. Split reads
//! and coalesced reads are both handled, and the buffer is bounded.

use std::io::Read;

use gamebot_integrations::Log;
use serde_json::Deserializer;

use crate::errors::ProtocolError;
use crate::types::FrameSnapshot;

/// Historical per-read size the emulator script was written against.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4096;

const READ_CHUNK_BYTES: usize = 1024;

/// Result of trying to pull a frame out of what has been buffered so far.
enum Parsed {
    Frame(FrameSnapshot, usize),
    Incomplete,
    Empty,
}

#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    buffer: Vec<u8>,
    max_frame_bytes: usize,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R, max_frame_bytes: usize) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(max_frame_bytes.min(DEFAULT_MAX_FRAME_BYTES)),
            max_frame_bytes,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Number of bytes read off the wire that haven't been consumed by a frame yet.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Reads until a full frame is available.
    ///
    /// Returns `Ok(None)` on a clean end of stream (nothing but whitespace buffered).
    /// Read timeouts from the underlying stream surface as an error for which
    /// `ProtocolError::is_timeout` is true; buffered bytes are kept, so calling this
    /// again resumes where it left off.
    pub fn next_frame(&mut self) -> Result<Option<FrameSnapshot>, ProtocolError> {
        loop {
            match self.try_parse()? {
                Parsed::Frame(frame, consumed) => {
                    self.buffer.drain(..consumed);
                    return Ok(Some(frame));
                },
                Parsed::Empty => self.buffer.clear(),
                Parsed::Incomplete => {},
            }

            if self.buffer.len() >= self.max_frame_bytes {
                return Err(ProtocolError::FrameTooLarge {
                    limit: self.max_frame_bytes,
                });
            }

            let room = (self.max_frame_bytes - self.buffer.len()).min(READ_CHUNK_BYTES);
            let mut chunk = [0u8; READ_CHUNK_BYTES];
            let read = self.inner.read(&mut chunk[..room])?;

            if read == 0 {
                if self.buffer.iter().all(u8::is_ascii_whitespace) {
                    return Ok(None);
                }

                return Err(ProtocolError::TruncatedFrame {
                    buffered: self.buffer.len(),
                });
            }

            tracing::trace!(target: Log::Transport, read, buffered = self.buffer.len(), "Read chunk");
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    fn try_parse(&self) -> Result<Parsed, ProtocolError> {
        let mut stream = Deserializer::from_slice(&self.buffer).into_iter::<FrameSnapshot>();

        match stream.next() {
            Some(Ok(frame)) => Ok(Parsed::Frame(frame, stream.byte_offset())),
            Some(Err(e)) if e.is_eof() => Ok(Parsed::Incomplete),
            Some(Err(e)) => Err(ProtocolError::Decode(e)),
            None => Ok(Parsed::Empty),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use super::*;

    const FRAME: &str = r#"{"p1":{"character":7,"health":100,"x":50,"y":192,"jumping":false,"crouching":false,"in_move":false,"move":0,"buttons":{}},"p2":{"character":3,"health":90,"x":200,"y":192,"jumping":true,"crouching":false,"in_move":true,"move":12,"buttons":{"B":true}},"timer":99,"result":0,"round_started":true,"round_over":false}"#;

    /// Hands out at most `step` bytes per read, like a slow socket.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let end = (self.pos + self.step).min(self.data.len());
            let n = (end - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn decodes_a_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(FRAME.as_bytes().to_vec()), DEFAULT_MAX_FRAME_BYTES);
        let frame = reader.next_frame().unwrap().unwrap();

        assert_eq!(frame.player1.player_id, 7);
        assert_eq!(frame.player2.health, 90);
        assert!(frame.player2.buttons.b);
        assert!(frame.round_started);
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn splits_coalesced_frames() {
        let wire = format!("{FRAME}{FRAME}\n{FRAME}");
        let mut reader = FrameReader::new(Cursor::new(wire.into_bytes()), DEFAULT_MAX_FRAME_BYTES);

        for _ in 0..3 {
            assert!(reader.next_frame().unwrap().is_some());
        }
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn reassembles_split_frames() {
        let trickle = Trickle {
            data: FRAME.as_bytes().to_vec(),
            pos: 0,
            step: 7,
        };
        let mut reader = FrameReader::new(trickle, DEFAULT_MAX_FRAME_BYTES);

        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.player2.move_id, 12);
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let mut reader = FrameReader::new(Cursor::new(b"{\"p1\": nope}".to_vec()), DEFAULT_MAX_FRAME_BYTES);
        assert!(matches!(reader.next_frame(), Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn missing_fields_are_a_decode_error() {
        let mut reader = FrameReader::new(Cursor::new(b"{\"timer\": 10}".to_vec()), DEFAULT_MAX_FRAME_BYTES);
        assert!(matches!(reader.next_frame(), Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut reader = FrameReader::new(Cursor::new(FRAME.as_bytes().to_vec()), 64);
        assert!(matches!(reader.next_frame(), Err(ProtocolError::FrameTooLarge { limit: 64 })));
    }

    #[test]
    fn eof_mid_frame_is_truncation() {
        let half = &FRAME.as_bytes()[..FRAME.len() / 2];
        let mut reader = FrameReader::new(Cursor::new(half.to_vec()), DEFAULT_MAX_FRAME_BYTES);
        assert!(matches!(reader.next_frame(), Err(ProtocolError::TruncatedFrame { .. })));
    }
}
