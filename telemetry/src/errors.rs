use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{0}")]
    GenericIO(#[from] std::io::Error),

    #[error("Unable to open telemetry file {path:?}: {source}")]
    Open { path: PathBuf, source: std::io::Error },

    #[error("Failed to write telemetry rows: {0}")]
    Csv(#[from] csv::Error),

    #[error("Telemetry sink rejected the write: {0}")]
    Rejected(String),
}
