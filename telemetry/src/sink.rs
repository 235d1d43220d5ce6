//! Where flushed rows end up.

use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use gamebot_integrations::Log;

use crate::row::{TelemetryRow, HEADERS};
use crate::TelemetryError;

/// A destination for telemetry rows. `append` must either persist every row it is
/// handed or return an error, in which case the buffer keeps them for a retry.
pub trait RowSink: Debug + Send {
    fn append(&mut self, rows: &[TelemetryRow]) -> Result<(), TelemetryError>;
}

/// Appends rows to a CSV file, writing the header only when the file is created.
///
/// The file is re-opened in append mode on every flush so that nothing is held
/// open between ticks and an external reader always sees whole rows.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    /// Prepares the file at `path`, creating it with a header row if it doesn't exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TelemetryError> {
        let path = path.into();

        if path.is_file() {
            tracing::info!(target: Log::Telemetry, ?path, "Appending to existing telemetry file");
        } else {
            let file = File::create(&path).map_err(|source| TelemetryError::Open {
                path: path.clone(),
                source,
            })?;

            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(HEADERS)?;
            writer.flush()?;

            tracing::info!(target: Log::Telemetry, ?path, "Created telemetry file");
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Encodes `rows` as CSV lines, without a header.
fn encode(rows: &[TelemetryRow]) -> Result<Vec<u8>, TelemetryError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());

    for row in rows {
        writer.write_record(row.to_record())?;
    }

    writer.into_inner().map_err(|error| TelemetryError::GenericIO(error.into_error()))
}

impl RowSink for CsvFileSink {
    /// The batch is encoded in memory first and handed to the file in one write, so
    /// an encoding failure leaves nothing behind for the retry to duplicate.
    fn append(&mut self, rows: &[TelemetryRow]) -> Result<(), TelemetryError> {
        let batch = encode(rows)?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| TelemetryError::Open {
                path: self.path.clone(),
                source,
            })?;

        file.write_all(&batch)?;
        file.flush()?;
        Ok(())
    }
}

/// Keeps rows in memory behind a shared handle. Clones see the same rows, which makes
/// this handy for dry runs and for inspecting what a buffer flushed.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    rows: Arc<Mutex<Vec<TelemetryRow>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything appended so far.
    pub fn rows(&self) -> Vec<TelemetryRow> {
        self.rows.lock().expect("Unable to lock memory sink rows").clone()
    }

    /// While set, every append fails without storing anything.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().expect("Unable to lock memory sink flag") = failing;
    }
}

impl RowSink for MemorySink {
    fn append(&mut self, rows: &[TelemetryRow]) -> Result<(), TelemetryError> {
        if *self.failing.lock().expect("Unable to lock memory sink flag") {
            return Err(TelemetryError::Rejected("memory sink is set to fail".into()));
        }

        let mut stored = self.rows.lock().expect("Unable to lock memory sink rows");
        stored.extend_from_slice(rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use gamebot_protocol::{ButtonState, FrameSnapshot, PlayerId};

    use super::*;

    fn row(frame: u64) -> TelemetryRow {
        TelemetryRow::capture(frame, 0.5, &FrameSnapshot::default(), PlayerId::One, ButtonState::default())
    }

    #[test]
    fn batch_is_encoded_before_touching_the_file() {
        let batch = encode(&[row(1), row(2)]).unwrap();
        let text = String::from_utf8(batch).unwrap();

        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));
        assert!(!text.contains("session_id"));
    }

    #[test]
    fn failed_append_leaves_no_partial_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GameData.csv");
        let mut sink = CsvFileSink::open(&path).unwrap();

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(sink.append(&[row(1), row(2)]), Err(TelemetryError::Open { .. })));

        let mut sink = CsvFileSink::open(&path).unwrap();
        sink.append(&[row(1), row(2)]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }
}
