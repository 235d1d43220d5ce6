//! Collects one labeled row per tick and persists them for offline training.
//!
//! The catch is that a row's label (who won) isn't known until the match ends, and
//! nothing on the wire marks that moment. Rows are therefore held in memory for the
//! current match, stamped with the winner once the lifecycle detector resolves it,
//! and flushed under three triggers: the match ending, the buffer filling up, and
//! a wall-clock interval passing.
//!
//! A failed write never discards rows. They stay buffered and go out with the next
//! trigger. While the sink is failing, a full buffer is retried at most once per
//! flush interval instead of on every tick; the backlog is logged on each attempt.

use std::time::{Duration, Instant};

use gamebot_integrations::Log;
use gamebot_protocol::Winner;

mod errors;
pub use errors::TelemetryError;

mod row;
pub use row::{unix_timestamp_now, TelemetryRow, HEADERS, UNRESOLVED_WINNER};

mod sink;
pub use sink::{CsvFileSink, MemorySink, RowSink};

/// Why a flush was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    MatchEnded,
    Capacity,
    Interval,
    Drain,
}

/// What happened to the buffer on a call that may flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushStatus {
    /// No trigger fired, or there was nothing to write.
    Idle,

    /// `written` rows went out; `retained` rows are still buffered.
    Written {
        trigger: FlushTrigger,
        written: usize,
        retained: usize,
    },

    /// The sink failed; every row is still buffered.
    Failed { trigger: FlushTrigger },
}

/// The per-session telemetry buffer.
///
/// Owns the session id, the current match id and the rows that haven't been
/// persisted yet.
#[derive(Debug)]
pub struct TelemetryBuffer {
    session_id: u64,
    match_id: u64,
    rows: Vec<TelemetryRow>,
    capacity: usize,
    flush_interval: Duration,
    last_flush: Instant,
    failing: bool,
    sink: Box<dyn RowSink>,
}

impl TelemetryBuffer {
    /// Creates an empty buffer starting at match 0.
    ///
    /// `capacity` is the row count that forces a flush; a zero capacity is treated
    /// as one.
    pub fn new(session_id: u64, capacity: usize, flush_interval: Duration, sink: Box<dyn RowSink>) -> Self {
        Self {
            session_id,
            match_id: 0,
            rows: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            flush_interval,
            last_flush: Instant::now(),
            failing: false,
            sink,
        }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn match_id(&self) -> u64 {
        self.match_id
    }

    /// Rows that haven't been persisted yet, oldest first.
    pub fn rows(&self) -> &[TelemetryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// How many of the newest rows a capacity or interval flush leaves in memory.
    pub fn retained_tail(&self) -> usize {
        self.capacity / 8
    }

    /// Records this tick's row and, if the match just ended, resolves it.
    pub fn record(&mut self, row: TelemetryRow, ended: Option<Winner>) -> FlushStatus {
        self.record_at(row, ended, Instant::now())
    }

    /// `record` with an explicit clock reading.
    pub fn record_at(&mut self, mut row: TelemetryRow, ended: Option<Winner>, now: Instant) -> FlushStatus {
        if let Some(last) = self.rows.last() {
            debug_assert!(
                last.match_id() != self.match_id || last.frame() < row.frame(),
                "telemetry rows must be appended in frame order"
            );
        }

        row.assign(self.session_id, self.match_id);
        self.rows.push(row);

        if let Some(winner) = ended {
            return self.end_match_at(winner, now);
        }

        let due = now.saturating_duration_since(self.last_flush) > self.flush_interval;

        if self.rows.len() >= self.capacity && (due || !self.failing) {
            return self.flush_at(FlushTrigger::Capacity, self.retained_tail(), now);
        }

        if due {
            return self.flush_at(FlushTrigger::Interval, self.retained_tail(), now);
        }

        FlushStatus::Idle
    }

    /// Stamps `winner` on every buffered row of the current match, flushes everything
    /// and moves on to the next match id.
    pub fn end_match(&mut self, winner: Winner) -> FlushStatus {
        self.end_match_at(winner, Instant::now())
    }

    fn end_match_at(&mut self, winner: Winner, now: Instant) -> FlushStatus {
        let match_id = self.match_id;
        let stamped = self
            .rows
            .iter_mut()
            .filter(|row| row.match_id() == match_id)
            .map(|row| row.resolve(winner))
            .filter(|stamped| *stamped)
            .count();

        tracing::info!(target: Log::Telemetry, match_id, ?winner, stamped, "Match resolved");

        let status = self.flush_at(FlushTrigger::MatchEnded, 0, now);
        self.match_id += 1;
        status
    }

    /// Writes out every buffered row regardless of triggers. Used once on shutdown.
    /// Draining an empty buffer does nothing.
    pub fn drain(&mut self) -> FlushStatus {
        if self.rows.is_empty() {
            return FlushStatus::Idle;
        }

        tracing::info!(target: Log::Telemetry, rows = self.rows.len(), "Draining telemetry buffer");
        self.flush_at(FlushTrigger::Drain, 0, Instant::now())
    }

    /// Writes all rows except the newest `keep`. If there aren't more than `keep`
    /// rows, everything is written.
    fn flush_at(&mut self, trigger: FlushTrigger, keep: usize, now: Instant) -> FlushStatus {
        self.last_flush = now;

        if self.rows.is_empty() {
            return FlushStatus::Idle;
        }

        let split = match keep > 0 && self.rows.len() > keep {
            true => self.rows.len() - keep,
            false => self.rows.len(),
        };

        match self.sink.append(&self.rows[..split]) {
            Ok(()) => {
                self.rows.drain(..split);

                if self.failing {
                    tracing::info!(target: Log::Telemetry, written = split, "Telemetry sink recovered");
                    self.failing = false;
                }

                tracing::debug!(
                    target: Log::Telemetry,
                    ?trigger,
                    written = split,
                    retained = self.rows.len(),
                    "Flushed telemetry"
                );

                FlushStatus::Written {
                    trigger,
                    written: split,
                    retained: self.rows.len(),
                }
            },

            Err(error) => {
                self.failing = true;

                tracing::error!(
                    target: Log::Telemetry,
                    ?error,
                    ?trigger,
                    backlog = self.rows.len(),
                    "Failed to flush telemetry, keeping rows for the next attempt"
                );

                FlushStatus::Failed { trigger }
            },
        }
    }
}
