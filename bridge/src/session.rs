use std::sync::atomic::{AtomicBool, Ordering};

use gamebot_engine::Engine;
use gamebot_integrations::Log;
use gamebot_telemetry::FlushStatus;

use crate::transport::{Connection, Transport};
use crate::BridgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The emulator closed the connection.
    PeerClosed,

    /// A shutdown was requested.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub ticks: u64,
    pub end: SessionEnd,
}

/// The tick loop: read a frame, run it through the engine, reply. Returns when the
/// connection closes or a shutdown is requested; any error is fatal to the session.
pub fn serve(engine: &mut Engine, connection: &mut Connection, shutdown: &AtomicBool) -> Result<SessionSummary, BridgeError> {
    let mut ticks = 0;

    loop {
        let Some(frame) = connection.recv(shutdown)? else {
            let end = match shutdown.load(Ordering::Relaxed) {
                true => SessionEnd::Shutdown,
                false => SessionEnd::PeerClosed,
            };

            return Ok(SessionSummary { ticks, end });
        };

        let command = engine.tick(&frame)?;
        connection.send(&command)?;
        ticks += 1;
    }
}

/// Accepts one emulator connection and serves it. Buffered telemetry is drained
/// however this ends, errors included.
pub fn run(transport: &Transport, engine: &mut Engine, shutdown: &AtomicBool) -> Result<SessionSummary, BridgeError> {
    let result = match transport.accept(shutdown) {
        Ok(Some(mut connection)) => serve(engine, &mut connection, shutdown),
        Ok(None) => Ok(SessionSummary {
            ticks: 0,
            end: SessionEnd::Shutdown,
        }),
        Err(error) => Err(error),
    };

    match &result {
        Ok(summary) => tracing::info!(target: Log::Bridge, ticks = summary.ticks, end = ?summary.end, "Session finished"),
        Err(error) => tracing::error!(target: Log::Bridge, ?error, "Session failed"),
    }

    if let FlushStatus::Failed { .. } = engine.drain() {
        tracing::error!(target: Log::Bridge, "Telemetry could not be drained before exit");
    }

    result
}
