//! Pieces that every other crate in the workspace leans on: the set of log targets
//! used with `tracing`, and the subscriber setup that the bridge binary calls once
//! on startup.
//!
//! Log calls should always pass an explicit target so output can be filtered per
//! area, e.g:
//!
//! ```no_run
//! use gamebot_integrations::Log;
//!
//! tracing::info!(target: Log::Engine, "Engine ready");
//! ```

pub mod logger;

/// Log targets, one per area of the bridge. These map directly onto `EnvFilter`
/// directives (`RUST_LOG=gamebot::telemetry=debug`).
#[derive(Debug)]
pub struct Log;

#[allow(non_upper_case_globals)]
impl Log {
    pub const Bridge: &'static str = "gamebot::bridge";
    pub const Transport: &'static str = "gamebot::transport";
    pub const Engine: &'static str = "gamebot::engine";
    pub const Strategy: &'static str = "gamebot::strategy";
    pub const Lifecycle: &'static str = "gamebot::lifecycle";
    pub const Telemetry: &'static str = "gamebot::telemetry";
    pub const Config: &'static str = "gamebot::config";
}
