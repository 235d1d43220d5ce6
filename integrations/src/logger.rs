//! Subscriber setup for the bridge process.

use tracing_subscriber::EnvFilter;

use crate::Log;

/// Installs the global `tracing` subscriber.
///
/// `default_filter` is used unless `RUST_LOG` is set, in which case the environment
/// wins. If a subscriber is already installed (tests, embedding) this quietly keeps
/// the existing one.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    if result.is_err() {
        tracing::debug!(target: Log::Bridge, "Subscriber already installed, keeping it");
    }
}
