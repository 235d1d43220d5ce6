use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use gamebot_bridge::{launch, Mode};
use gamebot_config::BridgeConfig;
use gamebot_integrations::{logger, Log};
use gamebot_protocol::PlayerId;

/// Plays one controller slot for the emulator.
#[derive(Debug, Parser)]
#[command(name = "gamebot-bridge", version, about)]
struct Args {
    /// Controller slot to drive (1 or 2).
    #[arg(short, long, default_value = "1")]
    player: PlayerId,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Mode::Scripted)]
    mode: Mode,

    /// Seed for maneuver selection, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Write telemetry to this CSV file (turns telemetry on).
    #[arg(long, conflicts_with = "no_telemetry")]
    telemetry: Option<PathBuf>,

    /// Don't record telemetry.
    #[arg(long)]
    no_telemetry: bool,
}

impl Args {
    /// Command line flags are the last configuration layer.
    fn apply(&self, mut config: BridgeConfig) -> BridgeConfig {
        config.strategy.seed = self.seed.or(config.strategy.seed);

        if let Some(path) = &self.telemetry {
            config.telemetry.path = path.clone();
            config.telemetry.enabled = true;
        }

        if self.no_telemetry {
            config.telemetry.enabled = false;
        }

        config
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match BridgeConfig::load(args.config.as_deref()) {
        Ok(config) => args.apply(config),
        Err(error) => {
            logger::init("info");
            tracing::error!(target: Log::Config, ?error, "Unable to load configuration");
            return ExitCode::FAILURE;
        },
    };

    logger::init(&config.logging.filter);

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = shutdown.clone();

    if let Err(error) = ctrlc::set_handler(move || {
        tracing::info!(target: Log::Bridge, "Shutdown requested");
        handler_flag.store(true, Ordering::Relaxed);
    }) {
        tracing::warn!(target: Log::Bridge, ?error, "Unable to install the shutdown handler");
    }

    tracing::info!(target: Log::Bridge, player = %args.player, mode = ?args.mode, "Starting bridge");

    match launch(&config, args.player, args.mode, &shutdown) {
        Ok(summary) => {
            tracing::info!(target: Log::Bridge, ticks = summary.ticks, end = ?summary.end, "Bridge stopped");
            ExitCode::SUCCESS
        },

        Err(error) => {
            tracing::error!(target: Log::Bridge, ?error, "Bridge stopped on an error");
            ExitCode::FAILURE
        },
    }
}
