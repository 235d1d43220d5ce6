//! Runs one player slot: listens for the emulator, then answers every frame it
//! sends with a controller command until the connection closes or the process is
//! asked to stop.
//!
//! The binary in `main.rs` is a thin wrapper over [`launch`]; tests drive the same
//! pieces directly over a loopback socket.

use std::sync::atomic::AtomicBool;

use gamebot_config::BridgeConfig;
use gamebot_engine::strategy::{human_channel, HumanInput, ScriptedStrategy, DEFAULT_INPUT_BOUND};
use gamebot_engine::Engine;
use gamebot_integrations::Log;
use gamebot_protocol::PlayerId;
use gamebot_telemetry::CsvFileSink;

mod errors;
pub use errors::BridgeError;

pub mod input;

mod session;
pub use session::{run, serve, SessionEnd, SessionSummary};

pub mod transport;
use transport::Transport;

/// Who decides what buttons to press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Canned maneuvers picked by distance to the opponent.
    Scripted,

    /// Button states typed on stdin.
    Human,
}

/// Builds the engine described by `config`. In human mode the returned input handle
/// must be fed by someone, usually the stdin reader.
pub fn build_engine(config: &BridgeConfig, player: PlayerId, mode: Mode) -> Result<(Engine, Option<HumanInput>), BridgeError> {
    let mut builder = Engine::builder(player);
    let mut input = None;

    match mode {
        Mode::Scripted => {
            let rng = match config.strategy.seed {
                Some(seed) => fastrand::Rng::with_seed(seed),
                None => fastrand::Rng::new(),
            };

            let strategy = ScriptedStrategy::new(rng)
                .map_err(gamebot_engine::EngineError::from)?
                .with_engage_distance(config.strategy.engage_distance);

            builder = builder.with_strategy(strategy);
        },

        Mode::Human => {
            let (handle, strategy) = human_channel(DEFAULT_INPUT_BOUND);
            builder = builder.with_strategy(strategy);
            input = Some(handle);
        },
    }

    if config.telemetry.enabled {
        let sink = CsvFileSink::open(&config.telemetry.path)?;
        builder = builder.with_telemetry(sink, config.telemetry.capacity, config.telemetry.flush_interval());
    } else {
        tracing::info!(target: Log::Bridge, "Telemetry disabled");
    }

    Ok((builder.build()?, input))
}

/// Everything the binary does after parsing arguments: build the engine, start the
/// stdin reader if needed, listen on the slot's port and serve one session.
pub fn launch(config: &BridgeConfig, player: PlayerId, mode: Mode, shutdown: &AtomicBool) -> Result<SessionSummary, BridgeError> {
    let (mut engine, input) = build_engine(config, player, mode)?;

    if let Some(input) = input {
        input::spawn_stdin_reader(input)?;
    }

    let transport = match Transport::bind(
        &config.transport.host,
        config.transport.port_for(player.number()),
        config.transport.max_frame_bytes,
        config.transport.poll_interval(),
    ) {
        Ok(transport) => transport,
        Err(error) => {
            engine.drain();
            return Err(error);
        },
    };

    run(&transport, &mut engine, shutdown)
}
