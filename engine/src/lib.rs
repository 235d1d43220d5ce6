//! The per-tick pipeline.
//!
//! [`Engine`] owns everything that lives for the length of a session on one player
//! slot: the strategy, the maneuver executor, the live button state, the match
//! tracker and (optionally) the telemetry buffer. The transport hands it one frame
//! at a time and sends back whatever command it returns.

use std::time::Duration;

use gamebot_integrations::Log;
use gamebot_protocol::{ButtonState, Command, FrameSnapshot, PlayerId};
use gamebot_telemetry::{unix_timestamp_now, FlushStatus, RowSink, TelemetryBuffer, TelemetryRow};

mod errors;
pub use errors::{EngineError, SequenceError, StrategyError};

pub mod executor;
pub mod lifecycle;
pub mod sequence;
pub mod strategy;

use crate::executor::{ActionExecutor, ExecutorState};
use crate::lifecycle::{MatchEvent, MatchTracker};
use crate::strategy::{Decision, ScriptedStrategy, Strategy};

/// The outcome of one tick, for callers that want more than the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub frame: u64,
    pub command: Command,
    pub event: MatchEvent,
}

#[derive(Debug)]
pub struct Engine {
    player: PlayerId,
    session_id: u64,
    frame: u64,
    strategy: Box<dyn Strategy>,
    executor: ActionExecutor,
    buttons: ButtonState,
    tracker: MatchTracker,
    telemetry: Option<TelemetryBuffer>,
}

impl Engine {
    pub fn builder(player: PlayerId) -> EngineBuilder {
        EngineBuilder::new(player)
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Number of ticks processed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn buttons(&self) -> &ButtonState {
        &self.buttons
    }

    pub fn executor_state(&self) -> &ExecutorState {
        self.executor.state()
    }

    pub fn telemetry(&self) -> Option<&TelemetryBuffer> {
        self.telemetry.as_ref()
    }

    /// Runs the whole pipeline for one frame and returns the reply.
    pub fn tick(&mut self, frame: &FrameSnapshot) -> Result<Command, EngineError> {
        self.step(frame).map(|tick| tick.command)
    }

    /// Same as `tick`, but also reports the frame number and lifecycle event.
    pub fn step(&mut self, frame: &FrameSnapshot) -> Result<Tick, EngineError> {
        self.frame += 1;

        let decision = self.strategy.decide(frame, self.player, self.executor.state())?;

        match decision {
            Decision::Begin(sequence) => {
                self.executor.request(sequence);
            },

            Decision::PassThrough => {},

            Decision::Direct(buttons) => {
                self.buttons = buttons;
            },
        }

        let observed = frame.player(self.player).buttons;
        self.executor.step(&mut self.buttons, &observed);

        let event = self.tracker.observe(frame);

        if let Some(telemetry) = self.telemetry.as_mut() {
            let row = TelemetryRow::capture(self.frame, unix_timestamp_now(), frame, self.player, self.buttons);
            telemetry.record(row, event.winner());
        }

        tracing::trace!(
            target: Log::Engine,
            frame = self.frame,
            buttons = ?self.buttons,
            "Tick processed"
        );

        Ok(Tick {
            frame: self.frame,
            command: Command::for_player(self.player, self.buttons),
            event,
        })
    }

    /// Writes out any buffered telemetry. Safe to call more than once.
    pub fn drain(&mut self) -> FlushStatus {
        match self.telemetry.as_mut() {
            Some(telemetry) => telemetry.drain(),
            None => FlushStatus::Idle,
        }
    }
}

struct TelemetrySettings {
    sink: Box<dyn RowSink>,
    capacity: usize,
    flush_interval: Duration,
}

pub struct EngineBuilder {
    player: PlayerId,
    session_id: Option<u64>,
    strategy: Option<Box<dyn Strategy>>,
    telemetry: Option<TelemetrySettings>,
}

impl EngineBuilder {
    fn new(player: PlayerId) -> Self {
        Self {
            player,
            session_id: None,
            strategy: None,
            telemetry: None,
        }
    }

    pub fn with_strategy(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    /// Defaults to the current unix time in seconds.
    pub fn with_session_id(mut self, session_id: u64) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_telemetry(mut self, sink: impl RowSink + 'static, capacity: usize, flush_interval: Duration) -> Self {
        self.telemetry = Some(TelemetrySettings {
            sink: Box::new(sink),
            capacity,
            flush_interval,
        });
        self
    }

    /// Builds the engine. Without an explicit strategy, an unseeded scripted one is used.
    pub fn build(self) -> Result<Engine, EngineError> {
        let session_id = self.session_id.unwrap_or_else(|| unix_timestamp_now() as u64);

        let strategy = match self.strategy {
            Some(strategy) => strategy,
            None => Box::new(ScriptedStrategy::new(fastrand::Rng::new())?),
        };

        let telemetry = self
            .telemetry
            .map(|settings| TelemetryBuffer::new(session_id, settings.capacity, settings.flush_interval, settings.sink));

        tracing::info!(
            target: Log::Engine,
            player = %self.player,
            session_id,
            strategy = strategy.name(),
            telemetry = telemetry.is_some(),
            "Engine ready"
        );

        Ok(Engine {
            player: self.player,
            session_id,
            frame: 0,
            strategy,
            executor: ActionExecutor::new(),
            buttons: ButtonState::default(),
            tracker: MatchTracker::new(),
            telemetry,
        })
    }
}
