//! Decision strategies.
//!
//! A strategy looks at the frame (and whether a maneuver is already in flight) and
//! either asks for a maneuver to begin, lets the running one continue, or hands back
//! a complete button state to use as-is.

use std::fmt::Debug;

use gamebot_protocol::{ButtonState, FrameSnapshot, PlayerId};

use crate::executor::ExecutorState;
use crate::sequence::ActionSequence;
use crate::StrategyError;

mod human;
pub use human::{human_channel, HumanInput, HumanStrategy, DEFAULT_INPUT_BOUND};

mod policy;
pub use policy::{features, PolicyModel, PolicyStrategy, FEATURE_COUNT, POLICY_BUTTONS, POLICY_THRESHOLDS};

mod scripted;
pub use scripted::{ManeuverBook, ScriptedStrategy, DEFAULT_ENGAGE_DISTANCE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Start this maneuver if the executor is idle.
    Begin(ActionSequence),

    /// Leave the buttons to whatever is in flight.
    PassThrough,

    /// Replace the live buttons outright.
    Direct(ButtonState),
}

pub trait Strategy: Debug + Send {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    fn decide(
        &mut self,
        frame: &FrameSnapshot,
        player: PlayerId,
        executor: &ExecutorState,
    ) -> Result<Decision, StrategyError>;
}
