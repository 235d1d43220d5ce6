//! Runs at most one maneuver at a time, one step per tick.

use gamebot_integrations::Log;
use gamebot_protocol::ButtonState;

use crate::sequence::{ActionSequence, Step};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExecutorState {
    #[default]
    Idle,

    /// `cursor` is the index of the next step to apply.
    Running { sequence: ActionSequence, cursor: usize },
}

impl ExecutorState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ExecutorState::Idle)
    }

    pub fn is_running(&self) -> bool {
        !self.is_idle()
    }
}

#[derive(Debug, Default)]
pub struct ActionExecutor {
    state: ExecutorState,
}

impl ActionExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ExecutorState {
        &self.state
    }

    /// Starts `sequence` if nothing is running. Returns whether it was accepted;
    /// requests made while busy, and empty sequences, are dropped.
    pub fn request(&mut self, sequence: ActionSequence) -> bool {
        if sequence.is_empty() {
            tracing::trace!(target: Log::Engine, maneuver = sequence.name(), "Ignoring empty maneuver");
            return false;
        }

        match self.state {
            ExecutorState::Idle => {
                tracing::trace!(target: Log::Engine, maneuver = sequence.name(), "Starting maneuver");
                self.state = ExecutorState::Running { sequence, cursor: 0 };
                true
            },

            ExecutorState::Running { .. } => {
                tracing::trace!(target: Log::Engine, maneuver = sequence.name(), "Busy, dropping maneuver");
                false
            },
        }
    }

    /// Applies the next step, if any, to `buttons`. Goes back to idle once the
    /// last step has been applied.
    ///
    /// Returns the step that was applied.
    pub fn step(&mut self, buttons: &mut ButtonState, observed: &ButtonState) -> Option<Step> {
        let ExecutorState::Running { sequence, cursor } = &mut self.state else {
            return None;
        };

        let step = sequence.steps().get(*cursor).cloned();

        if let Some(step) = &step {
            step.apply(buttons, observed);
            *cursor += 1;
        }

        if *cursor >= sequence.len() {
            tracing::trace!(target: Log::Engine, maneuver = sequence.name(), "Maneuver finished");
            self.state = ExecutorState::Idle;
        }

        step
    }

    /// Abandons whatever is running. Buttons are left as they are.
    pub fn reset(&mut self) {
        self.state = ExecutorState::Idle;
    }
}
