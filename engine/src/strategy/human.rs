//! Buttons supplied by a person, fed in from another thread.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use gamebot_integrations::Log;
use gamebot_protocol::{ButtonState, FrameSnapshot, PlayerId};

use crate::executor::ExecutorState;
use crate::strategy::{Decision, Strategy};
use crate::StrategyError;

/// Queue depth between the input thread and the tick loop.
pub const DEFAULT_INPUT_BOUND: usize = 16;

/// Creates the input handle and the strategy that consumes it.
pub fn human_channel(bound: usize) -> (HumanInput, HumanStrategy) {
    let (tx, rx) = mpsc::sync_channel(bound.max(1));
    (HumanInput { tx }, HumanStrategy::new(rx))
}

/// Producer side; owned by whatever is reading the person's input.
#[derive(Debug, Clone)]
pub struct HumanInput {
    tx: SyncSender<ButtonState>,
}

impl HumanInput {
    /// Queues a new button state, blocking while the queue is full. Returns `false`
    /// once the strategy side is gone.
    pub fn send(&self, state: ButtonState) -> bool {
        self.tx.send(state).is_ok()
    }

    /// Queues without blocking. A full queue drops `state`.
    pub fn try_send(&self, state: ButtonState) -> bool {
        match self.tx.try_send(state) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(target: Log::Strategy, "Human input queue is full, dropping state");
                false
            },
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Holds whatever the person last asked for. The queue is drained once per tick
/// and only the newest state is kept.
#[derive(Debug)]
pub struct HumanStrategy {
    rx: Receiver<ButtonState>,
    current: ButtonState,
    disconnected: bool,
}

impl HumanStrategy {
    fn new(rx: Receiver<ButtonState>) -> Self {
        Self {
            rx,
            current: ButtonState::default(),
            disconnected: false,
        }
    }

    pub fn current(&self) -> &ButtonState {
        &self.current
    }

    fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(state) => self.current = state,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        tracing::warn!(target: Log::Strategy, "Human input source closed, holding last state");
                        self.disconnected = true;
                    }
                    break;
                },
            }
        }
    }
}

impl Strategy for HumanStrategy {
    fn name(&self) -> &'static str {
        "human"
    }

    fn decide(
        &mut self,
        _frame: &FrameSnapshot,
        _player: PlayerId,
        _executor: &ExecutorState,
    ) -> Result<Decision, StrategyError> {
        self.drain();
        Ok(Decision::Direct(self.current))
    }
}

#[cfg(test)]
mod tests {
    use gamebot_protocol::Button;

    use super::*;

    fn decide(strategy: &mut HumanStrategy) -> ButtonState {
        match strategy
            .decide(&FrameSnapshot::default(), PlayerId::One, &ExecutorState::Idle)
            .unwrap()
        {
            Decision::Direct(state) => state,
            other => panic!("unexpected decision {other:?}"),
        }
    }

    #[test]
    fn starts_released_and_keeps_the_newest_state() {
        let (input, mut strategy) = human_channel(4);
        assert!(decide(&mut strategy).is_released());

        input.send(ButtonState::pressed([Button::Left]));
        input.send(ButtonState::pressed([Button::A]));

        assert_eq!(decide(&mut strategy), ButtonState::pressed([Button::A]));
        assert_eq!(decide(&mut strategy), ButtonState::pressed([Button::A]));
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let (input, mut strategy) = human_channel(1);

        assert!(input.try_send(ButtonState::pressed([Button::B])));
        assert!(!input.try_send(ButtonState::pressed([Button::X])));

        assert_eq!(decide(&mut strategy), ButtonState::pressed([Button::B]));
    }

    #[test]
    fn closed_source_holds_last_state() {
        let (input, mut strategy) = human_channel(2);
        input.send(ButtonState::pressed([Button::Down]));
        drop(input);

        assert_eq!(decide(&mut strategy), ButtonState::pressed([Button::Down]));
        assert_eq!(decide(&mut strategy), ButtonState::pressed([Button::Down]));
    }
}
