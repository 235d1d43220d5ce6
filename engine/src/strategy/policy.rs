//! Strategy backed by a learned model.
//!
//! The model itself lives outside this crate. It gets a fixed-width feature vector
//! per tick and returns one score per output button; scores are turned into
//! presses with per-button thresholds and a couple of sanity rules.

use std::fmt::Debug;

use gamebot_integrations::Log;
use gamebot_protocol::{Button, ButtonState, FrameSnapshot, PlayerId};

use crate::executor::ExecutorState;
use crate::strategy::{Decision, Strategy};
use crate::StrategyError;

pub const FEATURE_COUNT: usize = 16;

/// Buttons the model scores, in output order. The first four are movement.
pub const POLICY_BUTTONS: [Button; 8] = [
    Button::Left,
    Button::Right,
    Button::Up,
    Button::Down,
    Button::A,
    Button::B,
    Button::X,
    Button::Y,
];

/// A score has to be strictly above its threshold to count as a press.
pub const POLICY_THRESHOLDS: [f32; 8] = [0.25, 0.25, 0.35, 0.25, 0.15, 0.15, 0.20, 0.20];

/// A trained model, or anything that can stand in for one.
pub trait PolicyModel: Debug + Send {
    fn predict(&mut self, features: &[f32; FEATURE_COUNT]) -> Result<[f32; 8], StrategyError>;
}

/// Builds the feature vector for `player`. Flags are encoded as 0/1.
pub fn features(frame: &FrameSnapshot, player: PlayerId) -> [f32; FEATURE_COUNT] {
    let (me, opponent) = frame.perspective(player);
    let flag = |b: bool| if b { 1.0 } else { 0.0 };

    let dx = (i64::from(me.x) - i64::from(opponent.x)) as f32;
    let dy = (i64::from(me.y) - i64::from(opponent.y)) as f32;

    [
        me.x as f32,
        me.y as f32,
        opponent.x as f32,
        opponent.y as f32,
        (dx * dx + dy * dy).sqrt(),
        frame.timer as f32,
        flag(frame.round_started),
        flag(frame.round_over),
        flag(me.jumping),
        flag(me.crouching),
        flag(me.in_move),
        me.move_id as f32,
        flag(opponent.jumping),
        flag(opponent.crouching),
        flag(opponent.in_move),
        opponent.move_id as f32,
    ]
}

#[derive(Debug)]
pub struct PolicyStrategy {
    model: Box<dyn PolicyModel>,
    rng: fastrand::Rng,
}

impl PolicyStrategy {
    pub fn new(model: impl PolicyModel + 'static, rng: fastrand::Rng) -> Self {
        Self {
            model: Box::new(model),
            rng,
        }
    }

    /// Turns raw model scores into a button state.
    ///
    /// At most one movement button survives (picked at random when several clear
    /// their threshold), and if nothing at all is pressed one face button is forced.
    pub fn buttons_from_scores(&mut self, scores: &[f32; 8]) -> ButtonState {
        let active: Vec<bool> = scores
            .iter()
            .zip(POLICY_THRESHOLDS)
            .map(|(score, threshold)| *score > threshold)
            .collect();

        let mut buttons = ButtonState::default();

        let moving: Vec<Button> = (0..4).filter(|i| active[*i]).map(|i| POLICY_BUTTONS[i]).collect();
        if let Some(direction) = self.rng.choice(moving) {
            buttons.set(direction, true);
        }

        for i in 4..8 {
            buttons.set(POLICY_BUTTONS[i], active[i]);
        }

        if buttons.is_released() {
            buttons.set(POLICY_BUTTONS[4 + self.rng.usize(..4)], true);
        }

        buttons
    }
}

impl Strategy for PolicyStrategy {
    fn name(&self) -> &'static str {
        "policy"
    }

    fn decide(
        &mut self,
        frame: &FrameSnapshot,
        player: PlayerId,
        _executor: &ExecutorState,
    ) -> Result<Decision, StrategyError> {
        let scores = self.model.predict(&features(frame, player))?;

        if scores.iter().any(|score| !score.is_finite()) {
            return Err(StrategyError::Model(format!("non-finite scores {scores:?}")));
        }

        let buttons = self.buttons_from_scores(&scores);
        tracing::trace!(target: Log::Strategy, ?scores, ?buttons, "Policy decision");

        Ok(Decision::Direct(buttons))
    }
}
