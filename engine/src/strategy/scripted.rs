use gamebot_integrations::Log;
use gamebot_protocol::{FrameSnapshot, PlayerId};

use crate::executor::ExecutorState;
use crate::sequence::ActionSequence;
use crate::strategy::{Decision, Strategy};
use crate::{SequenceError, StrategyError};

/// Horizontal gap beyond which ranged maneuvers are used.
pub const DEFAULT_ENGAGE_DISTANCE: i32 = 60;

/// Every maneuver the scripted strategy knows, parsed once up front.
#[derive(Debug, Clone)]
pub struct ManeuverBook {
    /// Used when the opponent is off to the right.
    pub ranged_right: [ActionSequence; 3],

    /// Used when the opponent is off to the left.
    pub ranged_left: [ActionSequence; 3],

    pub dash_left: ActionSequence,
    pub dash_right: ActionSequence,
    pub crouch_kick: ActionSequence,
}

impl ManeuverBook {
    pub fn standard() -> Result<Self, SequenceError> {
        let sweep_right = ActionSequence::parse(
            "sweep_right",
            &[">", "-", "!>", "v+>", "-", "!v+!>", "v", "-", "!v", "v+<", "-", "!v+!<", "<+Y", "-", "!<+!Y"],
        )?;
        let sweep_left = ActionSequence::parse(
            "sweep_left",
            &["<", "-", "!<", "v+<", "-", "!v+!<", "v", "-", "!v", "v+>", "-", "!v+!>", ">+Y", "-", "!>+!Y"],
        )?;

        // The fireball motion rolls from back to front, so it is the opposite roll.
        let fireball_right = ActionSequence::new("fireball_right", sweep_left.steps().to_vec());
        let fireball_left = ActionSequence::new("fireball_left", sweep_right.steps().to_vec());

        Ok(Self {
            ranged_right: [
                sweep_right,
                ActionSequence::parse("jump_heavy_right", &[">+^+~B", ">+^+~B", "!>+!^+!B"])?,
                fireball_right,
            ],
            ranged_left: [
                sweep_left,
                ActionSequence::parse("jump_heavy_left", &["<+^+~B", "<+^+~B", "!<+!^+!B"])?,
                fireball_left,
            ],
            dash_left: ActionSequence::parse("dash_left", &["<", "<", "!<"])?,
            dash_right: ActionSequence::parse("dash_right", &[">", ">", "!>"])?,
            crouch_kick: ActionSequence::parse("crouch_kick", &["v+~R", "v+~R", "v+~R", "!v+!R"])?,
        })
    }
}

/// Picks canned maneuvers at random based on how far away the opponent is.
#[derive(Debug)]
pub struct ScriptedStrategy {
    book: ManeuverBook,
    rng: fastrand::Rng,
    engage_distance: i32,
}

impl ScriptedStrategy {
    pub fn new(rng: fastrand::Rng) -> Result<Self, StrategyError> {
        Ok(Self {
            book: ManeuverBook::standard()?,
            rng,
            engage_distance: DEFAULT_ENGAGE_DISTANCE,
        })
    }

    pub fn with_seed(seed: u64) -> Result<Self, StrategyError> {
        Self::new(fastrand::Rng::with_seed(seed))
    }

    pub fn with_engage_distance(mut self, distance: i32) -> Self {
        self.engage_distance = distance;
        self
    }

    pub fn book(&self) -> &ManeuverBook {
        &self.book
    }

    /// Chooses a maneuver for a gap of `diff` (opponent x minus our x).
    ///
    /// Coordinates are `i32` on the wire, so the gap is taken in `i64` where it can't
    /// overflow.
    pub fn select(&mut self, diff: i64, player: PlayerId) -> ActionSequence {
        let engage = i64::from(self.engage_distance);

        if diff > engage {
            return self.book.ranged_right[self.rng.usize(..3)].clone();
        }

        if diff < -engage {
            return self.book.ranged_left[self.rng.usize(..3)].clone();
        }

        if self.rng.usize(..2) == 0 {
            return self.book.crouch_kick.clone();
        }

        // Player one backs off, player two closes in.
        let go_left = match player {
            PlayerId::One => diff > 0,
            PlayerId::Two => diff < 0,
        };

        match go_left {
            true => self.book.dash_left.clone(),
            false => self.book.dash_right.clone(),
        }
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn decide(
        &mut self,
        frame: &FrameSnapshot,
        player: PlayerId,
        executor: &ExecutorState,
    ) -> Result<Decision, StrategyError> {
        if executor.is_running() {
            return Ok(Decision::PassThrough);
        }

        let (me, opponent) = frame.perspective(player);
        let diff = i64::from(opponent.x) - i64::from(me.x);
        let maneuver = self.select(diff, player);

        tracing::trace!(target: Log::Strategy, diff, maneuver = maneuver.name(), "Selected maneuver");
        Ok(Decision::Begin(maneuver))
    }
}
