//! Works out when a match ends, and who won, from consecutive snapshots.
//!
//! The emulator never says "the match is over", so this looks for the signs instead:
//! a knockout, the clock running out, the round-over flag going up, or health bars
//! snapping back to full for the next match.

use gamebot_integrations::Log;
use gamebot_protocol::{FrameSnapshot, Winner, FULL_HEALTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    NoOp,
    MatchEnded(Winner),
}

impl MatchEvent {
    pub fn winner(self) -> Option<Winner> {
        match self {
            MatchEvent::NoOp => None,
            MatchEvent::MatchEnded(winner) => Some(winner),
        }
    }
}

/// The handful of fields the detector looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub p1_health: i32,
    pub p2_health: i32,
    pub timer: i32,
    pub round_over: bool,
}

impl Observation {
    /// What is assumed to have come before the first frame.
    pub const INITIAL: Observation = Observation {
        p1_health: FULL_HEALTH,
        p2_health: FULL_HEALTH,
        timer: 0,
        round_over: false,
    };

    pub fn of(frame: &FrameSnapshot) -> Self {
        Self {
            p1_health: frame.player1.health,
            p2_health: frame.player2.health,
            timer: frame.timer,
            round_over: frame.round_over,
        }
    }
}

impl Default for Observation {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Checks the end-of-match rules in priority order; the first one that applies wins.
pub fn detect(previous: &Observation, current: &Observation) -> MatchEvent {
    let (p1, p2) = (current.p1_health, current.p2_health);

    if p1 <= 0 && p2 > 0 {
        return MatchEvent::MatchEnded(Winner::PlayerTwo);
    }

    if p2 <= 0 && p1 > 0 {
        return MatchEvent::MatchEnded(Winner::PlayerOne);
    }

    if previous.timer > 0 && current.timer <= 0 {
        return MatchEvent::MatchEnded(Winner::by_health(p1, p2));
    }

    if !previous.round_over && current.round_over {
        return MatchEvent::MatchEnded(Winner::by_health(p1, p2));
    }

    let refilled = (p1 == FULL_HEALTH && previous.p1_health < FULL_HEALTH)
        || (p2 == FULL_HEALTH && previous.p2_health < FULL_HEALTH);

    if refilled {
        let winner = if previous.p1_health <= 0 {
            Winner::PlayerTwo
        } else if previous.p2_health <= 0 {
            Winner::PlayerOne
        } else {
            Winner::by_health(previous.p1_health, previous.p2_health)
        };

        return MatchEvent::MatchEnded(winner);
    }

    MatchEvent::NoOp
}

/// Holds the previous observation between ticks.
#[derive(Debug, Default)]
pub struct MatchTracker {
    last: Observation,
}

impl MatchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> &Observation {
        &self.last
    }

    /// Feeds one frame through the detector. The stored observation is replaced
    /// every tick whether or not the match ended.
    pub fn observe(&mut self, frame: &FrameSnapshot) -> MatchEvent {
        let current = Observation::of(frame);
        let event = detect(&self.last, &current);

        if let MatchEvent::MatchEnded(winner) = event {
            tracing::info!(
                target: Log::Lifecycle,
                ?winner,
                p1_health = current.p1_health,
                p2_health = current.p2_health,
                timer = current.timer,
                "Match ended"
            );
        }

        self.last = current;
        event
    }
}
