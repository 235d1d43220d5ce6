//! Maneuvers: fixed lists of controller deltas, one per tick.
//!
//! Maneuvers are written as compact tokens and parsed once into [`Step`]s:
//!
//! | token      | meaning                                                         |
//! |------------|-----------------------------------------------------------------|
//! | `-`        | hold everything as-is for a tick                                |
//! | `v+>`      | press down and right                                            |
//! | `!v+!>`    | release down and right                                          |
//! | `v+~R`     | press down, set R to the opposite of what the emulator reported |
//!
//! Directions are `<` `>` `^` `v`; anything else is a button name (`A`, `start`, ...).

use std::fmt;
use std::sync::Arc;

use gamebot_protocol::{Button, ButtonState};

use crate::SequenceError;

/// One tick's worth of change to a player's buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Hold,
    Press(Vec<Button>),
    Release(Vec<Button>),

    /// Presses `press`, and sets each of `toggle` to the inverse of its last
    /// observed value in the emulator's snapshot.
    Toggle { press: Vec<Button>, toggle: Vec<Button> },
}

impl Step {
    pub fn parse(token: &str) -> Result<Self, SequenceError> {
        let token = token.trim();

        if token == "-" {
            return Ok(Step::Hold);
        }

        let mut press = Vec::new();
        let mut release = Vec::new();
        let mut toggle = Vec::new();

        for part in token.split('+') {
            let part = part.trim();

            let (target, name) = match part.strip_prefix('!') {
                Some(rest) => (&mut release, rest),
                None => match part.strip_prefix('~') {
                    Some(rest) => (&mut toggle, rest),
                    None => (&mut press, part),
                },
            };

            let button = parse_button(name).ok_or_else(|| SequenceError::UnknownButton {
                token: token.to_string(),
                part: part.to_string(),
            })?;

            target.push(button);
        }

        match (release.is_empty(), press.is_empty() && toggle.is_empty()) {
            (false, true) => Ok(Step::Release(release)),
            (false, false) => Err(SequenceError::MixedRelease {
                token: token.to_string(),
            }),
            (true, _) if toggle.is_empty() => Ok(Step::Press(press)),
            (true, _) => Ok(Step::Toggle { press, toggle }),
        }
    }

    /// Applies this step to `buttons`. `observed` is what the emulator last
    /// reported for the same player.
    pub fn apply(&self, buttons: &mut ButtonState, observed: &ButtonState) {
        match self {
            Step::Hold => {},

            Step::Press(pressed) => {
                for button in pressed {
                    buttons.set(*button, true);
                }
            },

            Step::Release(released) => {
                for button in released {
                    buttons.set(*button, false);
                }
            },

            Step::Toggle { press, toggle } => {
                for button in press {
                    buttons.set(*button, true);
                }

                for button in toggle {
                    buttons.set(*button, !observed.get(*button));
                }
            },
        }
    }
}

fn parse_button(name: &str) -> Option<Button> {
    match name {
        "<" => Some(Button::Left),
        ">" => Some(Button::Right),
        "^" => Some(Button::Up),
        "v" => Some(Button::Down),
        "" => None,
        other => other.parse().ok(),
    }
}

/// An immutable, cheaply clonable list of steps.
#[derive(Clone, PartialEq, Eq)]
pub struct ActionSequence {
    name: &'static str,
    steps: Arc<[Step]>,
}

impl ActionSequence {
    pub fn new(name: &'static str, steps: Vec<Step>) -> Self {
        Self {
            name,
            steps: steps.into(),
        }
    }

    /// Parses a maneuver from its tokens.
    pub fn parse(name: &'static str, tokens: &[&str]) -> Result<Self, SequenceError> {
        let steps = tokens
            .iter()
            .enumerate()
            .map(|(index, token)| match token.trim().is_empty() {
                true => Err(SequenceError::EmptyToken { index }),
                false => Step::parse(token),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(name, steps))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether both handles point at the same parsed maneuver.
    pub fn same_as(&self, other: &ActionSequence) -> bool {
        Arc::ptr_eq(&self.steps, &other.steps)
    }
}

impl fmt::Debug for ActionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSequence")
            .field("name", &self.name)
            .field("len", &self.steps.len())
            .finish()
    }
}
