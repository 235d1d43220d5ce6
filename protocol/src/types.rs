use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Health value the emulator reports for a fresh fighter.
pub const FULL_HEALTH: i32 = 100;

/// Which controller slot a bridge process is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub fn opponent(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl FromStr for PlayerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(PlayerId::One),
            "2" => Ok(PlayerId::Two),
            other => Err(format!("player must be 1 or 2, got {other:?}")),
        }
    }
}

/// Outcome of a match. Serialized as the bare integer the telemetry schema uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Winner {
    Draw = 0,
    PlayerOne = 1,
    PlayerTwo = 2,
}

impl Winner {
    /// Whoever has strictly more health wins; equal health is a draw.
    pub fn by_health(p1_health: i32, p2_health: i32) -> Self {
        if p1_health > p2_health {
            Winner::PlayerOne
        } else if p2_health > p1_health {
            Winner::PlayerTwo
        } else {
            Winner::Draw
        }
    }

    pub fn code(self) -> i8 {
        self as u8 as i8
    }
}

/// The twelve virtual controller buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Right,
    Up,
    Down,
    A,
    B,
    X,
    Y,
    L,
    R,
    Select,
    Start,
}

impl Button {
    /// Every button, in telemetry column order.
    pub const ALL: [Button; 12] = [
        Button::Left,
        Button::Right,
        Button::Up,
        Button::Down,
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::L,
        Button::R,
        Button::Select,
        Button::Start,
    ];

    /// Lower-case name, used by the stdin input source and in log output.
    pub fn name(self) -> &'static str {
        match self {
            Button::Left => "left",
            Button::Right => "right",
            Button::Up => "up",
            Button::Down => "down",
            Button::A => "a",
            Button::B => "b",
            Button::X => "x",
            Button::Y => "y",
            Button::L => "l",
            Button::R => "r",
            Button::Select => "select",
            Button::Start => "start",
        }
    }
}

impl FromStr for Button {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();

        Button::ALL
            .into_iter()
            .find(|button| button.name() == lowered)
            .ok_or_else(|| format!("unknown button {s:?}"))
    }
}

/// The set of asserted controller flags for one player.
///
/// Field names on the wire follow the emulator script (`"Left"`, `"A"`, ...), lower-case
/// spellings are accepted as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonState {
    #[serde(rename = "Left", alias = "left")]
    pub left: bool,

    #[serde(rename = "Right", alias = "right")]
    pub right: bool,

    #[serde(rename = "Up", alias = "up")]
    pub up: bool,

    #[serde(rename = "Down", alias = "down")]
    pub down: bool,

    #[serde(rename = "A", alias = "a")]
    pub a: bool,

    #[serde(rename = "B", alias = "b")]
    pub b: bool,

    #[serde(rename = "X", alias = "x")]
    pub x: bool,

    #[serde(rename = "Y", alias = "y")]
    pub y: bool,

    #[serde(rename = "L", alias = "l")]
    pub l: bool,

    #[serde(rename = "R", alias = "r")]
    pub r: bool,

    #[serde(rename = "Select", alias = "select")]
    pub select: bool,

    #[serde(rename = "Start", alias = "start")]
    pub start: bool,
}

impl ButtonState {
    pub fn get(&self, button: Button) -> bool {
        *self.slot(button)
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        *self.slot_mut(button) = pressed;
    }

    /// Builds a state with exactly the listed buttons held.
    pub fn pressed<I>(buttons: I) -> Self
    where
        I: IntoIterator<Item = Button>,
    {
        let mut state = Self::default();
        for button in buttons {
            state.set(button, true);
        }
        state
    }

    /// Iterates over the held buttons in column order.
    pub fn held(&self) -> impl Iterator<Item = Button> + '_ {
        Button::ALL.into_iter().filter(move |button| self.get(*button))
    }

    pub fn is_released(&self) -> bool {
        self.held().next().is_none()
    }

    fn slot(&self, button: Button) -> &bool {
        match button {
            Button::Left => &self.left,
            Button::Right => &self.right,
            Button::Up => &self.up,
            Button::Down => &self.down,
            Button::A => &self.a,
            Button::B => &self.b,
            Button::X => &self.x,
            Button::Y => &self.y,
            Button::L => &self.l,
            Button::R => &self.r,
            Button::Select => &self.select,
            Button::Start => &self.start,
        }
    }

    fn slot_mut(&mut self, button: Button) -> &mut bool {
        match button {
            Button::Left => &mut self.left,
            Button::Right => &mut self.right,
            Button::Up => &mut self.up,
            Button::Down => &mut self.down,
            Button::A => &mut self.a,
            Button::B => &mut self.b,
            Button::X => &mut self.x,
            Button::Y => &mut self.y,
            Button::L => &mut self.l,
            Button::R => &mut self.r,
            Button::Select => &mut self.select,
            Button::Start => &mut self.start,
        }
    }
}

/// Kinematic and status fields for one fighter on one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlayerSnapshot {
    /// Character identifier reported by the emulator.
    #[serde(rename = "character", alias = "player_id")]
    pub player_id: i32,

    pub health: i32,
    pub x: i32,
    pub y: i32,

    #[serde(default)]
    pub jumping: bool,

    #[serde(default)]
    pub crouching: bool,

    #[serde(default)]
    pub in_move: bool,

    #[serde(rename = "move", alias = "move_id", default)]
    pub move_id: i32,

    /// Buttons as the emulator last saw them for this player.
    #[serde(default)]
    pub buttons: ButtonState,
}

/// Everything the emulator reports for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrameSnapshot {
    #[serde(rename = "p1")]
    pub player1: PlayerSnapshot,

    #[serde(rename = "p2")]
    pub player2: PlayerSnapshot,

    pub timer: i32,

    #[serde(default)]
    pub round_started: bool,

    #[serde(default)]
    pub round_over: bool,

    /// Opaque fight result code; carried through but not interpreted.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

impl FrameSnapshot {
    pub fn player(&self, id: PlayerId) -> &PlayerSnapshot {
        match id {
            PlayerId::One => &self.player1,
            PlayerId::Two => &self.player2,
        }
    }

    /// Returns `(self, opponent)` from the point of view of `id`.
    pub fn perspective(&self, id: PlayerId) -> (&PlayerSnapshot, &PlayerSnapshot) {
        (self.player(id), self.player(id.opponent()))
    }
}

/// The reply sent back to the emulator each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Command {
    pub p1: ButtonState,
    pub p2: ButtonState,
}

impl Command {
    /// A command driving only `player`; the other slot is left released.
    pub fn for_player(player: PlayerId, buttons: ButtonState) -> Self {
        match player {
            PlayerId::One => Self {
                p1: buttons,
                p2: ButtonState::default(),
            },
            PlayerId::Two => Self {
                p1: ButtonState::default(),
                p2: buttons,
            },
        }
    }

    pub fn buttons(&self, player: PlayerId) -> &ButtonState {
        match player {
            PlayerId::One => &self.p1,
            PlayerId::Two => &self.p2,
        }
    }
}
