use gamebot_protocol::{Button, ButtonState, FrameSnapshot, PlayerId, Winner};
use time::OffsetDateTime;

/// Column names of the persisted store, in write order.
pub const HEADERS: [&str; 49] = [
    "session_id",
    "match_id",
    "frame",
    "timestamp",
    "player_id",
    "opponent_id",
    "player_health",
    "opponent_health",
    "player_x",
    "player_y",
    "opponent_x",
    "opponent_y",
    "distance",
    "timer",
    "has_round_started",
    "is_round_over",
    "winner",
    "player_jumping",
    "player_crouching",
    "player_in_move",
    "player_move_id",
    "opponent_jumping",
    "opponent_crouching",
    "opponent_in_move",
    "opponent_move_id",
    "action_left",
    "action_right",
    "action_up",
    "action_down",
    "action_A",
    "action_B",
    "action_X",
    "action_Y",
    "action_L",
    "action_R",
    "action_select",
    "action_start",
    "opponent_left",
    "opponent_right",
    "opponent_up",
    "opponent_down",
    "opponent_A",
    "opponent_B",
    "opponent_X",
    "opponent_Y",
    "opponent_L",
    "opponent_R",
    "opponent_select",
    "opponent_start",
];

/// Value written in the `winner` column while a match is still in progress.
pub const UNRESOLVED_WINNER: i8 = -1;

/// Current wall-clock time as fractional unix seconds.
pub fn unix_timestamp_now() -> f64 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1_000_000_000.0
}

/// One fighter's status columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FighterColumns {
    id: i32,
    health: i32,
    x: i32,
    y: i32,
    jumping: bool,
    crouching: bool,
    in_move: bool,
    move_id: i32,
}

/// One tick of labeled telemetry, seen from the controlled player's side.
///
/// `session_id` and `match_id` are assigned by the buffer when the row is recorded.
/// The winner starts out unresolved and can be set exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRow {
    session_id: u64,
    match_id: u64,
    frame: u64,
    timestamp: f64,
    player: FighterColumns,
    opponent: FighterColumns,
    timer: i32,
    round_started: bool,
    round_over: bool,
    winner: Option<Winner>,
    actions: ButtonState,
    opponent_actions: ButtonState,
}

impl TelemetryRow {
    /// Captures a row for `player`. `actions` are the buttons we are about to send;
    /// the opponent's actions are whatever the emulator reported for them.
    pub fn capture(frame: u64, timestamp: f64, snapshot: &FrameSnapshot, player: PlayerId, actions: ButtonState) -> Self {
        let (me, them) = snapshot.perspective(player);

        let columns = |p: &gamebot_protocol::PlayerSnapshot| FighterColumns {
            id: p.player_id,
            health: p.health,
            x: p.x,
            y: p.y,
            jumping: p.jumping,
            crouching: p.crouching,
            in_move: p.in_move,
            move_id: p.move_id,
        };

        Self {
            session_id: 0,
            match_id: 0,
            frame,
            timestamp,
            player: columns(me),
            opponent: columns(them),
            timer: snapshot.timer,
            round_started: snapshot.round_started,
            round_over: snapshot.round_over,
            winner: None,
            actions,
            opponent_actions: them.buttons,
        }
    }

    pub(crate) fn assign(&mut self, session_id: u64, match_id: u64) {
        self.session_id = session_id;
        self.match_id = match_id;
    }

    /// Sets the winner if it hasn't been set yet. Returns whether this call set it.
    pub(crate) fn resolve(&mut self, winner: Winner) -> bool {
        if self.winner.is_some() {
            return false;
        }

        self.winner = Some(winner);
        true
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn match_id(&self) -> u64 {
        self.match_id
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    pub fn actions(&self) -> &ButtonState {
        &self.actions
    }

    pub fn opponent_actions(&self) -> &ButtonState {
        &self.opponent_actions
    }

    /// Horizontal separation between the two fighters.
    pub fn distance(&self) -> u32 {
        self.player.x.abs_diff(self.opponent.x)
    }

    /// Renders the row as CSV fields, matching `HEADERS`.
    pub fn to_record(&self) -> Vec<String> {
        let flag = |b: bool| String::from(if b { "1" } else { "0" });
        let winner = self.winner.map(Winner::code).unwrap_or(UNRESOLVED_WINNER);

        let mut record = vec![
            self.session_id.to_string(),
            self.match_id.to_string(),
            self.frame.to_string(),
            self.timestamp.to_string(),
            self.player.id.to_string(),
            self.opponent.id.to_string(),
            self.player.health.to_string(),
            self.opponent.health.to_string(),
            self.player.x.to_string(),
            self.player.y.to_string(),
            self.opponent.x.to_string(),
            self.opponent.y.to_string(),
            self.distance().to_string(),
            self.timer.to_string(),
            flag(self.round_started),
            flag(self.round_over),
            winner.to_string(),
            flag(self.player.jumping),
            flag(self.player.crouching),
            flag(self.player.in_move),
            self.player.move_id.to_string(),
            flag(self.opponent.jumping),
            flag(self.opponent.crouching),
            flag(self.opponent.in_move),
            self.opponent.move_id.to_string(),
        ];

        record.extend(Button::ALL.iter().map(|b| flag(self.actions.get(*b))));
        record.extend(Button::ALL.iter().map(|b| flag(self.opponent_actions.get(*b))));
        record
    }
}

#[cfg(test)]
mod tests {
    use gamebot_protocol::PlayerSnapshot;

    use super::*;

    fn snapshot() -> FrameSnapshot {
        FrameSnapshot {
            player1: PlayerSnapshot {
                player_id: 7,
                health: 80,
                x: 40,
                y: 192,
                crouching: true,
                ..Default::default()
            },
            player2: PlayerSnapshot {
                player_id: 3,
                health: 55,
                x: 130,
                y: 180,
                in_move: true,
                move_id: 9,
                buttons: ButtonState::pressed([Button::B]),
                ..Default::default()
            },
            timer: 61,
            round_started: true,
            ..Default::default()
        }
    }

    #[test]
    fn record_matches_header_width() {
        let row = TelemetryRow::capture(1, 0.5, &snapshot(), PlayerId::One, ButtonState::default());
        assert_eq!(row.to_record().len(), HEADERS.len());
    }

    #[test]
    fn columns_follow_the_controlled_player() {
        let actions = ButtonState::pressed([Button::Down, Button::R]);
        let mut row = TelemetryRow::capture(12, 1.25, &snapshot(), PlayerId::Two, actions);
        row.assign(99, 4);

        let record = row.to_record();
        let column = |name: &str| record[HEADERS.iter().position(|h| *h == name).unwrap()].clone();

        assert_eq!(column("session_id"), "99");
        assert_eq!(column("match_id"), "4");
        assert_eq!(column("player_id"), "3");
        assert_eq!(column("opponent_health"), "80");
        assert_eq!(column("distance"), "90");
        assert_eq!(column("winner"), "-1");
        assert_eq!(column("player_in_move"), "1");
        assert_eq!(column("player_move_id"), "9");
        assert_eq!(column("opponent_crouching"), "1");
        assert_eq!(column("action_down"), "1");
        assert_eq!(column("action_R"), "1");
        assert_eq!(column("action_B"), "0");
        assert_eq!(column("opponent_B"), "0");
    }

    #[test]
    fn opponent_actions_come_from_the_snapshot() {
        let row = TelemetryRow::capture(1, 0.0, &snapshot(), PlayerId::One, ButtonState::default());
        assert!(row.opponent_actions().b);
    }

    #[test]
    fn distance_spans_the_whole_coordinate_range() {
        let mut frame = snapshot();
        frame.player1.x = i32::MIN;
        frame.player2.x = 1;

        let row = TelemetryRow::capture(1, 0.0, &frame, PlayerId::One, ButtonState::default());
        assert_eq!(row.distance(), 2_147_483_649);
        assert_eq!(row.to_record()[12], "2147483649");
    }

    #[test]
    fn winner_is_write_once() {
        let mut row = TelemetryRow::capture(1, 0.0, &snapshot(), PlayerId::One, ButtonState::default());

        assert!(row.resolve(Winner::PlayerTwo));
        assert!(!row.resolve(Winner::PlayerOne));
        assert_eq!(row.winner(), Some(Winner::PlayerTwo));
        assert_eq!(row.to_record()[16], "2");
    }
}
