//! Reads button states typed on stdin, for the human mode.
//!
//! Each line is a whitespace separated list of button names
//! (`left right up down a b x y l r select start`) that are held until the next
//! line. An empty line releases everything.

use std::io::{self, BufRead};
use std::thread;

use gamebot_engine::strategy::HumanInput;
use gamebot_integrations::Log;
use gamebot_protocol::{Button, ButtonState};

pub fn parse_buttons(line: &str) -> Result<ButtonState, String> {
    line.split_whitespace()
        .map(str::parse::<Button>)
        .collect::<Result<Vec<_>, _>>()
        .map(ButtonState::pressed)
}

/// Forwards every parseable line from `reader` until it runs dry or the strategy
/// side goes away. Bad lines are logged and skipped.
pub fn forward_lines<R: BufRead>(reader: R, input: &HumanInput) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                tracing::error!(target: Log::Bridge, ?error, "Failed to read human input");
                return;
            },
        };

        match parse_buttons(&line) {
            Ok(state) => {
                if !input.send(state) {
                    return;
                }
            },

            Err(error) => tracing::warn!(target: Log::Bridge, %error, "Ignoring input line"),
        }
    }

    tracing::info!(target: Log::Bridge, "Human input closed");
}

/// Starts a background thread feeding stdin into `input`. The thread is left to
/// die with the process; it spends its life blocked on stdin.
pub fn spawn_stdin_reader(input: HumanInput) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("GamebotStdinInputThread".into())
        .spawn(move || forward_lines(io::stdin().lock(), &input))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use gamebot_engine::executor::ExecutorState;
    use gamebot_engine::strategy::{human_channel, Decision, Strategy};
    use gamebot_protocol::{FrameSnapshot, PlayerId};

    use super::*;

    #[test]
    fn parses_names_in_any_case() {
        assert_eq!(
            parse_buttons("Left  a START").unwrap(),
            ButtonState::pressed([Button::Left, Button::A, Button::Start])
        );
        assert!(parse_buttons("").unwrap().is_released());
        assert!(parse_buttons("left kick").is_err());
    }

    #[test]
    fn forwards_lines_and_skips_garbage() {
        let (input, mut strategy) = human_channel(8);
        forward_lines(Cursor::new("down\nnonsense\ndown r\n"), &input);

        let decision = strategy
            .decide(&FrameSnapshot::default(), PlayerId::One, &ExecutorState::Idle)
            .unwrap();
        assert_eq!(decision, Decision::Direct(ButtonState::pressed([Button::Down, Button::R])));
    }
}
