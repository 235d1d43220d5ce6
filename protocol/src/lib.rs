//! Types and codecs for the socket protocol spoken with the emulator script.
//!
//! Every tick the emulator sends one JSON object describing both fighters and the
//! round, and expects exactly one JSON object back containing both controller slots.

use std::io::Write;

mod errors;
pub use errors::ProtocolError;

mod framer;
pub use framer::{FrameReader, DEFAULT_MAX_FRAME_BYTES};

mod types;
pub use types::{Button, ButtonState, Command, FrameSnapshot, PlayerId, PlayerSnapshot, Winner, FULL_HEALTH};

/// Serializes a command into the bytes that go on the wire.
pub fn encode_command(command: &Command) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(command).map_err(ProtocolError::Encode)
}

/// Encodes and writes a command in one go, flushing so the reply leaves before we
/// block on the next read.
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<(), ProtocolError> {
    let payload = encode_command(command)?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_both_slots_with_wire_names() {
        let command = Command::for_player(PlayerId::One, ButtonState::pressed([Button::Right, Button::Y]));
        let value: serde_json::Value = serde_json::from_slice(&encode_command(&command).unwrap()).unwrap();

        assert_eq!(value["p1"]["Right"], true);
        assert_eq!(value["p1"]["Y"], true);
        assert_eq!(value["p1"]["Left"], false);
        assert_eq!(value["p2"]["Y"], false);
        assert_eq!(value["p2"].as_object().unwrap().len(), 12);
    }

    #[test]
    fn write_command_writes_one_object() {
        let mut out = Vec::new();
        write_command(&mut out, &Command::default()).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_object());
    }
}
