//! Command message decoding
//!
//! Turns the raw bytes of one control-connection message into a `Command`.

use crate::protocol::commands::{Command, parse_command};

/// Decode a received message and parse it.
///
/// Bytes are decoded lossily; a trailing CR/LF is not part of the command.
pub fn parse_message(raw: &[u8]) -> Command {
    let text = String::from_utf8_lossy(raw);
    parse_command(text.trim_end_matches(['\r', '\n']))
}

/// Build the command for a message that exceeded the command length limit.
///
/// The message is never parsed, so a truncated prefix cannot be misread as a
/// valid command.
pub fn oversized_message(prefix: &[u8]) -> Command {
    Command::Invalid {
        raw_text: String::from_utf8_lossy(prefix).into_owned(),
    }
}
