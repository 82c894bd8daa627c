//! Control connection protocol
//!
//! Handles command parsing and the fixed texts sent back to clients.

pub mod commands;
pub mod parser;
pub mod responses;

pub use commands::{Command, GET_VERB, LIST_VERB, parse_command};
pub use parser::{oversized_message, parse_message};
pub use responses::{FILE_NOT_FOUND_REPLY, INVALID_COMMAND_REPLY};
