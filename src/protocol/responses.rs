//! Protocol responses
//!
//! Fixed texts the server puts on the wire.

/// Sent on the control connection when the command is not understood.
pub const INVALID_COMMAND_REPLY: &str =
    "Server Says: Error - invalid command. Terminating connection...";

/// Sent on the data connection when the requested file does not exist.
pub const FILE_NOT_FOUND_REPLY: &str = "FILE NOT FOUND\n";
