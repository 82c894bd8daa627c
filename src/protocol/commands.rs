//! Module `commands`
//!
//! Defines the command a client sends on the control connection and the
//! logic that turns one received line into it.

/// Verb requesting a listing of the served directory.
pub const LIST_VERB: &str = "-l";
/// Verb requesting the contents of a single file.
pub const GET_VERB: &str = "-g";

/// Represents a command parsed from one control-connection message.
///
/// Ports are kept as the text the client sent; a bad port only shows up when
/// the server tries to connect back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListDirectory { data_port: String },
    GetFile { filename: String, data_port: String },
    Invalid { raw_text: String },
}

impl Command {
    /// Port the client advertised for the data connection, if the command has one.
    pub fn data_port(&self) -> Option<&str> {
        match self {
            Command::ListDirectory { data_port } | Command::GetFile { data_port, .. } => {
                Some(data_port)
            }
            Command::Invalid { .. } => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Command::Invalid { .. })
    }
}

/// Parses a raw command line into a `Command`.
///
/// `-l <port>` and `-g <file> <port>` are the only accepted shapes. Any other
/// token count or verb yields `Invalid` carrying the original line.
pub fn parse_command(raw: &str) -> Command {
    let tokens: Vec<&str> = raw.split_whitespace().collect();

    match tokens.as_slice() {
        [LIST_VERB, port] => Command::ListDirectory {
            data_port: port.to_string(),
        },
        [GET_VERB, filename, port] => Command::GetFile {
            filename: filename.to_string(),
            data_port: port.to_string(),
        },
        _ => Command::Invalid {
            raw_text: raw.to_string(),
        },
    }
}
