//! Module `state`
//!
//! States of the per-connection protocol state machine and the report a
//! finished session leaves behind.

use std::fmt;
use tokio::net::TcpStream;

use crate::error::SessionError;
use crate::protocol::Command;
use crate::transfer::PeerIdentity;

/// Where a session is in its lifecycle.
///
/// The data connection only exists inside `Transferring`, so it can never
/// outlive the control connection or be opened twice.
#[derive(Debug)]
pub enum SessionState {
    AwaitingCommand,
    Dispatching(Command),
    AwaitingDataConnection {
        payload: Vec<u8>,
        data_port: String,
    },
    Transferring {
        data: TcpStream,
        payload: Vec<u8>,
        data_port: String,
    },
    Closed(SessionOutcome),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::AwaitingCommand => "awaiting command",
            SessionState::Dispatching(_) => "dispatching",
            SessionState::AwaitingDataConnection { .. } => "awaiting data connection",
            SessionState::Transferring { .. } => "transferring",
            SessionState::Closed(_) => "closed",
        }
    }
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The payload was delivered on the data connection.
    Transferred { bytes: usize },
    /// The command was not understood; the error text went back on the
    /// control connection.
    RejectedInvalid,
    /// The client disconnected without sending a command.
    PeerClosed,
    Failed(SessionError),
    /// Shutdown was requested while the session was in flight.
    Cancelled,
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::Transferred { bytes } => write!(f, "transferred {} bytes", bytes),
            SessionOutcome::RejectedInvalid => write!(f, "rejected invalid command"),
            SessionOutcome::PeerClosed => write!(f, "peer closed before sending a command"),
            SessionOutcome::Failed(e) => write!(f, "failed: {}", e),
            SessionOutcome::Cancelled => write!(f, "cancelled by shutdown"),
        }
    }
}

/// Summary of one finished session.
#[derive(Debug)]
pub struct SessionReport {
    pub peer: PeerIdentity,
    pub command: Option<Command>,
    pub outcome: SessionOutcome,
}
