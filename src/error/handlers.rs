//! Error handlers
//!
//! Routes errors to the operator log and maps fatal errors to exit codes.

use crate::error::types::{ConnectorError, FtServerError, SessionError, SetupError};
use log::{error, warn};
use std::net::SocketAddr;

/// Reports a session-scoped error to the operator. The client never sees these.
pub fn report_session_error(peer: &SocketAddr, err: &SessionError) {
    match err {
        // A client that went away or stalled is routine.
        SessionError::Read(ConnectorError::Timeout(_))
        | SessionError::Read(ConnectorError::Read(_)) => warn!("Session {}: {}", peer, err),
        _ => error!("Session {}: {}", peer, err),
    }
}

/// Handle an error that is about to terminate the process.
///
/// A rejected control port is a usage problem: it goes to stderr, not the log.
pub fn handle_fatal(err: &FtServerError) {
    match err {
        FtServerError::Setup(e @ SetupError::InvalidPort(_)) => eprintln!("{}", e),
        _ => error!("Server error: {}", err),
    }
}

/// Convert a fatal error to the process exit code.
///
/// A rejected control port is a usage error and exits cleanly, like any other
/// bad invocation.
pub fn error_to_exit_code(err: &FtServerError) -> u8 {
    match err {
        FtServerError::Setup(SetupError::InvalidPort(_)) => 0,
        _ => 1,
    }
}
