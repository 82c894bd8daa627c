//! Error types
//!
//! Defines domain-specific error types for each part of the file transfer server.

use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Errors raised while bringing the server up. These are fatal.
#[derive(Debug)]
pub enum SetupError {
    InvalidPort(String),
    Config(String),
    Bind(String, io::Error),
    Listen(SocketAddr, io::Error),
    ListenerFailed(io::Error),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::InvalidPort(p) => {
                write!(f, "Invalid control port {}: must be between 1024 and 65535", p)
            }
            SetupError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SetupError::Bind(target, e) => write!(f, "Failed to bind {}: {}", target, e),
            SetupError::Listen(addr, e) => write!(f, "Failed to listen on {}: {}", addr, e),
            SetupError::ListenerFailed(e) => write!(f, "Listening socket failed: {}", e),
        }
    }
}

impl std::error::Error for SetupError {}

impl From<config::ConfigError> for SetupError {
    fn from(error: config::ConfigError) -> Self {
        SetupError::Config(error.to_string())
    }
}

/// Socket-level failures reported by the transport connector.
#[derive(Debug)]
pub enum ConnectorError {
    Resolution { target: String, reason: String },
    Connect { target: String, source: io::Error },
    Accept(io::Error),
    Read(io::Error),
    Write(io::Error),
    Timeout(&'static str),
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorError::Resolution { target, reason } => {
                write!(f, "Cannot resolve {}: {}", target, reason)
            }
            ConnectorError::Connect { target, source } => {
                write!(f, "Failed to connect to {}: {}", target, source)
            }
            ConnectorError::Accept(e) => write!(f, "Failed to accept connection: {}", e),
            ConnectorError::Read(e) => write!(f, "Read failed: {}", e),
            ConnectorError::Write(e) => write!(f, "Write failed: {}", e),
            ConnectorError::Timeout(op) => write!(f, "Timed out during {}", op),
        }
    }
}

impl std::error::Error for ConnectorError {}

/// Failures while producing a response payload.
#[derive(Debug)]
pub enum ContentError {
    Unreadable(String, io::Error),
    TooLarge { what: String, size: u64, limit: usize },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::Unreadable(what, e) => write!(f, "Cannot read {}: {}", what, e),
            ContentError::TooLarge { what, size, limit } => write!(
                f,
                "{} is {} bytes, above the {} byte payload limit",
                what, size, limit
            ),
        }
    }
}

impl std::error::Error for ContentError {}

/// Session-scoped failures. Absorbed by the session, never fatal to the server.
#[derive(Debug)]
pub enum SessionError {
    Read(ConnectorError),
    Reply(ConnectorError),
    Content(ContentError),
    DataConnection(ConnectorError),
    Transfer(ConnectorError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Read(e) => write!(f, "Failed to read command: {}", e),
            SessionError::Reply(e) => write!(f, "Failed to send error reply: {}", e),
            SessionError::Content(e) => write!(f, "Failed to produce response: {}", e),
            SessionError::DataConnection(e) => write!(f, "Data connection failed: {}", e),
            SessionError::Transfer(e) => write!(f, "Transfer failed: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ContentError> for SessionError {
    fn from(error: ContentError) -> Self {
        SessionError::Content(error)
    }
}

/// Client-side failures of the `ftclient` companion.
#[derive(Debug)]
pub enum ClientError {
    InvalidPort(String),
    NoRequest,
    LocalFileExists(String),
    DataListener(SetupError),
    Control(ConnectorError),
    Data(ConnectorError),
    NoDataConnection,
    SaveFailed(String, io::Error),
    Output(io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::InvalidPort(port) => {
                write!(f, "Invalid port {}: must be between 1024 and 65535", port)
            }
            ClientError::NoRequest => {
                write!(f, "Expected -l <data_port> or -g <filename> <data_port>")
            }
            ClientError::LocalFileExists(name) => {
                write!(f, "{} already exists in directory, not requesting it", name)
            }
            ClientError::DataListener(e) => write!(f, "Cannot listen for data: {}", e),
            ClientError::Control(e) => write!(f, "Control connection error: {}", e),
            ClientError::Data(e) => write!(f, "Data connection error: {}", e),
            ClientError::NoDataConnection => {
                write!(f, "Server closed the control connection without sending data")
            }
            ClientError::SaveFailed(name, e) => write!(f, "Failed to save {}: {}", name, e),
            ClientError::Output(e) => write!(f, "Failed to write to stdout: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

/// Errors that end the server process
#[derive(Debug)]
pub enum FtServerError {
    Setup(SetupError),
}

impl fmt::Display for FtServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtServerError::Setup(e) => write!(f, "Setup error: {}", e),
        }
    }
}

impl std::error::Error for FtServerError {}

impl From<SetupError> for FtServerError {
    fn from(error: SetupError) -> Self {
        FtServerError::Setup(error)
    }
}

impl From<config::ConfigError> for FtServerError {
    fn from(error: config::ConfigError) -> Self {
        FtServerError::Setup(SetupError::from(error))
    }
}
