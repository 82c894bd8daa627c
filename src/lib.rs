//! ftserver
//!
//! A two-socket file transfer server: one command arrives on the control
//! connection, and the directory listing or file is sent back over a second
//! connection opened to the client's data port.

pub mod client;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod storage;
pub mod transfer;
pub mod utils;

pub use server::{Server, ServerConfig};
