//! Server core functionality
//!
//! The accept loop, its configuration and the shutdown signal.

pub mod config;
pub mod core;
pub mod shutdown;

pub use config::ServerConfig;
pub use core::Server;
pub use shutdown::{Shutdown, ShutdownTrigger};
