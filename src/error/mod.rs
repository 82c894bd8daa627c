//! Error handling
//!
//! Defines error types and handling for the file transfer server.

pub mod handlers;
pub mod types;

pub use types::*;
