//! Session controller
//!
//! Runs the protocol for one accepted control connection.

pub mod handler;
pub mod state;

pub use handler::Session;
pub use state::{SessionOutcome, SessionReport, SessionState};
