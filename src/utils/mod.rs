//! Utility functions
//!
//! Command line, logging and port validation helpers shared by both binaries.

pub mod cli;
pub mod logging;
pub mod validation;
