//! Content producers
//!
//! Produce response payloads from the served directory.

pub mod operations;
pub mod results;
pub mod validation;

pub use operations::{list_directory, read_file};
pub use results::FileLookup;
pub use validation::resolve_served_file;
