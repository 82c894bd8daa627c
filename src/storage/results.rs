//! Storage result types
//!
//! Defines result structures returned by storage operations.

/// Outcome of looking up a requested file.
///
/// A missing file is an ordinary answer, not an error; the session decides
/// what goes on the wire for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLookup {
    Found(Vec<u8>),
    NotFound,
}
