//! Transfer module
//!
//! Socket plumbing for the control and data connections.

pub mod connector;

pub use connector::{
    PeerIdentity, ReadLimits, ReadOutcome, accept, close, connect_to, listen, read_message,
    write_all,
};
