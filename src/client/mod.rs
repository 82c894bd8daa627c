//! ftclient
//!
//! Companion client: sends one command, then receives the listing or file on
//! its own data port.

pub mod args;
pub mod output;
pub mod receiver;
pub mod request;

pub use args::ClientArgs;
pub use output::write_listing;
pub use receiver::fetch;
pub use request::{Delivery, Reply, Request, interpret};
