//! Port validation
//!
//! Ports below 1024 are reserved; both the control port and client data ports
//! must fall inside `PORT_RANGE`.

use std::ops::RangeInclusive;

use crate::error::SetupError;

pub const PORT_RANGE: RangeInclusive<u16> = 1024..=65535;

/// Parses a port given as text, `None` if it is not a number in `PORT_RANGE`.
pub fn parse_port(text: &str) -> Option<u16> {
    text.trim()
        .parse::<u16>()
        .ok()
        .filter(|port| PORT_RANGE.contains(port))
}

pub fn validate_control_port(text: &str) -> Result<u16, SetupError> {
    parse_port(text).ok_or_else(|| SetupError::InvalidPort(text.to_string()))
}
