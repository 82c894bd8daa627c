//! Console output of received listings

use std::io::Write;

use crate::error::ClientError;

/// Prints a received listing under its header. The listing bytes are written
/// unchanged, so names that are not UTF-8 survive.
pub fn write_listing<W: Write>(
    out: &mut W,
    origin: &str,
    listing: &[u8],
) -> Result<(), ClientError> {
    writeln!(out, "Receiving directory structure from {}", origin)
        .map_err(ClientError::Output)?;
    out.write_all(listing).map_err(ClientError::Output)?;
    out.flush().map_err(ClientError::Output)
}
