//! Delimiter-safe text encoding for the wire.
//!
//! The surrounding activity treats `/` as a path separator, so chat text is
//! rewritten before transmission: every literal `/` becomes the
//! [`SLASH_SENTINEL`] string, and receipt reverses the substitution. A wire
//! payload that happens to contain the sentinel literally therefore decodes
//! to `/` — acceptable for chat text, by the same reasoning the original
//! activity used.

use crate::constants::{SLASH_SENTINEL, TEXT_DELIMITER};

/// Reversible (for sentinel-free input) delimiter substitution.
pub struct MessageCodec;

impl MessageCodec {
    /// Replace every literal delimiter with the sentinel before transmission.
    pub fn encode(text: &str) -> String {
        text.replace(TEXT_DELIMITER, SLASH_SENTINEL)
    }

    /// Reverse the substitution after receipt.
    pub fn decode(text: &str) -> String {
        text.replace(SLASH_SENTINEL, &TEXT_DELIMITER.to_string())
    }
}
