//! Wire constants shared by the SpeakChat text channel relay.

/// Text message types as they appear on the wire.
///
/// Only [`NORMAL`](message_types::NORMAL) messages are forwarded to the
/// application; every other type is acknowledged and dropped.
pub mod message_types {
    /// Plain chat text.
    pub const NORMAL: u32 = 0;

    /// `/me`-style action text. Present on the wire but never forwarded.
    pub const ACTION: u32 = 1;

    /// Server/system notice. Never forwarded.
    pub const NOTICE: u32 = 2;
}

/// Group capability flags reported by a shared channel.
pub mod group_flags {
    /// Participant handles on this channel are channel-specific and must be
    /// mapped to their owning global handles before presence lookup.
    pub const CHANNEL_SPECIFIC_HANDLES: u32 = 512;
}

/// The character that the activity's renderer treats as a path separator and
/// therefore must never appear literally in transmitted text.
pub const TEXT_DELIMITER: char = '/';

/// Sentinel substituted for [`TEXT_DELIMITER`] before transmission.
///
/// Chosen to be human-readable and unlikely in chat text; this is a
/// best-effort substitution, not a collision-proof escape scheme.
pub const SLASH_SENTINEL: &str = "-x-SLASH-x-";

/// Default stroke color for buddies without a presence entry.
pub const DEFAULT_STROKE_COLOR: &str = "#000000";

/// Default fill color for buddies without a presence entry.
pub const DEFAULT_FILL_COLOR: &str = "#808080";
