//! Error types for the channel relay.

use thiserror::Error;

use crate::transport::ParticipantHandle;

/// Main error type for the relay.
#[derive(Error, Debug)]
pub enum Error {
    /// The transport vanished before or during a close attempt. Recovered
    /// locally: the channel treats this as already closed.
    #[error("transport already gone")]
    TransportGone,

    /// A transport-level operation failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A channel-specific handle could not be mapped to an owning global
    /// handle (the group reported owner 0).
    #[error("no owner for channel handle {0}")]
    UnresolvedHandle(ParticipantHandle),

    /// The connection could not produce a display alias for a handle.
    #[error("alias lookup failed for handle {0}: {1}")]
    Alias(ParticipantHandle, String),

    /// A batched acknowledgment was rejected; the messages remain pending.
    #[error("acknowledgment failed: {0}")]
    Acknowledge(String),
}

/// Result type alias using our [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
