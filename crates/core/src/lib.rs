//! SpeakChat Core Library
//!
//! Messaging channel relay for the SpeakChat activity: owns a text
//! channel's lifecycle, translates wire-level participant handles into
//! stable buddy identities, keeps message text delimiter-safe on the wire,
//! and drains backlogged messages when a receiver attaches.
//!
//! The relay is single-threaded and event-driven. Boundary calls toward the
//! communication framework are async suspension points on one cooperative
//! event loop; none of the traits or callbacks here require `Send`. The
//! surrounding activity (UI, speech synthesis) talks to exactly one type,
//! [`ChannelWrapper`], through `attach`/`post`/callback registration/`close`.

pub mod channel;
pub mod codec;
pub mod constants;
pub mod error;
pub mod identity;
pub mod pending;
pub mod subscriptions;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export important types for easier access
pub use channel::{ChannelState, ChannelTopology, ChannelWrapper, ClosedCallback, ReceivedCallback};
pub use codec::MessageCodec;
pub use error::{Error, Result};
pub use identity::{BuddyIdentity, ColorPair, IdentityResolver};
pub use pending::{DrainReport, PendingMessageDrain};
pub use subscriptions::SignalSubscriptionSet;
pub use transport::{
    Connection, ParticipantHandle, PendingMessage, PresenceDirectory, PresenceEntry, SignalKind,
    Subscription, TextTransport,
};
