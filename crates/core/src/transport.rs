//! Boundary traits toward the communication framework.
//!
//! Everything the relay needs from the outside world comes through the three
//! traits here: the text channel itself ([`TextTransport`]), the connection
//! that owns it ([`Connection`]), and the shared presence directory
//! ([`PresenceDirectory`]). The surrounding activity resolves and connects
//! these before handing them to the channel wrapper.
//!
//! All transport operations run on one cooperative event loop; the traits
//! are `?Send` and implementations are free to use single-threaded interior
//! mutability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identity::ColorPair;

/// Opaque integer identifying a sender, valid only within one channel's
/// scope. Zero is never a valid handle.
pub type ParticipantHandle = u32;

/// Signals a text channel can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// The channel was closed by the peer or the framework.
    Closed,
    /// A text message arrived.
    Received,
}

/// An active signal subscription, held until channel teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Transport-assigned subscription id.
    pub id: u64,
    /// Which signal this subscription listens to.
    pub signal: SignalKind,
}

/// A message queued by the transport before a receiver attached, or a live
/// message as reported by the `Received` signal. Transient: exists only
/// while being delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingMessage {
    /// Transport-assigned message id, used for acknowledgment.
    pub id: u32,
    /// When the transport received the message.
    pub received_at: DateTime<Utc>,
    /// Channel-scoped handle of the sender.
    pub sender: ParticipantHandle,
    /// Wire message type; see [`crate::constants::message_types`].
    pub message_type: u32,
    /// Wire flags. Carried through unchanged; the relay does not interpret
    /// them.
    pub flags: u32,
    /// Encoded message text as it appeared on the wire.
    pub text: String,
}

/// The text channel the relay wraps.
#[async_trait(?Send)]
pub trait TextTransport {
    /// Transmit text with the given wire message type.
    async fn send(&self, message_type: u32, text: &str) -> Result<()>;

    /// Ask the framework to close the channel. Returns
    /// [`Error::TransportGone`](crate::Error::TransportGone) if the channel
    /// already vanished.
    async fn close(&self) -> Result<()>;

    /// Fetch the queued backlog in arrival order, oldest first, without
    /// acknowledging it.
    async fn list_pending(&self) -> Result<Vec<PendingMessage>>;

    /// Acknowledge the given message ids so the transport stops holding
    /// them.
    async fn acknowledge(&self, ids: &[u32]) -> Result<()>;

    /// Register interest in a signal. The event loop routes matching events
    /// to the wrapper until the subscription is detached.
    fn subscribe(&self, signal: SignalKind) -> Subscription;

    /// Drop a signal subscription.
    fn detach(&self, subscription: &Subscription);
}

/// The connection a channel lives on.
///
/// The group methods carry defaults and are only meaningful for shared
/// (group) channels; direct links never call them.
#[async_trait(?Send)]
pub trait Connection {
    /// Service name of the connection, part of the presence directory key.
    fn service_name(&self) -> &str;

    /// Object path of the connection, part of the presence directory key.
    fn object_path(&self) -> &str;

    /// The local user's global handle on this connection.
    fn self_handle(&self) -> ParticipantHandle;

    /// Request a display alias for a handle. Used on direct links, where
    /// the remote peer is not necessarily known to the presence service.
    async fn request_alias(&self, handle: ParticipantHandle) -> Result<String>;

    /// The local user's channel-scoped handle in the channel's group.
    fn self_group_handle(&self) -> ParticipantHandle {
        0
    }

    /// Capability flags of the channel's group; see
    /// [`crate::constants::group_flags`].
    async fn group_flags(&self) -> Result<u32> {
        Ok(0)
    }

    /// Map a channel-specific handle to its owning global handle. An owner
    /// of zero means the group could not resolve the handle.
    async fn handle_owner(&self, handle: ParticipantHandle) -> Result<ParticipantHandle> {
        let _ = handle;
        Ok(0)
    }
}

/// A known buddy as recorded by the presence directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceEntry {
    /// Display name.
    pub nick: String,
    /// The buddy's stroke/fill colors.
    pub colors: ColorPair,
}

/// Read-only directory of known buddies, shared process-wide and injected
/// into the relay. The relay never mutates it.
pub trait PresenceDirectory {
    /// Look up a buddy by connection identity and global handle.
    fn lookup_buddy(
        &self,
        service_name: &str,
        object_path: &str,
        handle: ParticipantHandle,
    ) -> Option<PresenceEntry>;
}
