//! The channel wrapper: the one component the surrounding activity talks to.
//!
//! Owns a text channel's lifecycle (`Attaching → Open → Closed`, never
//! reversed), forwards decoded chat text with resolved sender identities to
//! a single received-callback, and tears the channel down exactly once no
//! matter how often or from which side closing is initiated.
//!
//! The wrapper itself holds no event loop: the surrounding loop routes the
//! transport's `Received` and `Closed` signals to [`ChannelWrapper::handle_received`]
//! and [`ChannelWrapper::handle_closed`] for every subscription the wrapper
//! registered.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codec::MessageCodec;
use crate::constants::message_types;
use crate::identity::{BuddyIdentity, IdentityResolver};
use crate::pending::{deliver_one, Delivery, PendingMessageDrain};
use crate::subscriptions::SignalSubscriptionSet;
use crate::transport::{Connection, PendingMessage, PresenceDirectory, SignalKind, TextTransport};

/// How the channel connects its participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelTopology {
    /// Multi-party shared channel, possibly with per-channel handle
    /// remapping.
    Group,
    /// One-to-one link without group semantics.
    Direct,
}

/// Lifecycle state of the wrapped channel. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Created, not yet bound to a transport.
    Attaching,
    /// Live: sending, receiving and draining are allowed.
    Open,
    /// Terminal. No send, resolve or drain proceeds past this point; such
    /// calls become no-ops.
    Closed,
}

/// Single-slot callback receiving `(identity, decoded text)`.
pub type ReceivedCallback = Box<dyn FnMut(BuddyIdentity, String)>;

/// Callback invoked exactly once when teardown completes.
pub type ClosedCallback = Box<dyn FnOnce()>;

/// Wraps one text channel of the presence framework.
pub struct ChannelWrapper {
    directory: Arc<dyn PresenceDirectory>,
    transport: Option<Arc<dyn TextTransport>>,
    resolver: Option<IdentityResolver>,
    topology: Option<ChannelTopology>,
    state: ChannelState,
    subscriptions: SignalSubscriptionSet,
    received_cb: Option<ReceivedCallback>,
    closed_cb: Option<ClosedCallback>,
}

impl ChannelWrapper {
    /// Create a wrapper in `Attaching` state. The presence directory is the
    /// process-wide read-only singleton, injected rather than ambient.
    pub fn new(directory: Arc<dyn PresenceDirectory>) -> Self {
        Self {
            directory,
            transport: None,
            resolver: None,
            topology: None,
            state: ChannelState::Attaching,
            subscriptions: SignalSubscriptionSet::new(),
            received_cb: None,
            closed_cb: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// Bind the wrapper to a transport and go `Open`.
    ///
    /// Subscribes to the channel's `Closed` lifecycle signal immediately;
    /// if a received-callback was registered before attach, the `Received`
    /// subscription is added now as well. Attaching twice is a logged
    /// no-op.
    pub fn attach(
        &mut self,
        transport: Arc<dyn TextTransport>,
        connection: Arc<dyn Connection>,
        topology: ChannelTopology,
    ) {
        if self.state != ChannelState::Attaching {
            warn!("⚠️ attach() on a channel in state {:?}; ignoring", self.state);
            return;
        }
        self.subscriptions.track(transport.subscribe(SignalKind::Closed));
        self.resolver = Some(IdentityResolver::new(self.directory.clone(), connection));
        self.topology = Some(topology);
        self.transport = Some(transport);
        self.state = ChannelState::Open;
        if self.received_cb.is_some() {
            self.subscribe_received();
        }
        info!("🔌 Text channel attached ({:?} topology)", topology);
    }

    /// Register the received-callback.
    ///
    /// Single slot with last-registration-wins semantics: a new
    /// registration replaces any previous one, this is not a listener
    /// list. The first registration while a transport is present lazily
    /// subscribes to the `Received` signal.
    pub fn set_received_callback<F>(&mut self, callback: F)
    where
        F: FnMut(BuddyIdentity, String) + 'static,
    {
        self.received_cb = Some(Box::new(callback));
        if self.transport.is_some() {
            self.subscribe_received();
        }
    }

    /// Register the closed-callback, invoked exactly once when teardown
    /// completes. A new registration replaces any previous one.
    pub fn set_closed_callback<F>(&mut self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.closed_cb = Some(Box::new(callback));
    }

    fn subscribe_received(&mut self) {
        if self.subscriptions.has(SignalKind::Received) {
            return;
        }
        if let Some(transport) = &self.transport {
            let subscription = transport.subscribe(SignalKind::Received);
            self.subscriptions.track(subscription);
        }
    }

    /// Post chat text to the channel. Alias of [`send`](Self::send), kept
    /// for the activity's posting path.
    pub async fn post(&self, text: &str) {
        self.send(text).await;
    }

    /// Encode and transmit text as a normal chat message.
    ///
    /// No-op unless the channel is `Open`. Transmission failures are
    /// logged; nothing is surfaced to the caller.
    pub async fn send(&self, text: &str) {
        if self.state != ChannelState::Open {
            debug!("📪 Dropping outbound text; channel is {:?}", self.state);
            return;
        }
        let Some(transport) = self.transport.clone() else {
            return;
        };
        let encoded = MessageCodec::encode(text);
        debug!("📤 Sending {} byte(s) of chat text", encoded.len());
        if let Err(e) = transport.send(message_types::NORMAL, &encoded).await {
            warn!("⚠️ Failed to send chat text: {}", e);
        }
    }

    /// Deliver and acknowledge the backlog the transport queued before we
    /// attached. Called once, right after [`attach`](Self::attach), before
    /// any live event is forwarded.
    ///
    /// Messages left unacknowledged (transport refused the batch ack) are
    /// re-delivered on a later pass; the callback layer must tolerate the
    /// duplicates or de-duplicate by message id.
    pub async fn drain_pending(&mut self) {
        if self.state != ChannelState::Open {
            return;
        }
        let Some(transport) = self.transport.clone() else {
            return;
        };
        let (Some(resolver), Some(topology)) = (self.resolver.as_ref(), self.topology) else {
            return;
        };

        let received_cb = &mut self.received_cb;
        let drain = PendingMessageDrain::new(transport.as_ref(), resolver, topology);
        let result = drain
            .drain(|identity, text| match received_cb.as_mut() {
                Some(callback) => {
                    callback(identity, text);
                    true
                }
                None => false,
            })
            .await;
        match result {
            Ok(report) => {
                if report.delivered > 0 || report.skipped > 0 {
                    debug!(
                        "📥 Drain pass done: {} delivered, {} filtered, {} skipped, {} dropped",
                        report.delivered, report.filtered, report.skipped, report.dropped
                    );
                }
            }
            Err(e) => warn!("⚠️ Could not list pending messages: {}", e),
        }
    }

    /// Entry point for the `Received` signal.
    ///
    /// Filters to normal chat text, decodes it, resolves the sender and
    /// hands `(identity, text)` to the received-callback, then acknowledges
    /// the message. Non-normal types are acknowledged and dropped. If no
    /// callback is registered the message is dropped unacknowledged. Stale
    /// events arriving after teardown are discarded.
    pub async fn handle_received(&mut self, message: PendingMessage) {
        if self.state != ChannelState::Open {
            debug!("📪 Discarding receipt of message {}; channel is {:?}", message.id, self.state);
            return;
        }
        let Some(transport) = self.transport.clone() else {
            return;
        };
        let (Some(resolver), Some(topology)) = (self.resolver.as_ref(), self.topology) else {
            return;
        };

        let received_cb = &mut self.received_cb;
        let outcome = deliver_one(resolver, topology, &message, &mut |identity, text| {
            match received_cb.as_mut() {
                Some(callback) => {
                    callback(identity, text);
                    true
                }
                None => false,
            }
        })
        .await;

        match outcome {
            Delivery::Delivered | Delivery::Filtered => {
                if let Err(e) = transport.acknowledge(&[message.id]).await {
                    warn!("⚠️ Failed to acknowledge message {}: {}", message.id, e);
                }
            }
            Delivery::NoListener | Delivery::Skipped => {}
        }
    }

    /// Close the channel. Idempotent.
    ///
    /// Attempts a transport-level close first; a transport that already
    /// vanished (peer gone, framework error) counts as closed. Local
    /// teardown runs regardless, exactly once.
    pub async fn close(&mut self) {
        if self.state == ChannelState::Closed {
            debug!("close() on an already-closed channel");
            return;
        }
        if let Some(transport) = self.transport.clone() {
            debug!("🔌 Closing text channel");
            if let Err(e) = transport.close().await {
                debug!("Channel disappeared during close: {}", e);
            }
        }
        self.on_closed();
    }

    /// Entry point for the transport's `Closed` lifecycle signal.
    pub fn handle_closed(&mut self) {
        self.on_closed();
    }

    /// Local teardown. Runs exactly once: detaches all tracked
    /// subscriptions, drops the transport reference, goes `Closed` and
    /// fires the closed-callback if one is registered.
    fn on_closed(&mut self) {
        if self.state == ChannelState::Closed {
            return;
        }
        if let Some(transport) = self.transport.take() {
            self.subscriptions.detach_all(transport.as_ref());
        }
        self.state = ChannelState::Closed;
        info!("🔒 Text channel closed");
        if let Some(callback) = self.closed_cb.take() {
            callback();
        }
    }
}
