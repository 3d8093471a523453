//! Mock collaborators for exercising the relay without a live presence
//! framework. Test-only.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{Error, Result};
use crate::identity::ColorPair;
use crate::transport::{
    Connection, ParticipantHandle, PendingMessage, PresenceDirectory, PresenceEntry, SignalKind,
    Subscription, TextTransport,
};

/// Install a compact subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .try_init();
}

/// Build a pending/live message with fixed flags and a fresh timestamp.
pub(crate) fn pending_text(
    id: u32,
    sender: ParticipantHandle,
    message_type: u32,
    text: &str,
) -> PendingMessage {
    PendingMessage {
        id,
        received_at: Utc::now(),
        sender,
        message_type,
        flags: 0,
        text: text.to_string(),
    }
}

/// In-memory transport that records every interaction.
pub(crate) struct MockTransport {
    pub sent: RefCell<Vec<(u32, String)>>,
    pub pending: RefCell<Vec<PendingMessage>>,
    pub acks: RefCell<Vec<Vec<u32>>>,
    pub subscribed: RefCell<Vec<SignalKind>>,
    pub detached: RefCell<Vec<u64>>,
    pub closed: Cell<bool>,
    pub fail_close: Cell<bool>,
    pub fail_ack: Cell<bool>,
    next_subscription: Cell<u64>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            pending: RefCell::new(Vec::new()),
            acks: RefCell::new(Vec::new()),
            subscribed: RefCell::new(Vec::new()),
            detached: RefCell::new(Vec::new()),
            closed: Cell::new(false),
            fail_close: Cell::new(false),
            fail_ack: Cell::new(false),
            next_subscription: Cell::new(1),
        }
    }

    /// Queue a backlog message in arrival order.
    pub fn push_pending(&self, id: u32, sender: ParticipantHandle, message_type: u32, text: &str) {
        self.pending
            .borrow_mut()
            .push(pending_text(id, sender, message_type, text));
    }
}

#[async_trait(?Send)]
impl TextTransport for MockTransport {
    async fn send(&self, message_type: u32, text: &str) -> Result<()> {
        if self.closed.get() {
            return Err(Error::TransportGone);
        }
        self.sent.borrow_mut().push((message_type, text.to_string()));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.fail_close.get() {
            return Err(Error::TransportGone);
        }
        self.closed.set(true);
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<PendingMessage>> {
        Ok(self.pending.borrow().clone())
    }

    async fn acknowledge(&self, ids: &[u32]) -> Result<()> {
        if self.fail_ack.get() {
            return Err(Error::Acknowledge("transport refused the batch".to_string()));
        }
        self.acks.borrow_mut().push(ids.to_vec());
        self.pending.borrow_mut().retain(|m| !ids.contains(&m.id));
        Ok(())
    }

    fn subscribe(&self, signal: SignalKind) -> Subscription {
        let id = self.next_subscription.get();
        self.next_subscription.set(id + 1);
        self.subscribed.borrow_mut().push(signal);
        Subscription { id, signal }
    }

    fn detach(&self, subscription: &Subscription) {
        self.detached.borrow_mut().push(subscription.id);
    }
}

/// Connection stub with configurable group semantics and aliases.
pub(crate) struct MockConnection {
    self_handle: ParticipantHandle,
    self_group_handle: ParticipantHandle,
    flags: u32,
    owners: HashMap<ParticipantHandle, ParticipantHandle>,
    aliases: HashMap<ParticipantHandle, String>,
}

impl MockConnection {
    pub fn new(self_handle: ParticipantHandle) -> Self {
        Self {
            self_handle,
            self_group_handle: 0,
            flags: 0,
            owners: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    pub fn with_group(mut self, self_group_handle: ParticipantHandle, flags: u32) -> Self {
        self.self_group_handle = self_group_handle;
        self.flags = flags;
        self
    }

    pub fn with_owner(
        mut self,
        channel_handle: ParticipantHandle,
        owner: ParticipantHandle,
    ) -> Self {
        self.owners.insert(channel_handle, owner);
        self
    }

    pub fn with_buddy_alias(mut self, handle: ParticipantHandle, nick: &str) -> Self {
        self.aliases.insert(handle, nick.to_string());
        self
    }
}

#[async_trait(?Send)]
impl Connection for MockConnection {
    fn service_name(&self) -> &str {
        "mock.connection"
    }

    fn object_path(&self) -> &str {
        "/mock/connection"
    }

    fn self_handle(&self) -> ParticipantHandle {
        self.self_handle
    }

    async fn request_alias(&self, handle: ParticipantHandle) -> Result<String> {
        self.aliases
            .get(&handle)
            .cloned()
            .ok_or_else(|| Error::Alias(handle, "no alias recorded".to_string()))
    }

    fn self_group_handle(&self) -> ParticipantHandle {
        self.self_group_handle
    }

    async fn group_flags(&self) -> Result<u32> {
        Ok(self.flags)
    }

    async fn handle_owner(&self, handle: ParticipantHandle) -> Result<ParticipantHandle> {
        Ok(self.owners.get(&handle).copied().unwrap_or(0))
    }
}

/// Presence directory stub that counts lookups.
pub(crate) struct MockDirectory {
    buddies: HashMap<ParticipantHandle, PresenceEntry>,
    lookups: Rc<Cell<usize>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self {
            buddies: HashMap::new(),
            lookups: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_buddy(
        mut self,
        handle: ParticipantHandle,
        nick: &str,
        stroke: &str,
        fill: &str,
    ) -> Self {
        self.buddies.insert(
            handle,
            PresenceEntry {
                nick: nick.to_string(),
                colors: ColorPair {
                    stroke: stroke.to_string(),
                    fill: fill.to_string(),
                },
            },
        );
        self
    }

    /// Shared counter of `lookup_buddy` calls, usable after the directory
    /// has been handed to a resolver.
    pub fn lookup_count_handle(&self) -> Rc<Cell<usize>> {
        self.lookups.clone()
    }
}

impl PresenceDirectory for MockDirectory {
    fn lookup_buddy(
        &self,
        _service_name: &str,
        _object_path: &str,
        handle: ParticipantHandle,
    ) -> Option<PresenceEntry> {
        self.lookups.set(self.lookups.get() + 1);
        self.buddies.get(&handle).cloned()
    }
}
