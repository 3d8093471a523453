//! Backlog drain and the per-message delivery pipeline.
//!
//! Messages queued by the transport before a receiver attached are fetched
//! oldest-first, pushed through the same filter/decode/resolve path a live
//! message takes, and then acknowledged in one batch. Per-message failures
//! are isolated: one unresolvable sender never aborts the rest of the
//! drain.

use tracing::{debug, warn};

use crate::channel::ChannelTopology;
use crate::codec::MessageCodec;
use crate::constants::message_types;
use crate::error::Result;
use crate::identity::{BuddyIdentity, IdentityResolver};
use crate::transport::{PendingMessage, TextTransport};

/// Outcome of pushing one message through the delivery pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// The message reached the received-callback; safe to acknowledge.
    Delivered,
    /// Non-normal wire type: consumed without forwarding, still safe to
    /// acknowledge. Known limitation carried over from the original design.
    Filtered,
    /// Nobody is listening; the message was dropped and stays pending.
    NoListener,
    /// The sender could not be resolved; the message stays pending.
    Skipped,
}

/// Run one message through filter, decode and sender resolution, handing the
/// result to `deliver`. The closure reports whether a received-callback was
/// actually registered.
pub(crate) async fn deliver_one<F>(
    resolver: &IdentityResolver,
    topology: ChannelTopology,
    message: &PendingMessage,
    deliver: &mut F,
) -> Delivery
where
    F: FnMut(BuddyIdentity, String) -> bool,
{
    if message.message_type != message_types::NORMAL {
        debug!(
            "🙈 Dropping message {} with non-normal type {}",
            message.id, message.message_type
        );
        return Delivery::Filtered;
    }

    let text = MessageCodec::decode(&message.text);

    let identity = match resolver.resolve(message.sender, topology).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(
                "⚠️ Cannot resolve sender of message {}: {}; skipping it",
                message.id, e
            );
            return Delivery::Skipped;
        }
    };

    if deliver(identity, text) {
        Delivery::Delivered
    } else {
        debug!(
            "🗑️ Throwing message {} on the floor; no received-callback registered",
            message.id
        );
        Delivery::NoListener
    }
}

/// Summary of one drain pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrainReport {
    /// Messages handed to the received-callback.
    pub delivered: usize,
    /// Non-normal messages consumed without forwarding.
    pub filtered: usize,
    /// Messages skipped because their sender could not be resolved.
    pub skipped: usize,
    /// Messages dropped because no callback was registered.
    pub dropped: usize,
    /// Whether the batched acknowledgment went through. Unacknowledged
    /// messages stay pending and are re-delivered on the next pass.
    pub acknowledged: bool,
}

/// Fetches and acknowledges the transport's backlog at attach time.
pub struct PendingMessageDrain<'a> {
    transport: &'a dyn TextTransport,
    resolver: &'a IdentityResolver,
    topology: ChannelTopology,
}

impl<'a> PendingMessageDrain<'a> {
    pub fn new(
        transport: &'a dyn TextTransport,
        resolver: &'a IdentityResolver,
        topology: ChannelTopology,
    ) -> Self {
        Self {
            transport,
            resolver,
            topology,
        }
    }

    /// Deliver the full backlog in arrival order, then acknowledge every
    /// consumed message in one batch.
    ///
    /// At-least-once semantics: if the acknowledgment fails the messages
    /// remain pending and the next pass delivers them again, so callers
    /// must tolerate duplicates (or de-duplicate by message id).
    pub async fn drain<F>(&self, mut deliver: F) -> Result<DrainReport>
    where
        F: FnMut(BuddyIdentity, String) -> bool,
    {
        let backlog = self.transport.list_pending().await?;
        let mut report = DrainReport::default();
        if backlog.is_empty() {
            report.acknowledged = true;
            return Ok(report);
        }

        debug!("📥 Draining {} pending message(s)", backlog.len());
        let mut ack_ids = Vec::with_capacity(backlog.len());
        for message in &backlog {
            match deliver_one(self.resolver, self.topology, message, &mut deliver).await {
                Delivery::Delivered => {
                    report.delivered += 1;
                    ack_ids.push(message.id);
                }
                Delivery::Filtered => {
                    report.filtered += 1;
                    ack_ids.push(message.id);
                }
                Delivery::NoListener => report.dropped += 1,
                Delivery::Skipped => report.skipped += 1,
            }
        }

        if ack_ids.is_empty() {
            return Ok(report);
        }
        match self.transport.acknowledge(&ack_ids).await {
            Ok(()) => {
                debug!("✅ Acknowledged {} message(s)", ack_ids.len());
                report.acknowledged = true;
            }
            Err(e) => {
                warn!(
                    "⚠️ Acknowledgment of {} message(s) failed, they stay pending: {}",
                    ack_ids.len(),
                    e
                );
            }
        }
        Ok(report)
    }
}
