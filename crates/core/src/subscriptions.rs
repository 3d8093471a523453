//! Tracking of active signal subscriptions for guaranteed teardown.

use tracing::debug;

use crate::transport::{Subscription, TextTransport};

/// Append-only set of signal subscriptions, detached together exactly once
/// when the channel tears down.
#[derive(Debug, Default)]
pub struct SignalSubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SignalSubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a subscription until teardown.
    pub fn track(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Whether any subscription to `signal` is being tracked.
    pub fn has(&self, signal: crate::transport::SignalKind) -> bool {
        self.subscriptions.iter().any(|s| s.signal == signal)
    }

    /// Detach every tracked subscription from the transport.
    ///
    /// The set is emptied before the first detach call, so a second
    /// invocation detaches nothing. This guards the teardown path against
    /// double-detach faults when close is requested more than once.
    pub fn detach_all(&mut self, transport: &dyn TextTransport) {
        let subscriptions = std::mem::take(&mut self.subscriptions);
        if subscriptions.is_empty() {
            return;
        }
        debug!("🧹 Detaching {} signal subscription(s)", subscriptions.len());
        for subscription in &subscriptions {
            transport.detach(subscription);
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTransport;
    use crate::transport::SignalKind;
    use std::sync::Arc;

    #[test]
    fn test_detach_all_empties_set_first() {
        let transport = Arc::new(MockTransport::new());
        let mut set = SignalSubscriptionSet::new();
        set.track(transport.subscribe(SignalKind::Closed));
        set.track(transport.subscribe(SignalKind::Received));
        assert_eq!(set.len(), 2);

        set.detach_all(transport.as_ref());
        assert!(set.is_empty());
        assert_eq!(transport.detached.borrow().len(), 2);
    }

    #[test]
    fn test_second_detach_all_detaches_nothing() {
        let transport = Arc::new(MockTransport::new());
        let mut set = SignalSubscriptionSet::new();
        set.track(transport.subscribe(SignalKind::Closed));

        set.detach_all(transport.as_ref());
        set.detach_all(transport.as_ref());
        assert_eq!(transport.detached.borrow().len(), 1);
    }

    #[test]
    fn test_has_reports_tracked_signals() {
        let transport = Arc::new(MockTransport::new());
        let mut set = SignalSubscriptionSet::new();
        assert!(!set.has(SignalKind::Received));
        set.track(transport.subscribe(SignalKind::Received));
        assert!(set.has(SignalKind::Received));
        assert!(!set.has(SignalKind::Closed));
    }
}
