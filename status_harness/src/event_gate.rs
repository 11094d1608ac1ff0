//! Hold a lifecycle call until the test lets it through.
//!
//! A test marks an event as held, then releases it (optionally after a
//! delay) from another task. A release that comes before the call starts
//! waiting is not lost. A wait that times out lets the call proceed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use commit_status_publisher::LifecycleEvent;
use tokio::sync::Notify;

const DEFAULT_WAIT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct EventGate {
    held: Mutex<HashMap<LifecycleEvent, Arc<Notify>>>,
    wait_timeout: Duration,
}

impl Default for EventGate {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT)
    }
}

impl EventGate {
    pub fn new(wait_timeout: Duration) -> Self {
        Self {
            held: Mutex::new(HashMap::new()),
            wait_timeout,
        }
    }

    fn notify_for(&self, event: LifecycleEvent) -> Option<Arc<Notify>> {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&event)
            .cloned()
    }

    /// Make calls handling `event` wait for a release.
    pub fn hold(&self, event: LifecycleEvent) {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(event)
            .or_insert_with(|| Arc::new(Notify::new()));
    }

    pub fn is_held(&self, event: LifecycleEvent) -> bool {
        self.notify_for(event).is_some()
    }

    /// Called by the publisher before handling `event`.
    ///
    /// Returns `false` only when the event is held and the wait timed out.
    pub async fn pass(&self, event: LifecycleEvent) -> bool {
        let Some(notify) = self.notify_for(event) else {
            return true;
        };
        match tokio::time::timeout(self.wait_timeout, notify.notified()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(%event, "Gate wait timed out, proceeding");
                false
            }
        }
    }

    /// Release one waiting call for `event` after `delay`. No-op for events
    /// that are not held.
    pub async fn release_after(&self, event: LifecycleEvent, delay: Duration) {
        let Some(notify) = self.notify_for(event) else {
            return;
        };
        tokio::time::sleep(delay).await;
        notify.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unheld_event_passes_immediately() {
        let gate = EventGate::new(Duration::from_secs(60));
        assert!(gate.pass(LifecycleEvent::Started).await);
        assert!(!gate.is_held(LifecycleEvent::Started));
    }

    #[tokio::test]
    async fn test_release_before_wait_is_kept() {
        let gate = EventGate::new(Duration::from_secs(60));
        gate.hold(LifecycleEvent::Finished);
        gate.release_after(LifecycleEvent::Finished, Duration::ZERO).await;
        assert!(gate.pass(LifecycleEvent::Finished).await);
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let gate = EventGate::new(Duration::from_millis(50));
        gate.hold(LifecycleEvent::Queued);
        assert!(!gate.pass(LifecycleEvent::Queued).await);
    }
}
