//! Deferred Badge Notifications
//!
//! Unread-badge counts live in an external service. After a mutation that
//! changes what a recipient has unread, the caller enqueues a [`BadgeEvent`];
//! a background task delivers it to a [`BadgeNotifier`] implementation.
//!
//! ## Delivery Model
//!
//! - Enqueue is non-blocking (`try_send`) and happens only after the primary
//!   operation succeeded
//! - A full or closed queue drops the event with a warning
//! - Notifier failures are logged and never reach the primary caller
//! - The task exits once every [`BadgeDispatcher`] handle is dropped, after
//!   draining what is already queued

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default capacity of the notification queue
pub const DEFAULT_BADGE_QUEUE_CAPACITY: usize = 256;

/// A change the badge service should account for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BadgeEvent {
    /// Recompute the unread count of `recipient` in `collection`
    Recount {
        collection: String,
        recipient: String,
    },
    /// Every record of `recipient` in `collection` was deleted
    ClearAll {
        collection: String,
        recipient: String,
    },
}

impl BadgeEvent {
    pub fn recount(collection: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self::Recount {
            collection: collection.into(),
            recipient: recipient.into(),
        }
    }

    pub fn clear_all(collection: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self::ClearAll {
            collection: collection.into(),
            recipient: recipient.into(),
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Self::Recount { collection, .. } | Self::ClearAll { collection, .. } => collection,
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Self::Recount { recipient, .. } | Self::ClearAll { recipient, .. } => recipient,
        }
    }
}

/// Outbound interface to the unread-badge service
///
/// Implemented outside this crate for the real service; the core only
/// calls it.
#[async_trait]
pub trait BadgeNotifier: Send + Sync {
    async fn notify(&self, event: &BadgeEvent) -> anyhow::Result<()>;
}

/// Notifier that only logs; used when no badge service is wired in
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingBadgeNotifier;

#[async_trait]
impl BadgeNotifier for TracingBadgeNotifier {
    async fn notify(&self, event: &BadgeEvent) -> anyhow::Result<()> {
        tracing::info!(
            collection = event.collection(),
            recipient = event.recipient(),
            "Badge event: {:?}",
            event
        );
        Ok(())
    }
}

/// Cloneable handle for enqueueing badge events
#[derive(Clone, Debug)]
pub struct BadgeDispatcher {
    tx: mpsc::Sender<BadgeEvent>,
}

impl BadgeDispatcher {
    /// Spawn the delivery task and return a handle to it
    ///
    /// Must be called inside a Tokio runtime. The returned `JoinHandle`
    /// completes once every dispatcher clone is dropped and the queue drained.
    pub fn spawn(notifier: Arc<dyn BadgeNotifier>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<BadgeEvent>(capacity.max(1));

        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = notifier.notify(&event).await {
                    tracing::warn!(
                        "Badge notification for '{}' in '{}' failed: {}",
                        event.recipient(),
                        event.collection(),
                        e
                    );
                }
            }
            tracing::debug!("BadgeDispatcher queue closed, delivery task exiting");
        });

        (Self { tx }, task)
    }

    /// Queue an event without waiting
    ///
    /// Returns whether the event was accepted. Rejection is logged and never
    /// propagated as an error.
    pub fn enqueue(&self, event: BadgeEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => {
                tracing::debug!("Badge event queued");
                true
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    "Badge queue full, dropping event for '{}' in '{}'",
                    event.recipient(),
                    event.collection()
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("BadgeDispatcher has shut down, event ignored");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<BadgeEvent>>,
    }

    #[async_trait]
    impl BadgeNotifier for RecordingNotifier {
        async fn notify(&self, event: &BadgeEvent) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl BadgeNotifier for FailingNotifier {
        async fn notify(&self, _event: &BadgeEvent) -> anyhow::Result<()> {
            anyhow::bail!("badge service unavailable")
        }
    }

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (dispatcher, task) = BadgeDispatcher::spawn(notifier.clone(), 8);

        assert!(dispatcher.enqueue(BadgeEvent::recount("chat", "alice")));
        assert!(dispatcher.enqueue(BadgeEvent::clear_all("chat", "bob")));

        drop(dispatcher);
        task.await.unwrap();

        let events = notifier.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                BadgeEvent::recount("chat", "alice"),
                BadgeEvent::clear_all("chat", "bob"),
            ]
        );
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_stop_delivery() {
        let (dispatcher, task) = BadgeDispatcher::spawn(Arc::new(FailingNotifier), 4);

        assert!(dispatcher.enqueue(BadgeEvent::recount("alerts", "carol")));
        assert!(dispatcher.enqueue(BadgeEvent::recount("alerts", "dave")));

        drop(dispatcher);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_enqueue_after_shutdown_is_rejected() {
        let (dispatcher, task) = BadgeDispatcher::spawn(Arc::new(TracingBadgeNotifier), 4);
        task.abort();
        let _ = task.await;

        assert!(!dispatcher.enqueue(BadgeEvent::recount("alerts", "erin")));
    }

    #[test]
    fn test_event_serialization() {
        let value = serde_json::to_value(BadgeEvent::clear_all("chat", "alice")).unwrap();
        assert_eq!(value["type"], "clear_all");
        assert_eq!(value["collection"], "chat");
        assert_eq!(value["recipient"], "alice");
    }
}
