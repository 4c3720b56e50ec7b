// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Cross-workflow invalidation
//!
//! Workflows never share mutable state. When one of them changes something the
//! backend shows elsewhere (a new model, a different serving version, a resolved
//! review item) it publishes a [`WorkflowEvent`]. Views that depend on that
//! state hold an [`Invalidation`] and learn they are stale on their next check,
//! then re-fetch on their own schedule.

use std::sync::atomic::{AtomicBool, Ordering};

use api_client::ReviewId;
use shared_types::ReviewLabel;
use tokio::sync::{
    Mutex,
    broadcast::{self, Receiver, Sender, error::TryRecvError},
};
use tracing::debug;

/// Default number of undelivered events retained per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// State change published by a workflow after the backend acknowledged it
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    /// A model artifact was uploaded under `version`
    ModelUploaded { version: String },
    /// `version` became the serving model
    ModelActivated { version: String },
    /// A review item received its terminal label
    ReviewResolved { id: ReviewId, label: ReviewLabel },
}

impl WorkflowEvent {
    /// Check if the event changes the model list
    pub fn affects_models(&self) -> bool {
        matches!(
            self,
            WorkflowEvent::ModelUploaded { .. } | WorkflowEvent::ModelActivated { .. }
        )
    }
}

/// Broadcast channel shared by all workflows of a session
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Sender<WorkflowEvent>,
}

impl EventBus {
    /// Create a bus retaining up to `capacity` undelivered events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event, returning how many subscribers will see it
    pub fn publish(&self, event: WorkflowEvent) -> usize {
        debug!(?event, "publishing workflow event");
        // no subscribers is not an error
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    /// Create an invalidation tracker for events matching `interest`
    pub fn invalidation(&self, interest: fn(&WorkflowEvent) -> bool) -> Invalidation {
        Invalidation {
            receiver: Mutex::new(self.subscribe()),
            interest,
            stale: AtomicBool::new(false),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Staleness flag fed by an [`EventBus`] subscription
#[derive(Debug)]
pub struct Invalidation {
    receiver: Mutex<Receiver<WorkflowEvent>>,
    interest: fn(&WorkflowEvent) -> bool,
    stale: AtomicBool,
}

impl Invalidation {
    /// Drain pending events and report whether the owner is stale
    ///
    /// Missed events (subscriber lagged) count as a relevant change.
    pub async fn is_stale(&self) -> bool {
        let mut receiver = self.receiver.lock().await;
        loop {
            match receiver.try_recv() {
                Ok(event) => {
                    if (self.interest)(&event) {
                        self.stale.store(true, Ordering::Release);
                    }
                }
                Err(TryRecvError::Lagged(_)) => self.stale.store(true, Ordering::Release),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        self.stale.load(Ordering::Acquire)
    }

    /// Mark the owner fresh as a re-fetch starts
    ///
    /// Events already published are covered by that re-fetch and are dropped.
    pub async fn mark_fresh(&self) {
        let mut receiver = self.receiver.lock().await;
        while let Ok(_) | Err(TryRecvError::Lagged(_)) = receiver.try_recv() {}
        self.stale.store(false, Ordering::Release);
    }

    /// Mark the owner stale, e.g. after a failed re-fetch
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalidation_tracks_relevant_events() {
        let bus = EventBus::default();
        let models = bus.invalidation(WorkflowEvent::affects_models);
        assert!(!models.is_stale().await);

        bus.publish(WorkflowEvent::ReviewResolved {
            id: ReviewId::from("a1"),
            label: ReviewLabel::Ham,
        });
        assert!(!models.is_stale().await);

        bus.publish(WorkflowEvent::ModelActivated {
            version: "v3".to_string(),
        });
        assert!(models.is_stale().await);
        // stays stale until cleared
        assert!(models.is_stale().await);

        models.mark_fresh().await;
        assert!(!models.is_stale().await);

        models.mark_stale();
        assert!(models.is_stale().await);
    }

    #[tokio::test]
    async fn lagged_subscriber_is_stale() {
        let bus = EventBus::new(1);
        let all = bus.invalidation(|_| false);
        for n in 0..3 {
            bus.publish(WorkflowEvent::ModelUploaded {
                version: format!("v{n}"),
            });
        }
        assert!(all.is_stale().await);
    }

    #[tokio::test]
    async fn mark_fresh_drops_pending_events() {
        let bus = EventBus::default();
        let models = bus.invalidation(WorkflowEvent::affects_models);
        bus.publish(WorkflowEvent::ModelUploaded {
            version: "v1".to_string(),
        });

        models.mark_fresh().await;
        assert!(!models.is_stale().await);
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::default();
        let delivered = bus.publish(WorkflowEvent::ModelUploaded {
            version: "v1".to_string(),
        });
        assert_eq!(delivered, 0);
    }
}
