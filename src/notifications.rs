// Copyright 2025 Cowboy AI, LLC.

//! One-way notification publishing
//!
//! The core hands each successful mutation to a [`NotificationSink`] and never
//! looks at the result: `publish` returns nothing and sinks swallow (and log)
//! their own failures.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::events::{ConstructionEvent, DomainEvent};

/// A published notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Topic the payload was published on
    pub topic: String,
    /// Event and entity snapshot
    pub payload: Value,
}

/// Fire-and-forget publisher
pub trait NotificationSink: Send + Sync {
    /// Publish `payload` on `topic`; must not panic or block on delivery
    fn publish(&self, topic: &str, payload: Value);
}

/// Fan-out to in-process subscribers over a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastSink {
    /// Channel holding up to `capacity` undelivered notifications per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// New subscriber; sees notifications published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NotificationSink for BroadcastSink {
    fn publish(&self, topic: &str, payload: Value) {
        let notification = Notification {
            topic: topic.to_string(),
            payload,
        };
        if self.sender.send(notification).is_err() {
            debug!(topic, "no subscribers for notification");
        }
    }
}

/// Writes notifications to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn publish(&self, topic: &str, payload: Value) {
        info!(topic, %payload, "notification");
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish(&self, _topic: &str, _payload: Value) {}
}

/// Keeps every notification in memory for verification in tests
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    published: Arc<RwLock<Vec<Notification>>>,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far
    pub fn published(&self) -> Vec<Notification> {
        match self.published.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Notifications on one topic
    pub fn on_topic(&self, topic: &str) -> Vec<Notification> {
        self.published()
            .into_iter()
            .filter(|n| n.topic == topic)
            .collect()
    }

    /// Event type names in publish order
    pub fn event_types(&self) -> Vec<String> {
        self.published()
            .iter()
            .filter_map(|n| n.payload["event"]["type"].as_str().map(str::to_string))
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&self, topic: &str, payload: Value) {
        let notification = Notification {
            topic: topic.to_string(),
            payload,
        };
        match self.published.write() {
            Ok(mut guard) => guard.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

/// Builds payloads from events and entity snapshots and hands them to a sink
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

impl Notifier {
    /// Wrap a sink
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// A notifier that drops everything
    pub fn null() -> Self {
        Self::new(Arc::new(NullSink))
    }

    /// Publish `event` with the entity snapshot on the event's topic.
    pub fn emit<T: Serialize>(&self, event: &ConstructionEvent, snapshot: &T) {
        let payload = match (serde_json::to_value(event), serde_json::to_value(snapshot)) {
            (Ok(event), Ok(data)) => json!({ "event": event, "data": data }),
            (Err(e), _) | (_, Err(e)) => {
                warn!(
                    event_type = event.event_type(),
                    error = %e,
                    "dropping notification that failed to serialize"
                );
                return;
            }
        };
        self.sink.publish(event.topic(), payload);
    }
}
