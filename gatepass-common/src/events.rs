//! Event types for the gatepass event system
//!
//! Provides shared event definitions and the EventBus used to push changes
//! to the staff console over SSE.

use crate::status::CanonicalStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Gate event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GateEvent {
    /// A wizard session was opened at the kiosk
    SessionOpened {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A wizard session ended (submitted or abandoned)
    SessionClosed {
        session_id: Uuid,
        submitted: bool,
        timestamp: DateTime<Utc>,
    },

    /// A visit record became durable
    ///
    /// Triggers:
    /// - Live feed: refresh so the arrival shows up
    VisitSubmitted {
        visit_id: Uuid,
        full_name: String,
        purpose: String,
        /// The feedback-request notification soft-failed
        notification_failed: bool,
        timestamp: DateTime<Utc>,
    },

    /// A status change was confirmed by the store
    VisitStatusChanged {
        visit_id: Uuid,
        status: CanonicalStatus,
        timestamp: DateTime<Utc>,
    },

    /// An optimistic status change was rejected and undone
    VisitStatusRolledBack {
        visit_id: Uuid,
        restored: CanonicalStatus,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// The live feed was replaced from the store
    LiveFeedRefreshed {
        entries: usize,
        timestamp: DateTime<Utc>,
    },
}

impl GateEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            GateEvent::SessionOpened { .. } => "SessionOpened",
            GateEvent::SessionClosed { .. } => "SessionClosed",
            GateEvent::VisitSubmitted { .. } => "VisitSubmitted",
            GateEvent::VisitStatusChanged { .. } => "VisitStatusChanged",
            GateEvent::VisitStatusRolledBack { .. } => "VisitStatusRolledBack",
            GateEvent::LiveFeedRefreshed { .. } => "LiveFeedRefreshed",
        }
    }
}

/// Broadcast bus for [`GateEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GateEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<GateEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: GateEvent) -> Result<usize, broadcast::error::SendError<GateEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: GateEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No event subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
