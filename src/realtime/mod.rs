//! Task lifecycle events and the broadcast bus that fans them out.
//!
//! Services return events as plain data; route handlers dispatch them through
//! the [`EventBus`] after the mutation has committed. Connected websocket
//! clients treat the frames as cache-invalidation signals and refetch, so
//! delivery is best-effort: no acknowledgment, no replay, and a slow client
//! that lags simply skips events.

pub mod ws;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::TaskWithUsers;

/// Default capacity of the broadcast channel. A receiver further behind than
/// this skips ahead and loses the overwritten events.
const EVENT_BUFFER: usize = 256;

/// A task lifecycle event as pushed to realtime clients.
///
/// Wire format is one JSON object per frame, e.g.
/// `{"event": "taskCreated", "data": {...}}`; deletion carries the bare id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum TaskEvent {
    TaskCreated(TaskWithUsers),
    TaskUpdated(TaskWithUsers),
    TaskDeleted(Uuid),
    TaskAssigned(TaskWithUsers),
}

impl TaskEvent {
    /// The wire name of the event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskEvent::TaskCreated(_) => "taskCreated",
            TaskEvent::TaskUpdated(_) => "taskUpdated",
            TaskEvent::TaskDeleted(_) => "taskDeleted",
            TaskEvent::TaskAssigned(_) => "taskAssigned",
        }
    }
}

/// Connection registry and fan-out channel for realtime clients.
///
/// Each websocket session holds a `broadcast::Receiver`; subscribing on
/// connect and dropping the receiver on disconnect is the whole lifecycle.
/// Cloning the bus shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TaskEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new client. The receiver sees every event emitted after
    /// this call.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }

    /// Broadcast one event to all connected clients. Emitting with nobody
    /// connected is not an error; the event is simply dropped.
    pub fn emit(&self, event: TaskEvent) {
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(receivers) => log::debug!("broadcast {} to {} client(s)", kind, receivers),
            Err(_) => log::debug!("dropped {} (no connected clients)", kind),
        }
    }

    /// Dispatch the events a service returned, in order.
    pub fn dispatch(&self, events: Vec<TaskEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Number of currently connected clients.
    pub fn client_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_BUFFER)
    }
}
