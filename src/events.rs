//! Domain notifications emitted by the use-case layer.
//!
//! The repository knows nothing about this module; only use-cases publish.
//! Events carry the affected task id and nothing else — subscribers
//! re-query the repository for current state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A change notification. Closed set; one variant per mutation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskEvent {
    /// A task was created.
    TaskAdded { task_id: i64 },
    /// A task's fields changed.
    TaskUpdated { task_id: i64 },
    /// A task (and possibly its subtree) was removed.
    TaskDeleted { task_id: i64 },
    /// A task was reparented or repositioned.
    TaskMoved { task_id: i64 },
}

impl TaskEvent {
    /// The affected task.
    pub fn task_id(&self) -> i64 {
        match *self {
            TaskEvent::TaskAdded { task_id }
            | TaskEvent::TaskUpdated { task_id }
            | TaskEvent::TaskDeleted { task_id }
            | TaskEvent::TaskMoved { task_id } => task_id,
        }
    }

    /// The variant, for subscription routing.
    pub fn kind(&self) -> EventKind {
        match self {
            TaskEvent::TaskAdded { .. } => EventKind::Added,
            TaskEvent::TaskUpdated { .. } => EventKind::Updated,
            TaskEvent::TaskDeleted { .. } => EventKind::Deleted,
            TaskEvent::TaskMoved { .. } => EventKind::Moved,
        }
    }
}

/// Subscription key: one per `TaskEvent` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Added,
    Updated,
    Deleted,
    Moved,
}

type Handler = Box<dyn Fn(&TaskEvent)>;

/// Publish/subscribe bus with explicit per-variant registration.
#[derive(Default)]
pub struct EventBus {
    subscribers: HashMap<EventKind, Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event variant.
    pub fn subscribe(&mut self, kind: EventKind, handler: impl Fn(&TaskEvent) + 'static) {
        self.subscribers
            .entry(kind)
            .or_default()
            .push(Box::new(handler));
    }

    /// Deliver an event to every handler registered for its variant.
    pub fn emit(&self, event: &TaskEvent) {
        if let Some(handlers) = self.subscribers.get(&event.kind()) {
            for handler in handlers {
                handler(event);
            }
        }
    }
}
