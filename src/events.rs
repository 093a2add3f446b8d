use serde::Serialize;
use tokio::sync::broadcast;

use crate::model::TaskStatus;

/// What just changed on a task board.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BoardEvent {
    /// The list was replaced by an authoritative server snapshot.
    TasksReloaded { count: usize },
    /// An optimistic add was applied locally.
    TaskAdded { id: String },
    /// An optimistic edit was applied locally.
    TaskEdited { id: String },
    /// An optimistic delete was applied locally.
    TaskDeleted { id: String },
    /// A lifecycle step was applied locally.
    StatusChanged {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
    /// A failed mutation was undone; the list matches the pre-mutation
    /// snapshot again.
    MutationRolledBack { id: String },
}

/// Fan-out of board events to any number of subscribers.
///
/// Lagging receivers skip events rather than block the board.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BoardEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    /// Send to all subscribers. No subscribers is fine.
    pub fn publish(&self, event: BoardEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(BoardEvent::TasksReloaded { count: 3 });
        assert_eq!(rx.recv().await.unwrap(), BoardEvent::TasksReloaded { count: 3 });
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(BoardEvent::TaskDeleted { id: "t1".into() });
    }

    #[test]
    fn test_event_wire_shape() {
        let v = serde_json::to_value(BoardEvent::StatusChanged {
            id: "t1".into(),
            from: TaskStatus::Pending,
            to: TaskStatus::Accepted,
        })
        .unwrap();
        assert_eq!(v["kind"], "statusChanged");
        assert_eq!(v["from"], "pending");
        assert_eq!(v["to"], "accepted");
    }
}
