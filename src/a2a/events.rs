//! Event queue between an executor and the A2A host.
//!
//! Each execution gets its own queue. The host drains the receiver and
//! applies events to the task store; the queue closes when the executor
//! drops its sender.

use crate::a2a::types::Event;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum A2aError {
    #[error("event queue closed before {0} could be delivered")]
    QueueClosed(String),

    #[error("illegal transition for task {task_id}: {from} -> {to}")]
    IllegalTransition {
        task_id: String,
        from: crate::a2a::types::TaskState,
        to: crate::a2a::types::TaskState,
    },

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Sending half handed to executors.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: mpsc::UnboundedSender<Event>,
}

pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

impl EventQueue {
    pub fn new() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, event: Event) -> Result<(), A2aError> {
        let label = match &event {
            Event::Task(_) => "task",
            Event::StatusUpdate(_) => "status-update",
            Event::ArtifactUpdate(_) => "artifact-update",
        };
        self.tx
            .send(event)
            .map_err(|_| A2aError::QueueClosed(label.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::types::*;

    fn status_event() -> Event {
        Event::StatusUpdate(TaskStatusUpdateEvent {
            task_id: "t".to_string(),
            context_id: "c".to_string(),
            status: TaskStatus::new(TaskState::Working, None),
            is_final: false,
        })
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (queue, mut rx) = EventQueue::new();
        queue.enqueue(status_event()).expect("first");
        queue.enqueue(status_event()).expect("second");
        drop(queue);

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_enqueue_after_receiver_dropped() {
        let (queue, rx) = EventQueue::new();
        drop(rx);
        let err = queue.enqueue(status_event()).expect_err("closed");
        assert!(matches!(err, A2aError::QueueClosed(ref kind) if kind == "status-update"));
    }
}
