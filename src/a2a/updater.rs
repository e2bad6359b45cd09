//! Task lifecycle state machine.
//!
//! `TaskUpdater` is the only way an executor reports progress. It tracks
//! the task's current state and refuses transitions the protocol forbids
//! before anything reaches the event queue.

use crate::a2a::events::{A2aError, EventQueue};
use crate::a2a::types::*;
use uuid::Uuid;

pub struct TaskUpdater {
    queue: EventQueue,
    task_id: String,
    context_id: String,
    state: Option<TaskState>,
}

impl TaskUpdater {
    /// `state` is the task's current state, or `None` for a task the host
    /// has no record of yet.
    pub fn new(
        queue: EventQueue,
        task_id: impl Into<String>,
        context_id: impl Into<String>,
        state: Option<TaskState>,
    ) -> Self {
        Self {
            queue,
            task_id: task_id.into(),
            context_id: context_id.into(),
            state,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn state(&self) -> Option<TaskState> {
        self.state
    }

    /// Announce a brand-new task seeded with the inbound message.
    pub fn submit(&mut self, initial: &Message) -> Result<(), A2aError> {
        if let Some(current) = self.state {
            return Err(A2aError::IllegalTransition {
                task_id: self.task_id.clone(),
                from: current,
                to: TaskState::Submitted,
            });
        }

        let mut first = initial.clone();
        first.task_id = Some(self.task_id.clone());
        first.context_id = Some(self.context_id.clone());

        self.queue.enqueue(Event::Task(Task {
            id: self.task_id.clone(),
            context_id: self.context_id.clone(),
            status: TaskStatus::new(TaskState::Submitted, None),
            artifacts: vec![],
            history: vec![first],
            metadata: None,
        }))?;
        self.state = Some(TaskState::Submitted);
        Ok(())
    }

    pub fn start_work(&mut self) -> Result<(), A2aError> {
        self.update_status(TaskState::Working, None)
    }

    pub fn complete(&mut self, message: Option<Message>) -> Result<(), A2aError> {
        self.update_status(TaskState::Completed, message)
    }

    pub fn failed(&mut self, message: Option<Message>) -> Result<(), A2aError> {
        self.update_status(TaskState::Failed, message)
    }

    pub fn cancel(&mut self) -> Result<(), A2aError> {
        self.update_status(TaskState::Canceled, None)
    }

    pub fn update_status(
        &mut self,
        next: TaskState,
        message: Option<Message>,
    ) -> Result<(), A2aError> {
        let current = self
            .state
            .ok_or_else(|| A2aError::TaskNotFound(self.task_id.clone()))?;
        if !current.can_transition_to(next) {
            return Err(A2aError::IllegalTransition {
                task_id: self.task_id.clone(),
                from: current,
                to: next,
            });
        }

        self.queue
            .enqueue(Event::StatusUpdate(TaskStatusUpdateEvent {
                task_id: self.task_id.clone(),
                context_id: self.context_id.clone(),
                status: TaskStatus::new(next, message),
                is_final: next.is_terminal(),
            }))?;
        self.state = Some(next);
        tracing::debug!("A2A: task {} {} -> {}", self.task_id, current, next);
        Ok(())
    }

    /// Attach a named text artifact. Only allowed while the task is live.
    pub fn add_artifact(&mut self, name: &str, text: impl Into<String>) -> Result<(), A2aError> {
        match self.state {
            Some(state) if !state.is_terminal() => {}
            Some(state) => {
                return Err(A2aError::IllegalTransition {
                    task_id: self.task_id.clone(),
                    from: state,
                    to: state,
                });
            }
            None => return Err(A2aError::TaskNotFound(self.task_id.clone())),
        }

        self.queue
            .enqueue(Event::ArtifactUpdate(TaskArtifactUpdateEvent {
                task_id: self.task_id.clone(),
                context_id: self.context_id.clone(),
                artifact: Artifact {
                    artifact_id: Uuid::new_v4().to_string(),
                    name: Some(name.to_string()),
                    parts: vec![Part::text(text)],
                    metadata: None,
                },
                last_chunk: Some(true),
            }))
    }

    /// Build an agent message bound to this task.
    pub fn new_agent_message(&self, text: impl Into<String>) -> Message {
        Message::agent_text(&self.task_id, &self.context_id, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::events::EventReceiver;

    fn user_message(text: &str) -> Message {
        Message {
            message_id: Some("m1".to_string()),
            context_id: None,
            task_id: None,
            role: Role::User,
            parts: vec![Part::text(text)],
            metadata: None,
        }
    }

    fn drain(rx: &mut EventReceiver) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn test_full_lifecycle_for_new_task() {
        let (queue, mut rx) = EventQueue::new();
        let mut updater = TaskUpdater::new(queue, "t1", "c1", None);

        updater.submit(&user_message("Hello")).expect("submit");
        updater.start_work().expect("working");
        let reply = updater.new_agent_message("Hi there");
        updater
            .update_status(TaskState::Working, Some(reply))
            .expect("reply");
        updater.complete(None).expect("complete");

        let events = drain(&mut rx);
        assert_eq!(events.len(), 4);
        match &events[0] {
            Event::Task(task) => {
                assert_eq!(task.status.state, TaskState::Submitted);
                assert_eq!(task.history.len(), 1);
                assert_eq!(task.history[0].task_id.as_deref(), Some("t1"));
            }
            other => unreachable!("expected task event, got {other:?}"),
        }
        match &events[3] {
            Event::StatusUpdate(ev) => {
                assert_eq!(ev.status.state, TaskState::Completed);
                assert!(ev.is_final);
            }
            other => unreachable!("expected status update, got {other:?}"),
        }
    }

    #[test]
    fn test_no_transition_out_of_completed() {
        let (queue, mut rx) = EventQueue::new();
        let mut updater = TaskUpdater::new(queue, "t1", "c1", Some(TaskState::Working));
        updater.complete(None).expect("complete");

        let err = updater.failed(None).expect_err("terminal");
        assert!(matches!(
            err,
            A2aError::IllegalTransition {
                from: TaskState::Completed,
                to: TaskState::Failed,
                ..
            }
        ));
        assert!(updater.add_artifact("x.md", "body").is_err());
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn test_submit_rejected_for_existing_task() {
        let (queue, _rx) = EventQueue::new();
        let mut updater = TaskUpdater::new(queue, "t1", "c1", Some(TaskState::Submitted));
        assert!(updater.submit(&user_message("again")).is_err());
    }

    #[test]
    fn test_status_without_record_is_rejected() {
        let (queue, _rx) = EventQueue::new();
        let mut updater = TaskUpdater::new(queue, "t1", "c1", None);
        assert!(matches!(
            updater.start_work(),
            Err(A2aError::TaskNotFound(_))
        ));
    }

    #[test]
    fn test_artifact_event_carries_name_and_text() {
        let (queue, mut rx) = EventQueue::new();
        let mut updater = TaskUpdater::new(queue, "t1", "c1", Some(TaskState::Working));
        updater
            .add_artifact("treatment_plan.md", "Plan body")
            .expect("artifact");

        match drain(&mut rx).pop() {
            Some(Event::ArtifactUpdate(ev)) => {
                assert_eq!(ev.artifact.name.as_deref(), Some("treatment_plan.md"));
                assert_eq!(ev.artifact.parts[0].text.as_deref(), Some("Plan body"));
            }
            other => unreachable!("expected artifact update, got {other:?}"),
        }
    }
}
