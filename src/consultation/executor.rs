//! Protocol adapter: runs consultations as A2A tasks.
//!
//! Lifecycle per request: `submitted` (new tasks only) → `working` →
//! `working` carrying the reply → optional artifact → `completed`. Any
//! failure after work starts marks the task `failed` with a fixed apology.

use super::{ConsultationProcessor, GREETING_RESPONSE, TECHNICAL_DIFFICULTIES_RESPONSE};
use crate::a2a::events::{A2aError, EventQueue};
use crate::a2a::executor::{AgentExecutor, RequestContext};
use crate::a2a::types::{Role, Task, TaskState};
use crate::a2a::updater::TaskUpdater;
use crate::brain::ChatMessage;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

pub struct ConsultationExecutor {
    processor: ConsultationProcessor,
}

impl ConsultationExecutor {
    pub fn new(processor: ConsultationProcessor) -> Self {
        Self { processor }
    }

    async fn consult(
        &self,
        context: &RequestContext,
        updater: &mut TaskUpdater,
    ) -> Result<(), A2aError> {
        let user_text = context.message.text_content();

        let consultation = if user_text.is_empty() {
            tracing::info!("A2A: task {} carried no text, sending greeting", context.task_id);
            super::Consultation::new(GREETING_RESPONSE.to_string())
        } else {
            tracing::info!("A2A: task {} query: {}", context.task_id, preview(&user_text));
            let history = conversation_history(context.current_task.as_ref());
            self.processor.consult(&user_text, &history).await
        };

        let reply = updater.new_agent_message(consultation.text.clone());
        updater.update_status(TaskState::Working, Some(reply))?;

        if let Some(name) = consultation.artifact_name {
            updater.add_artifact(name, consultation.text)?;
        }

        updater.complete(None)
    }
}

#[async_trait]
impl AgentExecutor for ConsultationExecutor {
    async fn execute(&self, context: RequestContext, queue: EventQueue) -> Result<(), A2aError> {
        let state = context.current_task.as_ref().map(|t| t.status.state);
        let mut updater = TaskUpdater::new(
            queue,
            context.task_id.clone(),
            context.context_id.clone(),
            state,
        );

        if context.current_task.is_none() {
            updater.submit(&context.message)?;
        }
        updater.start_work()?;

        let outcome = AssertUnwindSafe(self.consult(&context, &mut updater))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(A2aError::Internal("consultation panicked".to_string())));

        match outcome {
            Ok(()) => {
                tracing::info!("A2A: completed task {}", context.task_id);
                Ok(())
            }
            Err(err) => {
                tracing::error!("A2A: error processing task {}: {}", context.task_id, err);
                let apology = updater.new_agent_message(TECHNICAL_DIFFICULTIES_RESPONSE);
                if let Err(emit_err) = updater.failed(Some(apology)) {
                    tracing::error!(
                        "A2A: could not mark task {} failed: {}",
                        context.task_id,
                        emit_err
                    );
                    return Err(err);
                }
                Ok(())
            }
        }
    }

    async fn cancel(&self, context: RequestContext, _queue: EventQueue) -> Result<(), A2aError> {
        // Requests run to completion inside `execute`; there is no in-flight
        // work to interrupt.
        tracing::info!("A2A: cancel requested for task {}", context.task_id);
        Ok(())
    }
}

/// Rebuild chat turns from a stored task's history, oldest first.
pub fn conversation_history(task: Option<&Task>) -> Vec<ChatMessage> {
    let Some(task) = task else {
        return Vec::new();
    };

    task.history
        .iter()
        .filter_map(|message| {
            let content = message.text_content();
            if content.is_empty() {
                return None;
            }
            Some(match message.role {
                Role::User => ChatMessage::user(content),
                Role::Agent => ChatMessage::assistant(content),
            })
        })
        .collect()
}

fn preview(text: &str) -> String {
    if text.len() > 100 {
        format!("{}...", &text[..text.floor_char_boundary(100)])
    } else {
        text.to_string()
    }
}
