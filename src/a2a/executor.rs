//! Executor seam between the A2A host and agent logic.

use crate::a2a::events::{A2aError, EventQueue};
use crate::a2a::types::{Message, Task};
use async_trait::async_trait;

/// Everything the host knows about an inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub task_id: String,
    pub context_id: String,
    pub message: Message,
    /// Stored task record, if this message continues an existing task.
    /// Its history already includes `message`.
    pub current_task: Option<Task>,
}

#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Run one request to completion, reporting progress on `queue`.
    async fn execute(&self, context: RequestContext, queue: EventQueue) -> Result<(), A2aError>;

    async fn cancel(&self, context: RequestContext, queue: EventQueue) -> Result<(), A2aError>;
}
