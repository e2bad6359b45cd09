//! JSON-RPC 2.0 handler for A2A protocol operations.
//!
//! Dispatches JSON-RPC methods:
//! - `message/send`   → run the executor to completion, return the task
//! - `message/stream` → run the executor, stream each event as SSE
//! - `tasks/get`      → retrieve task by ID
//! - `tasks/cancel`   → cancel a non-terminal task
//!
//! The task store is only ever written through `apply_event`, so every
//! status change passes the lifecycle guard.

use crate::a2a::events::{A2aError, EventQueue, EventReceiver};
use crate::a2a::executor::RequestContext;
use crate::a2a::server::A2aState;
use crate::a2a::types::*;
use crate::a2a::updater::TaskUpdater;
use futures::Stream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// In-memory task store.
pub type TaskStore = Arc<RwLock<HashMap<String, Task>>>;

/// Create a new empty task store.
pub fn new_task_store() -> TaskStore {
    Arc::new(RwLock::new(HashMap::new()))
}

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// `message/stream` is served by [`stream_message`]; here it is reported as
/// unsupported because a single response cannot carry a stream.
pub async fn dispatch(req: JsonRpcRequest, state: &A2aState) -> JsonRpcResponse {
    match req.method.as_str() {
        "message/send" => handle_send_message(req.id, req.params, state).await,
        "tasks/get" => handle_get_task(req.id, req.params, &state.task_store).await,
        "tasks/cancel" => handle_cancel_task(req.id, req.params, state).await,
        "message/stream" => JsonRpcResponse::error(
            req.id,
            error_codes::UNSUPPORTED_OPERATION,
            "message/stream requires an SSE-capable transport",
        ),
        _ => JsonRpcResponse::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    }
}

/// Apply one executor event to the store.
pub async fn apply_event(store: &TaskStore, event: &Event) -> Result<(), A2aError> {
    let mut tasks = store.write().await;
    match event {
        Event::Task(task) => {
            if let Some(existing) = tasks.get(&task.id) {
                return Err(A2aError::IllegalTransition {
                    task_id: task.id.clone(),
                    from: existing.status.state,
                    to: task.status.state,
                });
            }
            tasks.insert(task.id.clone(), task.clone());
        }
        Event::StatusUpdate(update) => {
            let task = tasks
                .get_mut(&update.task_id)
                .ok_or_else(|| A2aError::TaskNotFound(update.task_id.clone()))?;
            if !task.status.state.can_transition_to(update.status.state) {
                return Err(A2aError::IllegalTransition {
                    task_id: task.id.clone(),
                    from: task.status.state,
                    to: update.status.state,
                });
            }
            // The outgoing status message becomes part of the history.
            if let Some(previous) = task.status.message.take() {
                task.history.push(previous);
            }
            task.status = update.status.clone();
        }
        Event::ArtifactUpdate(update) => {
            let task = tasks
                .get_mut(&update.task_id)
                .ok_or_else(|| A2aError::TaskNotFound(update.task_id.clone()))?;
            if task.status.state.is_terminal() {
                return Err(A2aError::IllegalTransition {
                    task_id: task.id.clone(),
                    from: task.status.state,
                    to: task.status.state,
                });
            }
            task.artifacts.push(update.artifact.clone());
        }
    }
    Ok(())
}

/// Handle `message/send`: run the executor and return the final task.
async fn handle_send_message(
    id: serde_json::Value,
    params: serde_json::Value,
    state: &A2aState,
) -> JsonRpcResponse {
    let context = match prepare_request(&id, params, &state.task_store).await {
        Ok(context) => context,
        Err(resp) => return resp,
    };
    let task_id = context.task_id.clone();

    let (mut events, handle) = spawn_execution(state, context);
    while let Some(event) = events.recv().await {
        if let Err(e) = apply_event(&state.task_store, &event).await {
            tracing::warn!("A2A: dropped event for task {}: {}", event.task_id(), e);
        }
    }

    match handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            return JsonRpcResponse::error(
                id,
                error_codes::INTERNAL_ERROR,
                format!("Task {} failed: {}", task_id, e),
            );
        }
        Err(e) => {
            return JsonRpcResponse::error(
                id,
                error_codes::INTERNAL_ERROR,
                format!("Task {} aborted: {}", task_id, e),
            );
        }
    }

    let tasks = state.task_store.read().await;
    match tasks.get(&task_id) {
        Some(task) => task_response(id, task.clone()),
        None => JsonRpcResponse::error(
            id,
            error_codes::INTERNAL_ERROR,
            format!("Task {} was never recorded", task_id),
        ),
    }
}

/// Handle `message/stream`: each event is applied to the store and then
/// yielded as a JSON-RPC response.
///
/// A forwarding task owns the executor's receiver, so the store keeps
/// receiving events after the client goes away.
pub async fn stream_message(
    id: serde_json::Value,
    params: serde_json::Value,
    state: &A2aState,
) -> Result<impl Stream<Item = JsonRpcResponse> + Send + 'static, JsonRpcResponse> {
    if !state.agent_card.capabilities.streaming {
        return Err(JsonRpcResponse::error(
            id,
            error_codes::UNSUPPORTED_OPERATION,
            "Streaming is disabled for this agent",
        ));
    }

    let context = prepare_request(&id, params, &state.task_store).await?;
    let task_id = context.task_id.clone();
    let (mut events, _handle) = spawn_execution(state, context);
    let store = state.task_store.clone();
    let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

    tokio::spawn(async move {
        let mut client_gone = false;
        while let Some(event) = events.recv().await {
            if let Err(e) = apply_event(&store, &event).await {
                tracing::warn!("A2A: dropped event for task {}: {}", event.task_id(), e);
            }
            if client_gone {
                continue;
            }
            let payload = serde_json::to_value(&event)
                .unwrap_or_else(|_| serde_json::json!({"error": "serialize"}));
            if tx.send(JsonRpcResponse::success(id.clone(), payload)).is_err() {
                tracing::info!("A2A: stream client for task {} disconnected", task_id);
                client_gone = true;
            }
        }
    });

    Ok(futures::stream::unfold(rx, |mut rx| async move {
        let resp = rx.recv().await?;
        Some((resp, rx))
    }))
}

/// Resolve the target task for an inbound message.
///
/// A message naming an existing task continues it: the message joins the
/// stored history and the task goes back to `submitted`. Only completed
/// and input-required tasks accept follow-ups.
async fn prepare_request(
    id: &serde_json::Value,
    params: serde_json::Value,
    store: &TaskStore,
) -> Result<RequestContext, JsonRpcResponse> {
    let send_params: SendMessageParams = serde_json::from_value(params).map_err(|e| {
        JsonRpcResponse::error(
            id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Invalid params: {}", e),
        )
    })?;

    let mut message = send_params.message;
    if message.message_id.is_none() {
        message.message_id = Some(Uuid::new_v4().to_string());
    }

    let Some(task_id) = message.task_id.clone() else {
        let task_id = Uuid::new_v4().to_string();
        let context_id = message
            .context_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        message.task_id = Some(task_id.clone());
        message.context_id = Some(context_id.clone());

        tracing::info!("A2A: new task {} in context {}", task_id, context_id);
        return Ok(RequestContext {
            task_id,
            context_id,
            message,
            current_task: None,
        });
    };

    let mut tasks = store.write().await;
    let task = tasks.get_mut(&task_id).ok_or_else(|| {
        JsonRpcResponse::error(
            id.clone(),
            error_codes::TASK_NOT_FOUND,
            format!("Task not found: {}", task_id),
        )
    })?;

    if !matches!(
        task.status.state,
        TaskState::Completed | TaskState::InputRequired
    ) {
        return Err(JsonRpcResponse::error(
            id.clone(),
            error_codes::UNSUPPORTED_OPERATION,
            format!(
                "Task {} is {} and cannot accept new messages",
                task_id, task.status.state
            ),
        ));
    }

    message.context_id = Some(task.context_id.clone());
    if let Some(previous) = task.status.message.take() {
        task.history.push(previous);
    }
    task.history.push(message.clone());
    task.status = TaskStatus::new(TaskState::Submitted, None);

    tracing::info!(
        "A2A: continuing task {} ({} messages in history)",
        task_id,
        task.history.len()
    );
    Ok(RequestContext {
        task_id,
        context_id: task.context_id.clone(),
        message,
        current_task: Some(task.clone()),
    })
}

fn spawn_execution(
    state: &A2aState,
    context: RequestContext,
) -> (EventReceiver, JoinHandle<Result<(), A2aError>>) {
    let (queue, events) = EventQueue::new();
    let executor = state.executor.clone();
    let handle = tokio::spawn(async move {
        let task_id = context.task_id.clone();
        let result = executor.execute(context, queue).await;
        if let Err(e) = &result {
            tracing::error!("A2A: executor error on task {}: {}", task_id, e);
        }
        result
    });
    (events, handle)
}

fn task_response(id: serde_json::Value, task: Task) -> JsonRpcResponse {
    let task_json = serde_json::to_value(Event::Task(task))
        .unwrap_or_else(|_| serde_json::json!({"error": "serialize"}));
    JsonRpcResponse::success(id, task_json)
}

/// Handle `tasks/get`: retrieve a task by ID.
async fn handle_get_task(
    id: serde_json::Value,
    params: serde_json::Value,
    store: &TaskStore,
) -> JsonRpcResponse {
    let get_params: GetTaskParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Invalid params: {}", e),
            );
        }
    };

    let tasks = store.read().await;
    match tasks.get(&get_params.id) {
        Some(task) => {
            let mut task = task.clone();
            if let Some(keep) = get_params.history_length {
                let skip = task.history.len().saturating_sub(keep);
                task.history.drain(..skip);
            }
            task_response(id, task)
        }
        None => JsonRpcResponse::error(
            id,
            error_codes::TASK_NOT_FOUND,
            format!("Task not found: {}", get_params.id),
        ),
    }
}

/// Handle `tasks/cancel`: cancel a running task.
async fn handle_cancel_task(
    id: serde_json::Value,
    params: serde_json::Value,
    state: &A2aState,
) -> JsonRpcResponse {
    let cancel_params: CancelTaskParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Invalid params: {}", e),
            );
        }
    };

    let Some(task) = state.task_store.read().await.get(&cancel_params.id).cloned() else {
        return JsonRpcResponse::error(
            id,
            error_codes::TASK_NOT_FOUND,
            format!("Task not found: {}", cancel_params.id),
        );
    };

    // Only cancel if not in terminal state
    if task.status.state.is_terminal() {
        return JsonRpcResponse::error(
            id,
            error_codes::TASK_NOT_CANCELABLE,
            format!("Cannot cancel task in {} state", task.status.state),
        );
    }

    let message = task.history.last().cloned().unwrap_or_else(|| Message {
        message_id: None,
        context_id: Some(task.context_id.clone()),
        task_id: Some(task.id.clone()),
        role: Role::User,
        parts: vec![],
        metadata: None,
    });
    let context = RequestContext {
        task_id: task.id.clone(),
        context_id: task.context_id.clone(),
        message,
        current_task: Some(task.clone()),
    };

    let (queue, mut events) = EventQueue::new();
    if let Err(e) = state.executor.cancel(context, queue.clone()).await {
        return JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string());
    }

    let mut updater = TaskUpdater::new(
        queue,
        task.id.clone(),
        task.context_id.clone(),
        Some(task.status.state),
    );
    let canceled = updater.cancel();
    drop(updater);

    if let Err(e) = canceled {
        return JsonRpcResponse::error(id, error_codes::TASK_NOT_CANCELABLE, e.to_string());
    }

    while let Some(event) = events.recv().await {
        if let Err(e) = apply_event(&state.task_store, &event).await {
            return JsonRpcResponse::error(id, error_codes::TASK_NOT_CANCELABLE, e.to_string());
        }
    }

    tracing::info!("A2A: Canceled task {}", cancel_params.id);
    let tasks = state.task_store.read().await;
    match tasks.get(&cancel_params.id) {
        Some(task) => task_response(id, task.clone()),
        None => JsonRpcResponse::error(
            id,
            error_codes::TASK_NOT_FOUND,
            format!("Task not found: {}", cancel_params.id),
        ),
    }
}
