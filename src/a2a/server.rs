//! A2A HTTP server powered by axum.
//!
//! Serves:
//! - `GET  {AGENT_CARD_PATH}`       → Agent Card discovery
//! - `GET  /.well-known/agent.json` → Agent Card, legacy location
//! - `POST /`                       → JSON-RPC 2.0 endpoint (SSE for `message/stream`)
//! - `GET  /health`                 → Health check

use crate::a2a::executor::AgentExecutor;
use crate::a2a::{handler, types::*};
use crate::config::Config;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    response::{
        IntoResponse, Json, Response,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const LEGACY_CARD_PATH: &str = "/.well-known/agent.json";

/// Shared state for the A2A server.
#[derive(Clone)]
pub struct A2aState {
    pub task_store: handler::TaskStore,
    pub executor: Arc<dyn AgentExecutor>,
    pub agent_card: Arc<AgentCard>,
}

impl A2aState {
    pub fn new(executor: Arc<dyn AgentExecutor>, agent_card: AgentCard) -> Self {
        Self {
            task_store: handler::new_task_store(),
            executor,
            agent_card: Arc::new(agent_card),
        }
    }
}

/// Build the axum router for the A2A server.
pub fn build_router(state: A2aState, card_path: &str) -> Router {
    let mut router = Router::new()
        .route(card_path, get(get_agent_card))
        .route("/", post(handle_jsonrpc))
        .route("/health", get(health_check));

    if card_path != LEGACY_CARD_PATH {
        router = router.route(LEGACY_CARD_PATH, get(get_agent_card));
    }

    router.layer(CorsLayer::permissive()).with_state(state)
}

/// Start the A2A server and run until Ctrl-C.
pub async fn start_server(config: &Config, executor: Arc<dyn AgentExecutor>) -> anyhow::Result<()> {
    let state = A2aState::new(executor, config.agent_card());
    let app = build_router(state, &config.server.agent_card_path);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    tracing::info!("A2A server starting on http://{}", addr);
    tracing::info!(
        "   Agent Card: http://{}{}",
        addr,
        config.server.agent_card_path
    );
    tracing::info!("   JSON-RPC:   http://{}/", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("A2A server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// GET agent card.
async fn get_agent_card(State(state): State<A2aState>) -> Json<AgentCard> {
    Json(state.agent_card.as_ref().clone())
}

/// POST /: JSON-RPC 2.0 endpoint.
async fn handle_jsonrpc(State(state): State<A2aState>, body: Bytes) -> Response {
    let req = match parse_request(&body) {
        Ok(req) => req,
        Err(resp) => return Json(resp).into_response(),
    };

    // Validate JSON-RPC version
    if req.jsonrpc != "2.0" {
        return Json(JsonRpcResponse::error(
            req.id,
            error_codes::INVALID_REQUEST,
            "Invalid JSON-RPC version, expected 2.0",
        ))
        .into_response();
    }

    if req.method == "message/stream" {
        return match handler::stream_message(req.id, req.params, &state).await {
            Ok(stream) => Sse::new(stream.map(|resp| SseEvent::default().json_data(resp)))
                .keep_alive(KeepAlive::default())
                .into_response(),
            Err(resp) => Json(resp).into_response(),
        };
    }

    Json(handler::dispatch(req, &state).await).into_response()
}

/// Malformed JSON maps to -32700; valid JSON that is not a request object
/// maps to -32600.
fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        JsonRpcResponse::error(
            serde_json::Value::Null,
            error_codes::PARSE_ERROR,
            format!("Parse error: {}", e),
        )
    })?;

    let id = value.get("id").cloned().unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value).map_err(|e| {
        JsonRpcResponse::error(
            id,
            error_codes::INVALID_REQUEST,
            format!("Invalid request: {}", e),
        )
    })
}

/// GET /health: Health check.
async fn health_check(State(state): State<A2aState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "agent": state.agent_card.name,
        "protocol": "A2A",
        "protocol_version": state.agent_card.protocol_version,
    }))
}
