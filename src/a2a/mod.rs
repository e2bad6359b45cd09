//! A2A (Agent-to-Agent) protocol host.
//!
//! - Agent Card discovery
//! - JSON-RPC 2.0 task API (`message/send`, `message/stream`, `tasks/get`, `tasks/cancel`)
//! - Task lifecycle state machine and per-request event queues
//! - HTTP server (axum)

pub mod agent_card;
pub mod events;
pub mod executor;
pub mod handler;
pub mod server;
pub mod types;
pub mod updater;

pub use events::{A2aError, EventQueue};
pub use executor::{AgentExecutor, RequestContext};
pub use updater::TaskUpdater;
