//! Interventional cardiology medical-information agent.
//!
//! Exposes a Claude-backed consultation assistant over the A2A protocol:
//! agent card discovery plus a JSON-RPC task API.

pub mod a2a;
pub mod brain;
pub mod config;
pub mod consultation;
pub mod logging;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests;
