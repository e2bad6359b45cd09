//! Brain Module
//!
//! System prompt assembly and the LLM provider layer the consultation
//! processor talks to.

pub mod prompt_builder;
pub mod provider;

// Re-exports
pub use provider::{ChatMessage, ChatRole, LLMRequest, LLMResponse, Provider, ProviderError};
