//! Consultation processor.
//!
//! Validates inbound text, assembles the conversation for Claude and makes
//! exactly one provider call. Failures never escape: every outcome is a
//! reply string, possibly one of the fixed fallback responses below.

pub mod artifact;
pub mod executor;
pub mod guard;

pub use executor::ConsultationExecutor;
pub use guard::{DenylistGuard, InputGuard, Verdict};

use crate::brain::{ChatMessage, ChatRole, LLMRequest, Provider};
use crate::config::Config;
use std::sync::Arc;

/// Reply to input rejected by the guard.
pub const REDIRECT_RESPONSE: &str = "I'm here to assist with medical information and \
    coordination. Please ask about our interventional cardiology services.";

/// Reply when the Claude API itself fails.
pub const PROVIDER_ERROR_RESPONSE: &str = "I'm experiencing connectivity issues with my medical \
    knowledge system. Please try again in a moment, or contact our office directly for immediate \
    assistance with interventional cardiology services.";

/// Reply for any other failure while generating a response.
pub const GENERIC_ERROR_RESPONSE: &str = "I'm sorry, I'm having trouble processing your request \
    right now. Please contact Dr. Walter Reed's office directly for interventional cardiology \
    assistance.";

/// Status message attached to a failed task.
pub const TECHNICAL_DIFFICULTIES_RESPONSE: &str = "I apologize, but I'm experiencing technical \
    difficulties. Please try again later. For urgent medical matters, please contact our office \
    directly.";

/// Reply to a message with no text content.
pub const GREETING_RESPONSE: &str =
    "Hello! How can I assist you with our interventional cardiology services today?";

/// A reply plus the artifact classification derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consultation {
    pub text: String,
    /// Set when the reply should also be published as a named artifact.
    pub artifact_name: Option<&'static str>,
}

impl Consultation {
    pub fn new(text: String) -> Self {
        let artifact_name =
            artifact::should_create_artifact(&text).then(|| artifact::artifact_name(&text));
        Self {
            text,
            artifact_name,
        }
    }
}

pub struct ConsultationProcessor {
    provider: Arc<dyn Provider>,
    guard: Box<dyn InputGuard>,
    system_prompt: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ConsultationProcessor {
    pub fn new(config: &Config, provider: Arc<dyn Provider>) -> Self {
        tracing::info!(
            "Consultation processor initialized for {}",
            config.agent.practice_name
        );
        Self {
            provider,
            guard: Box::new(DenylistGuard::from_settings(&config.security)),
            system_prompt: config.system_prompt(),
            model: config.claude.model.clone(),
            max_tokens: config.claude.max_tokens,
            temperature: config.claude.temperature,
        }
    }

    /// Swap the input validation strategy.
    pub fn with_guard(mut self, guard: impl InputGuard + 'static) -> Self {
        self.guard = Box::new(guard);
        self
    }

    pub async fn process(&self, user_text: &str, history: &[ChatMessage]) -> String {
        if let Verdict::Reject(reason) = self.guard.check(user_text) {
            tracing::info!("Input rejected, redirecting: {:?}", reason);
            return REDIRECT_RESPONSE.to_string();
        }

        let messages = build_messages(history, user_text);
        tracing::debug!("Generating response for {} conversation turns", messages.len());

        let request = LLMRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: self.system_prompt.clone(),
            messages,
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                tracing::debug!("Generated {} character response", response.text.len());
                response.text
            }
            Err(e) if e.is_api_failure() => {
                tracing::error!("Claude API error: {}", e);
                PROVIDER_ERROR_RESPONSE.to_string()
            }
            Err(e) => {
                tracing::error!("Unexpected error generating response: {}", e);
                GENERIC_ERROR_RESPONSE.to_string()
            }
        }
    }

    /// `process`, plus artifact classification of the reply.
    pub async fn consult(&self, user_text: &str, history: &[ChatMessage]) -> Consultation {
        Consultation::new(self.process(user_text, history).await)
    }
}

/// Prior user/assistant turns with content, oldest first, followed by the
/// new user turn.
pub fn build_messages(history: &[ChatMessage], user_text: &str) -> Vec<ChatMessage> {
    history
        .iter()
        .filter(|m| matches!(m.role, ChatRole::User | ChatRole::Assistant))
        .filter(|m| !m.content.is_empty())
        .cloned()
        .chain(std::iter::once(ChatMessage::user(user_text)))
        .collect()
}
