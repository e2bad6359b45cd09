//! Input validation in front of the LLM.
//!
//! `DenylistGuard` is a shallow filter: a length cap plus case-insensitive
//! substring matching against known manipulation phrases. Other strategies
//! plug in through `InputGuard`.

use crate::config::SecuritySettings;

pub const MANIPULATION_PHRASES: &[&str] = &[
    "ignore previous instructions",
    "disregard system prompt",
    "act as a different",
    "pretend you are",
    "override your instructions",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Reject(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    TooLong { length: usize, max: usize },
    SuspiciousPhrase(String),
}

pub trait InputGuard: Send + Sync {
    fn check(&self, text: &str) -> Verdict;
}

#[derive(Debug, Clone)]
pub struct DenylistGuard {
    max_length: usize,
    phrases: Vec<String>,
}

impl DenylistGuard {
    pub fn new(max_length: usize, phrases: &[&str]) -> Self {
        Self {
            max_length,
            phrases: phrases.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Length cap always applies; the phrase list only when prompt
    /// injection protection is enabled.
    pub fn from_settings(settings: &SecuritySettings) -> Self {
        let phrases = if settings.enable_prompt_injection_protection {
            MANIPULATION_PHRASES
        } else {
            &[]
        };
        Self::new(settings.max_message_length, phrases)
    }
}

impl InputGuard for DenylistGuard {
    fn check(&self, text: &str) -> Verdict {
        let length = text.chars().count();
        if length > self.max_length {
            tracing::warn!("Message too long: {} characters", length);
            return Verdict::Reject(RejectReason::TooLong {
                length,
                max: self.max_length,
            });
        }

        let lowered = text.to_lowercase();
        if let Some(phrase) = self.phrases.iter().find(|p| lowered.contains(p.as_str())) {
            tracing::warn!("Potential prompt injection detected: {}", phrase);
            return Verdict::Reject(RejectReason::SuspiciousPhrase(phrase.clone()));
        }

        Verdict::Allow
    }
}
