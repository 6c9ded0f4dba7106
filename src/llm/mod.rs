//! Language model collaborators.
//!
//! The estimator and suggesters never fail: every error from the completion
//! API is turned into an [`Outcome::Fallback`] carrying a static value and a
//! message the caller can show to the user.

mod estimator;
mod openai;
mod suggester;

#[cfg(test)]
pub mod fake;

pub use estimator::*;
pub use openai::*;
pub use suggester::*;

use async_trait::async_trait;

/// What a prompt asks for. Used for logging and by test doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    EstimateMacros,
    ProteinChoices,
    MealSuggestion,
}

/// A single-turn prompt expecting a JSON object in reply.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub system: String,
    pub user: String,
}

/// Errors from a completion call.
#[derive(Debug, Clone)]
pub enum LlmError {
    /// No API key configured
    NotConfigured,
    /// Transport failure or timeout
    Http(String),
    /// Non-success status from the API
    Status { status: u16, body: String },
    /// Reply missing, not JSON, or not the expected shape
    Malformed(String),
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::NotConfigured => write!(f, "language model API key is not configured"),
            LlmError::Http(msg) => write!(f, "language model request failed: {}", msg),
            LlmError::Status { status, body } => {
                write!(f, "language model API returned {}: {}", status, body)
            }
            LlmError::Malformed(msg) => write!(f, "unexpected language model reply: {}", msg),
        }
    }
}

impl std::error::Error for LlmError {}

/// Chat-completion backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the prompt and return the raw text of the reply.
    async fn complete(&self, prompt: &Prompt) -> Result<String, LlmError>;
}

/// Result of a best-effort call: either fresh data or a fallback with the reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Fresh(T),
    Fallback { value: T, error: String },
}

impl<T> Outcome<T> {
    pub fn fallback(value: T, error: impl std::fmt::Display) -> Self {
        Outcome::Fallback {
            value,
            error: error.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Fresh(value) | Outcome::Fallback { value, .. } => value,
        }
    }

    /// Split into the value and the user-visible error, if any.
    pub fn into_parts(self) -> (T, Option<String>) {
        match self {
            Outcome::Fresh(value) => (value, None),
            Outcome::Fallback { value, error } => (value, Some(error)),
        }
    }
}

/// Parse a reply as JSON, tolerating a surrounding markdown code fence.
pub(crate) fn parse_reply<T: serde::de::DeserializeOwned>(reply: &str) -> Result<T, LlmError> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim()).map_err(|e| LlmError::Malformed(e.to_string()))
}
