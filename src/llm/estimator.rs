//! Macro estimation from free-text meal descriptions.

use std::sync::Arc;

use serde::Deserialize;

use super::{parse_reply, CompletionClient, LlmError, Outcome, Prompt, PromptKind};
use crate::models::{Macros, PendingMeal};

const ESTIMATE_SYSTEM_PROMPT: &str = "You are a nutrition assistant. Estimate the macronutrients \
of the meal the user describes, using typical portion sizes when amounts are not given. \
Reply with a JSON object of the form \
{\"macros\": {\"protein\": <grams>, \"carbs\": <grams>, \"fat\": <grams>}, \
\"interpretation\": \"<one sentence restating what you understood the meal to be>\"}. \
Use plain numbers, no units.";

/// A successful estimate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Estimate {
    pub macros: Macros,
    #[serde(default)]
    pub interpretation: Option<String>,
}

impl Outcome<Estimate> {
    /// The pending meal returned to the caller for confirmation.
    pub fn into_pending(self, description: String) -> PendingMeal {
        let (estimate, error) = self.into_parts();
        PendingMeal {
            description,
            macros: estimate.macros,
            interpretation: estimate.interpretation,
            error,
        }
    }
}

/// Turns meal descriptions into macro estimates.
pub struct MacroEstimator {
    client: Arc<dyn CompletionClient>,
}

impl MacroEstimator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Estimate macros for `description`. Any failure yields zero macros plus an error message.
    pub async fn estimate(&self, description: &str) -> Outcome<Estimate> {
        let prompt = Prompt {
            kind: PromptKind::EstimateMacros,
            system: ESTIMATE_SYSTEM_PROMPT.to_string(),
            user: description.to_string(),
        };

        let result = match self.client.complete(&prompt).await {
            Ok(reply) => parse_estimate(&reply),
            Err(e) => Err(e),
        };

        match result {
            Ok(estimate) => Outcome::Fresh(estimate),
            Err(e) => {
                tracing::warn!("Macro estimation failed, using zero macros: {}", e);
                let zero = Estimate {
                    macros: Macros::zero(),
                    interpretation: None,
                };
                Outcome::fallback(zero, format!("Could not estimate macros: {}", e))
            }
        }
    }
}

fn parse_estimate(reply: &str) -> Result<Estimate, LlmError> {
    let mut estimate: Estimate = parse_reply(reply)?;
    if let Some(field) = estimate.macros.invalid_field() {
        return Err(LlmError::Malformed(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    estimate.interpretation = estimate
        .interpretation
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    Ok(estimate)
}
