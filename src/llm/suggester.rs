//! Protein-source candidates and meal suggestions.

use std::sync::Arc;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::{parse_reply, CompletionClient, LlmError, Outcome, Prompt, PromptKind};
use crate::aggregate::Remaining;

/// Candidates offered when the API cannot be reached.
pub const FALLBACK_PROTEIN_CHOICES: &[&str] = &[
    "Chicken",
    "Eggs",
    "Greek Yogurt",
    "Paneer",
    "Tofu",
    "Lentils",
    "Fish",
    "Whey Protein",
];

const MAX_PROTEIN_CHOICES: usize = 20;

const PROTEIN_CHOICES_SYSTEM_PROMPT: &str = "You help people plan high-protein meals. \
List common, widely available protein sources a home cook might choose from. \
Reply with a JSON object of the form {\"protein_choices\": [\"<name>\", ...]} \
containing between 8 and 15 short names.";

const MEAL_SUGGESTION_SYSTEM_PROMPT: &str = "You are a practical nutrition coach. \
Suggest what the user could eat for the rest of the day to meet their targets, \
using their preferred protein sources where possible. Keep it to two or three sentences. \
Reply with a JSON object of the form {\"suggestion\": \"<text>\"}.";

#[derive(Debug, Deserialize)]
struct ProteinChoicesReply {
    protein_choices: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MealSuggestionReply {
    suggestion: String,
}

/// What the meal suggester knows about the user's day.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionContext {
    pub remaining: Remaining,
    pub protein_sources: Vec<String>,
    #[serde(with = "crate::models::hhmm")]
    pub last_meal_time: NaiveTime,
    #[serde(with = "crate::models::hhmm")]
    pub current_time: NaiveTime,
    pub meals_today: Vec<String>,
}

/// Fetches protein candidates and meal ideas.
pub struct Suggester {
    client: Arc<dyn CompletionClient>,
}

impl Suggester {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Protein-source candidates, or the static list when the API fails.
    pub async fn protein_choices(&self) -> Outcome<Vec<String>> {
        let prompt = Prompt {
            kind: PromptKind::ProteinChoices,
            system: PROTEIN_CHOICES_SYSTEM_PROMPT.to_string(),
            user: "List protein sources.".to_string(),
        };

        let result = match self.client.complete(&prompt).await {
            Ok(reply) => parse_protein_choices(&reply),
            Err(e) => Err(e),
        };

        match result {
            Ok(choices) => Outcome::Fresh(choices),
            Err(e) => {
                tracing::warn!("Protein choice lookup failed, using static list: {}", e);
                Outcome::fallback(
                    fallback_protein_choices(),
                    format!("Could not load protein choices: {}", e),
                )
            }
        }
    }

    /// A suggestion for the rest of the day, or a static hint when the API fails.
    pub async fn suggest_meal(&self, context: &SuggestionContext) -> Outcome<String> {
        let user = match serde_json::to_string(context) {
            Ok(json) => json,
            Err(e) => {
                return Outcome::fallback(
                    fallback_suggestion(context),
                    format!("Could not build suggestion request: {}", e),
                )
            }
        };
        let prompt = Prompt {
            kind: PromptKind::MealSuggestion,
            system: MEAL_SUGGESTION_SYSTEM_PROMPT.to_string(),
            user,
        };

        let result = match self.client.complete(&prompt).await {
            Ok(reply) => parse_reply::<MealSuggestionReply>(&reply).and_then(|r| {
                let text = r.suggestion.trim().to_string();
                if text.is_empty() {
                    Err(LlmError::Malformed("empty suggestion".to_string()))
                } else {
                    Ok(text)
                }
            }),
            Err(e) => Err(e),
        };

        match result {
            Ok(text) => Outcome::Fresh(text),
            Err(e) => {
                tracing::warn!("Meal suggestion failed, using static hint: {}", e);
                Outcome::fallback(
                    fallback_suggestion(context),
                    format!("Could not get a meal suggestion: {}", e),
                )
            }
        }
    }
}

pub fn fallback_protein_choices() -> Vec<String> {
    FALLBACK_PROTEIN_CHOICES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn parse_protein_choices(reply: &str) -> Result<Vec<String>, LlmError> {
    let parsed: ProteinChoicesReply = parse_reply(reply)?;
    let mut choices: Vec<String> = Vec::new();
    for choice in parsed.protein_choices {
        let choice = choice.trim();
        if !choice.is_empty() && !choices.iter().any(|c| c.eq_ignore_ascii_case(choice)) {
            choices.push(choice.to_string());
        }
    }
    choices.truncate(MAX_PROTEIN_CHOICES);

    if choices.is_empty() {
        return Err(LlmError::Malformed("no protein choices".to_string()));
    }
    Ok(choices)
}

fn fallback_suggestion(context: &SuggestionContext) -> String {
    let protein = context.remaining.protein.round();
    if protein <= 0.0 {
        return format!(
            "You've reached today's protein goal. Keep the rest of today light, with about {:.0} kcal left.",
            context.remaining.calories
        );
    }

    let source = context
        .protein_sources
        .first()
        .map(String::as_str)
        .unwrap_or("a lean protein source");
    format!(
        "Aim for about {:.0} g of protein and {:.0} kcal before {}, for example a meal built around {}.",
        protein,
        context.remaining.calories,
        context.last_meal_time.format("%H:%M"),
        source.to_lowercase()
    )
}
