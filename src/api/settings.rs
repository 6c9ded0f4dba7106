//! Goals, preferences and suggestion endpoints.

use axum::extract::State;
use serde::Serialize;

use super::{success, ApiResult, AppJson};
use crate::aggregate::{remaining, select_by_day, totals, Remaining};
use crate::errors::AppError;
use crate::llm::SuggestionContext;
use crate::models::{
    Goals, Preferences, ProteinChoices, SaveGoalsRequest, SavePreferencesRequest,
};
use crate::AppState;

/// Protein-source candidates plus a notice when they come from the static list.
#[derive(Debug, Serialize)]
pub struct ProteinChoicesResponse {
    pub protein_choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MealSuggestionResponse {
    pub suggestion: String,
    pub remaining: Remaining,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/goals
pub async fn get_goals(State(state): State<AppState>) -> ApiResult<Goals> {
    success(state.with_repo(|repo| repo.load_goals()).await?)
}

/// PUT /api/goals - Replace the goals record. Every field must be supplied.
pub async fn put_goals(
    State(state): State<AppState>,
    AppJson(request): AppJson<SaveGoalsRequest>,
) -> ApiResult<Goals> {
    let goals = Goals::from(request);
    let saved = goals.clone();
    state
        .with_repo(move |repo| repo.save_goals(&saved))
        .await?;
    tracing::info!(
        daily_calories = goals.daily_calories,
        protein_goal = goals.protein_goal,
        "Goals updated"
    );
    success(goals)
}

/// GET /api/preferences - Stored preferences limited to the current candidates.
pub async fn get_preferences(State(state): State<AppState>) -> ApiResult<Preferences> {
    let (choices, _) = cached_protein_choices(&state).await?;
    success(
        state
            .with_repo(move |repo| repo.load_preferences(&choices))
            .await?,
    )
}

/// PUT /api/preferences - Replace the preferences record. Every field must be supplied.
pub async fn put_preferences(
    State(state): State<AppState>,
    AppJson(request): AppJson<SavePreferencesRequest>,
) -> ApiResult<Preferences> {
    let preferences = Preferences::from(request).dedup_sources();
    let (choices, _) = cached_protein_choices(&state).await?;

    let unknown: Vec<String> = preferences
        .protein_sources
        .iter()
        .filter(|source| !choices.protein_choices.contains(*source))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::UnknownProteinSources(unknown));
    }

    let saved = preferences.clone();
    state
        .with_repo(move |repo| repo.save_preferences(&saved))
        .await?;
    tracing::info!(
        sources = preferences.protein_sources.len(),
        "Preferences updated"
    );
    success(preferences)
}

/// GET /api/protein-choices - Cached candidates, fetched on first use.
pub async fn get_protein_choices(
    State(state): State<AppState>,
) -> ApiResult<ProteinChoicesResponse> {
    let (choices, error) = cached_protein_choices(&state).await?;
    success(ProteinChoicesResponse {
        protein_choices: choices.protein_choices,
        error,
    })
}

/// POST /api/protein-choices/refresh - Fetch new candidates and replace the cache.
pub async fn refresh_protein_choices(
    State(state): State<AppState>,
) -> ApiResult<ProteinChoicesResponse> {
    let (choices, error) = fetch_protein_choices(&state).await?;
    success(ProteinChoicesResponse {
        protein_choices: choices.protein_choices,
        error,
    })
}

/// POST /api/suggestions/meal - Suggest what to eat for the rest of today.
pub async fn suggest_meal(State(state): State<AppState>) -> ApiResult<MealSuggestionResponse> {
    let zone = state.config.day_zone;
    let now = state.now();

    let (choices, _) = cached_protein_choices(&state).await?;
    let (meals, goals, preferences) = state
        .with_repo(move |repo| {
            Ok((
                repo.list_meals()?,
                repo.load_goals()?,
                repo.load_preferences(&choices)?,
            ))
        })
        .await?;

    let today = select_by_day(&meals, zone.date_of(&now), &zone);
    let left = remaining(&totals(today.iter().copied()), &goals);

    let context = SuggestionContext {
        remaining: left,
        protein_sources: preferences.protein_sources,
        last_meal_time: preferences.last_meal_time,
        current_time: now.time(),
        meals_today: today.iter().map(|m| m.description.clone()).collect(),
    };

    let (suggestion, error) = state.suggester.suggest_meal(&context).await.into_parts();
    success(MealSuggestionResponse {
        suggestion,
        remaining: left,
        error,
    })
}

/// The cached candidate list, fetching it first when the cache is empty.
async fn cached_protein_choices(
    state: &AppState,
) -> Result<(ProteinChoices, Option<String>), AppError> {
    let cached = state
        .with_repo(|repo| repo.load_protein_choices())
        .await?;
    if !cached.protein_choices.is_empty() {
        return Ok((cached, None));
    }
    fetch_protein_choices(state).await
}

/// Ask the suggester for candidates. Only fresh lists are cached, so a failed
/// lookup is retried on the next request.
async fn fetch_protein_choices(
    state: &AppState,
) -> Result<(ProteinChoices, Option<String>), AppError> {
    let outcome = state.suggester.protein_choices().await;
    if !outcome.is_fallback() {
        let fresh = ProteinChoices {
            protein_choices: outcome.value().clone(),
        };
        state
            .with_repo(move |repo| repo.save_protein_choices(&fresh))
            .await?;
        tracing::info!(count = outcome.value().len(), "Protein choices cached");
    }

    let (protein_choices, error) = outcome.into_parts();
    Ok((ProteinChoices { protein_choices }, error))
}
