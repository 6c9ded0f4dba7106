//! Meal API endpoints.

use axum::extract::{Path, Query, State};

use super::{success, ApiResult, AppJson, DateQuery};
use crate::aggregate::select_by_day;
use crate::errors::AppError;
use crate::models::{
    CreateMealRequest, EstimateMealRequest, Meal, PendingMeal, RemoveMealResponse,
};
use crate::AppState;

/// POST /api/meals/estimate - Estimate macros for a description without saving anything.
pub async fn estimate_meal(
    State(state): State<AppState>,
    AppJson(request): AppJson<EstimateMealRequest>,
) -> ApiResult<PendingMeal> {
    let description = request.description.trim().to_string();
    if description.is_empty() {
        return Err(AppError::Validation(
            "Meal description is required".to_string(),
        ));
    }

    let outcome = state.estimator.estimate(&description).await;
    success(outcome.into_pending(description))
}

/// GET /api/meals - List meals newest first, optionally for one day.
pub async fn list_meals(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Vec<Meal>> {
    let day = query.parse()?;
    let meals = state.with_repo(|repo| repo.list_meals()).await?;

    match day {
        Some(day) => success(
            select_by_day(&meals, day, &state.config.day_zone)
                .into_iter()
                .cloned()
                .collect(),
        ),
        None => success(meals),
    }
}

/// POST /api/meals - Confirm a pending meal and log it.
pub async fn create_meal(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateMealRequest>,
) -> ApiResult<Meal> {
    let description = request.description.trim();
    if description.is_empty() {
        return Err(AppError::Validation(
            "Meal description is required".to_string(),
        ));
    }
    if let Some(field) = request.macros.invalid_field() {
        return Err(AppError::Validation(format!(
            "Macro {} must be a non-negative number",
            field
        )));
    }

    let zone = state.config.day_zone;
    let now = state.now();
    let timestamp = request
        .timestamp
        .map(|ts| zone.localize(&ts))
        .unwrap_or(now);
    if zone.date_of(&timestamp) > zone.date_of(&now) {
        return Err(AppError::Validation(
            "Meals cannot be logged for a future day".to_string(),
        ));
    }

    let interpretation = request
        .interpretation
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    let meal = Meal::new(description, request.macros, interpretation, timestamp);
    success(state.with_repo(move |repo| repo.append(meal)).await?)
}

/// DELETE /api/meals/:id - Delete a meal. Unknown ids are not an error.
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<RemoveMealResponse> {
    let target = id.clone();
    let removed = state.with_repo(move |repo| repo.remove(&target)).await?;
    success(RemoveMealResponse { id, removed })
}

/// POST /api/meals/:id/repeat - Log an earlier meal again, eaten now.
pub async fn repeat_meal(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Meal> {
    let now = state.now();
    success(state.with_repo(move |repo| repo.repeat(&id, now)).await?)
}
