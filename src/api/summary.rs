//! Daily summary and history endpoints.

use axum::extract::{Query, State};
use chrono::NaiveDate;
use serde::Serialize;

use super::{success, ApiResult, DateQuery};
use crate::aggregate::{
    daily_history, progress, select_by_day, totals, DailyTotals, DaySummary, GoalProgress,
};
use crate::models::{Goals, Meal};
use crate::AppState;

/// One day's totals measured against the goals.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub date: NaiveDate,
    pub totals: DailyTotals,
    pub goals: Goals,
    pub progress: GoalProgress,
    pub meals: Vec<Meal>,
}

/// GET /api/summary - Totals and goal progress for a day (default today).
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<SummaryResponse> {
    let zone = state.config.day_zone;
    let date = match query.parse()? {
        Some(date) => date,
        None => zone.date_of(&state.now()),
    };

    let (meals, goals) = state
        .with_repo(|repo| Ok((repo.list_meals()?, repo.load_goals()?)))
        .await?;

    let day_meals: Vec<Meal> = select_by_day(&meals, date, &zone)
        .into_iter()
        .cloned()
        .collect();
    let day_totals = totals(&day_meals);

    success(SummaryResponse {
        date,
        totals: day_totals,
        progress: progress(&day_totals, &goals, &state.config.goal_bands),
        goals,
        meals: day_meals,
    })
}

/// GET /api/history - Per-day totals for every logged day, newest first.
pub async fn get_history(State(state): State<AppState>) -> ApiResult<Vec<DaySummary>> {
    let log = state.with_repo(|repo| repo.load_all()).await?;
    success(daily_history(&log.meals, &state.config.day_zone))
}
