//! Daily aggregation of logged meals against goals.
//!
//! Everything here is a pure function of its inputs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{sort_desc, Goals, Macros, Meal};

/// Summed macros for a set of meals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DailyTotals {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub calories: f64,
}

impl DailyTotals {
    fn add(mut self, macros: &Macros) -> Self {
        self.protein += macros.protein;
        self.carbs += macros.carbs;
        self.fat += macros.fat;
        self.calories = Macros::new(self.protein, self.carbs, self.fat).calories();
        self
    }
}

/// One calendar day of the history view.
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub totals: DailyTotals,
    pub meals: Vec<Meal>,
}

/// Zone whose calendar days meals are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayZone {
    /// Same offset all year round
    Fixed(FixedOffset),
    /// The host's zone; the offset follows daylight-saving changes per instant
    Local,
}

impl DayZone {
    /// `timestamp` expressed in this zone, with the offset in force at that instant.
    pub fn localize(&self, timestamp: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        match self {
            DayZone::Fixed(offset) => timestamp.with_timezone(offset),
            DayZone::Local => timestamp.with_timezone(&Local).fixed_offset(),
        }
    }

    /// Calendar day of `timestamp` in this zone.
    pub fn date_of(&self, timestamp: &DateTime<FixedOffset>) -> NaiveDate {
        self.localize(timestamp).date_naive()
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.localize(&Utc::now().fixed_offset())
    }
}

impl fmt::Display for DayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayZone::Fixed(offset) => write!(f, "UTC{}", offset),
            DayZone::Local => write!(f, "host local time"),
        }
    }
}

/// Meals eaten on `day` in `zone`. A meal at exactly midnight belongs to the day it starts.
pub fn select_by_day<'a>(meals: &'a [Meal], day: NaiveDate, zone: &DayZone) -> Vec<&'a Meal> {
    meals
        .iter()
        .filter(|m| zone.date_of(&m.timestamp) == day)
        .collect()
}

/// Sum of macros plus derived calories. Empty input gives all zeros.
pub fn totals<'a>(meals: impl IntoIterator<Item = &'a Meal>) -> DailyTotals {
    meals
        .into_iter()
        .fold(DailyTotals::default(), |acc, m| acc.add(&m.macros))
}

/// Group all meals by calendar day, newest day first, meals within a day newest first.
pub fn daily_history(meals: &[Meal], zone: &DayZone) -> Vec<DaySummary> {
    let mut days: BTreeMap<NaiveDate, Vec<Meal>> = BTreeMap::new();
    for meal in meals {
        days.entry(zone.date_of(&meal.timestamp))
            .or_default()
            .push(meal.clone());
    }

    days.into_iter()
        .rev()
        .map(|(date, mut meals)| {
            sort_desc(&mut meals);
            DaySummary {
                date,
                totals: totals(&meals),
                meals,
            }
        })
        .collect()
}

/// Thresholds, in percent of goal, used to classify progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalBands {
    /// Distance from 100% still counted as on target.
    pub tolerance_pct: f64,
    /// Percent above which intake is flagged as far over the goal.
    pub over_limit_pct: f64,
}

impl Default for GoalBands {
    fn default() -> Self {
        Self {
            tolerance_pct: 5.0,
            over_limit_pct: 120.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Under,
    OnTarget,
    Over,
    WayOver,
}

impl GoalBands {
    /// Tolerance must lie in `0..100` and the over limit at or above `100 + tolerance`.
    pub fn validate(&self) -> Result<(), String> {
        if !self.tolerance_pct.is_finite() || !(0.0..100.0).contains(&self.tolerance_pct) {
            return Err(format!(
                "Goal tolerance must be between 0 and 100 percent, got {}",
                self.tolerance_pct
            ));
        }
        if !self.over_limit_pct.is_finite() || self.over_limit_pct < 100.0 + self.tolerance_pct {
            return Err(format!(
                "Goal over limit must be at least {} percent, got {}",
                100.0 + self.tolerance_pct,
                self.over_limit_pct
            ));
        }
        Ok(())
    }

    pub fn classify(&self, percent: f64) -> Band {
        if percent < 100.0 - self.tolerance_pct {
            Band::Under
        } else if percent <= 100.0 + self.tolerance_pct {
            Band::OnTarget
        } else if percent <= self.over_limit_pct {
            Band::Over
        } else {
            Band::WayOver
        }
    }
}

/// Progress toward a single daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub actual: f64,
    pub goal: f64,
    /// `None` when the goal is zero.
    pub percent: Option<f64>,
    pub status: Option<Band>,
}

impl Progress {
    pub fn new(actual: f64, goal: f64, bands: &GoalBands) -> Self {
        let percent = (goal > 0.0).then(|| actual / goal * 100.0);
        Self {
            actual,
            goal,
            percent,
            status: percent.map(|p| bands.classify(p)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalProgress {
    pub calories: Progress,
    pub protein: Progress,
}

/// Compare a day's totals with the configured goals.
pub fn progress(totals: &DailyTotals, goals: &Goals, bands: &GoalBands) -> GoalProgress {
    GoalProgress {
        calories: Progress::new(totals.calories, goals.daily_calories as f64, bands),
        protein: Progress::new(totals.protein, goals.protein_goal as f64, bands),
    }
}

/// Calories and protein still available today.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Remaining {
    pub calories: f64,
    pub protein: f64,
}

pub fn remaining(totals: &DailyTotals, goals: &Goals) -> Remaining {
    Remaining {
        calories: (goals.daily_calories as f64 - totals.calories).max(0.0),
        protein: (goals.protein_goal as f64 - totals.protein).max(0.0),
    }
}
