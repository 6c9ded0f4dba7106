//! Meal model and the documents built around it.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Macronutrient breakdown in grams.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Macros {
    pub fn new(protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            protein,
            carbs,
            fat,
        }
    }

    /// All-zero breakdown substituted when estimation fails.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Energy in kcal: 4 per gram of protein and carbs, 9 per gram of fat.
    pub fn calories(&self) -> f64 {
        self.protein * 4.0 + self.carbs * 4.0 + self.fat * 9.0
    }

    /// Returns the name of the first field that is negative or not finite.
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
        ]
        .into_iter()
        .find(|(_, grams)| !grams.is_finite() || *grams < 0.0)
        .map(|(name, _)| name)
    }
}

/// One logged eating event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub timestamp: DateTime<FixedOffset>,
    pub description: String,
    pub macros: Macros,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

impl Meal {
    /// Create a meal with a freshly generated id.
    pub fn new(
        description: impl Into<String>,
        macros: Macros,
        interpretation: Option<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            description: description.into(),
            macros,
            interpretation,
        }
    }

    /// Clone of this meal's content as a new entry eaten at `now`.
    pub fn repeat_at(&self, now: DateTime<FixedOffset>) -> Self {
        Self::new(
            self.description.clone(),
            self.macros,
            self.interpretation.clone(),
            now,
        )
    }
}

/// The meals document: `{"meals": [...]}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MealLog {
    #[serde(default)]
    pub meals: Vec<Meal>,
}

impl MealLog {
    pub fn contains(&self, id: &str) -> bool {
        self.meals.iter().any(|m| m.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Meal> {
        self.meals.iter().find(|m| m.id == id)
    }

    /// Meals newest first. Equal timestamps are ordered by id.
    pub fn sorted_desc(&self) -> Vec<Meal> {
        let mut meals = self.meals.clone();
        sort_desc(&mut meals);
        meals
    }
}

/// Sort meals newest first, breaking timestamp ties by id.
pub fn sort_desc(meals: &mut [Meal]) {
    meals.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Request body for estimating a meal's macros.
#[derive(Debug, Clone, Deserialize)]
pub struct EstimateMealRequest {
    pub description: String,
}

/// An estimate shown to the caller before the meal is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingMeal {
    pub description: String,
    pub macros: Macros,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
    /// Notification for the user when the estimate fell back to zero macros.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request body for confirming a pending meal.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMealRequest {
    pub description: String,
    pub macros: Macros,
    #[serde(default)]
    pub interpretation: Option<String>,
    /// When the meal was eaten; defaults to now.
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// Response body for meal deletion.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveMealResponse {
    pub id: String,
    pub removed: bool,
}
