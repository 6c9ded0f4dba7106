//! Goals, preferences and the protein-choice cache.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DAILY_CALORIES: i64 = 2000;
pub const DEFAULT_PROTEIN_GOAL: i64 = 150;

pub const DAILY_CALORIES_RANGE: std::ops::RangeInclusive<i64> = 1000..=5000;
pub const PROTEIN_GOAL_RANGE: std::ops::RangeInclusive<i64> = 0..=500;

pub fn default_last_meal_time() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_daily_calories() -> i64 {
    DEFAULT_DAILY_CALORIES
}

fn default_protein_goal() -> i64 {
    DEFAULT_PROTEIN_GOAL
}

/// Daily targets configured by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goals {
    #[serde(default = "default_daily_calories")]
    pub daily_calories: i64,
    #[serde(default = "default_protein_goal")]
    pub protein_goal: i64,
    #[serde(default = "default_last_meal_time", with = "hhmm")]
    pub last_meal_time: NaiveTime,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            daily_calories: DEFAULT_DAILY_CALORIES,
            protein_goal: DEFAULT_PROTEIN_GOAL,
            last_meal_time: default_last_meal_time(),
        }
    }
}

impl Goals {
    /// Check bounds before the record is persisted.
    pub fn validate(&self) -> Result<(), String> {
        if !DAILY_CALORIES_RANGE.contains(&self.daily_calories) {
            return Err(format!(
                "daily_calories must be between {} and {}",
                DAILY_CALORIES_RANGE.start(),
                DAILY_CALORIES_RANGE.end()
            ));
        }
        if !PROTEIN_GOAL_RANGE.contains(&self.protein_goal) {
            return Err(format!(
                "protein_goal must be between {} and {}",
                PROTEIN_GOAL_RANGE.start(),
                PROTEIN_GOAL_RANGE.end()
            ));
        }
        Ok(())
    }
}

/// Food preferences used when suggesting meals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub protein_sources: Vec<String>,
    #[serde(default = "default_last_meal_time", with = "hhmm")]
    pub last_meal_time: NaiveTime,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            protein_sources: Vec::new(),
            last_meal_time: default_last_meal_time(),
        }
    }
}

impl Preferences {
    /// Drop sources that are not in the current candidate list.
    pub fn retain_candidates(mut self, candidates: &[String]) -> Self {
        self.protein_sources
            .retain(|source| candidates.iter().any(|c| c == source));
        self
    }

    /// Remove repeated sources, keeping the first occurrence.
    pub fn dedup_sources(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.protein_sources.len());
        self.protein_sources.retain(|source| {
            if seen.contains(source) {
                false
            } else {
                seen.push(source.clone());
                true
            }
        });
        self
    }
}

/// Cached protein-source candidates: `{"protein_choices": [...]}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProteinChoices {
    #[serde(default)]
    pub protein_choices: Vec<String>,
}

/// Request body for replacing the goals record. Every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveGoalsRequest {
    pub daily_calories: i64,
    pub protein_goal: i64,
    #[serde(with = "hhmm")]
    pub last_meal_time: NaiveTime,
}

impl From<SaveGoalsRequest> for Goals {
    fn from(r: SaveGoalsRequest) -> Self {
        Self {
            daily_calories: r.daily_calories,
            protein_goal: r.protein_goal,
            last_meal_time: r.last_meal_time,
        }
    }
}

/// Request body for replacing the preferences record. Every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct SavePreferencesRequest {
    pub protein_sources: Vec<String>,
    #[serde(with = "hhmm")]
    pub last_meal_time: NaiveTime,
}

impl From<SavePreferencesRequest> for Preferences {
    fn from(r: SavePreferencesRequest) -> Self {
        Self {
            protein_sources: r.protein_sources,
            last_meal_time: r.last_meal_time,
        }
    }
}

/// Serde adapter for `HH:MM` time-of-day strings.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT)
            .map_err(|e| serde::de::Error::custom(format!("invalid HH:MM time {:?}: {}", raw, e)))
    }
}
