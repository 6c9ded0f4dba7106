//! Repository over the four persisted documents.
//!
//! Read-modify-write sequences run under one mutex so concurrent requests
//! within the process cannot interleave their saves.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, FixedOffset};

use super::{
    JsonDocument, GOALS_FILE, MEALS_FILE, PREFERENCES_FILE, PROTEIN_CHOICES_FILE,
};
use crate::errors::AppError;
use crate::models::{Goals, Meal, MealLog, Preferences, ProteinChoices};

/// Access to meals, goals, preferences and the protein-choice cache.
pub struct Repository {
    meals: JsonDocument<MealLog>,
    goals: JsonDocument<Goals>,
    preferences: JsonDocument<Preferences>,
    protein_choices: JsonDocument<ProteinChoices>,
    write_lock: Mutex<()>,
}

impl Repository {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            meals: JsonDocument::new(data_dir.join(MEALS_FILE)),
            goals: JsonDocument::new(data_dir.join(GOALS_FILE)),
            preferences: JsonDocument::new(data_dir.join(PREFERENCES_FILE)),
            protein_choices: JsonDocument::new(data_dir.join(PROTEIN_CHOICES_FILE)),
            write_lock: Mutex::new(()),
        }
    }

    /// Load every document once, bootstrapping missing ones.
    ///
    /// Called at startup so a malformed document stops the process before it serves requests.
    pub fn verify(&self) -> Result<(), AppError> {
        let _guard = self.lock()?;
        let log = self.meals.load()?;
        self.goals.load()?;
        self.preferences.load()?;
        self.protein_choices.load()?;
        tracing::info!("Meal log holds {} meals", log.meals.len());
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, AppError> {
        self.write_lock
            .lock()
            .map_err(|_| AppError::Internal("Repository lock poisoned".to_string()))
    }

    // ==================== MEAL OPERATIONS ====================

    /// Read the whole meal log.
    pub fn load_all(&self) -> Result<MealLog, AppError> {
        let _guard = self.lock()?;
        self.meals.load()
    }

    /// Replace the whole meal log.
    pub fn save_all(&self, log: &MealLog) -> Result<(), AppError> {
        let _guard = self.lock()?;
        self.meals.save(log)
    }

    /// All meals, newest first.
    pub fn list_meals(&self) -> Result<Vec<Meal>, AppError> {
        Ok(self.load_all()?.sorted_desc())
    }

    /// Add a meal to the log.
    pub fn append(&self, meal: Meal) -> Result<Meal, AppError> {
        let _guard = self.lock()?;
        let mut log = self.meals.load()?;
        if log.contains(&meal.id) {
            return Err(AppError::Validation(format!(
                "Meal {} already exists",
                meal.id
            )));
        }
        log.meals.push(meal.clone());
        self.meals.save(&log)?;
        tracing::info!(id = %meal.id, "Logged meal");
        Ok(meal)
    }

    /// Remove a meal by id. Returns whether anything was removed; an unknown id is not an error.
    pub fn remove(&self, id: &str) -> Result<bool, AppError> {
        let _guard = self.lock()?;
        let mut log = self.meals.load()?;
        let before = log.meals.len();
        log.meals.retain(|m| m.id != id);

        if log.meals.len() == before {
            tracing::debug!(%id, "Remove requested for unknown meal");
            return Ok(false);
        }

        self.meals.save(&log)?;
        tracing::info!(%id, "Removed meal");
        Ok(true)
    }

    /// Log the content of an existing meal again as a new meal eaten at `now`.
    pub fn repeat(&self, id: &str, now: DateTime<FixedOffset>) -> Result<Meal, AppError> {
        let _guard = self.lock()?;
        let mut log = self.meals.load()?;
        let copy = log
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Meal {} not found", id)))?
            .repeat_at(now);

        log.meals.push(copy.clone());
        self.meals.save(&log)?;
        tracing::info!(source = %id, id = %copy.id, "Repeated meal");
        Ok(copy)
    }

    // ==================== SETTINGS OPERATIONS ====================

    pub fn load_goals(&self) -> Result<Goals, AppError> {
        let _guard = self.lock()?;
        self.goals.load()
    }

    /// Persist exactly `goals`, replacing the previous record.
    pub fn save_goals(&self, goals: &Goals) -> Result<(), AppError> {
        goals.validate().map_err(AppError::Validation)?;
        let _guard = self.lock()?;
        self.goals.save(goals)
    }

    /// Load preferences, keeping only sources present in `candidates`.
    pub fn load_preferences(&self, candidates: &ProteinChoices) -> Result<Preferences, AppError> {
        let _guard = self.lock()?;
        let stored = self.preferences.load()?;
        Ok(stored.retain_candidates(&candidates.protein_choices))
    }

    /// Persist exactly `preferences`, replacing the previous record.
    pub fn save_preferences(&self, preferences: &Preferences) -> Result<(), AppError> {
        let _guard = self.lock()?;
        self.preferences.save(preferences)
    }

    pub fn load_protein_choices(&self) -> Result<ProteinChoices, AppError> {
        let _guard = self.lock()?;
        self.protein_choices.load()
    }

    pub fn save_protein_choices(&self, choices: &ProteinChoices) -> Result<(), AppError> {
        let _guard = self.lock()?;
        self.protein_choices.save(choices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_last_meal_time, Macros};
    use chrono::{NaiveTime, TimeZone, Utc};
    use tempfile::TempDir;

    fn now() -> DateTime<FixedOffset> {
        Utc::now().fixed_offset()
    }

    fn meal(description: &str) -> Meal {
        Meal::new(description, Macros::new(20.0, 30.0, 10.0), None, now())
    }

    fn repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::new(dir.path());
        (dir, repo)
    }

    #[test]
    fn test_verify_bootstraps_all_documents() {
        let (dir, repo) = repo();
        repo.verify().unwrap();
        for file in [MEALS_FILE, GOALS_FILE, PREFERENCES_FILE, PROTEIN_CHOICES_FILE] {
            assert!(dir.path().join(file).exists(), "{} missing", file);
        }
    }

    #[test]
    fn test_verify_fails_on_malformed_goals() {
        let (dir, repo) = repo();
        std::fs::write(dir.path().join(GOALS_FILE), "not json").unwrap();
        assert!(matches!(repo.verify(), Err(AppError::Storage(_))));
    }

    #[test]
    fn test_append_then_remove_restores_log() {
        let (_dir, repo) = repo();
        repo.append(meal("eggs on toast")).unwrap();
        let before = repo.load_all().unwrap();

        let added = repo.append(meal("protein shake")).unwrap();
        assert_eq!(repo.load_all().unwrap().meals.len(), 2);

        assert!(repo.remove(&added.id).unwrap());
        assert_eq!(repo.load_all().unwrap(), before);
    }

    #[test]
    fn test_save_all_replaces_log() {
        let (_dir, repo) = repo();
        repo.append(meal("bagel")).unwrap();
        repo.append(meal("soup")).unwrap();

        let mut log = repo.load_all().unwrap();
        log.meals.retain(|m| m.description == "soup");
        repo.save_all(&log).unwrap();

        let reloaded = repo.load_all().unwrap();
        assert_eq!(reloaded, log);
        assert_eq!(reloaded.meals.len(), 1);

        repo.save_all(&repo.load_all().unwrap()).unwrap();
        assert_eq!(repo.load_all().unwrap(), log);
    }

    #[test]
    fn test_append_rejects_duplicate_id() {
        let (_dir, repo) = repo();
        let m = repo.append(meal("rice and beans")).unwrap();
        let err = repo.append(m).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(repo.load_all().unwrap().meals.len(), 1);
    }

    #[test]
    fn test_remove_absent_id_is_idempotent() {
        let (_dir, repo) = repo();
        repo.append(meal("salad")).unwrap();

        assert!(!repo.remove("no-such-id").unwrap());
        let once = repo.load_all().unwrap();
        assert!(!repo.remove("no-such-id").unwrap());
        let twice = repo.load_all().unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.meals.len(), 1);
    }

    #[test]
    fn test_repeat_creates_new_entry() {
        let (_dir, repo) = repo();
        let yesterday = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2026, 1, 5, 12, 30, 0)
            .unwrap();
        let source = repo
            .append(Meal::new(
                "chicken wrap",
                Macros::new(35.0, 40.0, 14.0),
                Some("grilled chicken in a flour tortilla".into()),
                yesterday,
            ))
            .unwrap();

        let at = now();
        let copy = repo.repeat(&source.id, at).unwrap();

        assert_ne!(copy.id, source.id);
        assert_eq!(copy.timestamp, at);
        assert_eq!(copy.description, source.description);
        assert_eq!(copy.macros, source.macros);

        let log = repo.load_all().unwrap();
        assert_eq!(log.meals.len(), 2);
        assert!(log.contains(&source.id));
        assert!(log.contains(&copy.id));
    }

    #[test]
    fn test_repeat_unknown_is_not_found() {
        let (_dir, repo) = repo();
        assert!(matches!(
            repo.repeat("missing", now()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_meals_newest_first() {
        let (_dir, repo) = repo();
        let tz = FixedOffset::east_opt(0).unwrap();
        for (hour, name) in [(9, "breakfast"), (20, "dinner"), (13, "lunch")] {
            repo.append(Meal::new(
                name,
                Macros::zero(),
                None,
                tz.with_ymd_and_hms(2026, 2, 1, hour, 0, 0).unwrap(),
            ))
            .unwrap();
        }
        let names: Vec<_> = repo
            .list_meals()
            .unwrap()
            .into_iter()
            .map(|m| m.description)
            .collect();
        assert_eq!(names, vec!["dinner", "lunch", "breakfast"]);
    }

    #[test]
    fn test_goals_full_replace_and_validation() {
        let (_dir, repo) = repo();
        assert_eq!(repo.load_goals().unwrap(), Goals::default());

        let goals = Goals {
            daily_calories: 2400,
            protein_goal: 180,
            last_meal_time: NaiveTime::from_hms_opt(20, 15, 0).unwrap(),
        };
        repo.save_goals(&goals).unwrap();
        assert_eq!(repo.load_goals().unwrap(), goals);

        let invalid = Goals {
            daily_calories: 200,
            ..goals.clone()
        };
        assert!(matches!(
            repo.save_goals(&invalid),
            Err(AppError::Validation(_))
        ));
        assert_eq!(repo.load_goals().unwrap(), goals);
    }

    #[test]
    fn test_preferences_filtered_by_candidates() {
        let (_dir, repo) = repo();
        let prefs = Preferences {
            protein_sources: vec!["Tofu".into(), "Eggs".into()],
            last_meal_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        };
        repo.save_preferences(&prefs).unwrap();

        let candidates = ProteinChoices {
            protein_choices: vec!["Eggs".into(), "Fish".into()],
        };
        let loaded = repo.load_preferences(&candidates).unwrap();
        assert_eq!(loaded.protein_sources, vec!["Eggs"]);
        assert_eq!(loaded.last_meal_time, prefs.last_meal_time);

        // Filtering is a read-time view; the stored record is untouched.
        let wider = ProteinChoices {
            protein_choices: vec!["Eggs".into(), "Tofu".into()],
        };
        assert_eq!(repo.load_preferences(&wider).unwrap(), prefs);
    }

    #[test]
    fn test_preferences_save_keeps_meal_time() {
        let (_dir, repo) = repo();
        let candidates = ProteinChoices {
            protein_choices: vec!["Paneer".into()],
        };
        let mut prefs = repo.load_preferences(&candidates).unwrap();
        assert_eq!(prefs.last_meal_time, default_last_meal_time());

        prefs.protein_sources = vec!["Paneer".into()];
        repo.save_preferences(&prefs).unwrap();

        let reloaded = repo.load_preferences(&candidates).unwrap();
        assert_eq!(reloaded.protein_sources, vec!["Paneer"]);
        assert_eq!(reloaded.last_meal_time, default_last_meal_time());
    }

    #[test]
    fn test_protein_choices_round_trip() {
        let (_dir, repo) = repo();
        assert!(repo.load_protein_choices().unwrap().protein_choices.is_empty());

        let choices = ProteinChoices {
            protein_choices: vec!["Chicken".into(), "Lentils".into()],
        };
        repo.save_protein_choices(&choices).unwrap();
        assert_eq!(repo.load_protein_choices().unwrap(), choices);
    }
}
