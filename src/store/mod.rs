//! Flat JSON document persistence.
//!
//! Each record lives in its own file under the data directory and is
//! replaced whole on every save.

mod repository;

pub use repository::*;

use std::fs;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::errors::AppError;

pub const MEALS_FILE: &str = "meals.json";
pub const GOALS_FILE: &str = "goals.json";
pub const PREFERENCES_FILE: &str = "preferences.json";
pub const PROTEIN_CHOICES_FILE: &str = "protein_choices.json";

/// A single JSON document on disk holding one `T`.
#[derive(Debug, Clone)]
pub struct JsonDocument<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, writing and returning `T::default()` when it does not exist yet.
    pub fn load(&self) -> Result<T, AppError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("Initializing missing document {:?}", self.path);
                let record = T::default();
                self.save(&record)?;
                return Ok(record);
            }
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&raw).map_err(|e| {
            tracing::error!("Malformed document {:?}: {}", self.path, e);
            AppError::Storage(format!("Malformed document {}: {}", self.path.display(), e))
        })
    }

    /// Replace the document atomically: write a sibling temp file, sync it, rename over the target.
    pub fn save(&self, record: &T) -> Result<(), AppError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, record)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| {
            AppError::Storage(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        tracing::debug!("Saved document {:?}", self.path);
        Ok(())
    }
}
