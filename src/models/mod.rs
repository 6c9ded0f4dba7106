//! Data models for the Tempo meal tracker.
//!
//! Persisted documents use the same field names on disk and over the API.

mod meal;
mod settings;

pub use meal::*;
pub use settings::*;
