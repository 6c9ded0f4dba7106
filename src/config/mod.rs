//! Configuration module for the Tempo backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;

use crate::aggregate::{DayZone, GoalBands};

/// Settings for the language model completion API.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Bearer key; without it every LLM call falls back immediately
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API, without trailing slash
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout.is_zero() {
            return Err("TEMPO_LLM_TIMEOUT_SECS must be at least 1".to_string());
        }
        if self.base_url.is_empty() {
            return Err("TEMPO_LLM_BASE_URL must not be empty".to_string());
        }
        Ok(())
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Directory holding the JSON documents
    pub data_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Zone used to assign meals to calendar days
    pub day_zone: DayZone,
    /// Thresholds for goal progress classification
    pub goal_bands: GoalBands,
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("TEMPO_API_PSK").ok().filter(|k| !k.is_empty());

        let data_dir = env::var("TEMPO_DATA_DIR")
            .unwrap_or_else(|_| "./data".to_string())
            .into();

        let bind_addr = env::var("TEMPO_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid TEMPO_BIND_ADDR format: {}", e))?;

        let log_level = env::var("TEMPO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let day_zone = match env::var("TEMPO_UTC_OFFSET") {
            Ok(raw) => parse_day_zone(&raw).ok_or_else(|| {
                format!("Invalid TEMPO_UTC_OFFSET {:?}, expected +HH:MM or local", raw)
            })?,
            Err(_) => DayZone::Local,
        };

        let defaults = GoalBands::default();
        let goal_bands = GoalBands {
            tolerance_pct: parse_var("TEMPO_GOAL_TOLERANCE_PCT", defaults.tolerance_pct)?,
            over_limit_pct: parse_var("TEMPO_GOAL_OVER_LIMIT_PCT", defaults.over_limit_pct)?,
        };
        goal_bands.validate()?;

        let llm = LlmConfig {
            api_key: env::var("TEMPO_LLM_API_KEY")
                .or_else(|_| env::var("OPENAI_API_KEY"))
                .ok()
                .filter(|k| !k.is_empty()),
            base_url: env::var("TEMPO_LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            model: env::var("TEMPO_LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            timeout: Duration::from_secs(parse_var("TEMPO_LLM_TIMEOUT_SECS", 30u64)?),
        };
        llm.validate()?;

        Ok(Self {
            api_psk,
            data_dir,
            bind_addr,
            log_level,
            day_zone,
            goal_bands,
            llm,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("Invalid {} value {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

/// `local` (or empty) selects the host zone; anything else must be a fixed offset.
pub fn parse_day_zone(raw: &str) -> Option<DayZone> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("local") {
        return Some(DayZone::Local);
    }
    parse_utc_offset(raw).map(DayZone::Fixed)
}

/// Parse `+HH:MM`, `-HH:MM` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
