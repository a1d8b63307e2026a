//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::auth::lockout::{DEFAULT_LOCKOUT_SECONDS, DEFAULT_MAX_ATTEMPTS};
use crate::auth::DEFAULT_MATCH_THRESHOLD;
use crate::rewards::DEFAULT_REWARD_PROBABILITY;

const ACCOUNTS_FILE: &str = "accounts.json";
const TRANSACTIONS_FILE: &str = "transactions.json";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Directory holding the JSON snapshots; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,

    /// Chance that a transfer earns cashback
    pub reward_probability: f64,

    /// Wrong PINs allowed before the session locks
    pub pin_max_attempts: u32,

    pub pin_lockout_seconds: i64,

    /// Similarity a face match must exceed
    pub face_match_threshold: f64,

    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = parse_or("PORT", 5000u16)?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let data_dir = env::var("DATA_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        if environment == "production" && data_dir.is_none() {
            return Err(ConfigError::MissingEnv("DATA_DIR"));
        }

        let reward_probability = parse_or("REWARD_PROBABILITY", DEFAULT_REWARD_PROBABILITY)?;
        if !(0.0..=1.0).contains(&reward_probability) {
            return Err(ConfigError::InvalidValue("REWARD_PROBABILITY"));
        }

        let pin_max_attempts = parse_or("PIN_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        if pin_max_attempts == 0 {
            return Err(ConfigError::InvalidValue("PIN_MAX_ATTEMPTS"));
        }

        let pin_lockout_seconds = parse_or("PIN_LOCKOUT_SECONDS", DEFAULT_LOCKOUT_SECONDS)?;
        if pin_lockout_seconds < 0 {
            return Err(ConfigError::InvalidValue("PIN_LOCKOUT_SECONDS"));
        }

        let face_match_threshold = parse_or("FACE_MATCH_THRESHOLD", DEFAULT_MATCH_THRESHOLD)?;
        if !(-1.0..=1.0).contains(&face_match_threshold) {
            return Err(ConfigError::InvalidValue("FACE_MATCH_THRESHOLD"));
        }

        let log_json = match env::var("LOG_FORMAT") {
            Ok(format) if format.eq_ignore_ascii_case("json") => true,
            Ok(format) if format.eq_ignore_ascii_case("text") => false,
            Ok(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT")),
            Err(_) => false,
        };

        Ok(Self {
            host,
            port,
            environment,
            data_dir,
            reward_probability,
            pin_max_attempts,
            pin_lockout_seconds,
            face_match_threshold,
            log_json,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn accounts_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(ACCOUNTS_FILE))
    }

    pub fn transactions_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(TRANSACTIONS_FILE))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            environment: "development".to_string(),
            data_dir: None,
            reward_probability: DEFAULT_REWARD_PROBABILITY,
            pin_max_attempts: DEFAULT_MAX_ATTEMPTS,
            pin_lockout_seconds: DEFAULT_LOCKOUT_SECONDS,
            face_match_threshold: DEFAULT_MATCH_THRESHOLD,
            log_json: false,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
