//! # Configuration Module
//!
//! This module defines configuration structures for meal analysis, including the
//! reference table location, the history database, external service credentials,
//! matching confidence and risk thresholds.

use std::env;
use std::time::Duration;

// Constants for analysis configuration
pub const DEFAULT_NUTRITION_CSV_PATH: &str = "nutrition_master.csv";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://nutrition.db";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MIN_MATCH_CONFIDENCE: f64 = 80.0;
pub const EDAMAM_NUTRITION_URL: &str = "https://api.edamam.com/api/nutrition-data";
pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const WEEKLY_HISTORY_DAYS: i64 = 7;

/// Configuration for the external nutrition lookup
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Edamam application id
    pub app_id: Option<String>,
    /// Edamam application key
    pub app_key: Option<String>,
    /// Nutrition-data endpoint
    pub base_url: String,
    /// Timeout for a single request
    pub timeout: Duration,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_key: None,
            base_url: EDAMAM_NUTRITION_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Configuration for the suggestion generator
#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    /// Groq API key
    pub api_key: Option<String>,
    /// Chat completions endpoint
    pub base_url: String,
    /// Model name sent with every request
    pub model: String,
    pub temperature: f32,
    /// Timeout for a single request
    pub timeout: Duration,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: GROQ_CHAT_URL.to_string(),
            model: GROQ_MODEL.to_string(),
            temperature: 0.7,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Sugar and carbohydrate limits used by the risk classifier, in grams per day
///
/// The carbohydrate limits are carried over as given configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskThresholds {
    /// Upper bound of the safe sugar zone (inclusive)
    pub safe_sugar: f64,
    /// Upper bound of the moderate sugar zone (inclusive)
    pub high_sugar: f64,
    /// Lower bound of the moderate carbohydrate zone (exclusive)
    pub moderate_carbs: f64,
    /// Upper bound of the moderate carbohydrate zone (inclusive)
    pub high_carbs: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            safe_sugar: 40.0,
            high_sugar: 65.0,
            moderate_carbs: 150.0,
            high_carbs: 250.0,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the reference nutrition CSV
    pub nutrition_csv_path: String,
    /// SQLite connection string for the history store
    pub database_url: String,
    /// Minimum fuzzy score (0-100) for a local match
    pub min_match_confidence: f64,
    pub lookup: LookupConfig,
    pub suggestions: SuggestionConfig,
    pub risk: RiskThresholds,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nutrition_csv_path: DEFAULT_NUTRITION_CSV_PATH.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            min_match_confidence: DEFAULT_MIN_MATCH_CONFIDENCE,
            lookup: LookupConfig::default(),
            suggestions: SuggestionConfig::default(),
            risk: RiskThresholds::default(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables
    ///
    /// Unset or unparseable variables fall back to their defaults. Call
    /// `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeout = Duration::from_secs(
            parse_env("HTTP_TIMEOUT_SECS").unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        );

        Self {
            nutrition_csv_path: env::var("NUTRITION_CSV_PATH")
                .unwrap_or(defaults.nutrition_csv_path),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            min_match_confidence: parse_env("MIN_MATCH_CONFIDENCE")
                .unwrap_or(defaults.min_match_confidence),
            lookup: LookupConfig {
                app_id: env::var("EDAMAM_APP_ID").ok(),
                app_key: env::var("EDAMAM_APP_KEY").ok(),
                timeout,
                ..defaults.lookup
            },
            suggestions: SuggestionConfig {
                api_key: env::var("GROQ_API_KEY").ok(),
                timeout,
                ..defaults.suggestions
            },
            risk: defaults.risk,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}
