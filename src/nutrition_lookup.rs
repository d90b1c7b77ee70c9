//! # External Nutrition Lookup
//!
//! This module resolves food phrases the reference table cannot answer (or answers
//! with suspicious zero sugar) through the Edamam nutrition-data API.
//!
//! ## Behavior
//!
//! - Without usable credentials no request is sent
//! - Queries without a leading number get a default quantity of one ("1 kiwi")
//! - One GET request per lookup, bounded by the configured timeout, no retries
//! - Every failure is logged and reported as `None`
//!
//! [`StaticLookup`] answers from an in-memory map and records its calls, for tests
//! and offline runs.

use crate::config::LookupConfig;
use crate::errors::ServiceError;
use crate::meal_model::NutrientProfile;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Marker found in credentials copied unchanged from a sample `.env`
const PLACEHOLDER_MARKER: &str = "YOUR_";

/// Source of nutrient data for phrases outside the reference table
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    /// Look up one phrase; `None` when no usable data is available
    async fn lookup(&self, query: &str) -> Option<NutrientProfile>;
}

/// Both credentials are present, non-blank and not placeholders
pub fn has_usable_credentials(app_id: Option<&str>, app_key: Option<&str>) -> bool {
    let usable = |value: Option<&str>| {
        value.is_some_and(|v| !v.trim().is_empty() && !v.contains(PLACEHOLDER_MARKER))
    };
    usable(app_id) && usable(app_key)
}

/// Prefix `"1 "` unless the query already starts with a digit
///
/// The nutrition-data endpoint returns nothing for ingredient lines without a
/// quantity.
pub fn with_default_quantity(query: &str) -> String {
    let query = query.trim();
    if query.starts_with(|c: char| c.is_ascii_digit()) {
        query.to_string()
    } else {
        format!("1 {query}")
    }
}

fn nutrient_quantity(nutrients: &serde_json::Map<String, Value>, code: &str) -> f64 {
    nutrients
        .get(code)
        .and_then(|n| n.get("quantity"))
        .and_then(Value::as_f64)
        .filter(|q| q.is_finite() && *q >= 0.0)
        .unwrap_or(0.0)
}

/// Extract a profile from a nutrition-data response body
///
/// Reads `totalNutrients` when non-empty, otherwise the nutrients of the first
/// parsed ingredient. With neither, a positive top-level `calories` yields a
/// calories-only profile.
pub fn profile_from_payload(query: &str, payload: &Value) -> Option<NutrientProfile> {
    let non_empty_map = |value: Option<&Value>| {
        value
            .and_then(Value::as_object)
            .filter(|map| !map.is_empty())
            .cloned()
    };

    let nutrients = non_empty_map(payload.get("totalNutrients")).or_else(|| {
        non_empty_map(
            payload
                .get("ingredients")
                .and_then(|i| i.get(0))
                .and_then(|i| i.get("parsed"))
                .and_then(|p| p.get(0))
                .and_then(|p| p.get("nutrients")),
        )
    });

    if let Some(nutrients) = nutrients {
        return Some(NutrientProfile {
            food_name: query.to_string(),
            calories: nutrient_quantity(&nutrients, "ENERC_KCAL"),
            protein: nutrient_quantity(&nutrients, "PROCNT"),
            fat: nutrient_quantity(&nutrients, "FAT"),
            carbs: nutrient_quantity(&nutrients, "CHOCDF"),
            fiber: nutrient_quantity(&nutrients, "FIBTG"),
            sugar: nutrient_quantity(&nutrients, "SUGAR"),
        });
    }

    let calories = payload.get("calories").and_then(Value::as_f64)?;
    (calories > 0.0).then(|| NutrientProfile {
        food_name: query.to_string(),
        calories,
        ..Default::default()
    })
}

/// Edamam nutrition-data API client
pub struct EdamamClient {
    config: LookupConfig,
    http_client: reqwest::Client,
}

impl EdamamClient {
    /// Create a client whose requests time out after `config.timeout`
    pub fn new(config: LookupConfig) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn has_credentials(&self) -> bool {
        has_usable_credentials(self.config.app_id.as_deref(), self.config.app_key.as_deref())
    }

    /// Perform one request and return the profile it carries, if any
    pub async fn fetch(&self, query: &str) -> Result<Option<NutrientProfile>, ServiceError> {
        let (Some(app_id), Some(app_key)) = (&self.config.app_id, &self.config.app_key) else {
            return Err(ServiceError::MissingCredentials(
                "EDAMAM_APP_ID/EDAMAM_APP_KEY".to_string(),
            ));
        };
        if !self.has_credentials() {
            return Err(ServiceError::MissingCredentials(
                "EDAMAM_APP_ID/EDAMAM_APP_KEY".to_string(),
            ));
        }

        let ingredient = with_default_quantity(query);
        debug!(query, ingredient = %ingredient, "Sending nutrition lookup");

        let response = self
            .http_client
            .get(&self.config.base_url)
            .query(&[
                ("app_id", app_id.as_str()),
                ("app_key", app_key.as_str()),
                ("ingr", ingredient.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body)?;
        Ok(profile_from_payload(query, &payload))
    }
}

#[async_trait]
impl NutritionLookup for EdamamClient {
    async fn lookup(&self, query: &str) -> Option<NutrientProfile> {
        match self.fetch(query).await {
            Ok(Some(profile)) => {
                info!(query, sugar = profile.sugar, calories = profile.calories, "Nutrition lookup succeeded");
                Some(profile)
            }
            Ok(None) => {
                warn!(query, "Nutrition lookup returned no usable data");
                None
            }
            Err(e) => {
                warn!(query, error = %e, "Nutrition lookup failed");
                None
            }
        }
    }
}

/// Lookup used when no credentials are configured; never answers
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledLookup;

#[async_trait]
impl NutritionLookup for DisabledLookup {
    async fn lookup(&self, query: &str) -> Option<NutrientProfile> {
        debug!(query, "Nutrition lookup disabled");
        None
    }
}

/// In-memory lookup keyed by exact query text
#[derive(Debug, Default)]
pub struct StaticLookup {
    profiles: HashMap<String, NutrientProfile>,
    calls: Mutex<Vec<String>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `profile`
    pub fn with_profile(mut self, query: impl Into<String>, profile: NutrientProfile) -> Self {
        self.profiles.insert(query.into(), profile);
        self
    }

    /// Every query received so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NutritionLookup for StaticLookup {
    async fn lookup(&self, query: &str) -> Option<NutrientProfile> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(query.to_string());
        }
        self.profiles.get(query).cloned()
    }
}
