//! # Meal and Nutrient Data Model
//!
//! This module defines the data structures shared by the parsing, matching and
//! classification stages.
//!
//! ## Core Concepts
//!
//! - **ExtractedItem**: a food phrase with the quantity found next to it
//! - **NutrientProfile**: per-100g nutrient values for one reference food
//! - **Totals**: nutrient sums over a whole request
//! - **RiskAssessment**: the glycemic risk tier derived from the totals
//!
//! ## Usage
//!
//! ```rust
//! use glycomeal::meal_model::{ExtractedItem, MealSlots};
//!
//! let item = ExtractedItem::new("slices of cheesecake", 2.0);
//! assert_eq!(item.quantity, 2.0);
//!
//! let meals = MealSlots {
//!     breakfast: "oatmeal".to_string(),
//!     dinner: "rice".to_string(),
//!     ..Default::default()
//! };
//! assert_eq!(meals.combined_text(), "oatmeal   rice");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A food phrase extracted from meal text together with its quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    /// Lowercase, stopword-free food phrase (e.g., "slices of cheesecake")
    pub food_name: String,
    /// Number of portions; 1.0 when no explicit number was found
    pub quantity: f64,
}

impl ExtractedItem {
    pub fn new(food_name: impl Into<String>, quantity: f64) -> Self {
        Self {
            food_name: food_name.into(),
            quantity,
        }
    }
}

impl fmt::Display for ExtractedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.quantity, self.food_name)
    }
}

/// Nutrient values for one food, per 100g-equivalent
///
/// Missing values deserialize as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientProfile {
    pub food_name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub sugar: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
}

/// Running nutrient totals for one analysis request
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(default)]
    pub total_calories: f64,
    #[serde(default)]
    pub total_carbs: f64,
    #[serde(default)]
    pub total_sugar: f64,
    #[serde(default)]
    pub total_protein: f64,
    #[serde(default)]
    pub total_fat: f64,
    #[serde(default)]
    pub total_fiber: f64,
}

/// Glycemic risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Safe,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "Safe",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Safe" => Ok(RiskLevel::Safe),
            "Moderate" => Ok(RiskLevel::Moderate),
            "High" => Ok(RiskLevel::High),
            other => Err(format!("Unknown risk level: {other}")),
        }
    }
}

/// Risk tier plus a human-readable explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub reason: String,
}

/// Raw meal text per slot of the day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealSlots {
    #[serde(default)]
    pub breakfast: String,
    #[serde(default)]
    pub lunch: String,
    #[serde(default)]
    pub snacks: String,
    #[serde(default)]
    pub dinner: String,
}

impl MealSlots {
    /// All slots joined with single spaces, in breakfast/lunch/snacks/dinner order
    pub fn combined_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.breakfast, self.lunch, self.snacks, self.dinner
        )
    }

    /// Set a slot by name; returns `false` for an unknown slot
    pub fn set_slot(&mut self, slot: &str, text: &str) -> bool {
        let target = match slot.trim().to_lowercase().as_str() {
            "breakfast" => &mut self.breakfast,
            "lunch" => &mut self.lunch,
            "snacks" | "snack" => &mut self.snacks,
            "dinner" => &mut self.dinner,
            _ => return false,
        };
        *target = text.to_string();
        true
    }
}

/// Result of analyzing one request's meal text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealAnalysis {
    /// Items in extraction order
    pub items: Vec<ExtractedItem>,
    /// Totals rounded to two decimals
    pub totals: Totals,
    pub risk: RiskAssessment,
    /// Phrases that matched neither locally nor remotely
    pub unmatched: Vec<String>,
}
