//! # Reference Nutrition Table
//!
//! This module loads the reference nutrition dataset (per-100g values keyed by a
//! lowercase food name) from CSV.
//!
//! ## Loading rules
//!
//! - Header names are trimmed and lowercased, so `" Food_Name "` is `food_name`
//! - Only `food_name` is required; missing nutrient columns and empty, unparseable
//!   or negative cells become `0.0`
//! - A repeated food name replaces the earlier row in place
//! - A fixed override patch set is applied after reading: patched foods replace
//!   existing rows or are appended
//!
//! [`NutritionTable::load`] never fails: any error is logged and an empty table is
//! returned, so every later match misses and falls through to the external lookup.

use crate::errors::ServiceError;
use crate::meal_model::NutrientProfile;
use log::{error, info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Curated values that override the dataset, as
/// `(food, calories, carbs, sugar, fiber, protein, fat)`
const PATCH_DATA: [(&str, f64, f64, f64, f64, f64, f64); 9] = [
    ("apple", 52.0, 14.0, 10.0, 2.4, 0.3, 0.2),
    ("banana", 89.0, 23.0, 12.0, 2.6, 1.1, 0.3),
    ("orange", 47.0, 12.0, 9.0, 2.4, 0.9, 0.1),
    ("grapes", 69.0, 18.0, 15.0, 0.9, 0.7, 0.2),
    ("strawberry", 32.0, 7.7, 4.9, 2.0, 0.7, 0.3),
    ("oatmeal", 68.0, 12.0, 0.5, 1.7, 2.4, 1.4),
    ("white bread", 265.0, 49.0, 5.0, 2.7, 9.0, 3.2),
    ("milk", 50.0, 4.8, 5.0, 0.0, 3.4, 2.0),
    ("egg", 155.0, 1.1, 1.1, 0.0, 13.0, 11.0),
];

/// The patched profiles in table order
pub fn patch_profiles() -> Vec<NutrientProfile> {
    PATCH_DATA
        .iter()
        .map(
            |&(name, calories, carbs, sugar, fiber, protein, fat)| NutrientProfile {
                food_name: name.to_string(),
                calories,
                carbs,
                sugar,
                fiber,
                protein,
                fat,
            },
        )
        .collect()
}

/// Column positions resolved from the normalized header row
struct ColumnIndex {
    food_name: usize,
    calories: Option<usize>,
    carbs: Option<usize>,
    sugar: Option<usize>,
    fiber: Option<usize>,
    protein: Option<usize>,
    fat: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ServiceError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |column: &str| names.iter().position(|name| name == column);

        let food_name = find("food_name")
            .ok_or_else(|| ServiceError::DataLoad("missing food_name column".to_string()))?;

        Ok(Self {
            food_name,
            calories: find("calories"),
            carbs: find("carbs"),
            sugar: find("sugar"),
            fiber: find("fiber"),
            protein: find("protein"),
            fat: find("fat"),
        })
    }
}

fn cell_value(record: &csv::StringRecord, column: Option<usize>) -> f64 {
    column
        .and_then(|i| record.get(i))
        .and_then(|cell| cell.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(0.0)
}

/// Read-only food-name to nutrient-profile table
#[derive(Debug, Clone, Default)]
pub struct NutritionTable {
    entries: Vec<NutrientProfile>,
    index: HashMap<String, usize>,
}

impl NutritionTable {
    /// A table with no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from profiles, normalizing names and applying the patch set
    pub fn from_profiles(profiles: impl IntoIterator<Item = NutrientProfile>) -> Self {
        let mut table = Self::empty();
        for profile in profiles {
            table.upsert(profile);
        }
        table.apply_patches();
        table
    }

    /// Load the table from a CSV file, returning an empty table on any failure
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(table) => {
                info!("Loaded {} foods from {}", table.len(), path.display());
                table
            }
            Err(e) => {
                error!("Error loading nutrition data from {}: {}", path.display(), e);
                Self::empty()
            }
        }
    }

    /// Load the table from a CSV file
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ServiceError::DataLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_reader(file)
    }

    /// Parse CSV data from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ServiceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = ColumnIndex::from_headers(csv_reader.headers()?)?;
        let mut table = Self::empty();
        let mut skipped = 0usize;

        for record in csv_reader.records() {
            let record = record?;
            let food_name = record
                .get(columns.food_name)
                .unwrap_or("")
                .trim()
                .to_lowercase();
            if food_name.is_empty() {
                skipped += 1;
                continue;
            }

            table.upsert(NutrientProfile {
                food_name,
                calories: cell_value(&record, columns.calories),
                carbs: cell_value(&record, columns.carbs),
                sugar: cell_value(&record, columns.sugar),
                fiber: cell_value(&record, columns.fiber),
                protein: cell_value(&record, columns.protein),
                fat: cell_value(&record, columns.fat),
            });
        }

        if skipped > 0 {
            warn!("Skipped {} rows without a food name", skipped);
        }

        table.apply_patches();
        Ok(table)
    }

    /// Insert a profile, replacing any row with the same normalized name
    fn upsert(&mut self, mut profile: NutrientProfile) {
        profile.food_name = profile.food_name.trim().to_lowercase();
        match self.index.get(&profile.food_name) {
            Some(&i) => self.entries[i] = profile,
            None => {
                self.index
                    .insert(profile.food_name.clone(), self.entries.len());
                self.entries.push(profile);
            }
        }
    }

    fn apply_patches(&mut self) {
        for profile in patch_profiles() {
            self.upsert(profile);
        }
    }

    /// Exact lookup by (case-insensitive) food name
    pub fn get(&self, food_name: &str) -> Option<&NutrientProfile> {
        self.index
            .get(&food_name.trim().to_lowercase())
            .map(|&i| &self.entries[i])
    }

    /// All rows in load order
    pub fn entries(&self) -> &[NutrientProfile] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.food_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
