//! # Glycomeal
//!
//! Turns free-text meal descriptions into food/quantity pairs, matches them
//! against a reference nutrition table (with an external lookup fallback), sums
//! the nutrients and classifies the day's glycemic risk.

pub mod aggregation;
pub mod analysis;
pub mod annotation;
pub mod config;
pub mod db;
pub mod errors;
pub mod fuzzy;
pub mod meal_model;
pub mod meal_parser;
pub mod nutrition_lookup;
pub mod nutrition_matcher;
pub mod nutrition_table;
pub mod risk;
pub mod suggestions;
pub mod text_processing;
pub mod weekly_report;
