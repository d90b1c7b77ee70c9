//! # Nutrition Matcher
//!
//! This module maps an extracted food phrase to a nutrient profile: a fuzzy match
//! against the reference table first, the external lookup when the table has no
//! confident answer or when its answer looks like missing sugar data.

use crate::config::DEFAULT_MIN_MATCH_CONFIDENCE;
use crate::fuzzy::{preprocess, weighted_ratio};
use crate::meal_model::NutrientProfile;
use crate::nutrition_lookup::NutritionLookup;
use crate::nutrition_table::NutritionTable;
use std::sync::Arc;
use tracing::{debug, info};

/// Best table candidate for a phrase
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Matched table name; `None` below the minimum confidence
    pub matched_name: Option<String>,
    pub profile: Option<NutrientProfile>,
    /// Best score found (0-100), reported even without a match
    pub confidence: f64,
}

impl MatchResult {
    fn miss(confidence: f64) -> Self {
        Self {
            matched_name: None,
            profile: None,
            confidence,
        }
    }
}

/// Where the nutrient data for a phrase came from
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Local(NutrientProfile),
    Remote(NutrientProfile),
    Unmatched,
}

impl Resolution {
    pub fn profile(&self) -> Option<&NutrientProfile> {
        match self {
            Resolution::Local(profile) | Resolution::Remote(profile) => Some(profile),
            Resolution::Unmatched => None,
        }
    }
}

/// A zero-sugar row is suspect unless its name says the food is sugar free
pub fn is_suspect_zero_sugar(matched_name: &str, profile: &NutrientProfile) -> bool {
    profile.sugar == 0.0
        && !matched_name.contains("sugar free")
        && !matched_name.contains("zero sugar")
}

/// Fuzzy matcher over a shared table with an external fallback
pub struct NutritionMatcher {
    table: Arc<NutritionTable>,
    lookup: Arc<dyn NutritionLookup>,
    min_confidence: f64,
    /// Preprocessed table names, in table order
    candidates: Vec<String>,
}

impl NutritionMatcher {
    pub fn new(table: Arc<NutritionTable>, lookup: Arc<dyn NutritionLookup>) -> Self {
        Self::with_min_confidence(table, lookup, DEFAULT_MIN_MATCH_CONFIDENCE)
    }

    pub fn with_min_confidence(
        table: Arc<NutritionTable>,
        lookup: Arc<dyn NutritionLookup>,
        min_confidence: f64,
    ) -> Self {
        let candidates = table.names().map(preprocess).collect();
        Self {
            table,
            lookup,
            min_confidence,
            candidates,
        }
    }

    /// Score the phrase against every table name and keep the best
    ///
    /// Ties go to the earlier row.
    pub fn match_phrase(&self, phrase: &str) -> MatchResult {
        let query = preprocess(phrase);
        if query.is_empty() {
            return MatchResult::miss(0.0);
        }

        let mut best: Option<(usize, f64)> = None;
        for (i, candidate) in self.candidates.iter().enumerate() {
            let score = weighted_ratio(&query, candidate);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((i, score));
                if score >= 100.0 {
                    break;
                }
            }
        }

        let Some((i, confidence)) = best else {
            return MatchResult::miss(0.0);
        };
        if confidence < self.min_confidence {
            debug!(phrase, confidence, "No confident table match");
            return MatchResult::miss(confidence);
        }

        let profile = self.table.entries()[i].clone();
        MatchResult {
            matched_name: Some(profile.food_name.clone()),
            profile: Some(profile),
            confidence,
        }
    }

    /// Decide which profile, if any, counts for the phrase
    pub async fn resolve(&self, phrase: &str) -> Resolution {
        let result = self.match_phrase(phrase);

        let (Some(name), Some(profile)) = (result.matched_name, result.profile) else {
            info!(phrase, confidence = result.confidence, "Falling back to nutrition lookup");
            return match self.lookup.lookup(phrase).await {
                Some(remote) => Resolution::Remote(remote),
                None => Resolution::Unmatched,
            };
        };

        debug!(phrase, matched = %name, confidence = result.confidence, sugar = profile.sugar, "Table match");

        if is_suspect_zero_sugar(&name, &profile) {
            info!(phrase, matched = %name, "Zero sugar in table, checking nutrition lookup");
            if let Some(remote) = self.lookup.lookup(phrase).await {
                if remote.sugar > 0.0 {
                    return Resolution::Remote(remote);
                }
            }
        }

        Resolution::Local(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition_lookup::{DisabledLookup, StaticLookup};

    fn profile(name: &str, sugar: f64) -> NutrientProfile {
        NutrientProfile {
            food_name: name.to_string(),
            calories: 100.0,
            carbs: 20.0,
            sugar,
            ..Default::default()
        }
    }

    fn table() -> Arc<NutritionTable> {
        Arc::new(NutritionTable::from_profiles(vec![
            profile("cheesecake", 21.8),
            profile("brown rice", 0.0),
            profile("sugar free cola", 0.0),
            profile("rice", 0.1),
        ]))
    }

    #[test]
    fn test_exact_and_misspelled_match() {
        let matcher = NutritionMatcher::new(table(), Arc::new(DisabledLookup));
        let exact = matcher.match_phrase("Cheesecake");
        assert_eq!(exact.matched_name.as_deref(), Some("cheesecake"));
        assert_eq!(exact.confidence, 100.0);

        let typo = matcher.match_phrase("cheescake");
        assert_eq!(typo.matched_name.as_deref(), Some("cheesecake"));
        assert!(typo.confidence >= 80.0);
    }

    #[test]
    fn test_no_match_reports_confidence() {
        let matcher = NutritionMatcher::new(table(), Arc::new(DisabledLookup));
        let result = matcher.match_phrase("xyzzyfood123");
        assert!(result.matched_name.is_none());
        assert!(result.profile.is_none());
        assert!(result.confidence < 80.0);
    }

    #[test]
    fn test_empty_phrase_and_empty_table() {
        let matcher = NutritionMatcher::new(table(), Arc::new(DisabledLookup));
        assert_eq!(matcher.match_phrase("  !! ").confidence, 0.0);

        let empty = NutritionMatcher::new(Arc::new(NutritionTable::empty()), Arc::new(DisabledLookup));
        assert!(empty.match_phrase("apple").matched_name.is_none());
    }

    #[test]
    fn test_suspect_zero_sugar() {
        assert!(is_suspect_zero_sugar("brown rice", &profile("brown rice", 0.0)));
        assert!(!is_suspect_zero_sugar("brown rice", &profile("brown rice", 0.35)));
        assert!(!is_suspect_zero_sugar("sugar free cola", &profile("sugar free cola", 0.0)));
        assert!(!is_suspect_zero_sugar("zero sugar soda", &profile("zero sugar soda", 0.0)));
    }

    #[tokio::test]
    async fn test_resolve_local_without_lookup() {
        let lookup = Arc::new(StaticLookup::new());
        let matcher = NutritionMatcher::new(table(), lookup.clone());
        let resolution = matcher.resolve("apple").await;
        // patched apple has sugar 10
        assert_eq!(resolution.profile().map(|p| p.sugar), Some(10.0));
        assert!(matches!(resolution, Resolution::Local(_)));
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_zero_sugar_prefers_remote_sugar() {
        let lookup = Arc::new(StaticLookup::new().with_profile("brown rice", profile("brown rice", 0.7)));
        let matcher = NutritionMatcher::new(table(), lookup.clone());
        let resolution = matcher.resolve("brown rice").await;
        assert_eq!(resolution, Resolution::Remote(profile("brown rice", 0.7)));
        assert_eq!(lookup.calls(), vec!["brown rice".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_zero_sugar_keeps_local_when_remote_has_none() {
        let lookup = Arc::new(StaticLookup::new().with_profile("brown rice", profile("brown rice", 0.0)));
        let matcher = NutritionMatcher::new(table(), lookup.clone());
        let resolution = matcher.resolve("brown rice").await;
        assert_eq!(resolution, Resolution::Local(profile("brown rice", 0.0)));
    }

    #[tokio::test]
    async fn test_resolve_sugar_free_name_skips_lookup() {
        let lookup = Arc::new(StaticLookup::new());
        let matcher = NutritionMatcher::new(table(), lookup.clone());
        let resolution = matcher.resolve("sugar free cola").await;
        assert!(matches!(resolution, Resolution::Local(_)));
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_unmatched_and_remote() {
        let lookup = Arc::new(StaticLookup::new().with_profile("durian", profile("durian", 6.8)));
        let matcher = NutritionMatcher::new(table(), lookup.clone());
        assert_eq!(matcher.resolve("durian").await, Resolution::Remote(profile("durian", 6.8)));
        assert_eq!(matcher.resolve("xyzzyfood123").await, Resolution::Unmatched);
    }
}
