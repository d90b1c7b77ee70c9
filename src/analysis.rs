//! # Meal Analysis
//!
//! This module runs one analysis request end to end: annotate the text, extract
//! items, resolve each item in order, accumulate totals, round once and classify.
//!
//! ## Usage
//!
//! ```rust
//! use glycomeal::analysis::MealAnalyzer;
//! use glycomeal::annotation::RuleBasedAnnotator;
//! use glycomeal::meal_model::RiskLevel;
//! use glycomeal::nutrition_lookup::DisabledLookup;
//! use glycomeal::nutrition_matcher::NutritionMatcher;
//! use glycomeal::nutrition_table::NutritionTable;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let table = Arc::new(NutritionTable::from_profiles(Vec::new()));
//! let matcher = NutritionMatcher::new(table, Arc::new(DisabledLookup));
//! let analyzer = MealAnalyzer::new(RuleBasedAnnotator::new(), matcher);
//!
//! let analysis = analyzer.analyze_text("an apple and a banana").await;
//! assert_eq!(analysis.totals.total_sugar, 22.0);
//! assert_eq!(analysis.risk.level, RiskLevel::Safe);
//! # }
//! ```

use crate::aggregation::accumulate;
use crate::annotation::Annotator;
use crate::config::RiskThresholds;
use crate::meal_model::{MealAnalysis, MealSlots, Totals};
use crate::meal_parser::parse_meals;
use crate::nutrition_matcher::{NutritionMatcher, Resolution};
use crate::risk::classify_with;
use tracing::{debug, info};

/// Analysis pipeline over one annotator and one matcher
pub struct MealAnalyzer<A: Annotator> {
    annotator: A,
    matcher: NutritionMatcher,
    thresholds: RiskThresholds,
}

impl<A: Annotator> MealAnalyzer<A> {
    pub fn new(annotator: A, matcher: NutritionMatcher) -> Self {
        Self::with_thresholds(annotator, matcher, RiskThresholds::default())
    }

    pub fn with_thresholds(annotator: A, matcher: NutritionMatcher, thresholds: RiskThresholds) -> Self {
        Self {
            annotator,
            matcher,
            thresholds,
        }
    }

    /// Analyze free meal text; never fails
    ///
    /// Phrases that resolve to nothing are listed in `unmatched` and add nothing
    /// to the totals.
    pub async fn analyze_text(&self, text: &str) -> MealAnalysis {
        let items = parse_meals(&self.annotator, text);
        let mut totals = Totals::default();
        let mut unmatched = Vec::new();

        for item in &items {
            match self.matcher.resolve(&item.food_name).await {
                Resolution::Local(profile) | Resolution::Remote(profile) => {
                    debug!(food = %item.food_name, quantity = item.quantity, source = %profile.food_name, "Accumulating item");
                    accumulate(&mut totals, &profile, item.quantity);
                }
                Resolution::Unmatched => unmatched.push(item.food_name.clone()),
            }
        }

        let totals = totals.rounded();
        let risk = classify_with(&totals, &self.thresholds);
        info!(
            items = items.len(),
            unmatched = unmatched.len(),
            sugar = totals.total_sugar,
            carbs = totals.total_carbs,
            risk = %risk.level,
            "Meal analysis complete"
        );

        MealAnalysis {
            items,
            totals,
            risk,
            unmatched,
        }
    }

    /// Analyze the combined text of all meal slots
    pub async fn analyze_meals(&self, meals: &MealSlots) -> MealAnalysis {
        self.analyze_text(&meals.combined_text()).await
    }
}
