//! # Glycemic Risk Classification
//!
//! Maps rounded daily [`Totals`] to a [`RiskAssessment`]. High risk is checked
//! first, then moderate; everything else is safe. Each reason names every
//! threshold that fired.

use crate::config::RiskThresholds;
use crate::meal_model::{RiskAssessment, RiskLevel, Totals};

/// Format a gram amount the way the reason strings show it ("70.0", "40.01")
fn grams(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Classify with the default thresholds
///
/// # Examples
///
/// ```rust
/// use glycomeal::meal_model::{RiskLevel, Totals};
/// use glycomeal::risk::classify;
///
/// let totals = Totals { total_sugar: 70.0, ..Default::default() };
/// let risk = classify(&totals);
/// assert_eq!(risk.level, RiskLevel::High);
/// assert_eq!(risk.reason, "Sugar (70.0g) exceeds the 65g high-risk threshold.");
/// ```
pub fn classify(totals: &Totals) -> RiskAssessment {
    classify_with(totals, &RiskThresholds::default())
}

/// Classify with explicit thresholds
pub fn classify_with(totals: &Totals, limits: &RiskThresholds) -> RiskAssessment {
    let sugar = totals.total_sugar;
    let carbs = totals.total_carbs;

    let high_sugar = sugar > limits.high_sugar;
    let high_carbs = carbs > limits.high_carbs;
    if high_sugar || high_carbs {
        let mut reasons = Vec::new();
        if high_sugar {
            reasons.push(format!(
                "Sugar ({}g) exceeds the {}g high-risk threshold.",
                grams(sugar),
                limits.high_sugar
            ));
        }
        if high_carbs {
            reasons.push(format!(
                "Carbs ({}g) exceed the {}g upper limit.",
                grams(carbs),
                limits.high_carbs
            ));
        }
        return RiskAssessment {
            level: RiskLevel::High,
            reason: reasons.join(" "),
        };
    }

    let moderate_sugar = sugar > limits.safe_sugar;
    let moderate_carbs = carbs > limits.moderate_carbs;
    if moderate_sugar || moderate_carbs {
        let mut reasons = Vec::new();
        if moderate_sugar {
            reasons.push(format!(
                "Sugar ({}g) is in the moderate risk zone ({}-{}g).",
                grams(sugar),
                limits.safe_sugar,
                limits.high_sugar
            ));
        }
        if moderate_carbs {
            reasons.push(format!(
                "Carbs ({}g) are in the moderate range ({}-{}g).",
                grams(carbs),
                limits.moderate_carbs,
                limits.high_carbs
            ));
        }
        return RiskAssessment {
            level: RiskLevel::Moderate,
            reason: format!("{} Needs moderation.", reasons.join(" ")),
        };
    }

    RiskAssessment {
        level: RiskLevel::Safe,
        reason: format!(
            "Your sugar intake is within the safe limit (≤{}g).",
            limits.safe_sugar
        ),
    }
}
