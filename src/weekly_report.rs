//! # Weekly Trends
//!
//! Summaries over the most recent history entries: chart series in ascending date
//! order, a count of days per risk level, and a one-line trend context.

use crate::db::HistoryEntry;
use crate::meal_model::RiskLevel;
use serde::{Deserialize, Serialize};

const SAFE_SUGAR_LIMIT: f64 = 40.0;
const FIBER_TARGET: f64 = 25.0;

/// Days per risk level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RiskCounts {
    pub safe: u32,
    pub moderate: u32,
    pub high: u32,
}

impl RiskCounts {
    fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Safe => self.safe += 1,
            RiskLevel::Moderate => self.moderate += 1,
            RiskLevel::High => self.high += 1,
        }
    }
}

/// Chart data for the weekly view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    /// "dd/mm", oldest first
    pub dates: Vec<String>,
    pub sugar: Vec<f64>,
    pub carbs: Vec<f64>,
    pub fiber: Vec<f64>,
    pub risk_counts: RiskCounts,
    pub context: String,
}

/// Describe the trend across `history`
pub fn weekly_context(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "No data available for weekly analysis.".to_string();
    }

    let total_days = history.len();
    let sugar_high_days = history
        .iter()
        .filter(|e| e.totals.total_sugar > SAFE_SUGAR_LIMIT)
        .count();
    let fiber_low_days = history
        .iter()
        .filter(|e| e.totals.total_fiber < FIBER_TARGET)
        .count();

    let mut messages = Vec::new();
    if sugar_high_days > 0 {
        messages.push(format!(
            "Sugar intake exceeded the safe limit on {sugar_high_days} of the last {total_days} days."
        ));
    }
    // at least half of the days
    if fiber_low_days * 2 >= total_days {
        messages.push("Fiber intake was consistently lower than optimal.".to_string());
    }
    if messages.is_empty() {
        messages.push("Your weekly trends indicate a stable glycemic load.".to_string());
    }

    messages.join(" ")
}

/// Build chart series from history given newest first
pub fn weekly_stats(history: &[HistoryEntry]) -> WeeklyStats {
    let mut stats = WeeklyStats {
        dates: Vec::with_capacity(history.len()),
        sugar: Vec::with_capacity(history.len()),
        carbs: Vec::with_capacity(history.len()),
        fiber: Vec::with_capacity(history.len()),
        risk_counts: RiskCounts::default(),
        context: weekly_context(history),
    };

    for entry in history.iter().rev() {
        stats.dates.push(entry.date.format("%d/%m").to_string());
        stats.sugar.push(entry.totals.total_sugar);
        stats.carbs.push(entry.totals.total_carbs);
        stats.fiber.push(entry.totals.total_fiber);
        stats.risk_counts.record(entry.risk_level);
    }

    stats
}
