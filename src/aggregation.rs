//! # Nutrient Aggregation
//!
//! Sums quantity-scaled nutrient profiles into [`Totals`]. Accumulation is plain
//! addition, so the order of items does not matter; rounding to two decimals
//! happens once, after the last item.

use crate::meal_model::{NutrientProfile, Totals};

/// Add `profile` scaled by `quantity` to the running totals
pub fn accumulate(totals: &mut Totals, profile: &NutrientProfile, quantity: f64) {
    totals.total_calories += profile.calories * quantity;
    totals.total_carbs += profile.carbs * quantity;
    totals.total_sugar += profile.sugar * quantity;
    totals.total_protein += profile.protein * quantity;
    totals.total_fat += profile.fat * quantity;
    totals.total_fiber += profile.fiber * quantity;
}

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Totals {
    /// Copy with every field rounded to two decimals
    pub fn rounded(&self) -> Totals {
        Totals {
            total_calories: round2(self.total_calories),
            total_carbs: round2(self.total_carbs),
            total_sugar: round2(self.total_sugar),
            total_protein: round2(self.total_protein),
            total_fat: round2(self.total_fat),
            total_fiber: round2(self.total_fiber),
        }
    }
}

/// Accumulate a batch of `(profile, quantity)` pairs and round the result
pub fn aggregate<'a, I>(items: I) -> Totals
where
    I: IntoIterator<Item = (&'a NutrientProfile, f64)>,
{
    let mut totals = Totals::default();
    for (profile, quantity) in items {
        accumulate(&mut totals, profile, quantity);
    }
    totals.rounded()
}
