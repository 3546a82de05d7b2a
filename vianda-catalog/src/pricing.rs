use serde::{Deserialize, Serialize};

/// Per-day rate for an order covering `day_count` delivery days.
///
/// Step function: short selections pay the full rate, larger weekly plans
/// fall into the discounted tiers. Non-positive counts are not producible
/// by the planner; they fall through to the top tier so the function stays
/// total and deterministic.
pub fn price_per_day(day_count: i64) -> i64 {
    match day_count {
        1..=3 => 6000,
        4..=8 => 5000,
        _ => 4500,
    }
}

/// Total for an order covering `day_count` delivery days.
pub fn order_total(day_count: i64) -> i64 {
    day_count.max(0) * price_per_day(day_count)
}

/// Pricing knobs loaded from app config.
///
/// The canonical total carries no tax; `tax_rate` exists as an explicit
/// re-introduction switch and defaults to zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingConfig {
    #[serde(default)]
    pub tax_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { tax_rate: 0.0 }
    }
}

impl PricingConfig {
    /// Tax amount for a subtotal, rounded to whole currency units.
    pub fn tax_on(&self, subtotal: i64) -> i64 {
        (subtotal as f64 * self.tax_rate).round() as i64
    }

    /// `order_total` plus configured tax.
    pub fn total_with_tax(&self, day_count: i64) -> i64 {
        let subtotal = order_total(day_count);
        subtotal + self.tax_on(subtotal)
    }
}
