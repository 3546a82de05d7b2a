use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::pricing::{order_total, price_per_day, PricingConfig};

/// Days of the week viandas are delivered. The kitchen does not run on
/// Fridays or weekends.
pub const SERVICE_WEEKDAYS: [Weekday; 4] = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu];

/// The service days (Monday through Thursday) of the week containing
/// `reference`. Week navigation is a matter of offsetting the reference
/// date by whole weeks.
pub fn service_week(reference: NaiveDate) -> Vec<NaiveDate> {
    let monday = reference
        - Duration::days(reference.weekday().num_days_from_monday() as i64);
    (0..SERVICE_WEEKDAYS.len() as i64)
        .map(|offset| monday + Duration::days(offset))
        .collect()
}

/// Ordered, duplicate-free selection of delivery days.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DaySelection {
    days: BTreeSet<NaiveDate>,
}

impl DaySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse ISO calendar dates (`YYYY-MM-DD`); duplicates collapse.
    pub fn from_iso_days(days: &[String]) -> Result<Self, chrono::ParseError> {
        let mut selection = Self::new();
        for day in days {
            selection.days.insert(NaiveDate::parse_from_str(day, "%Y-%m-%d")?);
        }
        Ok(selection)
    }

    /// Flip a day in or out of the selection; returns whether the day is
    /// selected afterwards.
    pub fn toggle(&mut self, day: NaiveDate) -> bool {
        if self.days.remove(&day) {
            false
        } else {
            self.days.insert(day);
            true
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.days.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Selected days as ISO date strings, ascending.
    pub fn iso_days(&self) -> Vec<String> {
        self.days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
    }

    /// Running totals for the cart panel next to the planner.
    pub fn summary(&self, config: &PricingConfig) -> CartSummary {
        let day_count = self.len() as i64;
        let subtotal = order_total(day_count);
        let tax = config.tax_on(subtotal);
        CartSummary {
            day_count,
            price_per_day: price_per_day(day_count),
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

/// Snapshot of the cart's running total display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub day_count: i64,
    pub price_per_day: i64,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
}
