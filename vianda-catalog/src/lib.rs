pub mod planner;
pub mod pricing;

pub use planner::{service_week, CartSummary, DaySelection, SERVICE_WEEKDAYS};
pub use pricing::{order_total, price_per_day, PricingConfig};
