pub mod admin;
pub mod checkout;
pub mod lifecycle;
pub mod models;
pub mod reconcile;
pub mod repository;

#[cfg(test)]
mod test_support;

pub use admin::{order_stats, AdminError, AdminReview, OrderFilters, OrderStats};
pub use checkout::{CheckoutError, CheckoutFlow, CheckoutOutcome, CheckoutStep};
pub use models::{Order, OrderDraft, OrderError, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};
pub use reconcile::{order_id_from_reference, PaymentReconciler, ReconcileOutcome};
pub use repository::{OrderFilter, OrderRepository, OrderSubscription, RepositoryError};
