use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::lifecycle::check_transition;
use crate::models::{Order, OrderError, OrderStatus, PaymentMethod, PaymentStatus};
use crate::repository::{OrderFilter, OrderRepository, OrderSubscription, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Composable filters for the admin order list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilters {
    /// Case-insensitive substring over student name, course and parent name.
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
}

impl OrderFilters {
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = order.record.child_name.to_lowercase().contains(&term)
                || order.record.course.to_lowercase().contains(&term)
                || order.record.parent_name.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        if let Some(status) = self.status {
            if order.record.status != status {
                return false;
            }
        }
        if let Some(method) = self.payment_method {
            if order.record.payment_method != method {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, orders: &[Order]) -> Vec<Order> {
        orders.iter().filter(|o| self.matches(o)).cloned().collect()
    }
}

/// Dashboard counters shown above the admin order list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    pub paid: usize,
    pub pending_payment: usize,
    pub revenue: i64,
}

pub fn order_stats(orders: &[Order]) -> OrderStats {
    OrderStats {
        total_orders: orders.len(),
        paid: orders
            .iter()
            .filter(|o| o.record.payment_status == PaymentStatus::Paid)
            .count(),
        pending_payment: orders
            .iter()
            .filter(|o| o.record.payment_status == PaymentStatus::Pending)
            .count(),
        revenue: orders.iter().map(|o| o.record.total).sum(),
    }
}

/// Admin-side order review: listing, stats and the status workflow.
///
/// Every action is a single field patch; a failure leaves the order
/// unchanged and is reported back, with nothing to roll back.
pub struct AdminReview {
    orders: Arc<dyn OrderRepository>,
}

impl AdminReview {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn list(&self, filters: &OrderFilters) -> Result<Vec<Order>, AdminError> {
        let orders = self.orders.list(&OrderFilter::All).await?;
        Ok(filters.apply(&orders))
    }

    pub async fn stats(&self) -> Result<OrderStats, AdminError> {
        let orders = self.orders.list(&OrderFilter::All).await?;
        Ok(order_stats(&orders))
    }

    pub async fn subscribe(&self) -> OrderSubscription {
        self.orders.subscribe(OrderFilter::All).await
    }

    /// Drive one lifecycle transition, validating the edge first.
    ///
    /// Approval of a cash or transfer order is the moment its payment is
    /// taken as settled, so the payment status flips in a second patch.
    pub async fn transition(&self, id: &str, next: OrderStatus) -> Result<(), AdminError> {
        let order = self
            .orders
            .get(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        check_transition(order.record.status, next)?;
        self.orders.update_status(id, next).await?;
        tracing::info!(order = %id, from = ?order.record.status, to = ?next, "order status updated");

        if next == OrderStatus::Approved
            && order.record.payment_method != PaymentMethod::Mercadopago
            && order.record.payment_status == PaymentStatus::Pending
        {
            self.orders.update_payment_status(id, PaymentStatus::Paid).await?;
            tracing::info!(order = %id, "offline payment marked as settled on approval");
        }
        Ok(())
    }

    pub async fn approve(&self, id: &str) -> Result<(), AdminError> {
        self.transition(id, OrderStatus::Approved).await
    }

    pub async fn reject(&self, id: &str) -> Result<(), AdminError> {
        self.transition(id, OrderStatus::Rejected).await
    }

    pub async fn mark_delivered(&self, id: &str) -> Result<(), AdminError> {
        self.transition(id, OrderStatus::Delivered).await
    }

    pub async fn mark_completed(&self, id: &str) -> Result<(), AdminError> {
        self.transition(id, OrderStatus::Completed).await
    }

    pub async fn mark_not_delivered(&self, id: &str) -> Result<(), AdminError> {
        self.transition(id, OrderStatus::NotDelivered).await
    }

    /// Hard delete, permitted only once an order is terminal.
    pub async fn delete(&self, id: &str) -> Result<(), AdminError> {
        let order = self
            .orders
            .get(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        if !order.record.status.is_terminal() {
            return Err(OrderError::NotDeletable(order.record.status).into());
        }
        self.orders.remove(id).await?;
        tracing::info!(order = %id, "order deleted");
        Ok(())
    }
}
