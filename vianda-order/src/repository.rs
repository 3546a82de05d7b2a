use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::models::{Order, OrderDraft, OrderStatus, PaymentStatus};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("order {0} not found")]
    NotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// Which slice of the collection a listing or subscription observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderFilter {
    All,
    Owner(String),
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            OrderFilter::All => true,
            OrderFilter::Owner(user_id) => &order.record.user_id == user_id,
        }
    }
}

/// Boundary to the hosted order collection.
///
/// Patches are last-writer-wins; the store performs no optimistic
/// concurrency checks and no transactions.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a draft; the store assigns the id and returns it.
    async fn create(&self, draft: OrderDraft) -> Result<String, RepositoryError>;

    async fn get(&self, id: &str) -> Result<Option<Order>, RepositoryError>;

    /// One-shot snapshot, newest-first by creation timestamp.
    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError>;

    /// Partial patch of the status field.
    async fn update_status(&self, id: &str, status: OrderStatus) -> Result<(), RepositoryError>;

    /// Partial patch of the payment-status field.
    async fn update_payment_status(
        &self,
        id: &str,
        payment_status: PaymentStatus,
    ) -> Result<(), RepositoryError>;

    /// Hard delete. Restricting this to terminal statuses is caller
    /// policy; the store itself does not enforce it.
    async fn remove(&self, id: &str) -> Result<(), RepositoryError>;

    /// Live subscription over the collection (see [`OrderSubscription`]).
    async fn subscribe(&self, filter: OrderFilter) -> OrderSubscription;
}

/// Live view over the order collection.
///
/// The store re-delivers the full, newest-first snapshot on every mutation
/// to any order in the collection; there is no partial-diff notification.
/// Owner-filtered subscriptions project each delivery but still wake on
/// every change. The handle owns the listener registration: dropping it
/// (or calling [`OrderSubscription::unsubscribe`]) detaches the listener,
/// after which no further deliveries occur.
pub struct OrderSubscription {
    filter: OrderFilter,
    initial: Option<Arc<Vec<Order>>>,
    rx: broadcast::Receiver<Arc<Vec<Order>>>,
}

impl OrderSubscription {
    pub fn new(
        initial: Arc<Vec<Order>>,
        rx: broadcast::Receiver<Arc<Vec<Order>>>,
        filter: OrderFilter,
    ) -> Self {
        Self {
            filter,
            initial: Some(initial),
            rx,
        }
    }

    /// Next snapshot, starting with the collection's current state.
    /// Returns `None` once the store has shut down. A lagged receiver
    /// skips ahead; the following delivery carries the latest snapshot
    /// anyway, so nothing stale is ever observed.
    pub async fn next(&mut self) -> Option<Vec<Order>> {
        if let Some(snapshot) = self.initial.take() {
            return Some(self.project(&snapshot));
        }
        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Some(self.project(&snapshot)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "order subscription lagged; catching up");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn project(&self, snapshot: &[Order]) -> Vec<Order> {
        snapshot
            .iter()
            .filter(|order| self.filter.matches(order))
            .cloned()
            .collect()
    }

    /// Detach the listener. Dropping the handle has the same effect; the
    /// explicit form marks the hand-off at call sites.
    pub fn unsubscribe(self) {
        drop(self);
    }
}
