use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};

use vianda_order::repository::{OrderFilter, OrderRepository, OrderSubscription, RepositoryError};
use vianda_order::{Order, OrderDraft, OrderStatus, PaymentStatus};

/// Capacity of the snapshot fan-out channel. A slow listener that falls
/// further behind than this skips ahead to the latest snapshot.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// In-process stand-in for the hosted realtime order collection.
///
/// A flat map keyed by opaque id; every mutation re-delivers the entire
/// collection, newest-first, to every live subscription. There are no
/// transactions and no conflict detection: concurrent patches to the same
/// order are last-writer-wins, exactly like the hosted store.
pub struct RealtimeOrderStore {
    inner: RwLock<HashMap<String, Order>>,
    tx: broadcast::Sender<Arc<Vec<Order>>>,
}

impl RealtimeOrderStore {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            inner: RwLock::new(HashMap::new()),
            tx,
        }
    }

    /// Number of live subscriptions; drops to zero once every handle has
    /// been unsubscribed or dropped.
    pub fn active_listeners(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Millisecond-timestamp keys, bumped on collision so two orders
    /// placed in the same millisecond still get distinct ids. Consumers
    /// treat the id as opaque; ordering always comes from `date`.
    fn allocate_id(map: &HashMap<String, Order>) -> String {
        let mut millis = Utc::now().timestamp_millis();
        while map.contains_key(&millis.to_string()) {
            millis += 1;
        }
        millis.to_string()
    }

    fn sorted_snapshot(map: &HashMap<String, Order>) -> Vec<Order> {
        let mut orders: Vec<Order> = map.values().cloned().collect();
        orders.sort_by(|a, b| b.record.date.cmp(&a.record.date).then(b.id.cmp(&a.id)));
        orders
    }

    fn publish(&self, map: &HashMap<String, Order>) {
        // Ignoring the error: no listeners is a fine state to publish into.
        let _ = self.tx.send(Arc::new(Self::sorted_snapshot(map)));
    }
}

impl Default for RealtimeOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for RealtimeOrderStore {
    async fn create(&self, draft: OrderDraft) -> Result<String, RepositoryError> {
        if draft.selected_days.is_empty() {
            return Err(RepositoryError::Persistence(
                "an order must cover at least one delivery day".to_string(),
            ));
        }
        let mut map = self.inner.write().await;
        let id = Self::allocate_id(&map);
        map.insert(id.clone(), draft.into_order(id.clone()));
        self.publish(&map);
        tracing::debug!(order = %id, "order document created");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Order>, RepositoryError> {
        Ok(self.inner.read().await.get(id).cloned())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let map = self.inner.read().await;
        Ok(Self::sorted_snapshot(&map)
            .into_iter()
            .filter(|order| filter.matches(order))
            .collect())
    }

    async fn update_status(&self, id: &str, status: OrderStatus) -> Result<(), RepositoryError> {
        let mut map = self.inner.write().await;
        let order = map
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        order.record.status = status;
        self.publish(&map);
        Ok(())
    }

    async fn update_payment_status(
        &self,
        id: &str,
        payment_status: PaymentStatus,
    ) -> Result<(), RepositoryError> {
        let mut map = self.inner.write().await;
        let order = map
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        order.record.payment_status = payment_status;
        self.publish(&map);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), RepositoryError> {
        let mut map = self.inner.write().await;
        if map.remove(id).is_none() {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        self.publish(&map);
        tracing::debug!(order = %id, "order document removed");
        Ok(())
    }

    async fn subscribe(&self, filter: OrderFilter) -> OrderSubscription {
        let map = self.inner.read().await;
        OrderSubscription::new(
            Arc::new(Self::sorted_snapshot(&map)),
            self.tx.subscribe(),
            filter,
        )
    }
}
