//! Minimal in-process doubles shared by the crate's tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use vianda_catalog::DaySelection;
use vianda_core::identity::Buyer;
use vianda_core::receipt::{ReceiptImage, ReceiptStore, UploadError};

use crate::models::{Order, OrderDraft, OrderStatus, PaymentMethod, PaymentStatus};
use crate::repository::{OrderFilter, OrderRepository, OrderSubscription, RepositoryError};

pub(crate) fn buyer() -> Buyer {
    Buyer {
        user_id: "uid-123".to_string(),
        name: "Marta Suarez".to_string(),
        email: "marta@example.com".to_string(),
        phone: "+54 11 5555-1234".to_string(),
    }
}

pub(crate) fn four_days() -> DaySelection {
    DaySelection::from_iso_days(&[
        "2024-03-11".to_string(),
        "2024-03-12".to_string(),
        "2024-03-13".to_string(),
        "2024-03-14".to_string(),
    ])
    .unwrap()
}

pub(crate) fn draft(
    user_id: &str,
    child_name: &str,
    course: &str,
    payment_method: PaymentMethod,
) -> OrderDraft {
    let buyer = Buyer {
        user_id: user_id.to_string(),
        name: "Marta Suarez".to_string(),
        email: "marta@example.com".to_string(),
        phone: "+54 11 5555-1234".to_string(),
    };
    OrderDraft::new(&buyer, child_name, course, &four_days(), payment_method).unwrap()
}

/// Map-backed repository double with the same snapshot semantics as the
/// real store, minus the id scheme.
pub(crate) struct MemoryOrders {
    inner: Mutex<HashMap<String, Order>>,
    seq: AtomicI64,
    tx: broadcast::Sender<Arc<Vec<Order>>>,
}

impl MemoryOrders {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            inner: Mutex::new(HashMap::new()),
            seq: AtomicI64::new(0),
            tx,
        }
    }

    fn snapshot(&self) -> Vec<Order> {
        let map = self.inner.lock().unwrap();
        let mut orders: Vec<Order> = map.values().cloned().collect();
        orders.sort_by(|a, b| b.record.date.cmp(&a.record.date).then(b.id.cmp(&a.id)));
        orders
    }

    fn publish(&self) {
        let _ = self.tx.send(Arc::new(self.snapshot()));
    }
}

#[async_trait]
impl OrderRepository for MemoryOrders {
    async fn create(&self, draft: OrderDraft) -> Result<String, RepositoryError> {
        let id = (1710158400000 + self.seq.fetch_add(1, Ordering::SeqCst)).to_string();
        self.inner
            .lock()
            .unwrap()
            .insert(id.clone(), draft.into_order(id.clone()));
        self.publish();
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Order>, RepositoryError> {
        Ok(self.inner.lock().unwrap().get(id).cloned())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|o| filter.matches(o))
            .collect())
    }

    async fn update_status(&self, id: &str, status: OrderStatus) -> Result<(), RepositoryError> {
        {
            let mut map = self.inner.lock().unwrap();
            let order = map
                .get_mut(id)
                .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
            order.record.status = status;
        }
        self.publish();
        Ok(())
    }

    async fn update_payment_status(
        &self,
        id: &str,
        payment_status: PaymentStatus,
    ) -> Result<(), RepositoryError> {
        {
            let mut map = self.inner.lock().unwrap();
            let order = map
                .get_mut(id)
                .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
            order.record.payment_status = payment_status;
        }
        self.publish();
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), RepositoryError> {
        let removed = self.inner.lock().unwrap().remove(id);
        if removed.is_none() {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        self.publish();
        Ok(())
    }

    async fn subscribe(&self, filter: OrderFilter) -> OrderSubscription {
        OrderSubscription::new(Arc::new(self.snapshot()), self.tx.subscribe(), filter)
    }
}

/// Receipt store double recording every uploaded URL.
pub(crate) struct MemoryReceipts {
    urls: Mutex<Vec<String>>,
}

impl MemoryReceipts {
    pub(crate) fn new() -> Self {
        Self {
            urls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn contains(&self, url: &str) -> bool {
        self.urls.lock().unwrap().iter().any(|u| u == url)
    }
}

#[async_trait]
impl ReceiptStore for MemoryReceipts {
    async fn upload(&self, image: &ReceiptImage) -> Result<String, UploadError> {
        let mut urls = self.urls.lock().unwrap();
        let url = format!(
            "https://files.example.com/receipts/{}-{}",
            urls.len(),
            image.file_name
        );
        urls.push(url.clone());
        Ok(url)
    }
}

/// Receipt store double that always fails, for the blocked-transfer path.
pub(crate) struct FailingReceipts;

#[async_trait]
impl ReceiptStore for FailingReceipts {
    async fn upload(&self, _image: &ReceiptImage) -> Result<String, UploadError> {
        Err(UploadError("bucket unavailable".to_string()))
    }
}
