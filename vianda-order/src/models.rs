use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vianda_catalog::{order_total, price_per_day, DaySelection};
use vianda_core::identity::Buyer;

/// Order status, driven exclusively by the admin workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
    Delivered,
    Completed,
    NotDelivered,
}

/// How the buyer pays. Older documents used Spanish spellings for the
/// offline methods; those are normalized on read and never re-emitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Mercadopago,
    #[serde(alias = "efectivo")]
    Cash,
    #[serde(alias = "transferencia")]
    Transfer,
}

/// Settlement state of an order's payment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    #[serde(rename = "pagado")]
    Paid,
    #[serde(rename = "pendiente")]
    Pending,
}

/// One billed delivery day. Derived from the selection at creation time
/// and frozen; later pricing changes never reprice an existing order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub title: String,
    pub unit_price: i64,
    pub quantity: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("an order must cover at least one delivery day")]
    EmptySelection,
    #[error("invalid status transition from {from:?} to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("order in status {0:?} cannot be deleted")]
    NotDeletable(OrderStatus),
}

/// An order as submitted for persistence; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub user_id: String,
    pub child_name: String,
    pub course: String,
    pub selected_days: Vec<String>,
    pub items: Vec<OrderItem>,
    pub total: i64,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: String,
    /// Receipt URL for bank-transfer orders. The key must be entirely
    /// absent from the serialized document when unset; the store rejects
    /// explicit null writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_image: Option<String>,
}

impl OrderDraft {
    /// Build a draft from checkout inputs.
    ///
    /// Items and total are derived from the day selection here and frozen.
    /// Every order starts `pending`/`pendiente`; settlement is flipped by
    /// webhook reconciliation or admin approval, never at creation.
    pub fn new(
        buyer: &Buyer,
        child_name: impl Into<String>,
        course: impl Into<String>,
        days: &DaySelection,
        payment_method: PaymentMethod,
    ) -> Result<Self, OrderError> {
        if days.is_empty() {
            return Err(OrderError::EmptySelection);
        }
        let day_count = days.len() as i64;
        let rate = price_per_day(day_count);
        let selected_days = days.iso_days();
        let items = selected_days
            .iter()
            .map(|day| OrderItem {
                title: format!("Vianda {day}"),
                unit_price: rate,
                quantity: 1,
            })
            .collect();
        Ok(Self {
            user_id: buyer.user_id.clone(),
            child_name: child_name.into(),
            course: course.into(),
            selected_days,
            items,
            total: order_total(day_count),
            date: Utc::now(),
            status: OrderStatus::Pending,
            payment_method,
            payment_status: PaymentStatus::Pending,
            parent_name: buyer.name.clone(),
            parent_email: buyer.email.clone(),
            parent_phone: buyer.phone.clone(),
            transfer_image: None,
        })
    }

    pub fn with_transfer_image(mut self, url: String) -> Self {
        self.transfer_image = Some(url);
        self
    }

    pub fn into_order(self, id: String) -> Order {
        Order { id, record: self }
    }
}

/// A persisted order: store-assigned opaque id plus the document body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    #[serde(flatten)]
    pub record: OrderDraft,
}
