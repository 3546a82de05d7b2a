use std::sync::Arc;

use vianda_core::payment::{GatewayPayment, GatewayPaymentStatus};

use crate::models::PaymentStatus;
use crate::repository::{OrderRepository, RepositoryError};

/// Prefix carried in the gateway's `external_reference` field. The suffix
/// is the store-assigned order id.
pub const REFERENCE_PREFIX: &str = "vianda_";

pub fn order_id_from_reference(reference: &str) -> Option<&str> {
    reference.strip_prefix(REFERENCE_PREFIX).filter(|id| !id.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The matched order's payment status was flipped to settled.
    MarkedPaid(String),
    /// The matched order was already settled; nothing written.
    AlreadyPaid(String),
    /// No stored order corresponds to the payment's reference.
    NoMatch,
    /// The gateway has not (or not successfully) settled the payment.
    NotSettled(GatewayPaymentStatus),
}

/// Correlates gateway payment notifications with stored orders.
///
/// Only `paymentStatus` is ever written; the `status` axis stays under
/// admin control. Unmatched references are logged and skipped so the
/// webhook can always be acknowledged.
pub struct PaymentReconciler {
    orders: Arc<dyn OrderRepository>,
}

impl PaymentReconciler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn apply(&self, payment: &GatewayPayment) -> Result<ReconcileOutcome, RepositoryError> {
        if !payment.status.is_approved() {
            tracing::debug!(payment = payment.id, status = ?payment.status, "payment not settled; nothing to reconcile");
            return Ok(ReconcileOutcome::NotSettled(payment.status));
        }
        let Some(order_id) = payment
            .external_reference
            .as_deref()
            .and_then(order_id_from_reference)
        else {
            tracing::warn!(payment = payment.id, reference = ?payment.external_reference, "approved payment carries no usable reference");
            return Ok(ReconcileOutcome::NoMatch);
        };
        match self.orders.get(order_id).await? {
            None => {
                tracing::warn!(payment = payment.id, order = %order_id, "approved payment references an unknown order");
                Ok(ReconcileOutcome::NoMatch)
            }
            Some(order) if order.record.payment_status == PaymentStatus::Paid => {
                Ok(ReconcileOutcome::AlreadyPaid(order.id))
            }
            Some(order) => {
                self.orders
                    .update_payment_status(&order.id, PaymentStatus::Paid)
                    .await?;
                tracing::info!(payment = payment.id, order = %order.id, "payment settled via webhook");
                Ok(ReconcileOutcome::MarkedPaid(order.id))
            }
        }
    }
}
