use chrono::Utc;

use vianda_catalog::{price_per_day, CartSummary, DaySelection, PricingConfig};
use vianda_core::identity::Buyer;
use vianda_core::payment::{
    BackUrls, GatewayError, PaymentGateway, PreferenceItem, PreferencePayer, PreferenceRequest,
};
use vianda_core::receipt::{ReceiptImage, ReceiptStore, UploadError};

use crate::models::{OrderDraft, OrderError, PaymentMethod};
use crate::reconcile::REFERENCE_PREFIX;
use crate::repository::{OrderRepository, RepositoryError};

/// Steps of the checkout wizard, strictly forward/back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckoutStep {
    Identity,
    Summary,
    Payment,
    Confirmation,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("checkout is not at the payment step")]
    NotAtPaymentStep,
    #[error("no payment method selected")]
    MissingPaymentMethod,
    #[error("a transfer receipt image is required")]
    MissingReceipt,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// How a completed payment step ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Hosted-checkout purchase: the buyer leaves for the gateway's pages.
    /// No local order is written; the rest of that journey belongs to the
    /// gateway and the webhook.
    Redirect {
        preference_id: String,
        init_point: String,
    },
    /// Cash or transfer purchase persisted locally as `pending`.
    Confirmed { order_id: String },
}

/// Linear checkout wizard: Identity -> Summary -> Payment -> Confirmation.
///
/// All input lives inside the flow until the payment step executes;
/// cancelling consumes the flow, so nothing is ever partially written and
/// a late network response has no flow left to mutate.
#[derive(Debug)]
pub struct CheckoutFlow {
    buyer: Buyer,
    days: DaySelection,
    step: CheckoutStep,
    child_name: String,
    course: String,
    payment_method: Option<PaymentMethod>,
    receipt: Option<ReceiptImage>,
}

impl CheckoutFlow {
    /// Open the wizard for a non-empty day selection.
    pub fn new(buyer: Buyer, days: DaySelection) -> Result<Self, OrderError> {
        if days.is_empty() {
            return Err(OrderError::EmptySelection);
        }
        Ok(Self {
            buyer,
            days,
            step: CheckoutStep::Identity,
            child_name: String::new(),
            course: String::new(),
            payment_method: None,
            receipt: None,
        })
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn set_student(&mut self, child_name: impl Into<String>, course: impl Into<String>) {
        self.child_name = child_name.into();
        self.course = course.into();
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
    }

    pub fn attach_receipt(&mut self, receipt: ReceiptImage) {
        self.receipt = Some(receipt);
    }

    /// Running totals for the summary step.
    pub fn summary(&self, pricing: &PricingConfig) -> CartSummary {
        self.days.summary(pricing)
    }

    /// Required fields still missing at the identity step.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.child_name.trim().is_empty() {
            missing.push("childName");
        }
        if self.course.trim().is_empty() {
            missing.push("course");
        }
        missing
    }

    /// Move one step forward. Returns whether the step changed; a failed
    /// validation gate leaves the wizard where it is rather than raising.
    pub fn advance(&mut self) -> bool {
        match self.step {
            CheckoutStep::Identity => {
                if !self.missing_fields().is_empty() {
                    return false;
                }
                self.step = CheckoutStep::Summary;
                true
            }
            CheckoutStep::Summary => {
                match self.payment_method {
                    None => false,
                    Some(PaymentMethod::Transfer) if self.receipt.is_none() => false,
                    Some(_) => {
                        self.step = CheckoutStep::Payment;
                        true
                    }
                }
            }
            // The payment step only completes through `execute_payment`.
            CheckoutStep::Payment | CheckoutStep::Confirmation => false,
        }
    }

    /// Move one step back; collected input is kept.
    pub fn back(&mut self) -> bool {
        match self.step {
            CheckoutStep::Summary => {
                self.step = CheckoutStep::Identity;
                true
            }
            CheckoutStep::Payment => {
                self.step = CheckoutStep::Summary;
                true
            }
            CheckoutStep::Identity | CheckoutStep::Confirmation => false,
        }
    }

    /// Abandon the wizard, discarding all collected input. Consuming the
    /// flow guarantees no partial write can follow.
    pub fn cancel(self) {}

    /// The preference submitted to the gateway for a hosted checkout.
    pub fn preference_request(&self, back_urls: BackUrls) -> PreferenceRequest {
        let rate = price_per_day(self.days.len() as i64);
        let items = self
            .days
            .iso_days()
            .into_iter()
            .map(|day| PreferenceItem {
                title: format!("Vianda {day}"),
                description: Some(format!("Vianda escolar para {}", self.child_name)),
                quantity: 1,
                unit_price: rate,
            })
            .collect();
        PreferenceRequest {
            items,
            payer: PreferencePayer {
                name: self.buyer.name.clone(),
                email: self.buyer.email.clone(),
                phone: Some(self.buyer.phone.clone()),
                address: None,
            },
            back_urls,
            auto_return: "approved".to_string(),
            external_reference: format!("{REFERENCE_PREFIX}{}", Utc::now().timestamp_millis()),
            metadata: serde_json::json!({
                "userId": self.buyer.user_id,
                "childName": self.child_name,
                "course": self.course,
                "selectedDays": self.days.iso_days(),
            }),
        }
    }

    fn build_draft(&self) -> Result<OrderDraft, CheckoutError> {
        let method = self.payment_method.ok_or(CheckoutError::MissingPaymentMethod)?;
        Ok(OrderDraft::new(
            &self.buyer,
            self.child_name.clone(),
            self.course.clone(),
            &self.days,
            method,
        )?)
    }

    /// Execute the payment action for the selected method.
    ///
    /// Cash and transfer persist an order and land on the confirmation
    /// step; transfer uploads the receipt first so the order only ever
    /// references a live URL. Mercadopago returns the redirect and writes
    /// nothing locally.
    pub async fn execute_payment(
        &mut self,
        gateway: &dyn PaymentGateway,
        receipts: &dyn ReceiptStore,
        orders: &dyn OrderRepository,
        back_urls: BackUrls,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        if self.step != CheckoutStep::Payment {
            return Err(CheckoutError::NotAtPaymentStep);
        }
        match self.payment_method.ok_or(CheckoutError::MissingPaymentMethod)? {
            PaymentMethod::Mercadopago => {
                let request = self.preference_request(back_urls);
                let preference = gateway.create_preference(&request).await?;
                tracing::info!(
                    preference = %preference.id,
                    reference = %request.external_reference,
                    "redirecting buyer to hosted checkout"
                );
                Ok(CheckoutOutcome::Redirect {
                    preference_id: preference.id,
                    init_point: preference.init_point,
                })
            }
            PaymentMethod::Transfer => {
                let image = self.receipt.as_ref().ok_or(CheckoutError::MissingReceipt)?;
                let url = receipts.upload(image).await?;
                let draft = self.build_draft()?.with_transfer_image(url);
                let order_id = orders.create(draft).await?;
                tracing::info!(order = %order_id, "transfer order placed, awaiting admin verification");
                self.step = CheckoutStep::Confirmation;
                Ok(CheckoutOutcome::Confirmed { order_id })
            }
            PaymentMethod::Cash => {
                let draft = self.build_draft()?;
                let order_id = orders.create(draft).await?;
                tracing::info!(order = %order_id, "cash order placed, awaiting admin approval");
                self.step = CheckoutStep::Confirmation;
                Ok(CheckoutOutcome::Confirmed { order_id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderStatus, PaymentStatus};
    use crate::test_support::{buyer, four_days, FailingReceipts, MemoryOrders, MemoryReceipts};
    use vianda_core::payment::MockGateway;

    fn back_urls() -> BackUrls {
        BackUrls {
            success: "https://viandas.example.com/checkout/success".to_string(),
            failure: "https://viandas.example.com/checkout/failure".to_string(),
            pending: "https://viandas.example.com/checkout/pending".to_string(),
        }
    }

    fn receipt() -> ReceiptImage {
        ReceiptImage {
            file_name: "comprobante.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8, 0xff],
        }
    }

    #[test]
    fn refuses_an_empty_selection() {
        assert!(matches!(
            CheckoutFlow::new(buyer(), DaySelection::new()),
            Err(OrderError::EmptySelection)
        ));
    }

    #[test]
    fn identity_step_gates_on_student_fields() {
        let mut flow = CheckoutFlow::new(buyer(), four_days()).unwrap();
        assert!(!flow.advance());
        assert_eq!(flow.step(), CheckoutStep::Identity);

        flow.set_student("", "5to Grado A");
        assert!(!flow.advance());
        assert_eq!(flow.missing_fields(), vec!["childName"]);

        flow.set_student("Juli", "5to Grado A");
        assert!(flow.advance());
        assert_eq!(flow.step(), CheckoutStep::Summary);
    }

    #[test]
    fn summary_step_requires_method_and_transfer_receipt() {
        let mut flow = CheckoutFlow::new(buyer(), four_days()).unwrap();
        flow.set_student("Juli", "5to Grado A");
        assert!(flow.advance());

        assert!(!flow.advance());
        flow.select_payment_method(PaymentMethod::Transfer);
        assert!(!flow.advance());
        flow.attach_receipt(receipt());
        assert!(flow.advance());
        assert_eq!(flow.step(), CheckoutStep::Payment);
    }

    #[test]
    fn back_walks_the_steps_without_losing_input() {
        let mut flow = CheckoutFlow::new(buyer(), four_days()).unwrap();
        flow.set_student("Juli", "5to Grado A");
        flow.select_payment_method(PaymentMethod::Cash);
        assert!(flow.advance());
        assert!(flow.advance());
        assert!(flow.back());
        assert_eq!(flow.step(), CheckoutStep::Summary);
        assert!(flow.back());
        assert_eq!(flow.step(), CheckoutStep::Identity);
        assert!(!flow.back());
        // Input survives the walk back.
        assert!(flow.missing_fields().is_empty());
    }

    #[tokio::test]
    async fn cash_checkout_creates_a_pending_order() {
        let orders = MemoryOrders::new();
        let gateway = MockGateway::new();
        let receipts = MemoryReceipts::new();

        let mut flow = CheckoutFlow::new(buyer(), four_days()).unwrap();
        flow.set_student("Juli", "5to Grado A");
        flow.select_payment_method(PaymentMethod::Cash);
        assert!(flow.advance() && flow.advance());

        let outcome = flow
            .execute_payment(&gateway, &receipts, &orders, back_urls())
            .await
            .unwrap();
        let CheckoutOutcome::Confirmed { order_id } = outcome else {
            panic!("expected a confirmed order");
        };
        assert_eq!(flow.step(), CheckoutStep::Confirmation);

        let order = orders.get(&order_id).await.unwrap().unwrap();
        assert_eq!(order.record.status, OrderStatus::Pending);
        assert_eq!(order.record.payment_status, PaymentStatus::Pending);
        assert_eq!(order.record.total, 20000);
        assert!(order.record.transfer_image.is_none());
    }

    #[tokio::test]
    async fn transfer_uploads_before_creating_the_order() {
        let orders = MemoryOrders::new();
        let gateway = MockGateway::new();
        let receipts = MemoryReceipts::new();

        let mut flow = CheckoutFlow::new(buyer(), four_days()).unwrap();
        flow.set_student("Juli", "5to Grado A");
        flow.select_payment_method(PaymentMethod::Transfer);
        flow.attach_receipt(receipt());
        assert!(flow.advance() && flow.advance());

        let outcome = flow
            .execute_payment(&gateway, &receipts, &orders, back_urls())
            .await
            .unwrap();
        let CheckoutOutcome::Confirmed { order_id } = outcome else {
            panic!("expected a confirmed order");
        };
        let order = orders.get(&order_id).await.unwrap().unwrap();
        let url = order.record.transfer_image.expect("receipt URL recorded");
        assert!(receipts.contains(&url));
    }

    #[tokio::test]
    async fn upload_failure_blocks_order_creation() {
        let orders = MemoryOrders::new();
        let gateway = MockGateway::new();
        let receipts = FailingReceipts;

        let mut flow = CheckoutFlow::new(buyer(), four_days()).unwrap();
        flow.set_student("Juli", "5to Grado A");
        flow.select_payment_method(PaymentMethod::Transfer);
        flow.attach_receipt(receipt());
        assert!(flow.advance() && flow.advance());

        let err = flow
            .execute_payment(&gateway, &receipts, &orders, back_urls())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Upload(_)));
        assert!(orders.list(&crate::OrderFilter::All).await.unwrap().is_empty());
        // The wizard stays on the payment step so the buyer can retry.
        assert_eq!(flow.step(), CheckoutStep::Payment);
    }

    #[tokio::test]
    async fn mercadopago_redirects_without_a_local_write() {
        let orders = MemoryOrders::new();
        let gateway = MockGateway::new();
        let receipts = MemoryReceipts::new();

        let mut flow = CheckoutFlow::new(buyer(), four_days()).unwrap();
        flow.set_student("Juli", "5to Grado A");
        flow.select_payment_method(PaymentMethod::Mercadopago);
        assert!(flow.advance() && flow.advance());

        let outcome = flow
            .execute_payment(&gateway, &receipts, &orders, back_urls())
            .await
            .unwrap();
        assert!(matches!(outcome, CheckoutOutcome::Redirect { .. }));
        assert!(orders.list(&crate::OrderFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_discards_everything() {
        let orders = MemoryOrders::new();
        let mut flow = CheckoutFlow::new(buyer(), four_days()).unwrap();
        flow.set_student("Juli", "5to Grado A");
        flow.select_payment_method(PaymentMethod::Cash);
        assert!(flow.advance());
        flow.cancel();
        assert!(orders.list(&crate::OrderFilter::All).await.unwrap().is_empty());
    }

    #[test]
    fn summary_reflects_the_selection() {
        let flow = CheckoutFlow::new(buyer(), four_days()).unwrap();
        let summary = flow.summary(&PricingConfig::default());
        assert_eq!(summary.day_count, 4);
        assert_eq!(summary.total, 20000);
    }

    #[test]
    fn preference_request_mirrors_the_cart() {
        let mut flow = CheckoutFlow::new(buyer(), four_days()).unwrap();
        flow.set_student("Juli", "5to Grado A");
        let request = flow.preference_request(back_urls());
        assert_eq!(request.items.len(), 4);
        assert!(request.items.iter().all(|i| i.unit_price == 5000 && i.quantity == 1));
        assert!(request.external_reference.starts_with(REFERENCE_PREFIX));
        assert_eq!(request.auto_return, "approved");
        assert_eq!(request.metadata["childName"], "Juli");
    }
}
