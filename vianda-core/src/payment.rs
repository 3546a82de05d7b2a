use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One purchasable line inside a checkout preference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreferenceItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: u32,
    pub unit_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreferencePayer {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Where the gateway's hosted pages send the buyer back to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// Server-side description of a purchase submitted to the gateway to
/// obtain a hosted checkout redirect URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub payer: PreferencePayer,
    pub back_urls: BackUrls,
    pub auto_return: String,
    pub external_reference: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceResponse {
    pub id: String,
    pub init_point: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_init_point: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayerIdentification {
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPayer {
    pub email: String,
    pub identification: PayerIdentification,
}

/// Direct card-capture request forwarded to the gateway's payment API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectPaymentRequest {
    pub token: String,
    pub issuer_id: String,
    pub payment_method_id: String,
    pub transaction_amount: i64,
    pub installments: u32,
    pub description: String,
    pub payer: PaymentPayer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
}

/// Payment state as reported by the gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
    Approved,
    Pending,
    InProcess,
    InMediation,
    Authorized,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
}

impl GatewayPaymentStatus {
    pub fn is_approved(self) -> bool {
        self == GatewayPaymentStatus::Approved
    }
}

/// A payment record fetched from or returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: i64,
    pub status: GatewayPaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_amount: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment gateway transport failure: {0}")]
    Transport(String),
    #[error("payment gateway rejected the request: {message}")]
    Rejected {
        message: String,
        details: Option<serde_json::Value>,
    },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted-checkout preference and return the redirect URLs.
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<PreferenceResponse, GatewayError>;

    /// Capture a card payment directly (tokenized card data).
    async fn create_payment(
        &self,
        request: &DirectPaymentRequest,
    ) -> Result<GatewayPayment, GatewayError>;

    /// Fetch a payment's current state, e.g. while handling a webhook.
    async fn get_payment(&self, payment_id: i64) -> Result<GatewayPayment, GatewayError>;
}

/// In-process gateway double. Payments staged with [`MockGateway::stage_payment`]
/// are returned by `get_payment`, which lets webhook flows run end to end
/// without the real gateway.
#[derive(Default)]
pub struct MockGateway {
    payments: Mutex<HashMap<i64, GatewayPayment>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_payment(&self, payment: GatewayPayment) {
        self.payments
            .lock()
            .expect("mock gateway lock poisoned")
            .insert(payment.id, payment);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<PreferenceResponse, GatewayError> {
        let id = format!("pref_{}", uuid::Uuid::new_v4().simple());
        tracing::debug!(preference = %id, reference = %request.external_reference, "mock preference created");
        Ok(PreferenceResponse {
            init_point: format!("https://www.mercadopago.test/checkout/start?pref_id={id}"),
            sandbox_init_point: Some(format!(
                "https://sandbox.mercadopago.test/checkout/start?pref_id={id}"
            )),
            id,
        })
    }

    async fn create_payment(
        &self,
        request: &DirectPaymentRequest,
    ) -> Result<GatewayPayment, GatewayError> {
        if request.token == "fail-capture" {
            return Err(GatewayError::Rejected {
                message: "cc_rejected_other_reason".to_string(),
                details: None,
            });
        }
        let payment = GatewayPayment {
            id: chrono::Utc::now().timestamp_millis(),
            status: GatewayPaymentStatus::Approved,
            status_detail: Some("accredited".to_string()),
            external_reference: request.external_reference.clone(),
            transaction_amount: Some(request.transaction_amount as f64),
        };
        self.stage_payment(payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, payment_id: i64) -> Result<GatewayPayment, GatewayError> {
        self.payments
            .lock()
            .expect("mock gateway lock poisoned")
            .get(&payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected {
                message: format!("payment {payment_id} not found"),
                details: None,
            })
    }
}
