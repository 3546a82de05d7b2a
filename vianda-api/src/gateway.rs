use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use vianda_core::payment::{
    DirectPaymentRequest, GatewayError, GatewayPayment, PaymentGateway, PreferenceRequest,
    PreferenceResponse,
};
use vianda_order::reconcile::REFERENCE_PREFIX;
use vianda_store::app_config::GatewayConfig;

/// Descriptor shown on the buyer's card statement.
const STATEMENT_DESCRIPTOR: &str = "VIANDAS_ESCUELA";

/// Thin client for the Mercado Pago REST API.
///
/// No retries and no timeouts beyond reqwest's defaults: a failed call is
/// reported once to the initiating action and never replayed.
pub struct MercadoPagoGateway {
    http: reqwest::Client,
    access_token: String,
    api_base_url: String,
    notification_url: String,
}

impl MercadoPagoGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token: config.access_token.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            notification_url: config.notification_url(),
        }
    }

    async fn rejection(response: reqwest::Response) -> GatewayError {
        let status = response.status();
        match response.json::<serde_json::Value>().await {
            Ok(body) => {
                let message = body
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("gateway request failed")
                    .to_string();
                GatewayError::Rejected {
                    message,
                    details: Some(body),
                }
            }
            Err(_) => GatewayError::Rejected {
                message: format!("gateway returned {status}"),
                details: None,
            },
        }
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<PreferenceResponse, GatewayError> {
        let mut body = serde_json::to_value(request)
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        body["notification_url"] = json!(self.notification_url);

        let response = self
            .http
            .post(format!("{}/checkout/preferences", self.api_base_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if response.status().is_success() {
            response
                .json::<PreferenceResponse>()
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn create_payment(
        &self,
        request: &DirectPaymentRequest,
    ) -> Result<GatewayPayment, GatewayError> {
        let mut body = serde_json::to_value(request)
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        body["statement_descriptor"] = json!(STATEMENT_DESCRIPTOR);
        if request.external_reference.is_none() {
            body["external_reference"] =
                json!(format!("{REFERENCE_PREFIX}{}", Utc::now().timestamp_millis()));
        }

        let response = self
            .http
            .post(format!("{}/v1/payments", self.api_base_url))
            .bearer_auth(&self.access_token)
            .header("X-Idempotency-Key", Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if response.status().is_success() {
            response
                .json::<GatewayPayment>()
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn get_payment(&self, payment_id: i64) -> Result<GatewayPayment, GatewayError> {
        let response = self
            .http
            .get(format!("{}/v1/payments/{payment_id}", self.api_base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if response.status().is_success() {
            response
                .json::<GatewayPayment>()
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))
        } else {
            Err(Self::rejection(response).await)
        }
    }
}
