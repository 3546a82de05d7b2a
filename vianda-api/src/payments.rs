use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use vianda_core::payment::{DirectPaymentRequest, GatewayError, PreferenceRequest};
use vianda_order::PaymentReconciler;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebhookNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    /// The gateway sends the payment id as a number or a string
    /// depending on the notification channel.
    pub id: serde_json::Value,
}

fn parse_payment_id(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// POST /api/payments/preference
/// Relay a hosted-checkout preference to the gateway.
pub async fn create_preference(
    State(state): State<AppState>,
    Json(request): Json<PreferenceRequest>,
) -> Response {
    match state.gateway.create_preference(&request).await {
        Ok(preference) => Json(json!({
            "success": true,
            "id": preference.id,
            "init_point": preference.init_point,
            "sandbox_init_point": preference.sandbox_init_point,
        }))
        .into_response(),
        Err(GatewayError::Rejected { message, .. }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": message })),
        )
            .into_response(),
        Err(GatewayError::Transport(msg)) => {
            tracing::error!("Error creating payment preference: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}

/// POST /api/payments
/// Relay a direct card capture to the gateway.
pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<DirectPaymentRequest>,
) -> Response {
    match state.gateway.create_payment(&request).await {
        Ok(payment) => Json(json!({
            "success": true,
            "payment": payment,
            "message": "Pago procesado exitosamente",
        }))
        .into_response(),
        Err(GatewayError::Rejected { message, details }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": message, "details": details })),
        )
            .into_response(),
        Err(GatewayError::Transport(msg)) => {
            tracing::error!("Error processing payment: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Error interno del servidor" })),
            )
                .into_response()
        }
    }
}

/// PUT /api/payments/webhook
/// Gateway payment notifications. The payment's current state is fetched
/// back from the gateway and reconciled onto the matching order; the
/// notification is acknowledged either way so the gateway stops retrying.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Json(notification): Json<WebhookNotification>,
) -> Response {
    if notification.kind != "payment" {
        return Json(json!({ "received": true })).into_response();
    }

    let Some(payment_id) = parse_payment_id(&notification.data.id) else {
        tracing::warn!(id = %notification.data.id, "webhook carried an unusable payment id");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Webhook error" })),
        )
            .into_response();
    };

    let payment = match state.gateway.get_payment(payment_id).await {
        Ok(payment) => payment,
        Err(err) => {
            tracing::error!(payment = payment_id, "Webhook error: {}", err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Webhook error" })),
            )
                .into_response();
        }
    };

    let reconciler = PaymentReconciler::new(state.orders.clone());
    match reconciler.apply(&payment).await {
        Ok(outcome) => {
            tracing::info!(payment = payment_id, ?outcome, "webhook reconciled");
            Json(json!({ "received": true })).into_response()
        }
        Err(err) => {
            tracing::error!(payment = payment_id, "Webhook error: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Webhook error" })),
            )
                .into_response()
        }
    }
}
