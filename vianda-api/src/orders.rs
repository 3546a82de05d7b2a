use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures_util::Stream;
use serde::{Deserialize, Serialize};

use vianda_catalog::{CartSummary, DaySelection};
use vianda_core::receipt::ReceiptImage;
use vianda_order::repository::{OrderFilter, OrderSubscription};
use vianda_order::{CheckoutFlow, CheckoutOutcome, Order, PaymentMethod};

use crate::error::AppError;
use crate::middleware::auth::UserClaims;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub child_name: String,
    pub course: String,
    pub selected_days: Vec<String>,
    pub payment_method: PaymentMethod,
    pub receipt_image: Option<ReceiptPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    pub file_name: String,
    pub content_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_point: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    /// Comma-separated ISO dates.
    pub days: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Run the checkout wizard for the authenticated buyer.
pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let days = DaySelection::from_iso_days(&req.selected_days)
        .map_err(|e| AppError::ValidationError(format!("invalid delivery day: {e}")))?;

    let mut flow = CheckoutFlow::new(claims.buyer(), days)?;
    flow.set_student(req.child_name, req.course);
    if !flow.advance() {
        return Err(AppError::ValidationError(
            "childName and course are required".to_string(),
        ));
    }

    flow.select_payment_method(req.payment_method);
    if req.payment_method == PaymentMethod::Transfer {
        let payload = req.receipt_image.ok_or_else(|| {
            AppError::ValidationError("a transfer receipt image is required".to_string())
        })?;
        let bytes = BASE64
            .decode(payload.data.as_bytes())
            .map_err(|e| AppError::ValidationError(format!("invalid receipt payload: {e}")))?;
        flow.attach_receipt(ReceiptImage {
            file_name: payload.file_name,
            content_type: payload.content_type,
            bytes,
        });
    }
    if !flow.advance() {
        return Err(AppError::ValidationError(
            "payment method input is incomplete".to_string(),
        ));
    }

    let outcome = flow
        .execute_payment(
            state.gateway.as_ref(),
            state.receipts.as_ref(),
            state.orders.as_ref(),
            state.back_urls.clone(),
        )
        .await?;

    Ok(Json(match outcome {
        CheckoutOutcome::Confirmed { order_id } => CheckoutResponse {
            order_id: Some(order_id),
            preference_id: None,
            init_point: None,
        },
        CheckoutOutcome::Redirect {
            preference_id,
            init_point,
        } => CheckoutResponse {
            order_id: None,
            preference_id: Some(preference_id),
            init_point: Some(init_point),
        },
    }))
}

/// GET /v1/orders
/// The authenticated buyer's orders, newest-first.
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state
        .orders
        .list(&OrderFilter::Owner(claims.sub.clone()))
        .await?;
    Ok(Json(orders))
}

/// GET /v1/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&order_id)
        .await?
        // Hide other buyers' orders behind the same response as a miss.
        .filter(|order| order.record.user_id == claims.sub || claims.admin)
        .ok_or_else(|| AppError::NotFoundError(format!("order {order_id} not found")))?;
    Ok(Json(order))
}

/// GET /v1/orders/stream
/// Live snapshots of the buyer's orders, re-delivered on every mutation.
pub async fn stream_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state
        .orders
        .subscribe(OrderFilter::Owner(claims.sub.clone()))
        .await;
    Sse::new(snapshot_stream(subscription)).keep_alive(KeepAlive::default())
}

/// GET /v1/pricing/quote?days=2024-03-11,2024-03-12
/// Running cart totals for a prospective selection.
pub async fn pricing_quote(
    State(state): State<AppState>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<CartSummary>, AppError> {
    let days: Vec<String> = params
        .days
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let selection = DaySelection::from_iso_days(&days)
        .map_err(|e| AppError::ValidationError(format!("invalid delivery day: {e}")))?;
    Ok(Json(selection.summary(&state.pricing)))
}

/// Adapt a repository subscription into an SSE event stream.
pub(crate) fn snapshot_stream(
    subscription: OrderSubscription,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures_util::stream::unfold(subscription, |mut subscription| async move {
        let snapshot = subscription.next().await?;
        let data = serde_json::to_string(&snapshot).unwrap_or_else(|_| "[]".to_string());
        Some((Ok(Event::default().event("orders").data(data)), subscription))
    })
}
