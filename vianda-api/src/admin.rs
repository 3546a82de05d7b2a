use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::Stream;
use serde::Deserialize;

use vianda_order::{AdminReview, Order, OrderFilters, OrderStats, OrderStatus};

use crate::error::AppError;
use crate::orders::snapshot_stream;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// GET /v1/admin/orders
/// Full order list with composable search/status/payment filters.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(filters): Query<OrderFilters>,
) -> Result<Json<Vec<Order>>, AppError> {
    let review = AdminReview::new(state.orders.clone());
    Ok(Json(review.list(&filters).await?))
}

/// GET /v1/admin/orders/stats
pub async fn order_stats(State(state): State<AppState>) -> Result<Json<OrderStats>, AppError> {
    let review = AdminReview::new(state.orders.clone());
    Ok(Json(review.stats().await?))
}

/// GET /v1/admin/orders/stream
/// Live snapshots of the whole collection.
pub async fn stream_orders(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let review = AdminReview::new(state.orders.clone());
    let subscription = review.subscribe().await;
    Sse::new(snapshot_stream(subscription)).keep_alive(KeepAlive::default())
}

/// POST /v1/admin/orders/{id}/status
/// Drive one lifecycle transition.
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<StatusCode, AppError> {
    let review = AdminReview::new(state.orders.clone());
    review.transition(&order_id, req.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/admin/orders/{id}
/// Hard delete; only terminal orders qualify.
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let review = AdminReview::new(state.orders.clone());
    review.delete(&order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
