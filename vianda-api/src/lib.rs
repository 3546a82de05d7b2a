use axum::{
    http::Method,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod orders;
pub mod payments;
pub mod state;

pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let buyer_routes = Router::new()
        .route("/v1/orders", post(orders::create_order).get(orders::list_orders))
        .route("/v1/orders/stream", get(orders::stream_orders))
        .route("/v1/orders/{id}", get(orders::get_order))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::buyer_auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/v1/admin/orders", get(admin::list_orders))
        .route("/v1/admin/orders/stats", get(admin::order_stats))
        .route("/v1/admin/orders/stream", get(admin::stream_orders))
        .route("/v1/admin/orders/{id}/status", post(admin::update_status))
        .route("/v1/admin/orders/{id}", delete(admin::delete_order))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::admin_auth_middleware,
        ));

    // The payment relay is unauthenticated: the webhook is called by the
    // gateway itself and the preference/capture endpoints carry no session.
    let payment_routes = Router::new()
        .route("/api/payments/preference", post(payments::create_preference))
        .route("/api/payments", post(payments::create_payment))
        .route("/api/payments/webhook", put(payments::handle_webhook));

    Router::new()
        .route("/v1/pricing/quote", get(orders::pricing_quote))
        .merge(buyer_routes)
        .merge(admin_routes)
        .merge(payment_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
