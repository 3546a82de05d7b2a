use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use vianda_core::payment::GatewayError;
use vianda_core::receipt::UploadError;
use vianda_order::{AdminError, CheckoutError, OrderError, RepositoryError};

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    AuthenticationError(String),
    AuthorizationError(String),
    NotFoundError(String),
    ConflictError(String),
    GatewayError(GatewayError),
    UploadError(UploadError),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::GatewayError(GatewayError::Rejected { message, .. }) => {
                (StatusCode::BAD_REQUEST, message)
            }
            AppError::GatewayError(GatewayError::Transport(msg)) => {
                tracing::error!("Payment gateway unreachable: {}", msg);
                (StatusCode::BAD_GATEWAY, "Payment gateway unavailable".to_string())
            }
            AppError::UploadError(err) => {
                tracing::error!("Receipt upload failed: {}", err);
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => AppError::NotFoundError(format!("order {id} not found")),
            RepositoryError::Persistence(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match &err {
            OrderError::EmptySelection => AppError::ValidationError(err.to_string()),
            OrderError::InvalidTransition { .. } | OrderError::NotDeletable(_) => {
                AppError::ConflictError(err.to_string())
            }
        }
    }
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Order(inner) => inner.into(),
            AdminError::Repository(inner) => inner.into(),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::GatewayError(err)
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::UploadError(err)
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Order(inner) => inner.into(),
            CheckoutError::Upload(inner) => inner.into(),
            CheckoutError::Gateway(inner) => inner.into(),
            CheckoutError::Repository(inner) => inner.into(),
            other => AppError::ValidationError(other.to_string()),
        }
    }
}
