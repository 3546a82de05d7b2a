use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use vianda_core::identity::Buyer;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserClaims {
    pub sub: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Identity-provider custom claim marking admin accounts.
    #[serde(default)]
    pub admin: bool,
    pub exp: usize,
}

impl UserClaims {
    /// The buyer snapshot copied onto orders at creation time.
    pub fn buyer(&self) -> Buyer {
        Buyer {
            user_id: self.sub.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

fn decode_claims(state: &AppState, req: &Request) -> Result<UserClaims, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::AuthenticationError("missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthenticationError("malformed Authorization header".to_string()))?;

    let token_data = decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthenticationError("invalid token".to_string()))?;

    Ok(token_data.claims)
}

// ============================================================================
// Buyer Authentication Middleware
// ============================================================================

pub async fn buyer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = decode_claims(&state, &req)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// ============================================================================
// Admin Authentication Middleware
// ============================================================================

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = decode_claims(&state, &req)?;
    if !claims.admin {
        return Err(AppError::AuthorizationError(
            "admin privileges required".to_string(),
        ));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
