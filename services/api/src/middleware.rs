//! Authentication middleware for JWT token validation
//!
//! The gate every protected route passes through. A request is rejected
//! with a uniform 401 whether the token is missing, malformed, expired,
//! or revoked; the reason is never surfaced to the caller.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Authenticated request identity, inserted into the request extensions
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// Owning user id from the token's `sub` claim
    pub id: i64,
    /// Token identifier, kept so logout can revoke without re-parsing
    pub jti: Uuid,
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        debug!("Token validation failed: {}", e);
        ApiError::Unauthorized
    })?;

    if state.revocation_list.is_revoked(&claims.jti).await {
        debug!("Rejected revoked token for user {}", claims.sub);
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        jti: claims.jti,
    });

    Ok(next.run(req).await)
}
