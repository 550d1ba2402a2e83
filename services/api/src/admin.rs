//! Admin panel glue
//!
//! The admin surface reuses the normal authentication gate, then checks
//! the authenticated username against the configured admin account. Its
//! only operation is AI content generation.

use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{
    error::ApiError,
    middleware::{AuthUser, auth_middleware},
    state::AppState,
};

const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Admin configuration
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Username of the admin account; None disables the admin surface
    pub username: Option<String>,
}

impl AdminConfig {
    /// Create a new AdminConfig from the `ADMIN_USERNAME` environment variable
    pub fn from_env() -> Self {
        Self {
            username: std::env::var("ADMIN_USERNAME").ok(),
        }
    }
}

/// Request for AI content generation
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub max_tokens: Option<u32>,
}

/// Create the admin sub-router, gated by the auth middleware
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Generate content through the text provider
pub async fn generate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let admin_username = state
        .admin
        .username
        .as_deref()
        .ok_or(ApiError::Unavailable("Admin panel not configured"))?;

    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if user.username != admin_username {
        return Err(ApiError::Forbidden);
    }

    if payload.prompt.trim().is_empty() {
        return Err(ApiError::Validation("Prompt is required".to_string()));
    }

    let generator = state
        .text_generator
        .as_ref()
        .ok_or(ApiError::Unavailable("Text provider not configured"))?;

    let max_tokens = payload.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    let text = generator
        .generate(&payload.prompt, max_tokens)
        .await
        .map_err(|e| {
            error!("Text generation failed: {}", e);
            ApiError::Internal
        })?;

    info!("Admin {} generated {} chars", user.username, text.len());

    Ok(Json(json!({"text": text})))
}
