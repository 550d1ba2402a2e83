//! Optional external identity-provider glue
//!
//! Some deployments hand session issuance to an externally-hosted
//! provider; this module verifies such tokens server-side as an extra
//! layer beyond client-side validation. When no provider is configured
//! the endpoint reports that plainly instead of guessing.

use anyhow::Result;
use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use serde_json::json;
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Verifier backed by an external identity provider
#[derive(Clone)]
pub struct IdentityVerifier {
    http: reqwest::Client,
    provider_url: Option<String>,
    service_key: Option<String>,
}

impl IdentityVerifier {
    /// Build a verifier from `IDENTITY_PROVIDER_URL` and
    /// `IDENTITY_SERVICE_KEY`; missing variables leave it unconfigured
    pub fn from_env() -> Self {
        Self {
            http: reqwest::Client::new(),
            provider_url: std::env::var("IDENTITY_PROVIDER_URL").ok(),
            service_key: std::env::var("IDENTITY_SERVICE_KEY").ok(),
        }
    }

    /// A verifier with no provider behind it
    pub fn unconfigured() -> Self {
        Self {
            http: reqwest::Client::new(),
            provider_url: None,
            service_key: None,
        }
    }

    /// Whether a provider is configured
    pub fn is_configured(&self) -> bool {
        self.provider_url.is_some()
    }

    /// Ask the provider whether the token identifies a live session
    pub async fn verify(&self, token: &str) -> Result<bool> {
        let provider_url = self
            .provider_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("identity provider not configured"))?;

        let mut request = self
            .http
            .get(format!("{}/auth/v1/user", provider_url))
            .bearer_auth(token);
        if let Some(key) = &self.service_key {
            request = request.header("apikey", key);
        }

        let response = request.send().await?;
        Ok(response.status().is_success())
    }
}

/// Verify an externally-issued session token
pub async fn verify_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    // Report a missing provider before inspecting credentials, so an
    // unconfigured deployment answers 503 rather than 401
    if !state.identity.is_configured() {
        return Err(ApiError::Unavailable("Identity provider not configured"));
    }

    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let valid = state.identity.verify(token).await.map_err(|e| {
        warn!("Identity provider verification failed: {}", e);
        ApiError::Internal
    })?;

    if valid {
        Ok(Json(json!({"valid": true})))
    } else {
        Err(ApiError::Unauthorized)
    }
}
