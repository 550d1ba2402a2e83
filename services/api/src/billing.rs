//! Payment-provider glue
//!
//! Pass-through only: checkout and billing-portal sessions are created
//! against the provider's REST API, and the signed webhook is verified
//! and acknowledged. Subscription state never enters the data model.

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::{error, info, warn};

use crate::{error::ApiError, state::AppState};

/// Accepted clock skew between the webhook timestamp and now, in seconds
const WEBHOOK_TOLERANCE_SECONDS: i64 = 300;

/// Billing configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Provider API secret key
    pub secret_key: String,
    /// Shared secret for verifying webhook signatures
    pub webhook_secret: String,
    /// Frontend base URL for checkout redirects
    pub frontend_url: String,
    /// Provider API base URL
    pub api_base: String,
}

impl BillingConfig {
    /// Create a new BillingConfig from environment variables
    ///
    /// # Environment Variables
    /// - `STRIPE_SECRET_KEY`: Provider API secret key
    /// - `STRIPE_WEBHOOK_SECRET`: Webhook signing secret
    /// - `FRONTEND_URL`: Redirect base (default: `http://localhost:5000`)
    /// - `STRIPE_API_BASE`: API base (default: `https://api.stripe.com`)
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("STRIPE_SECRET_KEY environment variable not set"))?;
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| anyhow::anyhow!("STRIPE_WEBHOOK_SECRET environment variable not set"))?;
        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());
        let api_base = std::env::var("STRIPE_API_BASE")
            .unwrap_or_else(|_| "https://api.stripe.com".to_string());

        Ok(BillingConfig {
            secret_key,
            webhook_secret,
            frontend_url,
            api_base,
        })
    }
}

/// Client for the payment provider's REST API
#[derive(Clone)]
pub struct BillingClient {
    http: reqwest::Client,
    config: BillingConfig,
}

impl BillingClient {
    /// Build a client from the environment; None of the required
    /// variables being set means billing stays disabled
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            config: BillingConfig::from_env()?,
        })
    }

    /// Webhook signing secret
    pub fn webhook_secret(&self) -> &str {
        &self.config.webhook_secret
    }

    /// Create a subscription-mode checkout session, returning its id
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        plan_id: &str,
        user_id: i64,
    ) -> Result<String> {
        let user_id = user_id.to_string();
        let success_url = format!(
            "{}/?success=true&session_id={{CHECKOUT_SESSION_ID}}",
            self.config.frontend_url
        );
        let cancel_url = format!("{}/?canceled=true", self.config.frontend_url);

        let params = [
            ("payment_method_types[]", "card"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("mode", "subscription"),
            ("success_url", success_url.as_str()),
            ("cancel_url", cancel_url.as_str()),
            ("client_reference_id", user_id.as_str()),
            ("metadata[user_id]", user_id.as_str()),
            ("metadata[plan_id]", plan_id),
        ];

        let body = self
            .post_form("/v1/checkout/sessions", &params)
            .await?;
        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("checkout session response missing id"))
    }

    /// Create a billing-portal session, returning its URL
    pub async fn create_portal_session(&self, customer_id: &str) -> Result<String> {
        let params = [
            ("customer", customer_id),
            ("return_url", self.config.frontend_url.as_str()),
        ];

        let body = self
            .post_form("/v1/billing_portal/sessions", &params)
            .await?;
        body["url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("portal session response missing url"))
    }

    async fn post_form(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}{}", self.config.api_base, path))
            .bearer_auth(&self.config.secret_key)
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("payment provider returned {}", response.status());
        }

        Ok(response.json().await?)
    }
}

/// Verify a webhook signature header of the form `t=<ts>,v1=<hex>`
///
/// The signed payload is `"<ts>.<body>"`, authenticated with HMAC-SHA256
/// under the webhook secret. Comparison is constant-time via the MAC
/// verification itself, and the timestamp must be within the tolerance.
pub fn verify_webhook_signature(
    secret: &str,
    header: &str,
    payload: &str,
    now: i64,
    tolerance: i64,
) -> Result<(), String> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or("signature header missing timestamp")?;
    if (now - timestamp).abs() > tolerance {
        return Err("signature timestamp outside tolerance".to_string());
    }

    let signed_payload = format!("{}.{}", timestamp, payload);
    for signature in signatures {
        let Ok(expected) = hex::decode(signature) else {
            continue;
        };
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|_| "invalid webhook secret".to_string())?;
        mac.update(signed_payload.as_bytes());
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err("no matching signature".to_string())
}

/// Request for checkout session creation
#[derive(Debug, Deserialize)]
pub struct CheckoutSessionRequest {
    #[serde(rename = "priceId")]
    pub price_id: String,
    #[serde(rename = "planId")]
    pub plan_id: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// Request for billing-portal session creation
#[derive(Debug, Deserialize)]
pub struct PortalSessionRequest {
    #[serde(rename = "customerId")]
    pub customer_id: String,
}

/// Create the billing sub-router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/create-portal-session", post(create_portal_session))
        .route("/webhook", post(webhook))
}

/// Create a checkout session for a subscription
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let billing = state
        .billing
        .as_ref()
        .ok_or(ApiError::Unavailable("Payment provider not configured"))?;

    let session_id = billing
        .create_checkout_session(&payload.price_id, &payload.plan_id, payload.user_id)
        .await
        .map_err(|e| {
            error!("Failed to create checkout session: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({"sessionId": session_id})))
}

/// Create a billing-portal session
pub async fn create_portal_session(
    State(state): State<AppState>,
    Json(payload): Json<PortalSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let billing = state
        .billing
        .as_ref()
        .ok_or(ApiError::Unavailable("Payment provider not configured"))?;

    let url = billing
        .create_portal_session(&payload.customer_id)
        .await
        .map_err(|e| {
            error!("Failed to create portal session: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({"url": url})))
}

/// Receive and acknowledge subscription lifecycle events
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let billing = state
        .billing
        .as_ref()
        .ok_or(ApiError::Unavailable("Payment provider not configured"))?;

    let signature = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let now = chrono::Utc::now().timestamp();
    verify_webhook_signature(
        billing.webhook_secret(),
        signature,
        &body,
        now,
        WEBHOOK_TOLERANCE_SECONDS,
    )
    .map_err(|e| {
        warn!("Rejected webhook: {}", e);
        ApiError::Unauthorized
    })?;

    let event: Value = serde_json::from_str(&body)
        .map_err(|_| ApiError::Validation("Malformed webhook payload".to_string()))?;
    let event_type = event["type"].as_str().unwrap_or("unknown");

    match event_type {
        "checkout.session.completed" => info!("Checkout session completed"),
        "customer.subscription.updated" => info!("Subscription updated"),
        "customer.subscription.deleted" => info!("Subscription deleted"),
        "invoice.payment_succeeded" => info!("Invoice payment succeeded"),
        "invoice.payment_failed" => warn!("Invoice payment failed"),
        other => info!("Unhandled webhook event: {}", other),
    }

    Ok(Json(json!({"status": "success"})))
}
