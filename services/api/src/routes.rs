//! API service routes
//!
//! Public surface: health, register, login, identity verification, and
//! the billing webhook glue. Everything else sits behind the
//! authentication gate, which resolves the bearer token to an owning
//! user id before the handler runs.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use std::collections::HashMap;
use tracing::info;

use crate::{
    admin, billing, identity,
    error::ApiError,
    middleware::{AuthUser, auth_middleware},
    models::{
        LoginRequest, PreferencesResponse, PresetRequest, PresetResponse, RegisterRequest,
        SetPreferenceRequest, SetPreferencesRequest, UserPublic,
    },
    state::AppState,
    validation,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/preferences", get(get_preferences).post(set_preferences))
        .route(
            "/api/preferences/:key",
            put(set_preference).delete(delete_preference),
        )
        .route("/api/presets", get(list_presets).post(create_preset))
        .route("/api/presets/:id", put(update_preset).delete(delete_preset))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify-session", post(identity::verify_session))
        .nest("/api/stripe", billing::router())
        .nest("/api/admin", admin::router(state.clone()))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "Timer API is running"
    }))
}

/// Register a new user
///
/// On success a default preference set is seeded for the new account, a
/// service-layer side effect after the credential store insert succeeds.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_username(&payload.username).map_err(ApiError::Validation)?;
    validation::validate_email(&payload.email).map_err(ApiError::Validation)?;
    validation::validate_password(&payload.password).map_err(ApiError::Validation)?;

    let user_id = state
        .user_repository
        .create(&payload.username, &payload.email, &payload.password)
        .await?;

    state
        .preference_repository
        .set_many(user_id, &default_preferences())
        .await?;

    info!("Registered user {} ({})", payload.username, user_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user_id": user_id
        })),
    ))
}

fn default_preferences() -> HashMap<String, String> {
    HashMap::from([
        ("voice_enabled".to_string(), "true".to_string()),
        ("default_hours".to_string(), "0".to_string()),
        ("default_minutes".to_string(), "1".to_string()),
        ("default_seconds".to_string(), "0".to_string()),
    ])
}

/// Login and mint a session token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.rate_limiter.check(&payload.username).await {
        return Err(ApiError::RateLimited);
    }

    let user = state
        .user_repository
        .verify_password(&payload.username, &payload.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    state.rate_limiter.reset(&payload.username).await;

    let access_token = state
        .jwt_service
        .generate_token(user.id)
        .map_err(|_| ApiError::Internal)?;

    info!("User {} logged in", user.id);

    Ok(Json(json!({
        "message": "Login successful",
        "access_token": access_token,
        "user": UserPublic::from(&user)
    })))
}

/// Logout by revoking the token's identifier
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    state.revocation_list.revoke(auth.jti).await;
    info!("User {} logged out", auth.id);

    Ok(Json(json!({"message": "Logout successful"})))
}

/// Get the current authenticated user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "created_at": user.created_at,
        "last_login": user.last_login
    })))
}

/// Get all preferences for the current user
pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let preferences = state.preference_repository.get_all(auth.id).await?;

    Ok(Json(PreferencesResponse { preferences }))
}

/// Set several preferences for the current user
pub async fn set_preferences(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<SetPreferencesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .preference_repository
        .set_many(auth.id, &payload.preferences)
        .await?;

    Ok(Json(json!({"message": "Preferences updated successfully"})))
}

/// Set a single preference
pub async fn set_preference(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(key): Path<String>,
    Json(payload): Json<SetPreferenceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .preference_repository
        .set(auth.id, &key, &payload.value)
        .await?;

    Ok(Json(json!({"message": "Preference updated successfully"})))
}

/// Delete a preference
pub async fn delete_preference(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.preference_repository.delete(auth.id, &key).await?;

    Ok(Json(json!({"message": "Preference deleted successfully"})))
}

/// List the current user's timer presets, newest first
pub async fn list_presets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let presets: Vec<PresetResponse> = state
        .preset_repository
        .list(auth.id)
        .await?
        .into_iter()
        .map(PresetResponse::from)
        .collect();

    Ok(Json(json!({"presets": presets})))
}

/// Create a timer preset
pub async fn create_preset(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<PresetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_preset(&payload.name, payload.hours, payload.minutes, payload.seconds)
        .map_err(ApiError::Validation)?;

    let preset_id = state
        .preset_repository
        .create(
            auth.id,
            &payload.name,
            payload.hours,
            payload.minutes,
            payload.seconds,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Preset created successfully",
            "preset_id": preset_id
        })),
    ))
}

/// Update a timer preset
///
/// An id that does not belong to the caller matches zero rows; that is
/// deliberately a no-op rather than an error, so the existence of other
/// users' presets never leaks.
pub async fn update_preset(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<PresetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_preset(&payload.name, payload.hours, payload.minutes, payload.seconds)
        .map_err(ApiError::Validation)?;

    state
        .preset_repository
        .update(
            auth.id,
            id,
            &payload.name,
            payload.hours,
            payload.minutes,
            payload.seconds,
        )
        .await?;

    Ok(Json(json!({"message": "Preset updated successfully"})))
}

/// Delete a timer preset
pub async fn delete_preset(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.preset_repository.delete(auth.id, id).await?;

    Ok(Json(json!({"message": "Preset deleted successfully"})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register_alice(state: &AppState) -> i64 {
        let response = register(
            State(state.clone()),
            Json(RegisterRequest {
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                password: "password1".to_string(),
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        body_json(response).await["user_id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_register_returns_numeric_id_and_seeds_defaults() {
        let state = AppState::in_memory().await;
        let user_id = register_alice(&state).await;
        assert!(user_id > 0);

        let prefs = state.preference_repository.get_all(user_id).await.unwrap();
        assert_eq!(prefs.get("voice_enabled").map(String::as_str), Some("true"));
        assert_eq!(prefs.get("default_hours").map(String::as_str), Some("0"));
        assert_eq!(prefs.get("default_minutes").map(String::as_str), Some("1"));
        assert_eq!(prefs.get("default_seconds").map(String::as_str), Some("0"));
    }

    #[tokio::test]
    async fn test_register_rejects_short_username_before_any_write() {
        let state = AppState::in_memory().await;
        let err = register(
            State(state.clone()),
            Json(RegisterRequest {
                username: "ab".to_string(),
                email: "ab@x.com".to_string(),
                password: "password1".to_string(),
            }),
        )
        .await
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        assert!(
            state
                .user_repository
                .find_by_username("ab")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_a_conflict() {
        let state = AppState::in_memory().await;
        register_alice(&state).await;

        let err = register(
            State(state.clone()),
            Json(RegisterRequest {
                username: "alice".to_string(),
                email: "fresh@x.com".to_string(),
                password: "password1".to_string(),
            }),
        )
        .await
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, ApiError::Duplicate));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let state = AppState::in_memory().await;
        register_alice(&state).await;

        let wrong_password = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "alice".to_string(),
                password: "wrong-pass".to_string(),
            }),
        )
        .await
        .map(|_| ())
        .unwrap_err();

        let unknown_user = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "mallory".to_string(),
                password: "wrong-pass".to_string(),
            }),
        )
        .await
        .map(|_| ())
        .unwrap_err();

        assert!(matches!(wrong_password, ApiError::InvalidCredentials));
        assert!(matches!(unknown_user, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_token_embeds_the_owner_and_logout_revokes_it() {
        let state = AppState::in_memory().await;
        let user_id = register_alice(&state).await;

        let response = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "alice".to_string(),
                password: "password1".to_string(),
            }),
        )
        .await
        .unwrap()
        .into_response();
        let body = body_json(response).await;
        let token = body["access_token"].as_str().unwrap().to_string();
        assert_eq!(body["user"]["id"].as_i64(), Some(user_id));

        // authenticate: resolves to the owner, not yet revoked
        let claims = state.jwt_service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(!state.revocation_list.is_revoked(&claims.jti).await);

        logout(
            State(state.clone()),
            Extension(AuthUser {
                id: claims.sub,
                jti: claims.jti,
            }),
        )
        .await
        .unwrap();

        // The token is still well-formed and unexpired, but the gate now
        // rejects it because its jti is revoked
        assert!(state.revocation_list.is_revoked(&claims.jti).await);
    }

    #[tokio::test]
    async fn test_create_preset_rejects_out_of_range_hours_before_write() {
        let state = AppState::in_memory().await;
        let user_id = register_alice(&state).await;
        let auth = AuthUser {
            id: user_id,
            jti: uuid::Uuid::new_v4(),
        };

        let err = create_preset(
            State(state.clone()),
            Extension(auth),
            Json(PresetRequest {
                name: "x".to_string(),
                hours: 25,
                minutes: 0,
                seconds: 0,
            }),
        )
        .await
        .map(|_| ())
        .unwrap_err();

        match err {
            ApiError::Validation(msg) => assert!(msg.contains("Hours")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(state.preset_repository.list(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preset_create_list_flow() {
        let state = AppState::in_memory().await;
        let user_id = register_alice(&state).await;
        let auth = AuthUser {
            id: user_id,
            jti: uuid::Uuid::new_v4(),
        };

        let response = create_preset(
            State(state.clone()),
            Extension(auth),
            Json(PresetRequest {
                name: "Pomodoro".to_string(),
                hours: 0,
                minutes: 25,
                seconds: 0,
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = list_presets(State(state.clone()), Extension(auth))
            .await
            .unwrap()
            .into_response();
        let body = body_json(response).await;
        let presets = body["presets"].as_array().unwrap();
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0]["name"], "Pomodoro");
        assert_eq!(presets[0]["minutes"], 25);
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_session_lifecycle_through_the_router() {
        let app = create_router(AppState::in_memory().await);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                json!({
                    "username": "alice",
                    "email": "alice@x.com",
                    "password": "password1"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                json!({"username": "alice", "password": "password1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await["access_token"]
            .as_str()
            .unwrap()
            .to_string();

        // The minted token passes the gate
        let response = app
            .clone()
            .oneshot(get_request("/api/auth/me", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["username"], "alice");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Same token, same route, but the jti is now revoked
        let response = app
            .oneshot(get_request("/api/auth/me", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
