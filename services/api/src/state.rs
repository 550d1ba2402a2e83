//! Application state shared across handlers
//!
//! Everything a handler touches is constructed once in `main` and injected
//! here; there are no module-level singletons.

use sqlx::SqlitePool;

use crate::{
    admin::AdminConfig,
    ai::TextGenerator,
    billing::BillingClient,
    identity::IdentityVerifier,
    jwt::JwtService,
    rate_limiter::RateLimiter,
    repositories::{PreferenceRepository, PresetRepository, UserRepository},
    revocation::RevocationList,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub user_repository: UserRepository,
    pub preference_repository: PreferenceRepository,
    pub preset_repository: PresetRepository,
    pub jwt_service: JwtService,
    pub revocation_list: RevocationList,
    pub rate_limiter: RateLimiter,
    pub billing: Option<BillingClient>,
    pub text_generator: Option<TextGenerator>,
    pub admin: AdminConfig,
    pub identity: IdentityVerifier,
}

#[cfg(test)]
impl AppState {
    /// State wired to an in-memory database, for handler and gate tests
    pub async fn in_memory() -> Self {
        use crate::jwt::JwtConfig;
        use crate::rate_limiter::RateLimiterConfig;

        let pool = crate::schema::memory_pool().await;
        AppState {
            db_pool: pool.clone(),
            user_repository: UserRepository::new(pool.clone()),
            preference_repository: PreferenceRepository::new(pool.clone()),
            preset_repository: PresetRepository::new(pool),
            jwt_service: JwtService::new(JwtConfig {
                secret: "test-secret".to_string(),
                access_token_expiry: 86400,
            }),
            revocation_list: RevocationList::new(),
            rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
            billing: None,
            text_generator: None,
            admin: AdminConfig { username: None },
            identity: IdentityVerifier::unconfigured(),
        }
    }
}
