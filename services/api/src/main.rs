use anyhow::Result;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

mod admin;
mod ai;
mod billing;
mod error;
mod identity;
mod jwt;
mod middleware;
mod models;
mod rate_limiter;
mod repositories;
mod revocation;
mod routes;
mod schema;
mod state;
mod validation;

use common::database::{DatabaseConfig, health_check, init_pool};

use crate::{
    admin::AdminConfig,
    ai::TextGenerator,
    billing::BillingClient,
    identity::IdentityVerifier,
    jwt::{JwtConfig, JwtService},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{PreferenceRepository, PresetRepository, UserRepository},
    revocation::RevocationList,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting timer API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Create tables on first run
    schema::init_schema(&pool).await?;
    info!("Database schema ready");

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config);

    // Optional provider glue; the core runs without it
    let billing = match BillingClient::from_env() {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("Billing disabled: {}", e);
            None
        }
    };
    let text_generator = match TextGenerator::from_env() {
        Ok(generator) => Some(generator),
        Err(e) => {
            warn!("Text generation disabled: {}", e);
            None
        }
    };

    let app_state = AppState {
        db_pool: pool.clone(),
        user_repository: UserRepository::new(pool.clone()),
        preference_repository: PreferenceRepository::new(pool.clone()),
        preset_repository: PresetRepository::new(pool),
        jwt_service,
        revocation_list: RevocationList::new(),
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
        billing,
        text_generator,
        admin: AdminConfig::from_env(),
        identity: IdentityVerifier::from_env(),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Timer API service listening on 0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
