//! User repository for database operations

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::User;

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user and return its id
    ///
    /// The password is hashed with argon2 and a per-user random salt. A
    /// username or email collision surfaces as `ApiError::Duplicate`; the
    /// unique constraints in the schema are the single source of truth,
    /// there is no existence pre-check that could race.
    pub async fn create(&self, username: &str, email: &str, password: &str) -> ApiResult<i64> {
        info!("Creating new user: {}", username);

        let salt = SaltString::generate(&mut rand::thread_rng());
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| ApiError::Internal)?
            .to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::Duplicate,
            _ => ApiError::Database(e),
        })?;

        Ok(result.last_insert_rowid())
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, last_login
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, last_login
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Verify a user's credentials
    ///
    /// Returns the user on success, updating the last-login timestamp as
    /// a side effect. An unknown username and a wrong password both come
    /// back as `None`, indistinguishable to the caller.
    pub async fn verify_password(&self, username: &str, password: &str) -> ApiResult<Option<User>> {
        let Some(mut user) = self.find_by_username(username).await? else {
            return Ok(None);
        };

        let parsed_hash =
            PasswordHash::new(&user.password_hash).map_err(|_| ApiError::Internal)?;

        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            return Ok(None);
        }

        let now = Utc::now();
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(now)
            .bind(user.id)
            .execute(&self.pool)
            .await?;
        user.last_login = Some(now);

        Ok(Some(user))
    }
}
