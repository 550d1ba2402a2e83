//! Preference repository for database operations

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

use crate::error::ApiResult;

/// Preference repository
#[derive(Clone)]
pub struct PreferenceRepository {
    pool: SqlitePool,
}

impl PreferenceRepository {
    /// Create a new preference repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all preferences for a user, empty map if none
    pub async fn get_all(&self, user_id: i64) -> ApiResult<HashMap<String, String>> {
        let rows = sqlx::query(
            r#"
            SELECT preference_key, preference_value
            FROM user_preferences
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let preferences = rows
            .into_iter()
            .map(|row| (row.get("preference_key"), row.get("preference_value")))
            .collect();

        Ok(preferences)
    }

    /// Upsert a single preference
    ///
    /// One conditional statement, so there is no lost-update window
    /// between an existence check and the write.
    pub async fn set(&self, user_id: i64, key: &str, value: &str) -> ApiResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (user_id, preference_key, preference_value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, preference_key)
            DO UPDATE SET preference_value = excluded.preference_value,
                          updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert several preferences
    ///
    /// Applied key by key; a mid-batch failure leaves earlier keys
    /// written, matching per-key upsert independence.
    pub async fn set_many(&self, user_id: i64, preferences: &HashMap<String, String>) -> ApiResult<()> {
        for (key, value) in preferences {
            self.set(user_id, key, value).await?;
        }
        Ok(())
    }

    /// Delete a preference; an absent key is a no-op
    pub async fn delete(&self, user_id: i64, key: &str) -> ApiResult<()> {
        sqlx::query(
            r#"
            DELETE FROM user_preferences
            WHERE user_id = ? AND preference_key = ?
            "#,
        )
        .bind(user_id)
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
