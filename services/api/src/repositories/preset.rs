//! Preset repository for database operations
//!
//! Mutations match on `id` and `user_id` in the same statement, so a
//! preset can only be changed by its owner. A mismatch affects zero rows
//! and is reported back as such; the handlers treat it as a silent no-op.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::ApiResult;
use crate::models::Preset;

/// Preset repository
#[derive(Clone)]
pub struct PresetRepository {
    pool: SqlitePool,
}

impl PresetRepository {
    /// Create a new preset repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a preset and return its id
    ///
    /// The caller validates the name and time fields before this runs;
    /// the store does not re-validate.
    pub async fn create(
        &self,
        user_id: i64,
        name: &str,
        hours: i64,
        minutes: i64,
        seconds: i64,
    ) -> ApiResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_presets (user_id, name, hours, minutes, seconds, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(hours)
        .bind(minutes)
        .bind(seconds)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// List a user's presets, newest first
    pub async fn list(&self, user_id: i64) -> ApiResult<Vec<Preset>> {
        let presets = sqlx::query_as::<_, Preset>(
            r#"
            SELECT id, user_id, name, hours, minutes, seconds, created_at
            FROM user_presets
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(presets)
    }

    /// Update a preset owned by the user; returns the number of rows matched
    pub async fn update(
        &self,
        user_id: i64,
        preset_id: i64,
        name: &str,
        hours: i64,
        minutes: i64,
        seconds: i64,
    ) -> ApiResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE user_presets
            SET name = ?, hours = ?, minutes = ?, seconds = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(name)
        .bind(hours)
        .bind(minutes)
        .bind(seconds)
        .bind(preset_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a preset owned by the user; returns the number of rows matched
    pub async fn delete(&self, user_id: i64, preset_id: i64) -> ApiResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_presets
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(preset_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::UserRepository;
    use crate::schema::memory_pool;

    async fn setup() -> (PresetRepository, i64, i64) {
        let pool = memory_pool().await;
        let users = UserRepository::new(pool.clone());
        let alice = users.create("alice", "alice@x.com", "password1").await.unwrap();
        let bob = users.create("bob", "bob@x.com", "password2").await.unwrap();
        (PresetRepository::new(pool), alice, bob)
    }

    #[tokio::test]
    async fn test_create_and_list_round_trip() {
        let (repo, alice, _) = setup().await;

        let id = repo.create(alice, "Pomodoro", 0, 25, 0).await.unwrap();
        let presets = repo.list(alice).await.unwrap();

        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].id, id);
        assert_eq!(presets[0].name, "Pomodoro");
        assert_eq!(presets[0].minutes, 25);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (repo, alice, _) = setup().await;

        repo.create(alice, "first", 0, 5, 0).await.unwrap();
        repo.create(alice, "second", 0, 10, 0).await.unwrap();

        let presets = repo.list(alice).await.unwrap();
        assert_eq!(presets[0].name, "second");
        assert_eq!(presets[1].name, "first");
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let (repo, alice, bob) = setup().await;

        repo.create(alice, "mine", 0, 5, 0).await.unwrap();
        assert!(repo.list(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_a_no_op() {
        let (repo, alice, bob) = setup().await;
        let id = repo.create(alice, "Pomodoro", 0, 25, 0).await.unwrap();

        let matched = repo.update(bob, id, "hijacked", 1, 0, 0).await.unwrap();
        assert_eq!(matched, 0);

        // Store state unchanged
        let presets = repo.list(alice).await.unwrap();
        assert_eq!(presets[0].name, "Pomodoro");
        assert_eq!(presets[0].minutes, 25);
    }

    #[tokio::test]
    async fn test_owner_update_changes_the_row() {
        let (repo, alice, _) = setup().await;
        let id = repo.create(alice, "Pomodoro", 0, 25, 0).await.unwrap();

        let matched = repo.update(alice, id, "Long break", 0, 15, 0).await.unwrap();
        assert_eq!(matched, 1);

        let presets = repo.list(alice).await.unwrap();
        assert_eq!(presets[0].name, "Long break");
        assert_eq!(presets[0].minutes, 15);
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_a_no_op() {
        let (repo, alice, bob) = setup().await;
        let id = repo.create(alice, "Pomodoro", 0, 25, 0).await.unwrap();

        assert_eq!(repo.delete(bob, id).await.unwrap(), 0);
        assert_eq!(repo.list(alice).await.unwrap().len(), 1);

        assert_eq!(repo.delete(alice, id).await.unwrap(), 1);
        assert!(repo.list(alice).await.unwrap().is_empty());
    }
}
