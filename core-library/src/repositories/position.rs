//! Playback position repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::PlaybackPosition;
use bridge_traits::platform::PlatformSendSync;
use sqlx::SqlitePool;
use tracing::debug;

/// Resume-position persistence keyed by media locator.
#[async_trait::async_trait]
pub trait PositionRepository: PlatformSendSync {
    /// Find the saved position for a media key
    ///
    /// # Returns
    /// - `Ok(Some(record))` if found
    /// - `Ok(None)` if not found
    async fn get(&self, media_key: &str) -> Result<Option<PlaybackPosition>>;

    /// Insert or replace the record for `record.media_key`
    ///
    /// Last writer wins; fields are never merged.
    ///
    /// # Errors
    /// Returns error if validation fails or a database error occurs
    async fn upsert(&self, record: &PlaybackPosition) -> Result<()>;

    /// Delete the record for a media key
    ///
    /// # Returns
    /// - `Ok(true)` if a record was deleted
    /// - `Ok(false)` if none existed
    async fn delete(&self, media_key: &str) -> Result<bool>;

    /// Delete every record whose `last_played_at_ms` is strictly below
    /// `threshold_ms`, returning the number removed.
    async fn prune_older_than(&self, threshold_ms: i64) -> Result<u64>;

    /// Count stored records
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of PositionRepository
pub struct SqlitePositionRepository {
    pool: SqlitePool,
}

impl SqlitePositionRepository {
    /// Create a new repository from a SQLite connection pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PositionRepository for SqlitePositionRepository {
    async fn get(&self, media_key: &str) -> Result<Option<PlaybackPosition>> {
        let record = sqlx::query_as::<_, PlaybackPosition>(
            r#"
            SELECT media_key, position_ms, duration_ms, last_played_at_ms
            FROM playback_positions
            WHERE media_key = ?
            "#,
        )
        .bind(media_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn upsert(&self, record: &PlaybackPosition) -> Result<()> {
        record.validate().map_err(|e| LibraryError::InvalidInput {
            field: "PlaybackPosition".to_string(),
            message: e,
        })?;

        sqlx::query(
            r#"
            INSERT INTO playback_positions (
                media_key, position_ms, duration_ms, last_played_at_ms
            )
            VALUES (?, ?, ?, ?)
            ON CONFLICT(media_key) DO UPDATE SET
                position_ms = excluded.position_ms,
                duration_ms = excluded.duration_ms,
                last_played_at_ms = excluded.last_played_at_ms
            "#,
        )
        .bind(&record.media_key)
        .bind(record.position_ms)
        .bind(record.duration_ms)
        .bind(record.last_played_at_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, media_key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM playback_positions WHERE media_key = ?")
            .bind(media_key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn prune_older_than(&self, threshold_ms: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM playback_positions WHERE last_played_at_ms < ?")
            .bind(threshold_ms)
            .execute(&self.pool)
            .await?;

        debug!(
            threshold_ms,
            removed = result.rows_affected(),
            "Pruned stale playback positions"
        );

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM playback_positions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn setup_repo() -> SqlitePositionRepository {
        SqlitePositionRepository::from_pool(create_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = setup_repo().await;
        assert!(repo.get("file:///missing.mkv").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let repo = setup_repo().await;
        let record = PlaybackPosition::new("file:///a.mkv", 6_000, 10_000, 1_000);

        repo.upsert(&record).await.unwrap();

        assert_eq!(repo.get("file:///a.mkv").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let repo = setup_repo().await;
        repo.upsert(&PlaybackPosition::new("k", 6_000, 10_000, 1_000))
            .await
            .unwrap();
        repo.upsert(&PlaybackPosition::new("k", 2_000, 12_000, 2_000))
            .await
            .unwrap();

        let stored = repo.get("k").await.unwrap().unwrap();
        assert_eq!(stored.position_ms, 2_000);
        assert_eq!(stored.duration_ms, 12_000);
        assert_eq!(stored.last_played_at_ms, 2_000);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_record() {
        let repo = setup_repo().await;
        let result = repo.upsert(&PlaybackPosition::new("", 1, 1, 1)).await;

        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup_repo().await;
        repo.upsert(&PlaybackPosition::new("k", 6_000, 10_000, 1_000))
            .await
            .unwrap();

        assert!(repo.delete("k").await.unwrap());
        assert!(!repo.delete("k").await.unwrap());
        assert!(repo.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prune_older_than_is_strict() {
        let repo = setup_repo().await;
        for (key, played_at) in [("old", 100), ("edge", 200), ("new", 300)] {
            repo.upsert(&PlaybackPosition::new(key, 1_000, 10_000, played_at))
                .await
                .unwrap();
        }

        let removed = repo.prune_older_than(200).await.unwrap();

        assert_eq!(removed, 1);
        assert!(repo.get("old").await.unwrap().is_none());
        assert!(repo.get("edge").await.unwrap().is_some());
        assert!(repo.get("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_keys_are_opaque() {
        let repo = setup_repo().await;
        let key = "https://cdn.example.com/v.mkv?token=a&b=c#frag";
        repo.upsert(&PlaybackPosition::new(key, 1, 2, 3)).await.unwrap();

        assert_eq!(repo.get(key).await.unwrap().unwrap().media_key, key);
        assert!(repo.get("https://cdn.example.com/v.mkv").await.unwrap().is_none());
    }
}
