use async_trait::async_trait;

use super::schema::SqliteStore;
use super::types::{HeadMarker, StoreError};
use super::HeadStore;

fn map_err(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolClosed => StoreError::Closed,
        other => StoreError::from_sqlx(other),
    }
}

#[async_trait]
impl HeadStore for SqliteStore {
    async fn get(&self, url: &str) -> Result<Option<HeadMarker>, StoreError> {
        sqlx::query_as::<_, HeadMarker>(
            "SELECT title, updated, published FROM feed_heads WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    /// Single-statement upsert: every column is overwritten, so a reader
    /// sees either the previous marker or the new one.
    async fn set(&self, url: &str, head: &HeadMarker) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO feed_heads (url, title, updated, published, stored_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                updated = excluded.updated,
                published = excluded.published,
                stored_at = excluded.stored_at
        "#,
        )
        .bind(url)
        .bind(&head.title)
        .bind(&head.updated)
        .bind(&head.published)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}
