//! # Cursor Persistence
//!
//! Keyed get/put for watermark cursors. Per-name atomicity is all the engine
//! needs; there are no multi-key transactional guarantees.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::EventsResult;
use crate::models::PollCursor;

/// Keyed watermark cursor storage
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn load(&self, name: &str) -> EventsResult<Option<PollCursor>>;

    /// Insert or overwrite the cursor for its name. Saving an unchanged
    /// cursor is a deliberate "touch" refreshing the row's updated-at for
    /// observability.
    async fn save(&self, cursor: &PollCursor) -> EventsResult<()>;
}

/// Postgres-backed cursor store over the `poll_cursors` table
#[derive(Debug, Clone)]
pub struct PgCursorStore {
    pool: PgPool,
}

impl PgCursorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CursorStore for PgCursorStore {
    async fn load(&self, name: &str) -> EventsResult<Option<PollCursor>> {
        let cursor = sqlx::query_as::<_, PollCursor>(
            r#"
            SELECT name, next_start_time, record_count
            FROM poll_cursors
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cursor)
    }

    async fn save(&self, cursor: &PollCursor) -> EventsResult<()> {
        sqlx::query(
            r#"
            INSERT INTO poll_cursors (name, next_start_time, record_count, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (name) DO UPDATE
            SET next_start_time = EXCLUDED.next_start_time,
                record_count = EXCLUDED.record_count,
                updated_at = NOW()
            "#,
        )
        .bind(&cursor.name)
        .bind(cursor.next_start_time)
        .bind(cursor.record_count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
