//! SQLite chat history implementation.
//!
//! Implements `HistoryRepository` from `aidash-core` using sqlx with split
//! read/write pools. Each project's message list is stored as one JSON array.

use aidash_core::chat::repository::HistoryRepository;
use aidash_types::chat::ChatMessage;
use aidash_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `HistoryRepository`.
#[derive(Clone)]
pub struct SqliteHistoryRepository {
    pool: DatabasePool,
}

/// Stored-history overview for one project.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub project_id: String,
    pub message_count: u64,
    pub updated_at: DateTime<Utc>,
}

impl SqliteHistoryRepository {
    /// Create a new history repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// One summary per project with stored history, most recent first.
    pub async fn summaries(&self) -> Result<Vec<HistorySummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT project_id, json_array_length(messages) AS message_count, updated_at \
             FROM chat_history ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let project_id: String = row
                    .try_get("project_id")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let count: i64 = row
                    .try_get("message_count")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let updated_at: String = row
                    .try_get("updated_at")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(HistorySummary {
                    project_id,
                    message_count: count.max(0) as u64,
                    updated_at: parse_datetime(&updated_at)?,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// HistoryRepository implementation
// ---------------------------------------------------------------------------

impl HistoryRepository for SqliteHistoryRepository {
    async fn load(&self, project_id: &str) -> Result<Vec<ChatMessage>, RepositoryError> {
        let row = sqlx::query("SELECT messages FROM chat_history WHERE project_id = ?")
            .bind(project_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let raw: String = row
                    .try_get("messages")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                serde_json::from_str(&raw).map_err(|e| {
                    RepositoryError::Serialization(format!("invalid stored history: {e}"))
                })
            }
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, project_id: &str, messages: &[ChatMessage]) -> Result<(), RepositoryError> {
        let now = format_datetime(&Utc::now());
        let raw = serde_json::to_string(messages)
            .map_err(|e| RepositoryError::Serialization(format!("failed to serialize history: {e}")))?;

        sqlx::query(
            r#"INSERT INTO chat_history (project_id, messages, created_at, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT (project_id) DO UPDATE SET messages = excluded.messages, updated_at = excluded.updated_at"#,
        )
        .bind(project_id)
        .bind(&raw)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tracing::debug!(project = %project_id, messages = messages.len(), "chat history saved");
        Ok(())
    }

    async fn clear(&self, project_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM chat_history WHERE project_id = ?")
            .bind(project_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
