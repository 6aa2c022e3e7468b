//! Source repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::SourceRow;

/// Get or create a source by name
///
/// Concurrent callers with the same name converge on one row through the
/// UNIQUE constraint.
pub async fn get_or_create_source(pool: &SqlitePool, name: &str) -> Result<SourceRow, SqliteError> {
    let now = chrono::Utc::now().timestamp_micros();

    sqlx::query(
        r#"
        INSERT INTO sources (name, description, created_at)
        VALUES (?, '', ?)
        ON CONFLICT(name) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(now)
    .execute(pool)
    .await?;

    find_source(pool, name)
        .await?
        .ok_or_else(|| SqliteError::Conflict(format!("source {name} vanished after insert")))
}

/// Find a source by name
pub async fn find_source(pool: &SqlitePool, name: &str) -> Result<Option<SourceRow>, SqliteError> {
    let row: Option<(i64, String, String, i64)> = sqlx::query_as(
        "SELECT id, name, description, created_at FROM sources WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, name, description, created_at)| SourceRow {
        id,
        name,
        description,
        created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::test_pool;

    #[tokio::test]
    async fn test_get_or_create_source_is_idempotent() {
        let pool = test_pool().await;

        let first = get_or_create_source(&pool, "host1").await.unwrap();
        let second = get_or_create_source(&pool, "host1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.description, "");

        let other = get_or_create_source(&pool, "host2").await.unwrap();
        assert_ne!(first.id, other.id);
    }

    #[tokio::test]
    async fn test_find_source_missing() {
        let pool = test_pool().await;
        assert!(find_source(&pool, "nope").await.unwrap().is_none());
    }
}
