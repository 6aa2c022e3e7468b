//! Database migration system
//!
//! Handles schema versioning and incremental migrations.
//! Version 1 is the initial schema.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use super::error::SqliteError;
use super::schema::{SCHEMA, SCHEMA_VERSION};

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteError> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        tracing::debug!(
            "Initializing database with schema version {}",
            SCHEMA_VERSION
        );
        apply_initial_schema(pool).await?;
        return Ok(());
    }

    let current_version: i32 =
        sqlx::query_scalar("SELECT version FROM schema_version WHERE id = 1")
            .fetch_optional(pool)
            .await?
            .unwrap_or(0);

    if current_version > SCHEMA_VERSION {
        return Err(SqliteError::SchemaTooNew {
            found: current_version,
            supported: SCHEMA_VERSION,
        });
    }

    let applied_checksum: Option<String> =
        sqlx::query_scalar("SELECT checksum FROM schema_migrations WHERE version = ?")
            .bind(current_version)
            .fetch_optional(pool)
            .await?;
    if current_version == SCHEMA_VERSION
        && applied_checksum.is_some_and(|c| c != schema_checksum(SCHEMA))
    {
        tracing::warn!(
            version = current_version,
            "Applied schema differs from the bundled schema of the same version"
        );
    }

    tracing::debug!(
        "Database schema is up to date (version {})",
        current_version
    );
    Ok(())
}

/// Apply the initial schema (version 1)
async fn apply_initial_schema(pool: &SqlitePool) -> Result<(), SqliteError> {
    let start = std::time::Instant::now();

    let mut tx = pool.begin().await?;

    sqlx::query(SCHEMA)
        .execute(&mut *tx)
        .await
        .map_err(|e| SqliteError::MigrationFailed {
            version: SCHEMA_VERSION,
            name: "initial_schema".to_string(),
            error: e.to_string(),
        })?;

    let now = chrono::Utc::now().timestamp_micros();
    sqlx::query(
        "INSERT INTO schema_version (id, version, applied_at, description) VALUES (1, ?, ?, 'Initial schema')",
    )
    .bind(SCHEMA_VERSION)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let elapsed_ms = start.elapsed().as_millis() as i64;
    sqlx::query(
        "INSERT INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms, success) VALUES (?, ?, ?, ?, ?, 1)",
    )
    .bind(SCHEMA_VERSION)
    .bind("initial_schema")
    .bind(now)
    .bind(schema_checksum(SCHEMA))
    .bind(elapsed_ms)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!("Applied initial schema in {}ms", elapsed_ms);
    Ok(())
}

/// SHA-256 of the migration SQL, hex encoded
fn schema_checksum(sql: &str) -> String {
    hex::encode(Sha256::digest(sql.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn empty_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[test]
    fn test_schema_checksum_is_stable_hex() {
        let a = schema_checksum("SELECT 1");
        let b = schema_checksum("SELECT 1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, schema_checksum("SELECT 2"));
    }

    #[tokio::test]
    async fn test_run_migrations_fresh_database() {
        let pool = empty_pool().await;
        run_migrations(&pool).await.unwrap();

        let version: i32 = sqlx::query_scalar("SELECT version FROM schema_version WHERE id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let (name, checksum): (String, String) =
            sqlx::query_as("SELECT name, checksum FROM schema_migrations WHERE version = ?")
                .bind(SCHEMA_VERSION)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(name, "initial_schema");
        assert_eq!(checksum, schema_checksum(SCHEMA));
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = empty_pool().await;
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_run_migrations_rejects_newer_schema() {
        let pool = empty_pool().await;
        run_migrations(&pool).await.unwrap();
        sqlx::query("UPDATE schema_version SET version = ? WHERE id = 1")
            .bind(SCHEMA_VERSION + 1)
            .execute(&pool)
            .await
            .unwrap();

        let err = run_migrations(&pool).await.unwrap_err();
        assert!(matches!(
            err,
            SqliteError::SchemaTooNew {
                supported: SCHEMA_VERSION,
                ..
            }
        ));
    }
}
