//! Parameter repository for SQLite operations

use sqlx::SqlitePool;

use super::parse_kind;
use crate::data::sqlite::SqliteError;
use crate::data::types::{ParameterDefaults, ParameterRow};
use crate::domain::kinds::Kind;

type ParameterTuple = (
    i64,
    String,
    String,
    String,
    Option<i64>,
    Option<i64>,
    i64,
    i64,
    i64,
);

const SELECT_PARAMETER: &str = r#"
    SELECT id, kind, name, description, min_value, max_value,
           max_lifetime_days, max_num_entries, created_at
    FROM parameters
"#;

fn to_parameter_row(row: ParameterTuple) -> Result<ParameterRow, SqliteError> {
    let (
        id,
        kind,
        name,
        description,
        min_value,
        max_value,
        max_lifetime_days,
        max_num_entries,
        created_at,
    ) = row;
    Ok(ParameterRow {
        id,
        kind: parse_kind(&kind)?,
        name,
        description,
        min_value,
        max_value,
        max_lifetime_days,
        max_num_entries,
        created_at,
    })
}

/// Get or create a parameter by (kind, name)
///
/// Retention defaults are written only when the row is created; an existing
/// parameter keeps its stored metadata.
pub async fn get_or_create_parameter(
    pool: &SqlitePool,
    kind: Kind,
    name: &str,
    defaults: &ParameterDefaults,
) -> Result<ParameterRow, SqliteError> {
    let now = chrono::Utc::now().timestamp_micros();

    let result = sqlx::query(
        r#"
        INSERT INTO parameters (kind, name, description, max_lifetime_days, max_num_entries, created_at)
        VALUES (?, ?, '', ?, ?, ?)
        ON CONFLICT(kind, name) DO NOTHING
        "#,
    )
    .bind(kind.as_str())
    .bind(name)
    .bind(defaults.max_lifetime_days)
    .bind(defaults.max_num_entries)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        tracing::debug!(kind = %kind, name, "Created parameter");
    }

    find_parameter(pool, kind, name).await?.ok_or_else(|| {
        SqliteError::Conflict(format!("parameter {kind}:{name} vanished after insert"))
    })
}

/// Find a parameter by (kind, name)
pub async fn find_parameter(
    pool: &SqlitePool,
    kind: Kind,
    name: &str,
) -> Result<Option<ParameterRow>, SqliteError> {
    let row: Option<ParameterTuple> =
        sqlx::query_as(&format!("{SELECT_PARAMETER} WHERE kind = ? AND name = ?"))
            .bind(kind.as_str())
            .bind(name)
            .fetch_optional(pool)
            .await?;

    row.map(to_parameter_row).transpose()
}

/// Replace the description of a parameter
pub async fn set_parameter_description(
    pool: &SqlitePool,
    parameter_id: i64,
    description: &str,
) -> Result<(), SqliteError> {
    sqlx::query("UPDATE parameters SET description = ? WHERE id = ?")
        .bind(description)
        .bind(parameter_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Count all parameters
pub async fn count_parameters(pool: &SqlitePool) -> Result<i64, SqliteError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parameters")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
