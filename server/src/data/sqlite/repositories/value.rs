//! Value repository for SQLite operations
//!
//! Each kind has its own table; the metric's kind selects the table and the
//! column type used to decode rows.

use sqlx::{Sqlite, SqlitePool};

use crate::data::sqlite::SqliteError;
use crate::data::types::{MetricRow, NewValue, ValueRow};
use crate::domain::kinds::{Decimal, Kind, TypedValue};

/// Insert values for a metric in a single transaction
///
/// Returns the new row ids in input order. Nothing is written when any value
/// does not match the metric's kind or any insert fails.
pub async fn insert_values(
    pool: &SqlitePool,
    metric: &MetricRow,
    values: &[NewValue],
) -> Result<Vec<i64>, SqliteError> {
    if let Some(bad) = values.iter().find(|v| v.value.kind() != metric.kind) {
        return Err(SqliteError::InvalidInput(format!(
            "{} value for {} metric {}",
            bad.value.kind(),
            metric.kind,
            metric.id
        )));
    }

    let sql = format!(
        "INSERT INTO {} (metric_id, datetime, value) VALUES (?, ?, ?)",
        metric.kind.table_name()
    );

    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(values.len());
    for new in values {
        let query = sqlx::query(&sql).bind(metric.id).bind(new.datetime);
        let query = match &new.value {
            TypedValue::Int(v) => query.bind(*v),
            TypedValue::Float(v) => query.bind(*v),
            TypedValue::Decimal(d) => query.bind(d.micros()),
            TypedValue::String(s) => query.bind(s.clone()),
        };
        let result = query.execute(&mut *tx).await?;
        ids.push(result.last_insert_rowid());
    }
    tx.commit().await?;

    tracing::debug!(metric_id = metric.id, count = ids.len(), "Inserted values");
    Ok(ids)
}

/// Latest value by (datetime, id); the highest id wins among equal datetimes
pub async fn latest_value(
    pool: &SqlitePool,
    metric: &MetricRow,
) -> Result<Option<ValueRow>, SqliteError> {
    Ok(recent_values(pool, metric, 1).await?.pop())
}

/// Most recent `limit` values, returned ascending by (datetime, id)
pub async fn recent_values(
    pool: &SqlitePool,
    metric: &MetricRow,
    limit: i64,
) -> Result<Vec<ValueRow>, SqliteError> {
    let sql = format!(
        r#"
        SELECT id, datetime, value FROM (
            SELECT id, datetime, value FROM {}
            WHERE metric_id = ?
            ORDER BY datetime DESC, id DESC
            LIMIT ?
        )
        ORDER BY datetime, id
        "#,
        metric.kind.table_name()
    );
    fetch_values(pool, metric, &sql, limit).await
}

/// All values, ascending by (datetime, id)
pub async fn all_values(pool: &SqlitePool, metric: &MetricRow) -> Result<Vec<ValueRow>, SqliteError> {
    let sql = format!(
        r#"
        SELECT id, datetime, value FROM {}
        WHERE metric_id = ?
        ORDER BY datetime, id
        LIMIT ?
        "#,
        metric.kind.table_name()
    );
    // LIMIT -1 is unbounded in SQLite
    fetch_values(pool, metric, &sql, -1).await
}

async fn fetch_values(
    pool: &SqlitePool,
    metric: &MetricRow,
    sql: &str,
    limit: i64,
) -> Result<Vec<ValueRow>, SqliteError> {
    match metric.kind {
        Kind::Int => fetch_typed(pool, metric, sql, limit, TypedValue::Int).await,
        Kind::Float => fetch_typed(pool, metric, sql, limit, TypedValue::Float).await,
        Kind::Decimal => {
            fetch_typed(pool, metric, sql, limit, |micros: i64| {
                TypedValue::Decimal(Decimal::from_micros(micros))
            })
            .await
        }
        Kind::String => fetch_typed(pool, metric, sql, limit, TypedValue::String).await,
    }
}

async fn fetch_typed<T, F>(
    pool: &SqlitePool,
    metric: &MetricRow,
    sql: &str,
    limit: i64,
    wrap: F,
) -> Result<Vec<ValueRow>, SqliteError>
where
    T: for<'r> sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite> + Send + Unpin,
    F: Fn(T) -> TypedValue,
{
    let rows: Vec<(i64, i64, T)> = sqlx::query_as(sql)
        .bind(metric.id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, datetime, value)| ValueRow {
            id,
            metric_id: metric.id,
            datetime,
            value: wrap(value),
        })
        .collect())
}
