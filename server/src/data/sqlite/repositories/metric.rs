//! Metric repository for SQLite operations

use sqlx::SqlitePool;

use super::parse_kind;
use crate::data::sqlite::SqliteError;
use crate::data::types::{MetricRow, MetricSummaryRow};

pub(super) type MetricTuple = (i64, i64, Option<i64>, i64, String, String, Option<String>, i64);

/// Metric columns joined with parameter kind/name and source name
pub(super) const SELECT_METRIC: &str = r#"
    SELECT m.id, m.parameter_id, m.source_id, m.sort_order,
           p.kind, p.name, s.name, m.created_at
    FROM metrics m
    JOIN parameters p ON p.id = m.parameter_id
    LEFT JOIN sources s ON s.id = m.source_id
"#;

pub(super) fn to_metric_row(row: MetricTuple) -> Result<MetricRow, SqliteError> {
    let (id, parameter_id, source_id, sort_order, kind, parameter_name, source_name, created_at) =
        row;
    Ok(MetricRow {
        id,
        parameter_id,
        source_id,
        sort_order,
        kind: parse_kind(&kind)?,
        parameter_name,
        source_name,
        created_at,
    })
}

/// Get or create the metric for (parameter, source)
///
/// A missing source is its own identity: the two partial UNIQUE indexes keep
/// at most one sourceless metric and one metric per source for a parameter.
/// New metrics are appended to the end of the display order.
pub async fn get_or_create_metric(
    pool: &SqlitePool,
    parameter_id: i64,
    source_id: Option<i64>,
) -> Result<MetricRow, SqliteError> {
    let now = chrono::Utc::now().timestamp_micros();

    let result = sqlx::query(
        r#"
        INSERT INTO metrics (parameter_id, source_id, sort_order, created_at)
        VALUES (?, ?, COALESCE((SELECT MAX(sort_order) FROM metrics), 0) + 1, ?)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(parameter_id)
    .bind(source_id)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        tracing::debug!(parameter_id, ?source_id, "Created metric");
    }

    find_metric(pool, parameter_id, source_id)
        .await?
        .ok_or_else(|| {
            SqliteError::Conflict(format!(
                "metric {parameter_id}@{source_id:?} vanished after insert"
            ))
        })
}

/// Find the metric for (parameter, source)
pub async fn find_metric(
    pool: &SqlitePool,
    parameter_id: i64,
    source_id: Option<i64>,
) -> Result<Option<MetricRow>, SqliteError> {
    // `IS ?` matches NULL against NULL and a value against itself
    let row: Option<MetricTuple> = sqlx::query_as(&format!(
        "{SELECT_METRIC} WHERE m.parameter_id = ? AND m.source_id IS ?"
    ))
    .bind(parameter_id)
    .bind(source_id)
    .fetch_optional(pool)
    .await?;

    row.map(to_metric_row).transpose()
}

/// List all metrics in display order with entry counts and last entry time
pub async fn list_metrics(pool: &SqlitePool) -> Result<Vec<MetricSummaryRow>, SqliteError> {
    let rows: Vec<(i64, i64, Option<i64>, i64, String, String, Option<String>, i64, i64, Option<i64>)> =
        sqlx::query_as(
            r#"
            SELECT m.id, m.parameter_id, m.source_id, m.sort_order,
                   p.kind, p.name, s.name, m.created_at,
                   COALESCE(v.entry_count, 0), v.last_datetime
            FROM metrics m
            JOIN parameters p ON p.id = m.parameter_id
            LEFT JOIN sources s ON s.id = m.source_id
            LEFT JOIN (
                SELECT metric_id, COUNT(*) AS entry_count, MAX(datetime) AS last_datetime
                FROM (
                    SELECT metric_id, datetime FROM int_values
                    UNION ALL SELECT metric_id, datetime FROM float_values
                    UNION ALL SELECT metric_id, datetime FROM decimal_values
                    UNION ALL SELECT metric_id, datetime FROM string_values
                )
                GROUP BY metric_id
            ) v ON v.metric_id = m.id
            ORDER BY m.sort_order, m.id
            "#,
        )
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(
            |(id, parameter_id, source_id, sort_order, kind, name, source, created_at, count, last)| {
                Ok(MetricSummaryRow {
                    metric: to_metric_row((
                        id,
                        parameter_id,
                        source_id,
                        sort_order,
                        kind,
                        name,
                        source,
                        created_at,
                    ))?,
                    entry_count: count,
                    last_datetime: last,
                })
            },
        )
        .collect()
}
