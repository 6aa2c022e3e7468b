//! Report repository for SQLite operations

use sqlx::SqlitePool;

use super::metric::{MetricTuple, SELECT_METRIC, to_metric_row};
use crate::data::sqlite::SqliteError;
use crate::data::types::{MetricRow, ReportRow};

/// Create a report, or update the view of an existing one when it differs
pub async fn upsert_report(
    pool: &SqlitePool,
    name: &str,
    view: i64,
) -> Result<ReportRow, SqliteError> {
    let now = chrono::Utc::now().timestamp_micros();

    sqlx::query(
        r#"
        INSERT INTO reports (name, view, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            view = excluded.view,
            updated_at = excluded.updated_at
        WHERE reports.view != excluded.view
        "#,
    )
    .bind(name)
    .bind(view)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_report(pool, name)
        .await?
        .ok_or_else(|| SqliteError::Conflict(format!("report {name} vanished after upsert")))
}

/// Get a report by name
pub async fn get_report(pool: &SqlitePool, name: &str) -> Result<Option<ReportRow>, SqliteError> {
    let row: Option<(i64, String, i64, i64, i64)> = sqlx::query_as(
        "SELECT id, name, view, created_at, updated_at FROM reports WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, name, view, created_at, updated_at)| ReportRow {
        id,
        name,
        view,
        created_at,
        updated_at,
    }))
}

/// Append a metric to the end of a report (idempotent)
/// Returns true if added, false if already a member
pub async fn add_report_metric(
    pool: &SqlitePool,
    report_id: i64,
    metric_id: i64,
) -> Result<bool, SqliteError> {
    let result = sqlx::query(
        r#"
        INSERT INTO report_metrics (report_id, metric_id, position)
        VALUES (?, ?, COALESCE((SELECT MAX(position) FROM report_metrics WHERE report_id = ?), 0) + 1)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(report_id)
    .bind(metric_id)
    .bind(report_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List a report's metrics in member order
pub async fn list_report_metrics(
    pool: &SqlitePool,
    report_id: i64,
) -> Result<Vec<MetricRow>, SqliteError> {
    let rows: Vec<MetricTuple> = sqlx::query_as(&format!(
        r#"{SELECT_METRIC}
        JOIN report_metrics rm ON rm.metric_id = m.id
        WHERE rm.report_id = ?
        ORDER BY rm.position
        "#
    ))
    .bind(report_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(to_metric_row).collect()
}

/// Delete a report and its memberships
/// Returns true if deleted, false if it didn't exist
pub async fn delete_report(pool: &SqlitePool, name: &str) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM reports WHERE name = ?")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
