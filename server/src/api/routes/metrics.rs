//! Metric listing endpoint

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::types::ApiError;
use crate::data::types::MetricSummaryRow;
use crate::domain::{Kind, MetricStore};
use crate::utils::time::micros_to_datetime;

/// Metric DTO for API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct MetricDto {
    pub kind: Kind,
    pub name: String,
    pub source: Option<String>,
    /// `name` or `name@source`
    pub label: String,
    pub sort_order: i64,
    pub entry_count: i64,
    pub last_datetime: Option<DateTime<Utc>>,
}

impl From<MetricSummaryRow> for MetricDto {
    fn from(row: MetricSummaryRow) -> Self {
        let label = row.metric.label();
        Self {
            kind: row.metric.kind,
            name: row.metric.parameter_name,
            source: row.metric.source_name,
            label,
            sort_order: row.metric.sort_order,
            entry_count: row.entry_count,
            last_datetime: row.last_datetime.map(micros_to_datetime),
        }
    }
}

pub fn routes(store: MetricStore) -> Router<()> {
    Router::new().route("/", get(list_metrics)).with_state(store)
}

/// List all metrics in display order
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    tag = "metrics",
    responses(
        (status = 200, description = "Metrics with entry counts", body = Vec<MetricDto>)
    )
)]
pub async fn list_metrics(
    State(store): State<MetricStore>,
) -> Result<Json<Vec<MetricDto>>, ApiError> {
    let metrics = store.list_metrics().await?;
    Ok(Json(metrics.into_iter().map(MetricDto::from).collect()))
}
