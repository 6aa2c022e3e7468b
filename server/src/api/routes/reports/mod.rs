//! Report API endpoints

pub mod types;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::extractors::{ValidatedJson, ValidatedQuery};
use crate::api::routes::data::types::SeriesQuery;
use crate::api::types::ApiError;
use crate::domain::reports::ChartSeries;
use crate::domain::{MetricIdentity, MetricStore, PivotTable};

use types::{ReportDto, ReportTableQuery, UpsertReportRequest};

/// Shared state for Reports API endpoints
#[derive(Clone)]
pub struct ReportsApiState {
    pub store: MetricStore,
}

/// Build Reports API routes
pub fn routes(store: MetricStore) -> Router<()> {
    let state = ReportsApiState { store };

    Router::new()
        .route(
            "/{name}",
            get(get_report).put(upsert_report).delete(delete_report),
        )
        .route("/{name}/series", get(get_report_series))
        .route("/{name}/table", get(get_report_table))
        .with_state(state)
}

/// Create a report or extend an existing one
///
/// The view is replaced; metrics are appended in order and must name
/// existing parameters.
#[utoipa::path(
    put,
    path = "/api/v1/reports/{name}",
    tag = "reports",
    params(("name" = String, Path, description = "Report name")),
    request_body = UpsertReportRequest,
    responses(
        (status = 200, description = "Report", body = ReportDto),
        (status = 400, description = "Invalid view or identity"),
        (status = 404, description = "A member names an unknown parameter")
    )
)]
pub async fn upsert_report(
    State(state): State<ReportsApiState>,
    Path(name): Path<String>,
    ValidatedJson(req): ValidatedJson<UpsertReportRequest>,
) -> Result<Json<ReportDto>, ApiError> {
    let identities = req
        .metrics
        .iter()
        .map(|raw| raw.parse::<MetricIdentity>())
        .collect::<Result<Vec<_>, _>>()?;

    let report = state
        .store
        .reports()
        .upsert(&name, req.view, &identities)
        .await?;
    Ok(Json(ReportDto::from(report)))
}

/// Get a report with its members in order
#[utoipa::path(
    get,
    path = "/api/v1/reports/{name}",
    tag = "reports",
    params(("name" = String, Path, description = "Report name")),
    responses(
        (status = 200, description = "Report", body = ReportDto),
        (status = 404, description = "Report not found")
    )
)]
pub async fn get_report(
    State(state): State<ReportsApiState>,
    Path(name): Path<String>,
) -> Result<Json<ReportDto>, ApiError> {
    let report = state.store.reports().get(&name).await?;
    Ok(Json(ReportDto::from(report)))
}

/// Delete a report; member metrics and their values are kept
#[utoipa::path(
    delete,
    path = "/api/v1/reports/{name}",
    tag = "reports",
    params(("name" = String, Path, description = "Report name")),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn delete_report(
    State(state): State<ReportsApiState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.reports().delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Chart series for every member, most recent window of each
#[utoipa::path(
    get,
    path = "/api/v1/reports/{name}/series",
    tag = "reports",
    params(
        ("name" = String, Path, description = "Report name"),
        ("limit" = Option<usize>, Query, description = "Values per metric (1-100000)")
    ),
    responses(
        (status = 200, description = "Chart series", body = Vec<ChartSeries>),
        (status = 404, description = "Report not found")
    )
)]
pub async fn get_report_series(
    State(state): State<ReportsApiState>,
    Path(name): Path<String>,
    ValidatedQuery(query): ValidatedQuery<SeriesQuery>,
) -> Result<Json<Vec<ChartSeries>>, ApiError> {
    let series = state
        .store
        .reports()
        .chart_series(&name, query.limit)
        .await?;
    Ok(Json(series))
}

/// Pivot table over every value of every member
#[utoipa::path(
    get,
    path = "/api/v1/reports/{name}/table",
    tag = "reports",
    params(
        ("name" = String, Path, description = "Report name"),
        ("layout" = Option<String>, Query, description = "by-time (default) or by-metric"),
        ("row" = Option<String>, Query, description = "Row field: datetime, metric or value"),
        ("col" = Option<String>, Query, description = "Column field: datetime, metric or value")
    ),
    responses(
        (status = 200, description = "Pivot table", body = PivotTable),
        (status = 400, description = "Invalid layout"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn get_report_table(
    State(state): State<ReportsApiState>,
    Path(name): Path<String>,
    ValidatedQuery(query): ValidatedQuery<ReportTableQuery>,
) -> Result<Json<PivotTable>, ApiError> {
    let layout = query.pivot_layout()?;
    let table = state.store.reports().table(&name, layout).await?;
    Ok(Json(table))
}
