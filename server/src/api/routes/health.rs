//! Health check endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::MetricStore;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Known parameters, or null when the store could not be queried
    pub parameters: Option<i64>,
}

pub fn routes(store: MetricStore) -> Router<()> {
    Router::new().route("/", get(health)).with_state(store)
}

/// Health check endpoint
///
/// Reports `degraded` with 503 when the store cannot be reached.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store unavailable", body = HealthResponse)
    )
)]
pub async fn health(State(store): State<MetricStore>) -> impl IntoResponse {
    let (status, label, parameters) = match store.resolver().count_parameters().await {
        Ok(count) => (StatusCode::OK, "ok", Some(count)),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the store");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", None)
        }
    };
    (
        status,
        Json(HealthResponse {
            status: label,
            version: env!("CARGO_PKG_VERSION"),
            parameters,
        }),
    )
}
