//! Data API endpoints: ingestion, latest value, series and descriptions
//!
//! Bodies and plain responses are text, one value per line.

pub mod types;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::extractors::{IdentityPath, ValidatedQuery};
use crate::api::types::ApiError;
use crate::domain::MetricStore;

use types::SeriesQuery;

/// Shared state for Data API endpoints
#[derive(Clone)]
pub struct DataApiState {
    pub store: MetricStore,
}

/// Build Data API routes
pub fn routes(store: MetricStore) -> Router<()> {
    let state = DataApiState { store };

    Router::new()
        .route("/{identity}", get(get_latest).post(post_data))
        .route("/{identity}/series", get(get_series))
        .route(
            "/{identity}/description",
            get(get_description).post(post_description),
        )
        .with_state(state)
}

/// Store one value per body line
///
/// Lines are `value` or, for numeric kinds, `timestamp value`. The whole
/// body is rejected when any line fails to parse.
#[utoipa::path(
    post,
    path = "/api/v1/data/{identity}",
    tag = "data",
    params(("identity" = String, Path, description = "Metric identity: [kind:]name[@source]")),
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, description = "Values stored", body = String),
        (status = 400, description = "Unknown kind, malformed identity or invalid value")
    )
)]
pub async fn post_data(
    State(state): State<DataApiState>,
    IdentityPath(identity): IdentityPath,
    body: String,
) -> Result<&'static str, ApiError> {
    state.store.ingest(&identity, &body).await?;
    Ok("OK")
}

/// Latest value of a metric, formatted as text
#[utoipa::path(
    get,
    path = "/api/v1/data/{identity}",
    tag = "data",
    params(("identity" = String, Path, description = "Metric identity: [kind:]name[@source]")),
    responses(
        (status = 200, description = "Latest value", body = String, content_type = "text/plain"),
        (status = 404, description = "Unknown parameter"),
        (status = 409, description = "No data for the metric yet")
    )
)]
pub async fn get_latest(
    State(state): State<DataApiState>,
    IdentityPath(identity): IdentityPath,
) -> Result<String, ApiError> {
    let latest = state.store.latest(&identity).await?;
    Ok(format!("{}\n", latest.value.format()))
}

/// Most recent values of a metric as `[epoch_ms, value]` points, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/data/{identity}/series",
    tag = "data",
    params(
        ("identity" = String, Path, description = "Metric identity: [kind:]name[@source]"),
        ("limit" = Option<usize>, Query, description = "Number of most recent values (1-100000)")
    ),
    responses(
        (status = 200, description = "Series points", body = Vec<Vec<serde_json::Value>>),
        (status = 404, description = "Unknown parameter")
    )
)]
pub async fn get_series(
    State(state): State<DataApiState>,
    IdentityPath(identity): IdentityPath,
    ValidatedQuery(query): ValidatedQuery<SeriesQuery>,
) -> Result<Json<Vec<(i64, serde_json::Value)>>, ApiError> {
    let values = state.store.series(&identity, query.limit).await?;
    Ok(Json(
        values
            .iter()
            .map(|v| (v.epoch_millis(), v.value.to_json()))
            .collect(),
    ))
}

/// Description of a parameter; the source part of the identity is ignored
#[utoipa::path(
    get,
    path = "/api/v1/data/{identity}/description",
    tag = "data",
    params(("identity" = String, Path, description = "Metric identity: [kind:]name[@source]")),
    responses(
        (status = 200, description = "Parameter description", body = String, content_type = "text/plain"),
        (status = 404, description = "Unknown parameter")
    )
)]
pub async fn get_description(
    State(state): State<DataApiState>,
    IdentityPath(identity): IdentityPath,
) -> Result<String, ApiError> {
    let description = state.store.description(&identity).await?;
    Ok(format!("{description}\n"))
}

/// Set a parameter's description, creating the parameter when needed
#[utoipa::path(
    post,
    path = "/api/v1/data/{identity}/description",
    tag = "data",
    params(("identity" = String, Path, description = "Metric identity: [kind:]name[@source]")),
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, description = "Stored description", body = String, content_type = "text/plain"),
        (status = 400, description = "Unknown kind or malformed identity")
    )
)]
pub async fn post_description(
    State(state): State<DataApiState>,
    IdentityPath(identity): IdentityPath,
    body: String,
) -> Result<String, ApiError> {
    let description = state.store.set_description(&identity, body.trim()).await?;
    Ok(format!("{description}\n"))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::api::routes::test_support::{body_json, body_text, test_store};

    async fn send(router: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        (status, body_text(response).await)
    }

    #[tokio::test]
    async fn test_unknown_parameter_is_not_found() {
        let router = routes(test_store().await);
        let (status, body) = send(&router, "GET", "/int:missing", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Invalid parameter: int:missing"));
    }

    #[tokio::test]
    async fn test_post_then_latest() {
        let router = routes(test_store().await);

        let (status, body) = send(&router, "POST", "/int:requests", "1\n2\n3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");

        let (status, body) = send(&router, "GET", "/requests", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "3\n");
    }

    #[tokio::test]
    async fn test_invalid_line_reports_line_number() {
        let router = routes(test_store().await);
        let (status, body) = send(&router, "POST", "/float:load", "1.5\nabc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Invalid float: abc at line #2"));
    }

    #[tokio::test]
    async fn test_known_parameter_without_values_is_conflict() {
        let router = routes(test_store().await);
        let (status, _) = send(&router, "POST", "/int:empty/description", "nothing yet").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&router, "GET", "/int:empty", "").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains("No data for int:empty yet"));
    }

    #[tokio::test]
    async fn test_malformed_identity_and_unknown_kind() {
        let router = routes(test_store().await);

        let (status, body) = send(&router, "GET", "/:name", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("MALFORMED_IDENTITY"));

        let (status, body) = send(&router, "POST", "/blob:name", "1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("UNKNOWN_KIND"));
    }

    #[tokio::test]
    async fn test_description_round_trip_ignores_source() {
        let router = routes(test_store().await);

        let (status, body) =
            send(&router, "POST", "/string:motd/description", "  Message of the day \n").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Message of the day\n");

        let (status, body) = send(&router, "GET", "/string:motd@web1/description", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Message of the day\n");
    }

    #[tokio::test]
    async fn test_series_returns_points_oldest_first() {
        let router = routes(test_store().await);
        let payload = "2030-01-01T00:00:00 1\n2030-01-01T00:00:01 2\n2030-01-01T00:00:02 3";
        let (status, _) = send(&router, "POST", "/int:hits@web1", payload).await;
        assert_eq!(status, StatusCode::OK);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/int:hits@web1/series?limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let points = body_json(response).await;
        assert_eq!(
            points,
            serde_json::json!([[1893456001000_i64, 2], [1893456002000_i64, 3]])
        );
    }

    #[tokio::test]
    async fn test_series_limit_is_validated() {
        let router = routes(test_store().await);
        let (status, body) = send(&router, "GET", "/int:hits/series?limit=0", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("VALIDATION_ERROR"));
    }
}
