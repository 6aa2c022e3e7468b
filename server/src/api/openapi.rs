//! OpenAPI specification and Swagger UI

use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{data, health, metrics, reports};
use crate::domain::Kind;
use crate::domain::pivot::{PivotField, PivotRow, PivotTable};
use crate::domain::reports::ChartSeries;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Statline API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Typed time-series metric store"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "data", description = "Value ingestion, reads and parameter descriptions"),
        (name = "metrics", description = "Metric listing"),
        (name = "reports", description = "Named metric bundles for charts and tables")
    ),
    paths(
        // Health
        health::health,
        // Data
        data::post_data,
        data::get_latest,
        data::get_series,
        data::get_description,
        data::post_description,
        // Metrics
        metrics::list_metrics,
        // Reports
        reports::upsert_report,
        reports::get_report,
        reports::delete_report,
        reports::get_report_series,
        reports::get_report_table,
    ),
    components(schemas(
        // Health
        health::HealthResponse,
        // Data
        Kind,
        data::types::SeriesQuery,
        // Metrics
        metrics::MetricDto,
        // Reports
        reports::types::ReportDto,
        reports::types::UpsertReportRequest,
        reports::types::ReportTableQuery,
        reports::types::TableLayout,
        ChartSeries,
        PivotField,
        PivotRow,
        PivotTable,
    ))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

/// Serve Swagger UI from CDN
pub async fn swagger_ui_html() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Statline API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        html { box-sizing: border-box; overflow-y: scroll; }
        *, *:before, *:after { box-sizing: inherit; }
        body { margin: 0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: "/api/openapi.json",
                dom_id: '#swagger-ui',
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout",
                deepLinking: true,
                showExtensions: true,
                showCommonExtensions: true
            });
        };
    </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_store_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/health",
            "/api/v1/data/{identity}",
            "/api/v1/data/{identity}/series",
            "/api/v1/data/{identity}/description",
            "/api/v1/metrics",
            "/api/v1/reports/{name}",
            "/api/v1/reports/{name}/table",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert_eq!(doc.info.title, "Statline API");
    }

    #[test]
    fn test_series_paths_document_limit_query() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        for path in ["/api/v1/data/{identity}/series", "/api/v1/reports/{name}/series"] {
            let params = doc["paths"][path]["get"]["parameters"]
                .as_array()
                .unwrap_or_else(|| panic!("no parameters for {path}"));
            assert!(
                params
                    .iter()
                    .any(|p| p["name"] == "limit" && p["in"] == "query"),
                "missing limit query param on {path}"
            );
        }
    }
}
