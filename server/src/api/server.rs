//! API server initialization

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::Redirect;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{self, AllowedOrigins};
use super::openapi::{openapi_json, swagger_ui_html};
use super::routes::{data, health, metrics, reports};
use crate::core::CoreApp;
use crate::core::constants::{API_PREFIX, DEFAULT_BODY_LIMIT};
use crate::domain::MetricStore;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Serve until shutdown is triggered; returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();
        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let router = router(app.store.clone(), &allowed_origins);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            "Listening on http://{} (docs at /api/docs)",
            listener.local_addr()?
        );
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}

/// Full application router over one store
pub fn router(store: MetricStore, allowed_origins: &AllowedOrigins) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/api/docs") }))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/docs", get(swagger_ui_html))
        .route("/api/docs/", get(swagger_ui_html))
        .nest(&format!("{API_PREFIX}/health"), health::routes(store.clone()))
        .nest(&format!("{API_PREFIX}/data"), data::routes(store.clone()))
        .nest(&format!("{API_PREFIX}/metrics"), metrics::routes(store.clone()))
        .nest(&format!("{API_PREFIX}/reports"), reports::routes(store))
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(middleware::cors(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::api::routes::test_support::{body_json, body_text, test_store};

    fn app(store: MetricStore) -> Router {
        router(store, &AllowedOrigins::new("127.0.0.1", 5390))
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(test_store().await)
            .oneshot(get_req("/api/v1/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["parameters"], 0);
    }

    #[tokio::test]
    async fn test_ingest_and_read_through_full_router() {
        let router = app(test_store().await);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/data/decimal:price@shop")
                    .body(Body::from("888.1230\n888"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(get_req("/api/v1/data/decimal:price@shop"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "888\n");

        let response = router
            .oneshot(get_req("/api/v1/metrics"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json[0]["label"], "price@shop");
        assert_eq!(json[0]["entry_count"], 2);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = app(test_store().await)
            .oneshot(get_req("/api/v1/nothing-here"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_json_served() {
        let response = app(test_store().await)
            .oneshot(get_req("/api/openapi.json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let json = body_json(response).await;
        assert_eq!(json["info"]["title"], "Statline API");
    }

    #[tokio::test]
    async fn test_cors_allows_local_origin() {
        let response = app(test_store().await)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header(header::ORIGIN, "http://localhost:5390")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5390"
        );
    }
}
