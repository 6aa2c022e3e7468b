//! HTTP middleware (CORS, 404 handler)

use axum::http::{HeaderValue, Method, Uri, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::types::ApiError;
use crate::core::config::is_all_interfaces;

/// Allowed origins configuration
#[derive(Debug, Clone)]
pub struct AllowedOrigins {
    origins: Vec<String>,
}

impl AllowedOrigins {
    /// Create allowed origins from host and port configuration
    pub fn new(host: &str, port: u16) -> Self {
        // Loopback and wildcard binds are reached through either loopback name
        let hosts: Vec<&str> =
            if is_all_interfaces(host) || host == "127.0.0.1" || host == "localhost" {
                vec!["localhost", "127.0.0.1"]
            } else {
                vec![host]
            };

        let origins = hosts
            .iter()
            .flat_map(|h| [format!("http://{}:{}", h, port), format!("http://{}", h)])
            .collect();

        Self { origins }
    }

    /// Check if an origin is allowed
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    fn as_header_values(&self) -> Vec<HeaderValue> {
        self.origins.iter().filter_map(|o| o.parse().ok()).collect()
    }
}

/// Create CORS layer
pub fn cors(allowed: &AllowedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed.as_header_values()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::CACHE_CONTROL,
        ])
}

/// Unmatched routes get the standard JSON error body
pub async fn handle_404(method: Method, uri: Uri) -> ApiError {
    tracing::debug!(%method, %uri, "No route");
    ApiError::not_found("ROUTE_NOT_FOUND", format!("No route for {method} {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_bind_allows_both_names() {
        let allowed = AllowedOrigins::new("127.0.0.1", 5390);
        assert!(allowed.is_allowed("http://localhost:5390"));
        assert!(allowed.is_allowed("http://127.0.0.1:5390"));
        assert!(allowed.is_allowed("http://localhost"));
        assert!(!allowed.is_allowed("http://evil.example:5390"));
    }

    #[test]
    fn test_wildcard_bind_uses_loopback_names() {
        let allowed = AllowedOrigins::new("0.0.0.0", 8080);
        assert!(allowed.is_allowed("http://localhost:8080"));
        assert!(!allowed.is_allowed("http://0.0.0.0:8080"));
    }

    #[test]
    fn test_named_host_is_used_verbatim() {
        let allowed = AllowedOrigins::new("stats.internal", 80);
        assert!(allowed.is_allowed("http://stats.internal:80"));
        assert!(allowed.is_allowed("http://stats.internal"));
        assert!(!allowed.is_allowed("http://localhost:80"));
    }
}
