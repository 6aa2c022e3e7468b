//! API route handlers

pub mod data;
pub mod health;
pub mod metrics;
pub mod reports;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Response;

    use crate::core::constants::{DEFAULT_MAX_NUM_ENTRIES, DEFAULT_SERIES_LIMIT};
    use crate::data::SqliteService;
    use crate::data::types::ParameterDefaults;
    use crate::domain::{MetricStore, StoreConfig};

    pub async fn test_store() -> MetricStore {
        let db = Arc::new(SqliteService::in_memory().await.unwrap());
        MetricStore::new(
            db.repository(),
            StoreConfig {
                defaults: ParameterDefaults {
                    max_lifetime_days: 0,
                    max_num_entries: DEFAULT_MAX_NUM_ENTRIES,
                },
                series_limit: DEFAULT_SERIES_LIMIT,
            },
        )
    }

    pub async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }
}
