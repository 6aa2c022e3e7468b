//! Data API types

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::values::MAX_SERIES_LIMIT;

/// Query params for series reads
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SeriesQuery {
    /// Number of most recent values; the configured default applies when absent
    #[validate(range(min = 1, max = MAX_SERIES_LIMIT, message = "limit must be 1-100000"))]
    pub limit: Option<usize>,
}
