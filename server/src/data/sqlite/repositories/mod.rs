//! SQLite repositories
//!
//! Row types (SourceRow, MetricRow, etc.) are imported from `crate::data::types`.

pub mod metric;
pub mod parameter;
pub mod report;
pub mod source;
pub mod value;

pub use metric::{find_metric, get_or_create_metric, list_metrics};
pub use parameter::{
    count_parameters, find_parameter, get_or_create_parameter, set_parameter_description,
};
pub use report::{
    add_report_metric, delete_report, get_report, list_report_metrics, upsert_report,
};
pub use source::{find_source, get_or_create_source};
pub use value::{all_values, insert_values, latest_value, recent_values};

use crate::data::sqlite::SqliteError;
use crate::domain::kinds::Kind;

/// Decode a stored kind tag
fn parse_kind(tag: &str) -> Result<Kind, SqliteError> {
    tag.parse()
        .map_err(|_| SqliteError::CorruptRow(format!("unknown kind {tag:?}")))
}

#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    crate::data::sqlite::SqliteService::in_memory()
        .await
        .unwrap()
        .pool()
        .clone()
}
