//! Repository trait for the metric store backend
//!
//! Domain services depend on this trait rather than on a concrete pool so the
//! resolver, value store and report service stay backend-agnostic.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::types::{
    MetricRow, MetricSummaryRow, NewValue, ParameterDefaults, ParameterRow, ReportRow, SourceRow,
    ValueRow,
};
use crate::domain::kinds::Kind;

#[async_trait]
pub trait MetricRepository: Send + Sync {
    // ==================== Source Operations ====================

    /// Get or create a source by (already normalized) name
    async fn get_or_create_source(&self, name: &str) -> Result<SourceRow, DataError>;

    // ==================== Parameter Operations ====================

    /// Get or create a parameter by (kind, name); defaults apply only on creation
    async fn get_or_create_parameter(
        &self,
        kind: Kind,
        name: &str,
        defaults: &ParameterDefaults,
    ) -> Result<ParameterRow, DataError>;

    /// Find a parameter without creating it
    async fn find_parameter(
        &self,
        kind: Kind,
        name: &str,
    ) -> Result<Option<ParameterRow>, DataError>;

    /// Replace a parameter's description
    async fn set_parameter_description(
        &self,
        parameter_id: i64,
        description: &str,
    ) -> Result<(), DataError>;

    /// Total number of parameters
    async fn count_parameters(&self) -> Result<i64, DataError>;

    // ==================== Metric Operations ====================

    /// Get or create the metric for (parameter, source-or-none)
    async fn get_or_create_metric(
        &self,
        parameter_id: i64,
        source_id: Option<i64>,
    ) -> Result<MetricRow, DataError>;

    /// All metrics in display order with entry counts
    async fn list_metrics(&self) -> Result<Vec<MetricSummaryRow>, DataError>;

    // ==================== Value Operations ====================

    /// Insert values atomically; returns the new row ids in input order
    async fn insert_values(
        &self,
        metric: &MetricRow,
        values: &[NewValue],
    ) -> Result<Vec<i64>, DataError>;

    /// Value with the greatest (datetime, id)
    async fn latest_value(&self, metric: &MetricRow) -> Result<Option<ValueRow>, DataError>;

    /// Most recent `limit` values, ascending by (datetime, id)
    async fn recent_values(
        &self,
        metric: &MetricRow,
        limit: i64,
    ) -> Result<Vec<ValueRow>, DataError>;

    /// Every value, ascending by (datetime, id)
    async fn all_values(&self, metric: &MetricRow) -> Result<Vec<ValueRow>, DataError>;

    // ==================== Report Operations ====================

    /// Create a report or update the view of an existing one
    async fn upsert_report(&self, name: &str, view: i64) -> Result<ReportRow, DataError>;

    async fn get_report(&self, name: &str) -> Result<Option<ReportRow>, DataError>;

    /// Append a metric to a report; false when it is already a member
    async fn add_report_metric(&self, report_id: i64, metric_id: i64) -> Result<bool, DataError>;

    /// Member metrics in report order
    async fn list_report_metrics(&self, report_id: i64) -> Result<Vec<MetricRow>, DataError>;

    /// Delete a report by name; false when it did not exist
    async fn delete_report(&self, name: &str) -> Result<bool, DataError>;
}
