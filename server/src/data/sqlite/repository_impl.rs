//! MetricRepository trait implementation for SQLite
//!
//! Implements the trait for Arc<SqliteService>, delegating to the free
//! repository functions and converting errors into `DataError`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::traits::MetricRepository;
use crate::data::types::{
    MetricRow, MetricSummaryRow, NewValue, ParameterDefaults, ParameterRow, ReportRow, SourceRow,
    ValueRow,
};
use crate::domain::kinds::Kind;

use super::SqliteService;
use super::repositories::{metric, parameter, report, source, value};

#[async_trait]
impl MetricRepository for Arc<SqliteService> {
    // ==================== Source Operations ====================

    async fn get_or_create_source(&self, name: &str) -> Result<SourceRow, DataError> {
        source::get_or_create_source(self.pool(), name)
            .await
            .map_err(Into::into)
    }

    // ==================== Parameter Operations ====================

    async fn get_or_create_parameter(
        &self,
        kind: Kind,
        name: &str,
        defaults: &ParameterDefaults,
    ) -> Result<ParameterRow, DataError> {
        parameter::get_or_create_parameter(self.pool(), kind, name, defaults)
            .await
            .map_err(Into::into)
    }

    async fn find_parameter(
        &self,
        kind: Kind,
        name: &str,
    ) -> Result<Option<ParameterRow>, DataError> {
        parameter::find_parameter(self.pool(), kind, name)
            .await
            .map_err(Into::into)
    }

    async fn set_parameter_description(
        &self,
        parameter_id: i64,
        description: &str,
    ) -> Result<(), DataError> {
        parameter::set_parameter_description(self.pool(), parameter_id, description)
            .await
            .map_err(Into::into)
    }

    async fn count_parameters(&self) -> Result<i64, DataError> {
        parameter::count_parameters(self.pool())
            .await
            .map_err(Into::into)
    }

    // ==================== Metric Operations ====================

    async fn get_or_create_metric(
        &self,
        parameter_id: i64,
        source_id: Option<i64>,
    ) -> Result<MetricRow, DataError> {
        metric::get_or_create_metric(self.pool(), parameter_id, source_id)
            .await
            .map_err(Into::into)
    }

    async fn list_metrics(&self) -> Result<Vec<MetricSummaryRow>, DataError> {
        metric::list_metrics(self.pool()).await.map_err(Into::into)
    }

    // ==================== Value Operations ====================

    async fn insert_values(
        &self,
        metric: &MetricRow,
        values: &[NewValue],
    ) -> Result<Vec<i64>, DataError> {
        value::insert_values(self.pool(), metric, values)
            .await
            .map_err(Into::into)
    }

    async fn latest_value(&self, metric: &MetricRow) -> Result<Option<ValueRow>, DataError> {
        value::latest_value(self.pool(), metric)
            .await
            .map_err(Into::into)
    }

    async fn recent_values(
        &self,
        metric: &MetricRow,
        limit: i64,
    ) -> Result<Vec<ValueRow>, DataError> {
        value::recent_values(self.pool(), metric, limit)
            .await
            .map_err(Into::into)
    }

    async fn all_values(&self, metric: &MetricRow) -> Result<Vec<ValueRow>, DataError> {
        value::all_values(self.pool(), metric)
            .await
            .map_err(Into::into)
    }

    // ==================== Report Operations ====================

    async fn upsert_report(&self, name: &str, view: i64) -> Result<ReportRow, DataError> {
        report::upsert_report(self.pool(), name, view)
            .await
            .map_err(Into::into)
    }

    async fn get_report(&self, name: &str) -> Result<Option<ReportRow>, DataError> {
        report::get_report(self.pool(), name)
            .await
            .map_err(Into::into)
    }

    async fn add_report_metric(&self, report_id: i64, metric_id: i64) -> Result<bool, DataError> {
        report::add_report_metric(self.pool(), report_id, metric_id)
            .await
            .map_err(Into::into)
    }

    async fn list_report_metrics(&self, report_id: i64) -> Result<Vec<MetricRow>, DataError> {
        report::list_report_metrics(self.pool(), report_id)
            .await
            .map_err(Into::into)
    }

    async fn delete_report(&self, name: &str) -> Result<bool, DataError> {
        report::delete_report(self.pool(), name)
            .await
            .map_err(Into::into)
    }
}
