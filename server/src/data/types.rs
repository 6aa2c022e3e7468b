//! Row types shared between the repository trait and its SQLite implementation
//!
//! Timestamps (`created_at`, `updated_at`, `datetime`) are microseconds since
//! the Unix epoch, UTC.

use serde::{Deserialize, Serialize};

use crate::domain::kinds::{Kind, TypedValue};

// ============================================================================
// Identity types
// ============================================================================

/// Source row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: i64,
}

/// Parameter row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRow {
    pub id: i64,
    pub kind: Kind,
    pub name: String,
    pub description: String,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub max_lifetime_days: i64,
    pub max_num_entries: i64,
    pub created_at: i64,
}

/// Retention metadata applied to newly created parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterDefaults {
    pub max_lifetime_days: i64,
    pub max_num_entries: i64,
}

/// Metric row joined with its parameter and optional source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub id: i64,
    pub parameter_id: i64,
    pub source_id: Option<i64>,
    pub sort_order: i64,
    pub kind: Kind,
    pub parameter_name: String,
    pub source_name: Option<String>,
    pub created_at: i64,
}

impl MetricRow {
    /// Display label: `name` or `name@source`
    pub fn label(&self) -> String {
        match &self.source_name {
            Some(source) => format!("{}@{}", self.parameter_name, source),
            None => self.parameter_name.clone(),
        }
    }
}

/// Metric with entry count and last entry time (for listings)
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummaryRow {
    pub metric: MetricRow,
    pub entry_count: i64,
    pub last_datetime: Option<i64>,
}

// ============================================================================
// Value types
// ============================================================================

/// Stored value row, decoded according to the metric's kind
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRow {
    pub id: i64,
    pub metric_id: i64,
    pub datetime: i64,
    pub value: TypedValue,
}

/// Value ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewValue {
    pub datetime: i64,
    pub value: TypedValue,
}

// ============================================================================
// Report types
// ============================================================================

/// Report row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub id: i64,
    pub name: String,
    pub view: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
