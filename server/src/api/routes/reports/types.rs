//! Report API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::pivot::PivotField;
use crate::domain::reports::Report;
use crate::domain::{PivotLayout, StoreError};
use crate::utils::time::micros_to_datetime;

/// Report DTO for API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportDto {
    pub name: String,
    /// Bitmask: 1 = diagram, 2 = table, 3 = both
    pub view: i64,
    pub diagram: bool,
    pub table: bool,
    /// Member identities (`kind:name[@source]`) in report order
    pub metrics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Report> for ReportDto {
    fn from(report: Report) -> Self {
        Self {
            name: report.row.name,
            view: report.view.bits(),
            diagram: report.view.has_diagram(),
            table: report.view.has_table(),
            metrics: report
                .metrics
                .iter()
                .map(|m| format!("{}:{}", m.kind, m.label()))
                .collect(),
            created_at: micros_to_datetime(report.row.created_at),
            updated_at: micros_to_datetime(report.row.updated_at),
        }
    }
}

fn default_view() -> i64 {
    3
}

/// Request body for creating or extending a report
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertReportRequest {
    #[serde(default = "default_view")]
    #[validate(range(min = 1, max = 3, message = "view must be 1 (diagram), 2 (table) or 3 (both)"))]
    pub view: i64,

    /// Identities appended to the report in order; existing members keep their place
    #[serde(default)]
    #[validate(length(max = 1000, message = "At most 1000 metrics per request"))]
    pub metrics: Vec<String>,
}

/// Named table layouts
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TableLayout {
    ByTime,
    ByMetric,
}

/// Query params for report tables
///
/// Either a named `layout` or an explicit `row`/`col` pair; `by-time` when
/// nothing is given.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReportTableQuery {
    pub layout: Option<TableLayout>,
    pub row: Option<PivotField>,
    pub col: Option<PivotField>,
}

impl ReportTableQuery {
    pub fn pivot_layout(&self) -> Result<PivotLayout, StoreError> {
        match (self.layout, self.row, self.col) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(StoreError::InvalidLayout(
                "use either layout or row/col, not both".into(),
            )),
            (_, Some(row), Some(col)) => PivotLayout::new(row, col),
            (_, Some(_), None) | (_, None, Some(_)) => Err(StoreError::InvalidLayout(
                "row and col must be given together".into(),
            )),
            (Some(TableLayout::ByMetric), None, None) => Ok(PivotLayout::BY_METRIC),
            (Some(TableLayout::ByTime), None, None) | (None, None, None) => Ok(PivotLayout::BY_TIME),
        }
    }
}
