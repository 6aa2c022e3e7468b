//! Pivot tables over metric value series
//!
//! Any two of {datetime, metric, value} become the row and column keys and
//! the remaining field fills the cells. Datetimes are truncated to whole
//! seconds before they are used as keys.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::error::StoreError;
use crate::domain::kinds::TypedValue;
use crate::domain::values::StoredValue;
use crate::utils::time::{format_seconds, truncate_to_seconds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PivotField {
    Datetime,
    Metric,
    Value,
}

/// Row and column field selection; the cell field is the remaining one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotLayout {
    row: PivotField,
    col: PivotField,
}

impl PivotLayout {
    /// Rows are timestamps, columns are metrics
    pub const BY_TIME: PivotLayout = PivotLayout {
        row: PivotField::Datetime,
        col: PivotField::Metric,
    };

    /// Rows are metrics, columns are timestamps
    pub const BY_METRIC: PivotLayout = PivotLayout {
        row: PivotField::Metric,
        col: PivotField::Datetime,
    };

    pub fn new(row: PivotField, col: PivotField) -> Result<Self, StoreError> {
        if row == col {
            return Err(StoreError::InvalidLayout(format!(
                "row and column both use {row:?}"
            )));
        }
        Ok(Self { row, col })
    }

    pub fn row(&self) -> PivotField {
        self.row
    }

    pub fn col(&self) -> PivotField {
        self.col
    }

    pub fn value_field(&self) -> PivotField {
        [PivotField::Datetime, PivotField::Metric, PivotField::Value]
            .into_iter()
            .find(|f| *f != self.row && *f != self.col)
            .unwrap_or(PivotField::Value)
    }
}

/// One metric's label and values, in the order they should be considered
#[derive(Debug, Clone)]
pub struct MetricSeries {
    pub label: String,
    pub values: Vec<StoredValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PivotRow {
    pub title: String,
    pub cells: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PivotTable {
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
}

/// Key drawn from one of the three fields, ordered naturally for its field
#[derive(Debug, Clone)]
enum PivotKey {
    Datetime(DateTime<Utc>),
    Metric(String),
    Value(TypedValue),
}

impl PivotKey {
    fn of(field: PivotField, label: &str, value: &StoredValue) -> Self {
        match field {
            PivotField::Datetime => PivotKey::Datetime(truncate_to_seconds(value.datetime)),
            PivotField::Metric => PivotKey::Metric(label.to_string()),
            PivotField::Value => PivotKey::Value(value.value.clone()),
        }
    }

    fn render(&self) -> String {
        match self {
            PivotKey::Datetime(dt) => format_seconds(*dt),
            PivotKey::Metric(label) => label.clone(),
            PivotKey::Value(value) => value.format(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            PivotKey::Datetime(_) => 0,
            PivotKey::Metric(_) => 1,
            PivotKey::Value(_) => 2,
        }
    }
}

impl Ord for PivotKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PivotKey::Datetime(a), PivotKey::Datetime(b)) => a.cmp(b),
            (PivotKey::Metric(a), PivotKey::Metric(b)) => a.cmp(b),
            (PivotKey::Value(a), PivotKey::Value(b)) => a.total_cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for PivotKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PivotKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PivotKey {}

pub struct PivotTableBuilder;

impl PivotTableBuilder {
    /// Build a dense table; (row, col) pairs without a value get an empty cell
    ///
    /// When several values land on one (row, col) pair the first one, in
    /// series order and then value order, fills the cell.
    pub fn build(layout: PivotLayout, series: &[MetricSeries]) -> PivotTable {
        let value_field = layout.value_field();
        let mut cells: BTreeMap<(PivotKey, PivotKey), PivotKey> = BTreeMap::new();

        for metric in series {
            for value in &metric.values {
                let row = PivotKey::of(layout.row, &metric.label, value);
                let col = PivotKey::of(layout.col, &metric.label, value);
                cells
                    .entry((row, col))
                    .or_insert_with(|| PivotKey::of(value_field, &metric.label, value));
            }
        }

        let mut row_keys: Vec<&PivotKey> = cells.keys().map(|(row, _)| row).collect();
        row_keys.dedup();
        let mut col_keys: Vec<&PivotKey> = cells.keys().map(|(_, col)| col).collect();
        col_keys.sort();
        col_keys.dedup();

        let rows = row_keys
            .iter()
            .map(|row| PivotRow {
                title: row.render(),
                cells: col_keys
                    .iter()
                    .map(|col| {
                        cells
                            .get(&((*row).clone(), (*col).clone()))
                            .map(PivotKey::render)
                    })
                    .collect(),
            })
            .collect();

        PivotTable {
            columns: col_keys.iter().map(|col| col.render()).collect(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::parse_naive_timestamp;

    fn value(ts: &str, micros: i64, value: TypedValue) -> StoredValue {
        let dt = parse_naive_timestamp(ts).unwrap() + chrono::Duration::microseconds(micros);
        StoredValue {
            id: 0,
            datetime: dt,
            value,
        }
    }

    fn series() -> Vec<MetricSeries> {
        vec![
            MetricSeries {
                label: "load@host2".into(),
                values: vec![
                    value("2024-01-01T00:00:00", 250, TypedValue::Int(5)),
                    value("2024-01-01T00:00:10", 0, TypedValue::Int(6)),
                ],
            },
            MetricSeries {
                label: "load@host1".into(),
                values: vec![value("2024-01-01T00:00:00", 900_000, TypedValue::Int(3))],
            },
        ]
    }

    #[test]
    fn test_layout_rejects_same_field() {
        let err = PivotLayout::new(PivotField::Metric, PivotField::Metric).unwrap_err();
        assert!(matches!(err, StoreError::InvalidLayout(_)));
    }

    #[test]
    fn test_layout_value_field() {
        assert_eq!(PivotLayout::BY_TIME.value_field(), PivotField::Value);
        assert_eq!(PivotLayout::BY_METRIC.value_field(), PivotField::Value);
        let layout = PivotLayout::new(PivotField::Value, PivotField::Metric).unwrap();
        assert_eq!(layout.value_field(), PivotField::Datetime);
    }

    #[test]
    fn test_by_time() {
        let table = PivotTableBuilder::build(PivotLayout::BY_TIME, &series());
        assert_eq!(table.columns, vec!["load@host1", "load@host2"]);
        assert_eq!(
            table.rows,
            vec![
                PivotRow {
                    title: "2024-01-01T00:00:00".into(),
                    cells: vec![Some("3".into()), Some("5".into())],
                },
                PivotRow {
                    title: "2024-01-01T00:00:10".into(),
                    cells: vec![None, Some("6".into())],
                },
            ]
        );
    }

    #[test]
    fn test_by_metric_is_transposed() {
        let table = PivotTableBuilder::build(PivotLayout::BY_METRIC, &series());
        assert_eq!(
            table.columns,
            vec!["2024-01-01T00:00:00", "2024-01-01T00:00:10"]
        );
        assert_eq!(table.rows[0].title, "load@host1");
        assert_eq!(table.rows[0].cells, vec![Some("3".into()), None]);
        assert_eq!(table.rows[1].title, "load@host2");
        assert_eq!(
            table.rows[1].cells,
            vec![Some("5".into()), Some("6".into())]
        );
    }

    #[test]
    fn test_first_value_wins_within_a_second() {
        let series = vec![MetricSeries {
            label: "cpu".into(),
            values: vec![
                value("2024-01-01T00:00:00", 100, TypedValue::Float(1.5)),
                value("2024-01-01T00:00:00", 500_000, TypedValue::Float(2.5)),
            ],
        }];
        let table = PivotTableBuilder::build(PivotLayout::BY_TIME, &series);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells, vec![Some("1.5".into())]);
    }

    #[test]
    fn test_value_keys_sort_numerically() {
        let series = vec![MetricSeries {
            label: "n".into(),
            values: vec![
                value("2024-01-01T00:00:00", 0, TypedValue::Int(10)),
                value("2024-01-01T00:00:01", 0, TypedValue::Int(9)),
            ],
        }];
        let layout = PivotLayout::new(PivotField::Value, PivotField::Metric).unwrap();
        let table = PivotTableBuilder::build(layout, &series);
        let titles: Vec<&str> = table.rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["9", "10"]);
        assert_eq!(table.rows[0].cells, vec![Some("2024-01-01T00:00:01".into())]);
    }

    #[test]
    fn test_empty_input() {
        let table = PivotTableBuilder::build(PivotLayout::BY_TIME, &[]);
        assert!(table.columns.is_empty());
        assert!(table.rows.is_empty());
    }
}
