//! Append-only, time-ordered value storage per metric

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::data::{DataError, MetricRepository};
use crate::data::types::{MetricRow, NewValue, ValueRow};
use crate::domain::error::StoreError;
use crate::domain::kinds::{TypeRegistry, TypedValue};
use crate::utils::time::{datetime_to_micros, micros_to_datetime};

/// Upper bound for a single series request
pub const MAX_SERIES_LIMIT: usize = 100_000;

/// A persisted value
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub id: i64,
    pub datetime: DateTime<Utc>,
    pub value: TypedValue,
}

impl StoredValue {
    pub fn epoch_millis(&self) -> i64 {
        self.datetime.timestamp_millis()
    }
}

impl From<ValueRow> for StoredValue {
    fn from(row: ValueRow) -> Self {
        Self {
            id: row.id,
            datetime: micros_to_datetime(row.datetime),
            value: row.value,
        }
    }
}

#[derive(Clone)]
pub struct ValueStore {
    repo: Arc<dyn MetricRepository>,
    default_limit: usize,
}

impl ValueStore {
    pub fn new(repo: Arc<dyn MetricRepository>, default_limit: usize) -> Self {
        Self {
            repo,
            default_limit: default_limit.clamp(1, MAX_SERIES_LIMIT),
        }
    }

    /// Coerce `raw` with the metric's kind and persist it
    pub async fn append(
        &self,
        metric: &MetricRow,
        datetime: DateTime<Utc>,
        raw: &str,
    ) -> Result<StoredValue, StoreError> {
        let value = TypeRegistry::ops(metric.kind).coerce(raw)?;
        let mut stored = self.append_typed(metric, vec![(datetime, value)]).await?;
        stored.pop().ok_or_else(|| {
            StoreError::Data(DataError::Conflict(format!(
                "no row stored for metric {}",
                metric.id
            )))
        })
    }

    /// Persist already coerced values in one transaction
    pub async fn append_typed(
        &self,
        metric: &MetricRow,
        entries: Vec<(DateTime<Utc>, TypedValue)>,
    ) -> Result<Vec<StoredValue>, StoreError> {
        let values: Vec<NewValue> = entries
            .into_iter()
            .map(|(datetime, value)| NewValue {
                datetime: datetime_to_micros(datetime),
                value,
            })
            .collect();

        let ids = self.repo.insert_values(metric, &values).await?;

        Ok(ids
            .into_iter()
            .zip(values)
            .map(|(id, new)| StoredValue {
                id,
                datetime: micros_to_datetime(new.datetime),
                value: new.value,
            })
            .collect())
    }

    /// Most recent value; ties on datetime go to the later insertion
    pub async fn latest(&self, metric: &MetricRow) -> Result<StoredValue, StoreError> {
        self.repo
            .latest_value(metric)
            .await?
            .map(StoredValue::from)
            .ok_or_else(|| StoreError::NoData(format!("{}:{}", metric.kind, metric.label())))
    }

    /// Up to `limit` most recent values in ascending order
    ///
    /// `None` uses the configured default; any limit is clamped to
    /// `1..=MAX_SERIES_LIMIT`.
    pub async fn series(
        &self,
        metric: &MetricRow,
        limit: Option<usize>,
    ) -> Result<Vec<StoredValue>, StoreError> {
        let limit = limit
            .unwrap_or(self.default_limit)
            .clamp(1, MAX_SERIES_LIMIT);
        let rows = self.repo.recent_values(metric, limit as i64).await?;
        Ok(rows.into_iter().map(StoredValue::from).collect())
    }

    /// Every value in ascending order
    pub async fn all(&self, metric: &MetricRow) -> Result<Vec<StoredValue>, StoreError> {
        let rows = self.repo.all_values(metric).await?;
        Ok(rows.into_iter().map(StoredValue::from).collect())
    }
}
