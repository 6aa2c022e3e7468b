//! Reports: named, ordered bundles of metrics exported together

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use utoipa::ToSchema;

use crate::data::MetricRepository;
use crate::data::types::{MetricRow, ReportRow};
use crate::domain::error::StoreError;
use crate::domain::identity::MetricIdentity;
use crate::domain::pivot::{MetricSeries, PivotLayout, PivotTable, PivotTableBuilder};
use crate::domain::resolver::{EntityResolver, normalize_name};
use crate::domain::values::ValueStore;

/// Display modes, a bitmask of `DIAGRAM` and `TABLE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportView(u8);

impl ReportView {
    pub const DIAGRAM: ReportView = ReportView(1);
    pub const TABLE: ReportView = ReportView(2);
    pub const BOTH: ReportView = ReportView(3);

    pub fn from_bits(bits: i64) -> Result<Self, StoreError> {
        match bits {
            1..=3 => Ok(Self(bits as u8)),
            _ => Err(StoreError::InvalidReport(format!(
                "view must be 1 (diagram), 2 (table) or 3 (both), got {bits}"
            ))),
        }
    }

    pub fn bits(&self) -> i64 {
        i64::from(self.0)
    }

    pub fn has_diagram(&self) -> bool {
        self.0 & Self::DIAGRAM.0 != 0
    }

    pub fn has_table(&self) -> bool {
        self.0 & Self::TABLE.0 != 0
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub row: ReportRow,
    pub view: ReportView,
    pub metrics: Vec<MetricRow>,
}

/// Chart-ready series: `[epoch_ms, value]` points
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartSeries {
    pub label: String,
    #[schema(value_type = Vec<Vec<Object>>)]
    pub data: Vec<(i64, serde_json::Value)>,
}

#[derive(Clone)]
pub struct ReportService {
    repo: Arc<dyn MetricRepository>,
    resolver: EntityResolver,
    values: ValueStore,
}

impl ReportService {
    pub fn new(repo: Arc<dyn MetricRepository>, resolver: EntityResolver, values: ValueStore) -> Self {
        Self {
            repo,
            resolver,
            values,
        }
    }

    /// Create a report (or update its view) and append the given metrics
    ///
    /// Every metric must belong to an existing parameter. Members already in
    /// the report keep their position.
    pub async fn upsert(
        &self,
        name: &str,
        view: i64,
        metrics: &[MetricIdentity],
    ) -> Result<Report, StoreError> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(StoreError::InvalidReport("name must not be blank".into()));
        }
        let view = ReportView::from_bits(view)?;

        let mut resolved = Vec::with_capacity(metrics.len());
        for identity in metrics {
            resolved.push(self.resolver.lookup_identity(identity).await?);
        }
        self.check_distinct_labels(&name, &resolved).await?;

        let row = self.repo.upsert_report(&name, view.bits()).await?;
        for metric in &resolved {
            self.repo.add_report_metric(row.id, metric.id).await?;
        }
        tracing::debug!(report = %name, members = resolved.len(), "Upserted report");

        self.get(&name).await
    }

    /// Members are keyed by label in chart and table exports, so two metrics
    /// of different kinds sharing `name[@source]` cannot both be members.
    async fn check_distinct_labels(
        &self,
        name: &str,
        incoming: &[MetricRow],
    ) -> Result<(), StoreError> {
        let mut members: HashMap<String, i64> = HashMap::new();
        if let Some(row) = self.repo.get_report(name).await? {
            for metric in self.repo.list_report_metrics(row.id).await? {
                members.insert(metric.label(), metric.id);
            }
        }
        for metric in incoming {
            let label = metric.label();
            match members.get(&label) {
                Some(&id) if id != metric.id => {
                    return Err(StoreError::InvalidReport(format!(
                        "report {name} already has a metric labelled {label}"
                    )));
                }
                Some(_) => {}
                None => {
                    members.insert(label, metric.id);
                }
            }
        }
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<Report, StoreError> {
        let name = normalize_name(name);
        let row = self
            .repo
            .get_report(&name)
            .await?
            .ok_or_else(|| StoreError::UnknownReport(name.clone()))?;
        let view = ReportView::from_bits(row.view)?;
        let metrics = self.repo.list_report_metrics(row.id).await?;
        Ok(Report { row, view, metrics })
    }

    /// One chart series per member metric, most recent window of each
    pub async fn chart_series(
        &self,
        name: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChartSeries>, StoreError> {
        let report = self.get(name).await?;
        try_join_all(report.metrics.iter().map(|metric| async move {
            let values = self.values.series(metric, limit).await?;
            Ok::<_, StoreError>(ChartSeries {
                label: metric.label(),
                data: values
                    .iter()
                    .map(|v| (v.epoch_millis(), v.value.to_json()))
                    .collect(),
            })
        }))
        .await
    }

    /// Pivot table over every value of every member metric
    pub async fn table(&self, name: &str, layout: PivotLayout) -> Result<PivotTable, StoreError> {
        let report = self.get(name).await?;
        let series = try_join_all(report.metrics.iter().map(|metric| async move {
            Ok::<_, StoreError>(MetricSeries {
                label: metric.label(),
                values: self.values.all(metric).await?,
            })
        }))
        .await?;
        Ok(PivotTableBuilder::build(layout, &series))
    }

    pub async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let name = normalize_name(name);
        if self.repo.delete_report(&name).await? {
            tracing::debug!(report = %name, "Deleted report");
            Ok(())
        } else {
            Err(StoreError::UnknownReport(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SqliteService;
    use crate::data::types::ParameterDefaults;
    use crate::domain::ingest::IngestionParser;

    struct Fixture {
        reports: ReportService,
        ingest: IngestionParser,
    }

    async fn fixture() -> Fixture {
        let db = Arc::new(SqliteService::in_memory().await.unwrap());
        let defaults = ParameterDefaults {
            max_lifetime_days: 0,
            max_num_entries: 100,
        };
        let resolver = EntityResolver::new(db.repository(), defaults);
        let values = ValueStore::new(db.repository(), 1000);
        Fixture {
            reports: ReportService::new(db.repository(), resolver.clone(), values.clone()),
            ingest: IngestionParser::new(resolver, values),
        }
    }

    fn ids(raw: &[&str]) -> Vec<MetricIdentity> {
        raw.iter().map(|r| r.parse().unwrap()).collect()
    }

    #[test]
    fn test_report_view_bits() {
        assert!(ReportView::from_bits(0).is_err());
        assert!(ReportView::from_bits(4).is_err());
        let both = ReportView::from_bits(3).unwrap();
        assert_eq!(both, ReportView::BOTH);
        assert!(both.has_diagram() && both.has_table());
        assert!(!ReportView::DIAGRAM.has_table());
        assert!(!ReportView::TABLE.has_diagram());
    }

    #[tokio::test]
    async fn test_upsert_requires_known_parameters() {
        let f = fixture().await;
        let err = f
            .reports
            .upsert("daily", 1, &ids(&["int:missing"]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownParameter(_)));
        assert!(matches!(
            f.reports.get("daily").await,
            Err(StoreError::UnknownReport(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_appends_members_in_order() {
        let f = fixture().await;
        for id in ids(&["int:b", "float:a"]) {
            f.ingest.ingest(&id, "1").await.unwrap();
        }

        let report = f
            .reports
            .upsert("daily", 1, &ids(&["int:b", "float:a"]))
            .await
            .unwrap();
        let labels: Vec<String> = report.metrics.iter().map(|m| m.label()).collect();
        assert_eq!(labels, vec!["b", "a"]);

        // Re-adding keeps positions; view changes in place
        let report = f
            .reports
            .upsert("daily", 3, &ids(&["float:a"]))
            .await
            .unwrap();
        assert_eq!(report.view, ReportView::BOTH);
        assert_eq!(report.metrics.len(), 2);
        assert_eq!(report.metrics[0].label(), "b");
    }

    #[tokio::test]
    async fn test_chart_series_and_table() {
        let f = fixture().await;
        let cpu: MetricIdentity = "float:cpu@host1".parse().unwrap();
        let motd: MetricIdentity = "string:motd".parse().unwrap();
        f.ingest
            .ingest(&cpu, "2024-01-01T00:00:00 0.5\n2024-01-01T00:00:10 0.75")
            .await
            .unwrap();
        f.ingest
            .ingest(&motd, "2024-01-01T00:00:10 hello there")
            .await
            .unwrap();
        f.reports
            .upsert("ops", 3, &[cpu.clone(), motd.clone()])
            .await
            .unwrap();

        let series = f.reports.chart_series("ops", None).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "cpu@host1");
        assert_eq!(
            series[0].data,
            vec![
                (1_704_067_200_000, serde_json::json!(0.5)),
                (1_704_067_210_000, serde_json::json!(0.75)),
            ]
        );
        assert_eq!(series[1].data[0].1, serde_json::json!("hello there"));

        let table = f.reports.table("ops", PivotLayout::BY_TIME).await.unwrap();
        assert_eq!(table.columns, vec!["cpu@host1", "motd"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells, vec![Some("0.5".into()), None]);
        assert_eq!(
            table.rows[1].cells,
            vec![Some("0.75".into()), Some("hello there".into())]
        );
    }

    #[tokio::test]
    async fn test_upsert_rejects_label_shared_across_kinds() {
        let f = fixture().await;
        for id in ids(&["int:x", "float:x", "int:y"]) {
            f.ingest.ingest(&id, "2024-01-01T00:00:00 1").await.unwrap();
        }

        let err = f
            .reports
            .upsert("mixed", 3, &ids(&["int:x", "float:x"]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReport(_)));
        assert!(matches!(
            f.reports.get("mixed").await,
            Err(StoreError::UnknownReport(_))
        ));

        // Collision with an existing member is caught too
        f.reports.upsert("mixed", 3, &ids(&["int:x"])).await.unwrap();
        let err = f
            .reports
            .upsert("mixed", 3, &ids(&["int:y", "float:x"]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReport(_)));
        let report = f.reports.get("mixed").await.unwrap();
        assert_eq!(report.metrics.len(), 1);

        // Re-adding the same metric is not a collision
        let report = f
            .reports
            .upsert("mixed", 3, &ids(&["int:x", "int:y"]))
            .await
            .unwrap();
        assert_eq!(report.metrics.len(), 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let f = fixture().await;
        f.reports.upsert("tmp", 2, &[]).await.unwrap();
        f.reports.delete("tmp").await.unwrap();
        assert!(matches!(
            f.reports.delete("tmp").await,
            Err(StoreError::UnknownReport(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_view_and_name() {
        let f = fixture().await;
        assert!(matches!(
            f.reports.upsert("x", 0, &[]).await,
            Err(StoreError::InvalidReport(_))
        ));
        assert!(matches!(
            f.reports.upsert("  ", 1, &[]).await,
            Err(StoreError::InvalidReport(_))
        ));
    }
}
