//! Typed metric store
//!
//! - `kinds` - closed value kind set and its parse/validate/format registry
//! - `identity` - `[kind:]name[@source]` metric identities
//! - `resolver` - idempotent get-or-create of sources, parameters and metrics
//! - `values` - append-only value storage and reads
//! - `ingest` - line-oriented payload ingestion
//! - `pivot` - pivot tables over value series
//! - `reports` - named metric bundles for combined export

pub mod error;
pub mod identity;
pub mod ingest;
pub mod kinds;
pub mod pivot;
pub mod reports;
pub mod resolver;
pub mod values;

use std::sync::Arc;

pub use error::StoreError;
pub use identity::MetricIdentity;
pub use ingest::IngestionParser;
pub use kinds::{Kind, TypeRegistry, TypedValue};
pub use pivot::{PivotLayout, PivotTable, PivotTableBuilder};
pub use reports::ReportService;
pub use resolver::EntityResolver;
pub use values::{StoredValue, ValueStore};

use crate::data::MetricRepository;
use crate::data::types::{MetricSummaryRow, ParameterDefaults};

/// Store-wide settings taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    pub defaults: ParameterDefaults,
    pub series_limit: usize,
}

/// Entry point bundling the store's services over one repository
#[derive(Clone)]
pub struct MetricStore {
    resolver: EntityResolver,
    values: ValueStore,
    ingest: IngestionParser,
    reports: ReportService,
}

impl MetricStore {
    pub fn new(repo: Arc<dyn MetricRepository>, config: StoreConfig) -> Self {
        let resolver = EntityResolver::new(Arc::clone(&repo), config.defaults);
        let values = ValueStore::new(Arc::clone(&repo), config.series_limit);
        let ingest = IngestionParser::new(resolver.clone(), values.clone());
        let reports = ReportService::new(repo, resolver.clone(), values.clone());
        Self {
            resolver,
            values,
            ingest,
            reports,
        }
    }

    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    pub fn values(&self) -> &ValueStore {
        &self.values
    }

    pub fn reports(&self) -> &ReportService {
        &self.reports
    }

    pub async fn ingest(
        &self,
        identity: &MetricIdentity,
        payload: &str,
    ) -> Result<usize, StoreError> {
        self.ingest.ingest(identity, payload).await
    }

    pub async fn latest(&self, identity: &MetricIdentity) -> Result<StoredValue, StoreError> {
        let metric = self.resolver.lookup_identity(identity).await?;
        self.values.latest(&metric).await
    }

    pub async fn series(
        &self,
        identity: &MetricIdentity,
        limit: Option<usize>,
    ) -> Result<Vec<StoredValue>, StoreError> {
        let metric = self.resolver.lookup_identity(identity).await?;
        self.values.series(&metric, limit).await
    }

    /// Description of an existing parameter; the source part is ignored
    pub async fn description(&self, identity: &MetricIdentity) -> Result<String, StoreError> {
        Ok(self.resolver.lookup_parameter(identity).await?.description)
    }

    /// Replace a parameter's description, creating the parameter if needed
    ///
    /// A blank description leaves the stored one unchanged.
    pub async fn set_description(
        &self,
        identity: &MetricIdentity,
        description: &str,
    ) -> Result<String, StoreError> {
        let parameter = self
            .resolver
            .resolve_parameter_of_kind(identity.kind, &identity.name, Some(description))
            .await?;
        Ok(parameter.description)
    }

    pub async fn list_metrics(&self) -> Result<Vec<MetricSummaryRow>, StoreError> {
        self.resolver.list_metrics().await
    }
}
