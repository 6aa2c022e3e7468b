//! Idempotent get-or-create resolution of sources, parameters and metrics
//!
//! Uniqueness is enforced by the store (unique indexes + insert-on-conflict),
//! so concurrent resolutions of one key converge on a single row. Transient
//! storage errors (busy database, pool timeouts) are retried with backoff.

use std::future::Future;
use std::sync::Arc;

use crate::data::types::{MetricRow, MetricSummaryRow, ParameterDefaults, ParameterRow, SourceRow};
use crate::data::{DataError, MetricRepository};
use crate::domain::error::StoreError;
use crate::domain::identity::{MAX_NAME_LENGTH, MetricIdentity};
use crate::domain::kinds::{Kind, TypeRegistry};
use crate::utils::retry::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, retry_with_backoff_async};

/// Truncate to the bounded length, then trim
pub fn normalize_name(raw: &str) -> String {
    let truncated: String = raw.chars().take(MAX_NAME_LENGTH).collect();
    truncated.trim().to_string()
}

async fn with_retry<T, F, Fut>(operation: F) -> Result<T, DataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DataError>>,
{
    retry_with_backoff_async(
        DEFAULT_MAX_ATTEMPTS,
        DEFAULT_BASE_DELAY_MS,
        DataError::is_transient,
        operation,
    )
    .await
}

#[derive(Clone)]
pub struct EntityResolver {
    repo: Arc<dyn MetricRepository>,
    defaults: ParameterDefaults,
}

impl EntityResolver {
    pub fn new(repo: Arc<dyn MetricRepository>, defaults: ParameterDefaults) -> Self {
        Self { repo, defaults }
    }

    /// Get or create a source; a blank name means "no source"
    pub async fn resolve_source(&self, name: &str) -> Result<Option<SourceRow>, StoreError> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Ok(None);
        }
        let (repo, name) = (&self.repo, name.as_str());
        let source = with_retry(move || repo.get_or_create_source(name)).await?;
        Ok(Some(source))
    }

    /// Get or create a parameter from a textual kind tag
    pub async fn resolve_parameter(
        &self,
        kind_tag: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<ParameterRow, StoreError> {
        let kind = TypeRegistry::lookup(kind_tag)?.kind;
        self.resolve_parameter_of_kind(kind, name, description)
            .await
    }

    /// Get or create a parameter by (kind, name)
    ///
    /// A supplied description that is non-blank and differs from the stored
    /// one replaces it; otherwise the parameter is returned untouched.
    pub async fn resolve_parameter_of_kind(
        &self,
        kind: Kind,
        name: &str,
        description: Option<&str>,
    ) -> Result<ParameterRow, StoreError> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(StoreError::MalformedIdentity(format!("{kind}:")));
        }

        let (repo, defaults, name_ref) = (&self.repo, &self.defaults, name.as_str());
        let mut parameter =
            with_retry(move || repo.get_or_create_parameter(kind, name_ref, defaults)).await?;

        let description = description.map(str::trim).filter(|d| !d.is_empty());
        if let Some(description) = description
            && description != parameter.description
        {
            let id = parameter.id;
            with_retry(move || repo.set_parameter_description(id, description)).await?;
            tracing::debug!(kind = %kind, name = %name, "Updated parameter description");
            parameter.description = description.to_string();
        }

        Ok(parameter)
    }

    /// Get or create the metric for (parameter, source-or-none)
    pub async fn resolve_metric(
        &self,
        parameter: &ParameterRow,
        source: Option<&SourceRow>,
    ) -> Result<MetricRow, StoreError> {
        let repo = &self.repo;
        let source_id = source.map(|s| s.id);
        let parameter_id = parameter.id;
        let metric =
            with_retry(move || repo.get_or_create_metric(parameter_id, source_id)).await?;
        Ok(metric)
    }

    /// Write path: create every missing piece of the identity
    pub async fn resolve_identity(
        &self,
        identity: &MetricIdentity,
        description: Option<&str>,
    ) -> Result<MetricRow, StoreError> {
        let parameter = self
            .resolve_parameter_of_kind(identity.kind, &identity.name, description)
            .await?;
        let source = match &identity.source {
            Some(name) => self.resolve_source(name).await?,
            None => None,
        };
        self.resolve_metric(&parameter, source.as_ref()).await
    }

    /// Read path: the parameter must already exist
    ///
    /// Source and metric are still created on first read, so a known
    /// parameter read through a new source reports "no data" rather than
    /// "unknown parameter".
    pub async fn lookup_identity(&self, identity: &MetricIdentity) -> Result<MetricRow, StoreError> {
        let parameter = self.lookup_parameter(identity).await?;
        let source = match &identity.source {
            Some(name) => self.resolve_source(name).await?,
            None => None,
        };
        self.resolve_metric(&parameter, source.as_ref()).await
    }

    /// Existing parameter for an identity, or `UnknownParameter`
    pub async fn lookup_parameter(
        &self,
        identity: &MetricIdentity,
    ) -> Result<ParameterRow, StoreError> {
        let name = normalize_name(&identity.name);
        let (repo, kind, name_ref) = (&self.repo, identity.kind, name.as_str());
        with_retry(move || repo.find_parameter(kind, name_ref))
            .await?
            .ok_or_else(|| StoreError::UnknownParameter(identity.to_string()))
    }

    pub async fn list_metrics(&self) -> Result<Vec<MetricSummaryRow>, StoreError> {
        let repo = &self.repo;
        Ok(with_retry(move || repo.list_metrics()).await?)
    }

    pub async fn count_parameters(&self) -> Result<i64, StoreError> {
        let repo = &self.repo;
        Ok(with_retry(move || repo.count_parameters()).await?)
    }
}
