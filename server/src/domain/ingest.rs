//! Text payload ingestion
//!
//! One record per line: `<value>` or `YYYY-MM-DDTHH:MM:SS <value>`. Every
//! line is parsed and coerced before anything is written, and the batch is
//! stored in one transaction, so the first bad line rejects the whole payload.

use chrono::{DateTime, Utc};

use crate::domain::error::StoreError;
use crate::domain::identity::MetricIdentity;
use crate::domain::kinds::{Kind, TypeRegistry, TypedValue};
use crate::domain::resolver::EntityResolver;
use crate::domain::values::ValueStore;
use crate::utils::time::parse_naive_timestamp;

/// One payload line split into its timestamp and raw value text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub datetime: DateTime<Utc>,
    pub text: &'a str,
}

/// Split a line into (timestamp, value text)
///
/// A single token is the whole value, stamped with `now`. Otherwise the
/// first token must be a timestamp; when it is not and
/// `allow_embedded_timestamp` is set, the entire line is the value.
pub fn parse_line<'a>(
    line: &'a str,
    kind: Kind,
    allow_embedded_timestamp: bool,
    now: DateTime<Utc>,
) -> Result<ParsedLine<'a>, StoreError> {
    let Some((first, rest)) = line.trim_start().split_once(char::is_whitespace) else {
        return Ok(ParsedLine {
            datetime: now,
            text: line,
        });
    };
    let rest = rest.trim_start();
    if rest.is_empty() {
        return Ok(ParsedLine {
            datetime: now,
            text: line,
        });
    }

    match parse_naive_timestamp(first) {
        Some(datetime) => Ok(ParsedLine {
            datetime,
            text: rest,
        }),
        None if allow_embedded_timestamp => Ok(ParsedLine {
            datetime: now,
            text: line,
        }),
        None => Err(StoreError::invalid_value(kind, line)),
    }
}

/// Split a payload into lines: surrounding whitespace trimmed, `\n` separated,
/// a trailing `\r` dropped from each line
pub fn split_payload(payload: &str) -> impl Iterator<Item = &str> {
    payload
        .trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Parse and coerce a whole payload
///
/// Stops at the first invalid line; the error carries its 1-based number.
pub fn parse_payload(
    payload: &str,
    kind: Kind,
    allow_embedded_timestamp: bool,
    now: DateTime<Utc>,
) -> Result<Vec<(DateTime<Utc>, TypedValue)>, StoreError> {
    let ops = TypeRegistry::ops(kind);
    split_payload(payload)
        .enumerate()
        .map(|(i, line)| -> Result<_, StoreError> {
            let parsed = parse_line(line, kind, allow_embedded_timestamp, now)
                .map_err(|e| e.at_line(i + 1))?;
            let value = ops.coerce(parsed.text).map_err(|e| e.at_line(i + 1))?;
            Ok((parsed.datetime, value))
        })
        .collect()
}

#[derive(Clone)]
pub struct IngestionParser {
    resolver: EntityResolver,
    values: ValueStore,
}

impl IngestionParser {
    pub fn new(resolver: EntityResolver, values: ValueStore) -> Self {
        Self { resolver, values }
    }

    /// Store every line of `payload` against the metric named by `identity`
    ///
    /// The metric is resolved once per request. Returns the number of stored
    /// values.
    pub async fn ingest(
        &self,
        identity: &MetricIdentity,
        payload: &str,
    ) -> Result<usize, StoreError> {
        let metric = self.resolver.resolve_identity(identity, None).await?;
        let entries = parse_payload(
            payload,
            metric.kind,
            metric.kind.allows_embedded_timestamp(),
            Utc::now(),
        )?;

        let stored = self.values.append_typed(&metric, entries).await?;
        tracing::debug!(metric = %identity, count = stored.len(), "Ingested values");
        Ok(stored.len())
    }
}
