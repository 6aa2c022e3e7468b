//! SQLite schema definitions
//!
//! Identity tables (sources, parameters, metrics) carry the unique indexes that
//! make get-or-create atomic. Values live in one table per kind so each column
//! keeps a native SQLite storage class.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Sources (optional origin of data)
-- =============================================================================
CREATE TABLE IF NOT EXISTS sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK(length(name) >= 1 AND length(name) <= 512),
    description TEXT NOT NULL DEFAULT '',
    created_at INTEGER NOT NULL
);

-- =============================================================================
-- 2. Parameters (kind-tagged metric definitions)
-- =============================================================================
CREATE TABLE IF NOT EXISTS parameters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL CHECK(kind IN ('int', 'float', 'decimal', 'string')),
    name TEXT NOT NULL CHECK(length(name) >= 1 AND length(name) <= 512),
    description TEXT NOT NULL DEFAULT '',
    min_value INTEGER,
    max_value INTEGER,
    max_lifetime_days INTEGER NOT NULL DEFAULT 0,
    max_num_entries INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    UNIQUE(kind, name)
);

CREATE INDEX IF NOT EXISTS idx_parameters_name ON parameters(name);

-- =============================================================================
-- 3. Metrics (parameter + optional source)
-- =============================================================================
CREATE TABLE IF NOT EXISTS metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parameter_id INTEGER NOT NULL REFERENCES parameters(id) ON DELETE CASCADE,
    source_id INTEGER REFERENCES sources(id) ON DELETE CASCADE,
    sort_order INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

-- Partial indexes for uniqueness: SQLite NULL != NULL in UNIQUE constraints
CREATE UNIQUE INDEX IF NOT EXISTS idx_metrics_no_source
    ON metrics(parameter_id)
    WHERE source_id IS NULL;
CREATE UNIQUE INDEX IF NOT EXISTS idx_metrics_with_source
    ON metrics(parameter_id, source_id)
    WHERE source_id IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_metrics_sort_order ON metrics(sort_order);

-- =============================================================================
-- 4. Values (one table per kind; datetime is microseconds since epoch, UTC)
-- =============================================================================
CREATE TABLE IF NOT EXISTS int_values (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    metric_id INTEGER NOT NULL REFERENCES metrics(id) ON DELETE CASCADE,
    datetime INTEGER NOT NULL,
    value INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_int_values_metric ON int_values(metric_id, datetime, id);

CREATE TABLE IF NOT EXISTS float_values (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    metric_id INTEGER NOT NULL REFERENCES metrics(id) ON DELETE CASCADE,
    datetime INTEGER NOT NULL,
    value REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_float_values_metric ON float_values(metric_id, datetime, id);

-- Fixed-point: value holds micro-units (6 fractional digits)
CREATE TABLE IF NOT EXISTS decimal_values (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    metric_id INTEGER NOT NULL REFERENCES metrics(id) ON DELETE CASCADE,
    datetime INTEGER NOT NULL,
    value INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_decimal_values_metric ON decimal_values(metric_id, datetime, id);

CREATE TABLE IF NOT EXISTS string_values (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    metric_id INTEGER NOT NULL REFERENCES metrics(id) ON DELETE CASCADE,
    datetime INTEGER NOT NULL,
    value TEXT NOT NULL CHECK(length(value) <= 5000)
);
CREATE INDEX IF NOT EXISTS idx_string_values_metric ON string_values(metric_id, datetime, id);

-- =============================================================================
-- 5. Reports (named, ordered bundles of metrics)
-- =============================================================================
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK(length(name) >= 1 AND length(name) <= 512),
    view INTEGER NOT NULL CHECK(view BETWEEN 1 AND 3),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS report_metrics (
    report_id INTEGER NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
    metric_id INTEGER NOT NULL REFERENCES metrics(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    PRIMARY KEY (report_id, metric_id)
);

CREATE INDEX IF NOT EXISTS idx_report_metrics_position ON report_metrics(report_id, position);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::assertions_on_constants)]
    fn test_schema_version_is_positive() {
        assert!(SCHEMA_VERSION > 0);
    }

    #[test]
    fn test_schema_contains_required_tables() {
        let required_tables = [
            "schema_version",
            "schema_migrations",
            "sources",
            "parameters",
            "metrics",
            "int_values",
            "float_values",
            "decimal_values",
            "string_values",
            "reports",
            "report_metrics",
        ];

        for table in required_tables {
            assert!(
                SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table)),
                "Schema missing table: {}",
                table
            );
        }
    }

    #[test]
    fn test_schema_kind_check_matches_value_tables() {
        for kind in crate::domain::kinds::Kind::ALL {
            assert!(SCHEMA.contains(&format!("'{}'", kind.as_str())));
            assert!(SCHEMA.contains(&format!(
                "CREATE TABLE IF NOT EXISTS {}",
                kind.table_name()
            )));
        }
    }
}
