//! Unified error type for data layer
//!
//! Wraps backend errors so domain services never depend on sqlx directly.

use thiserror::Error;

use crate::data::sqlite::SqliteError;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    /// Schema could not be brought to the supported version
    #[error("Migration {version} ({name}) failed on {backend}: {error}")]
    MigrationFailed {
        backend: &'static str,
        version: i32,
        name: String,
        error: String,
    },

    /// Stored data that no longer decodes
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    /// Conflict error (e.g. a get-or-create race that found no row)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request the store cannot represent (e.g. a value of the wrong kind)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DataError {
    /// Check if this is a connection or contention error that might succeed on retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sqlite(e) => match e {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
                sqlx::Error::Database(db) => {
                    // SQLITE_BUSY (5) / SQLITE_LOCKED (6), including extended codes
                    db.code()
                        .and_then(|c| c.parse::<i32>().ok())
                        .is_some_and(|c| matches!(c & 0xff, 5 | 6))
                }
                _ => false,
            },
            Self::Conflict(_) => true,
            Self::MigrationFailed { .. } | Self::Corrupt(_) | Self::InvalidInput(_) => false,
        }
    }
}

impl From<SqliteError> for DataError {
    fn from(e: SqliteError) -> Self {
        match e {
            SqliteError::Database(e) => Self::Sqlite(e),
            SqliteError::MigrationFailed {
                version,
                name,
                error,
            } => Self::MigrationFailed {
                backend: "sqlite",
                version,
                name,
                error,
            },
            e @ SqliteError::SchemaTooNew { found, .. } => Self::MigrationFailed {
                backend: "sqlite",
                version: found,
                name: "downgrade".to_string(),
                error: e.to_string(),
            },
            SqliteError::CorruptRow(msg) => Self::Corrupt(msg),
            SqliteError::Conflict(msg) => Self::Conflict(msg),
            SqliteError::InvalidInput(msg) => Self::InvalidInput(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(DataError::Sqlite(sqlx::Error::PoolTimedOut).is_transient());
        assert!(DataError::Conflict("race".into()).is_transient());
        assert!(!DataError::Sqlite(sqlx::Error::RowNotFound).is_transient());
        assert!(!DataError::Corrupt("unknown kind \"blob\"".into()).is_transient());
        assert!(!DataError::InvalidInput("wrong kind".into()).is_transient());
    }

    #[test]
    fn test_from_sqlite_error_preserves_variant() {
        let err: DataError = SqliteError::Conflict("metric".into()).into();
        assert!(matches!(err, DataError::Conflict(_)));

        let err: DataError = SqliteError::CorruptRow("row 7".into()).into();
        assert!(matches!(err, DataError::Corrupt(_)));
    }

    #[test]
    fn test_newer_schema_becomes_migration_failure() {
        let err: DataError = SqliteError::SchemaTooNew {
            found: 2,
            supported: 1,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Migration 2 (downgrade) failed on sqlite: \
             Database schema version 2 is newer than supported version 1"
        );
    }
}
