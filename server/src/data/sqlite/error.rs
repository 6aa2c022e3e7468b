//! SQLite error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    /// The file was written by a newer release
    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i32, supported: i32 },

    /// A stored row that no longer decodes (e.g. an unknown kind tag)
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// A get-or-create found neither an inserted nor an existing row
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_too_new_display() {
        let err = SqliteError::SchemaTooNew {
            found: 3,
            supported: 1,
        };
        assert_eq!(
            err.to_string(),
            "Database schema version 3 is newer than supported version 1"
        );
    }

    #[test]
    fn test_sqlx_error_from() {
        let err: SqliteError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, SqliteError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_conflict_display() {
        let err = SqliteError::Conflict("metric 3@none".to_string());
        assert_eq!(err.to_string(), "Conflict: metric 3@none");
    }
}
