//! Domain error type for the metric store

use thiserror::Error;

use crate::data::DataError;
use crate::domain::kinds::Kind;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    #[error("Invalid {kind}: {text}{}", line_suffix(.line))]
    InvalidValue {
        kind: Kind,
        text: String,
        line: Option<usize>,
    },

    #[error("Invalid parameter: {0}")]
    UnknownParameter(String),

    #[error("No data for {0} yet")]
    NoData(String),

    #[error("Malformed identity: {0}")]
    MalformedIdentity(String),

    #[error("Unknown report: {0}")]
    UnknownReport(String),

    #[error("Invalid report: {0}")]
    InvalidReport(String),

    #[error("Invalid pivot layout: {0}")]
    InvalidLayout(String),

    #[error(transparent)]
    Data(#[from] DataError),
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|n| format!(" at line #{n}")).unwrap_or_default()
}

impl StoreError {
    pub fn invalid_value(kind: Kind, text: impl Into<String>) -> Self {
        Self::InvalidValue {
            kind,
            text: text.into(),
            line: None,
        }
    }

    /// Attach a 1-based payload line number to an `InvalidValue` error
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Self::InvalidValue { kind, text, .. } => Self::InvalidValue {
                kind,
                text,
                line: Some(line),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_display() {
        let err = StoreError::invalid_value(Kind::Int, "abc");
        assert_eq!(err.to_string(), "Invalid int: abc");
        assert_eq!(err.at_line(3).to_string(), "Invalid int: abc at line #3");
    }

    #[test]
    fn test_at_line_ignores_other_variants() {
        let err = StoreError::NoData("cpu".into()).at_line(2);
        assert_eq!(err.to_string(), "No data for cpu yet");
    }

    #[test]
    fn test_unknown_parameter_display() {
        let err = StoreError::UnknownParameter("float:load@host1".into());
        assert_eq!(err.to_string(), "Invalid parameter: float:load@host1");
    }
}
