//! Shared API types
//!
//! Error responses are JSON `{error, code, message}` bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::StoreError;

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn from_data(e: crate::data::DataError) -> Self {
        tracing::error!(error = %e, transient = e.is_transient(), "Data error");
        Self::internal("Database operation failed")
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let message = e.to_string();
        match e {
            StoreError::UnknownKind(_) => Self::bad_request("UNKNOWN_KIND", message),
            StoreError::InvalidValue { .. } => Self::bad_request("INVALID_VALUE", message),
            StoreError::MalformedIdentity(_) => Self::bad_request("MALFORMED_IDENTITY", message),
            StoreError::InvalidReport(_) => Self::bad_request("INVALID_REPORT", message),
            StoreError::InvalidLayout(_) => Self::bad_request("INVALID_LAYOUT", message),
            StoreError::UnknownParameter(_) => Self::not_found("UNKNOWN_PARAMETER", message),
            StoreError::UnknownReport(_) => Self::not_found("UNKNOWN_REPORT", message),
            StoreError::NoData(_) => Self::conflict("NO_DATA", message),
            StoreError::Data(e) => Self::from_data(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::Conflict { code, message } => (StatusCode::CONFLICT, "conflict", code, message),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataError;
    use crate::domain::Kind;

    fn status_of(e: StoreError) -> StatusCode {
        ApiError::from(e).into_response().status()
    }

    #[test]
    fn test_store_error_status_mapping() {
        assert_eq!(
            status_of(StoreError::UnknownKind("blob".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(StoreError::invalid_value(Kind::Int, "x").at_line(2)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(StoreError::MalformedIdentity("a:b:c".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(StoreError::UnknownParameter("int:x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(StoreError::UnknownReport("r".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(StoreError::NoData("int:x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(StoreError::Data(DataError::InvalidInput("boom".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_value_keeps_message() {
        match ApiError::from(StoreError::invalid_value(Kind::Float, "abc").at_line(3)) {
            ApiError::BadRequest { code, message } => {
                assert_eq!(code, "INVALID_VALUE");
                assert_eq!(message, "Invalid float: abc at line #3");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
