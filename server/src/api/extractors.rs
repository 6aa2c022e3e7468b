//! Request extractors
//!
//! Every rejection is rendered through [`ApiError`], so clients see the same
//! `{error, code, message}` body for a bad identity, a malformed query or a
//! failed field validation.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::api::types::ApiError;
use crate::domain::{MetricIdentity, StoreError};

#[derive(Debug)]
pub enum ValidationRejection {
    Path(PathRejection),
    Identity(StoreError),
    Query(QueryRejection),
    Json(JsonRejection),
    Fields(ValidationErrors),
}

impl From<ValidationRejection> for ApiError {
    fn from(rejection: ValidationRejection) -> Self {
        match rejection {
            ValidationRejection::Identity(e) => e.into(),
            ValidationRejection::Path(r) => ApiError::bad_request("PATH_PARSE_ERROR", r.body_text()),
            ValidationRejection::Query(r) => {
                ApiError::bad_request("QUERY_PARSE_ERROR", r.body_text())
            }
            ValidationRejection::Json(r) => ApiError::bad_request("JSON_PARSE_ERROR", r.body_text()),
            ValidationRejection::Fields(errors) => {
                ApiError::bad_request("VALIDATION_ERROR", format_validation_errors(&errors))
            }
        }
    }
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Field messages joined with `; `, falling back to `<field>: validation failed`
fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(m) => m.to_string(),
                None => format!("{field}: validation failed"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

fn validated<T: Validate>(value: T) -> Result<T, ValidationRejection> {
    value.validate().map_err(ValidationRejection::Fields)?;
    Ok(value)
}

/// `{identity}` path segment parsed as `[kind:]name[@source]`
#[derive(Debug)]
pub struct IdentityPath(pub MetricIdentity);

impl<S: Send + Sync> FromRequestParts<S> for IdentityPath {
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;
        raw.parse()
            .map(IdentityPath)
            .map_err(ValidationRejection::Identity)
    }
}

/// Query string deserialized into `T` and checked with `validator`
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Query)?;
        validated(value).map(ValidatedQuery)
    }
}

/// JSON body deserialized into `T` and checked with `validator`
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        validated(value).map(ValidatedJson)
    }
}
