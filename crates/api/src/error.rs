//! API error types with HTTP response mapping.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use park_store::StoreError;

/// Field name to problem description.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed path, query or body.
    BadRequest(String),
    /// One or more request fields failed validation.
    Validation(FieldErrors),
    /// Domain logic error.
    Domain(DomainError),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Validation(_) => "invalid_input",
            ApiError::Domain(err) => err.kind(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(err) => domain_error_status(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let body = match self {
            ApiError::BadRequest(msg) => serde_json::json!({ "error": msg, "kind": kind }),
            ApiError::Validation(details) => serde_json::json!({
                "error": "request validation failed",
                "kind": kind,
                "details": details,
            }),
            ApiError::Domain(err) => {
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, "internal server error");
                }
                serde_json::json!({ "error": err.to_string(), "kind": kind })
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DomainError::Rule(_) => StatusCode::CONFLICT,
        DomainError::Store {
            source: StoreError::ConcurrencyConflict { .. },
            ..
        } => StatusCode::CONFLICT,
        DomainError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Collects field problems so a request reports all of them at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `field` as invalid and returns `None` when `result` failed.
    pub fn check<T, E>(&mut self, field: &'static str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(_) => {
                self.errors.insert(field, "is invalid".to_string());
                None
            }
        }
    }

    /// Records `field` as invalid when `valid` is false.
    pub fn ensure(&mut self, field: &'static str, valid: bool) {
        if !valid {
            self.errors.insert(field, "is invalid".to_string());
        }
    }

    /// Returns the checked values, or every collected problem at once.
    pub fn finish<T>(self, checked: Option<T>) -> Result<T, ApiError> {
        match checked {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(ApiError::Validation(self.errors)),
        }
    }
}
