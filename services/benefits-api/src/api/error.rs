//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every endpoint and the
//! authorization boundary return the same error shape.
//!
//! # Key invariants and assumptions
//! - Error responses carry a stable `code` and a human-readable `message`.
//! - Status codes align with the error category.
//!
//! # Security considerations
//! - Internal errors are logged server-side and returned as a generic message.
//! - A row outside the caller's scope is reported exactly like a missing row.
use crate::api::types::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use benefits_store::{RepositoryError, StoreError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn api_conflict(code: &str, message: &str) -> ApiError {
    api_error(StatusCode::CONFLICT, code, message)
}

pub fn api_internal_message(message: &str) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Translate a repository failure into a response.
///
/// `message` is only used for internal errors; not-found and conflict use
/// fixed messages so responses never reveal whether a hidden row exists.
pub fn api_repository(message: &str, err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::NotFound { entity, .. } => {
            api_not_found(&format!("{entity} not found"))
        }
        RepositoryError::Store(StoreError::NotFound(_)) => api_not_found("resource not found"),
        RepositoryError::Store(StoreError::Conflict(_)) => {
            api_conflict("conflict", "resource already exists")
        }
        RepositoryError::Scope(err) => {
            tracing::error!(error = %err, "scoped repository used without a scope context");
            api_internal_message(message)
        }
        RepositoryError::Store(err) => {
            tracing::error!(error = ?err, "benefits storage error");
            api_internal_message(message)
        }
    }
}
