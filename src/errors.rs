//! Error taxonomy shared by the services and the HTTP layer.
//!
//! Every failure a request can run into ends up as a [`ServiceError`], which knows
//! its HTTP status and renders a JSON envelope:
//!
//! ```json
//! { "error": { "code": "validation_error", "message": "...", "details": [...] } }
//! ```
//!
//! Server-side faults are logged in full and answered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::error;
use crate::repositories::StoreError;
use crate::services::credential_store::CredentialError;
use crate::services::session_token::TokenError;

/// A single offending input field.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] TokenError),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("failed to fetch remote file: {0}")]
    Fetch(String),

    #[error("file storage failure: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => {
                ServiceError::Conflict(format!("{} is already registered", field))
            }
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Unauthorized(_) | ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Fetch(_)
            | ServiceError::Io(_)
            | ServiceError::Credential(_)
            | ServiceError::Store(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Unauthorized(_) | ServiceError::InvalidCredentials => "unauthorized",
            ServiceError::Forbidden => "forbidden",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Fetch(_) => "fetch_error",
            ServiceError::Io(_) => "io_error",
            ServiceError::Credential(_) | ServiceError::Store(_) | ServiceError::Internal(_) => {
                "internal_error"
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ServiceError::Validation(fields) => json!({
                "error": {
                    "code": self.code(),
                    "message": "Request contains invalid fields",
                    "details": fields,
                }
            }),
            _ if status.is_server_error() => {
                error!("Request failed due to: {}", self);
                json!({
                    "error": {
                        "code": self.code(),
                        "message": "Something went wrong, please try again.",
                    }
                })
            }
            _ => json!({
                "error": {
                    "code": self.code(),
                    "message": self.to_string(),
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}
