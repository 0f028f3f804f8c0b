//! Server error types

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::media;
use crate::request::ValidationError;

/// Error document returned as `application/alto-error+json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ErrorDocument {
    pub error_code: &'static str,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("No resource at {method} {path}")]
    NotFound { method: String, path: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Cannot produce {produced} for Accept: {accept}")]
    NotAcceptable {
        accept: String,
        produced: &'static str,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Get the error code for structured responses
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::NotFound { .. } => "not-found",
            ServerError::Validation(err) => err.code(),
            ServerError::NotAcceptable { .. } => "not-acceptable",
            ServerError::Internal(_) => "internal-error",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn document(&self) -> ErrorDocument {
        let (field, value) = match self {
            ServerError::Validation(err) => {
                (err.field().map(str::to_string), err.value().map(str::to_string))
            }
            _ => (None, None),
        };
        ErrorDocument {
            error_code: self.code(),
            detail: self.to_string(),
            field,
            value,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error_code = self.code(), error = %self, "Request rejected");
        }

        // Serializing a struct of strings cannot fail
        let body = serde_json::to_vec(&self.document()).unwrap_or_default();
        (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(media::ERROR))],
            body,
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
