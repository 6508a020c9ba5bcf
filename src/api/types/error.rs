//! Error envelope shared by every endpoint

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::query::QueryError;
use crate::domain::DomainError;

const GENERIC_FAILURE: &str = "Layanan sedang bermasalah";

/// `{status: "error", message, error_code, error_detail?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub status: String,
    pub message: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                status: "error".to_string(),
                message: message.into(),
                error_code: code.into(),
                error_detail: None,
            },
        }
    }

    /// Attach a user-safe detail
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.response.error_detail = Some(detail.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn invalid_json() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_JSON", "Format JSON tidak valid")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            "Metode HTTP tidak diizinkan",
        )
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", GENERIC_FAILURE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message } => {
                Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
            }
            DomainError::UnsafeSql { message } => {
                Self::new(StatusCode::BAD_REQUEST, "UNSAFE_SQL", "SQL ditolak").with_detail(message)
            }
            DomainError::Conflict { message } => {
                Self::new(StatusCode::CONFLICT, "CONFLICT", message)
            }
            other => {
                error!(error = %other, "Request failed");
                Self::internal()
            }
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let status = match err {
            QueryError::EmptyPrompt => StatusCode::BAD_REQUEST,
            QueryError::DangerousIntent { .. } => StatusCode::FORBIDDEN,
            QueryError::EmptySql | QueryError::UnsafeSql(_) | QueryError::Execution(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            QueryError::Embedding(_)
            | QueryError::SchemaUnavailable(_)
            | QueryError::Generation(_)
            | QueryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %err, code = err.code(), "Query resolution failed");
        }

        let api_error = Self::new(status, err.code(), err.user_message());
        match err.detail() {
            Some(detail) => api_error.with_detail(detail),
            None => api_error,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.response.error_code, self.response.message)
    }
}

impl std::error::Error for ApiError {}
