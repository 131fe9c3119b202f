//! Unified error type.
//!
//! Every failure in the question-answering pipeline is one of these variants.
//! The `Display` text is the human-readable diagnostic that ends up in the
//! transcript when a stage forwards its failure.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

/// Text shown whenever an operation needs a database connection and none exists.
pub const NOT_CONNECTED_MESSAGE: &str = "Please connect to the database first.";

/// Application error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    /// The inference server could not be reached.
    #[error("Error: Unable to connect to the model server. {0}")]
    ModelUnavailable(String),

    /// The inference server answered, but not with a usable body.
    #[error("Error: Invalid response from the model server. {0}")]
    ModelResponse(String),

    /// Opening the database session failed.
    #[error("Error connecting to database: {0}")]
    DatabaseConnection(String),

    /// No database session is open.
    #[error("{}", NOT_CONNECTED_MESSAGE)]
    NotConnected,

    /// Schema enumeration failed.
    #[error("Error fetching schema: {0}")]
    Introspection(String),

    /// The database engine rejected a query.
    #[error("Error executing query: {0}")]
    QueryExecution(String),

    /// Request payload failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            AppError::ModelResponse(_) => "MODEL_RESPONSE_ERROR",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::NotConnected => "NOT_CONNECTED",
            AppError::Introspection(_) => "INTROSPECTION_ERROR",
            AppError::QueryExecution(_) => "QUERY_EXECUTION_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status used when the error escapes to an API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ModelUnavailable(_) | AppError::ModelResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseConnection(_) => StatusCode::BAD_GATEWAY,
            AppError::NotConnected => StatusCode::CONFLICT,
            AppError::Introspection(_) | AppError::QueryExecution(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match status {
            s if s.is_server_error() => tracing::error!(code = self.code(), error = %self, "请求失败"),
            _ => tracing::warn!(code = self.code(), error = %self, "请求失败"),
        }
        let body = ApiResponse::err(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}
