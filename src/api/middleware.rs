use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Silver/Gold schemas not found: {0}")]
    SchemaUnavailable(String),

    #[error("Model endpoint unreachable: {0}")]
    EndpointUnreachable(String),

    #[error("Model endpoint error: {0}")]
    EndpointError(String),

    #[error("Model output was not parseable: {0}")]
    MalformedModelOutput(String),

    #[error("Model did not provide a SQL statement")]
    NoStatementProvided,

    #[error("Only SELECT statements are allowed: {0}")]
    NonSelectStatement(String),

    #[error("Statement appears to modify data (found '{0}'); rejecting")]
    MutatingKeywordDetected(String),

    #[error("Warehouse failed to execute the generated SQL: {0}")]
    QueryExecutionFailed(String),

    #[error("Warehouse unavailable: {0}")]
    WarehouseUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl AppError {
    /// Stable machine-readable code for each error kind
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::SchemaUnavailable(_) => "SCHEMA_UNAVAILABLE",
            AppError::EndpointUnreachable(_) => "ENDPOINT_UNREACHABLE",
            AppError::EndpointError(_) => "ENDPOINT_ERROR",
            AppError::MalformedModelOutput(_) => "MALFORMED_MODEL_OUTPUT",
            AppError::NoStatementProvided => "NO_STATEMENT_PROVIDED",
            AppError::NonSelectStatement(_) => "NON_SELECT_STATEMENT",
            AppError::MutatingKeywordDetected(_) => "MUTATING_KEYWORD",
            AppError::QueryExecutionFailed(_) => "QUERY_EXECUTION_FAILED",
            AppError::WarehouseUnavailable(_) => "WAREHOUSE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::SchemaUnavailable(_)
            | AppError::NoStatementProvided
            | AppError::NonSelectStatement(_)
            | AppError::MutatingKeywordDetected(_)
            | AppError::QueryExecutionFailed(_) => StatusCode::BAD_REQUEST,
            AppError::EndpointUnreachable(_) | AppError::EndpointError(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::MalformedModelOutput(_)
            | AppError::WarehouseUnavailable(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: ErrorDetail::new(self.code(), self.to_string()),
        });

        (status, body).into_response()
    }
}
