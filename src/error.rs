//! # Error Handling
//!
//! Dashboard API errors, rendered as `application/problem+json` with a
//! correlation id so a response can be matched to server logs.

use axum::{
    extract::rejection::QueryRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::db::DatabaseError;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Suggested retry delay in seconds (optional)
    pub retry_after: Option<u64>,
    /// Correlation id, also written to the server log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            retry_after: None,
            trace_id: Some(Self::correlation_id()),
        }
    }

    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    fn correlation_id() -> Box<str> {
        format!("corr-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]).into_boxed_str()
    }

    /// 503 returned while the warehouse cannot be reached.
    pub fn warehouse_unavailable() -> Self {
        ErrorType::ServiceUnavailable
            .into_api_error("Warehouse database is unavailable")
            .with_retry_after(WAREHOUSE_RETRY_AFTER_SECS)
    }
}

const WAREHOUSE_RETRY_AFTER_SECS: u64 = 30;

/// Standard error types with predefined status codes
#[derive(Debug, Error)]
pub enum ErrorType {
    #[error("Bad Request")]
    BadRequest,
    #[error("Internal Server Error")]
    InternalServerError,
    #[error("Service Unavailable")]
    ServiceUnavailable,
}

impl ErrorType {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorType::BadRequest => StatusCode::BAD_REQUEST,
            ErrorType::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// SCREAMING_SNAKE_CASE code carried in the body
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorType::BadRequest => "VALIDATION_FAILED",
            ErrorType::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorType::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn into_api_error(self, message: &str) -> ApiError {
        ApiError::new(self.status_code(), self.error_code(), message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        if let Some(retry_after) = self.retry_after
            && let Ok(header_value) = HeaderValue::from_str(&retry_after.to_string())
        {
            headers.insert("retry-after", header_value);
        }

        (self.status, headers, axum::Json(self)).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ErrorType::BadRequest.into_api_error(&format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<DatabaseError> for ApiError {
    fn from(error: DatabaseError) -> Self {
        let api_error = ApiError::warehouse_unavailable();
        tracing::error!(trace_id = ?api_error.trace_id, error = %error, "Warehouse connection failed");
        api_error
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        match error {
            sea_orm::DbErr::Conn(connection_err) => {
                let api_error = ApiError::warehouse_unavailable();
                tracing::error!(
                    trace_id = ?api_error.trace_id,
                    "Database connection error: {:?}",
                    connection_err
                );
                api_error
            }
            sea_orm::DbErr::ConnectionAcquire(acquire_err) => {
                let api_error = ApiError::warehouse_unavailable();
                tracing::error!(
                    trace_id = ?api_error.trace_id,
                    "Database connection acquire error: {:?}",
                    acquire_err
                );
                api_error
            }
            other => {
                let api_error =
                    ErrorType::InternalServerError.into_api_error("Database error occurred");
                tracing::error!(trace_id = ?api_error.trace_id, "Database error: {:?}", other);
                api_error
            }
        }
    }
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ErrorType::BadRequest
        .into_api_error(message)
        .with_details(field_errors)
}
