//! Error handling
//!
//! Defines every error the service can surface and how each one maps to an
//! HTTP response.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Body, query string or path that could not be deserialized
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: Decimal, available: Decimal },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("Export error: {0}")]
    Export(String),
}

/// Error body returned by the API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
            code: Some(code.to_string()),
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl AppError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) | AppError::Hash(_) | AppError::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::MalformedRequest(_)
            | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                ErrorResponse::new(
                    "Database Error",
                    "An error occurred while accessing the database",
                    "DB_ERROR",
                )
            }

            AppError::Validation(e) => {
                tracing::debug!(error = %e, "validation error");
                ErrorResponse::new("Validation Error", "The provided data is invalid", "VALIDATION_ERROR")
                    .with_details(json!(e))
            }

            AppError::BadRequest(msg) => ErrorResponse::new("Bad Request", msg, "BAD_REQUEST"),

            AppError::MalformedRequest(msg) => {
                tracing::debug!(%msg, "malformed request");
                ErrorResponse::new("Validation Error", msg, "VALIDATION_ERROR")
            }

            AppError::Unauthorized(msg) => {
                tracing::debug!(%msg, "unauthorized");
                ErrorResponse::new("Unauthorized", msg, "UNAUTHORIZED")
            }

            AppError::Forbidden(msg) => {
                tracing::debug!(%msg, "forbidden");
                ErrorResponse::new("Forbidden", msg, "FORBIDDEN")
            }

            AppError::NotFound(msg) => ErrorResponse::new("Not Found", msg, "NOT_FOUND"),

            AppError::Conflict(msg) => ErrorResponse::new("Conflict", msg, "CONFLICT"),

            AppError::InsufficientStock { requested, available } => ErrorResponse::new(
                "Insufficient stock",
                format!("Requested {} L but only {} L is available", requested, available),
                "INSUFFICIENT_STOCK",
            )
            .with_details(json!({
                "requested": requested.to_string(),
                "available": available.to_string(),
            })),

            AppError::Internal(msg) => {
                tracing::error!(%msg, "internal error");
                ErrorResponse::new("Internal Server Error", "An unexpected error occurred", "INTERNAL_ERROR")
            }

            AppError::RateLimitExceeded => ErrorResponse::new(
                "Rate Limit Exceeded",
                "Too many requests. Please try again later",
                "RATE_LIMIT_EXCEEDED",
            ),

            AppError::Jwt(msg) => ErrorResponse::new("Unauthorized", msg, "JWT_ERROR"),

            AppError::Hash(msg) => {
                tracing::error!(%msg, "password hashing failed");
                ErrorResponse::new(
                    "Hash Error",
                    "An error occurred while processing credentials",
                    "HASH_ERROR",
                )
            }

            AppError::Export(msg) => {
                tracing::error!(%msg, "export failed");
                ErrorResponse::new("Export Error", "Failed to build the spreadsheet", "EXPORT_ERROR")
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

/// Result alias used across handlers, services and repositories
pub type AppResult<T> = Result<T, AppError>;

/// Builds a single-field validation error
pub fn validation_error(field: &'static str, code: &'static str, message: &str) -> AppError {
    let mut error = validator::ValidationError::new(code);
    error.message = Some(message.to_string().into());

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Maps a unique/foreign-key violation to `Conflict`, everything else to `Database`
pub fn map_constraint_error(err: sqlx::Error, conflict_message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        // 23505 unique_violation, 23503 foreign_key_violation
        if matches!(db_err.code().as_deref(), Some("23505") | Some("23503")) {
            return AppError::Conflict(conflict_message.to_string());
        }
    }
    AppError::Database(err)
}
