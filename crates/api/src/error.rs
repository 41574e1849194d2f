//! The error type every handler returns, and its JSON rendering:
//! `{"error": "<message>", "code": "<CODE>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cinema_core::error::CoreError;
use cinema_core::types::DbId;
use serde_json::json;
use sqlx::error::ErrorKind;

use crate::payments::PaymentError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("No route for {0}")]
    RouteNotFound(String),

    /// Logged in full; clients only see a generic message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

type ErrorParts = (StatusCode, &'static str, String);

impl AppError {
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        CoreError::NotFound { entity, id }.into()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into()).into()
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CoreError::Conflict(msg.into()).into()
    }

    /// Status, machine-readable code and client-facing message.
    pub fn parts(&self) -> ErrorParts {
        match self {
            AppError::Core(err) => core_parts(err),
            AppError::Database(err) => database_parts(err),
            AppError::Payment(err) => payment_parts(err),
            AppError::RouteNotFound(path) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("No route for {path}"),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}

fn core_parts(err: &CoreError) -> ErrorParts {
    let (status, code) = match err {
        CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        CoreError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        CoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
    };
    let message = match err {
        CoreError::NotFound { .. } => err.to_string(),
        CoreError::Validation(msg)
        | CoreError::Conflict(msg)
        | CoreError::Unauthorized(msg)
        | CoreError::Forbidden(msg) => msg.clone(),
    };
    (status, code, message)
}

fn payment_parts(err: &PaymentError) -> ErrorParts {
    match err {
        PaymentError::Declined(_) | PaymentError::NotCompleted(_) => {
            (StatusCode::PAYMENT_REQUIRED, "PAYMENT_FAILED", err.to_string())
        }
        PaymentError::NotFound(_) => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Unknown payment intent".to_string(),
        ),
        PaymentError::Provider { .. } | PaymentError::Transport(_) => {
            tracing::error!(error = %err, "Payment provider failure");
            (
                StatusCode::BAD_GATEWAY,
                "PAYMENT_PROVIDER_ERROR",
                "The payment provider is unavailable, please try again".to_string(),
            )
        }
    }
}

/// Constraint violations that reach this point were not anticipated by a
/// handler; they still map to a client error rather than a 500.
fn database_parts(err: &sqlx::Error) -> ErrorParts {
    let sqlx::Error::Database(db_err) = err else {
        if matches!(err, sqlx::Error::RowNotFound) {
            return (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Resource not found".to_string(),
            );
        }
        tracing::error!(error = %err, "Database error");
        return internal();
    };

    let constraint = db_err.constraint().unwrap_or("unnamed");
    if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) {
        return (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Value overlaps an existing record: {constraint}"),
        );
    }
    match db_err.kind() {
        ErrorKind::UniqueViolation => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        ),
        ErrorKind::ForeignKeyViolation => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Operation violates a reference between records: {constraint}"),
        ),
        ErrorKind::CheckViolation | ErrorKind::NotNullViolation => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            format!("Value rejected by constraint: {constraint}"),
        ),
        _ => {
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
    }
}

/// SQLSTATE `exclusion_violation`, which `ErrorKind` does not name.
const EXCLUSION_VIOLATION: &str = "23P01";

fn internal() -> ErrorParts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Whether `err` is a unique violation of the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation() && db_err.constraint() == Some(constraint)
    )
}

/// Whether `err` is an exclusion violation of the named constraint.
pub fn is_exclusion_violation(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION)
                && db_err.constraint() == Some(constraint)
    )
}
