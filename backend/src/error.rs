//! Application error handling
//!
//! `AppError` is the single error type returned by every core operation.
//! It carries no transport concerns; the HTTP mapping lives in
//! `routes::response`.

use fiqh_qa_shared::ErrorKind;
use thiserror::Error;

/// Error returned by services, repositories and the transaction manager
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unknown identifier and wrong password are deliberately the same error.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// The kind this error maps to on the API contract
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::BadRequest(_) => ErrorKind::BadRequest,
            AppError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Internal(_) | AppError::Database(_) => ErrorKind::Internal,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(anyhow::anyhow!(message.into()))
    }
}

/// Result type alias for core operations
pub type AppResult<T> = Result<T, AppError>;
