//! Error kinds for the Fiqh QA application

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of failure kinds the API contract is built on.
///
/// Every backend error maps to exactly one kind, and the HTTP layer maps
/// each kind to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    InvalidCredentials,
    Conflict,
    NotFound,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::InvalidCredentials | ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }

    /// Message shown when detailed errors are disabled
    pub fn generic_message(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad request",
            ErrorKind::InvalidCredentials => "invalid credentials",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Internal => "internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.generic_message())
    }
}

/// Access token verification failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,
}
