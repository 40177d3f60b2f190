//! Response envelope and error mapping
//!
//! Every response body is `{status, message, data}`. Errors carry a generic
//! message per kind; `expose_error_details` swaps in the error's own message
//! when the server is configured for detailed errors.

use std::any::Any;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use fiqh_qa_shared::{ApiResponse, ErrorKind};
use tracing::error;

use crate::error::AppError;
use crate::state::AppState;

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Detailed message of an error response, kept out of the body by default
#[derive(Debug, Clone)]
struct ErrorDetail(String);

fn status_of(kind: ErrorKind) -> StatusCode {
    StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn envelope(status: StatusCode, message: &str) -> Response {
    let body = ApiResponse::<()>::error(status.as_u16(), message);
    (status, Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind == ErrorKind::Internal {
            error!("Internal error: {:?}", self);
        }

        let mut response = envelope(status_of(kind), kind.generic_message());
        response
            .extensions_mut()
            .insert(ErrorDetail(self.to_string()));
        response
    }
}

/// Rewrite error bodies with their detailed message when enabled
pub async fn expose_error_details(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !state.config().server.detailed_errors {
        return response;
    }

    match response.extensions().get::<ErrorDetail>().cloned() {
        Some(ErrorDetail(detail)) => envelope(response.status(), &detail),
        None => response,
    }
}

/// Give the outer timeout's bare 408 the standard envelope
pub async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        error!("Request exceeded the server timeout");
        return envelope(StatusCode::REQUEST_TIMEOUT, "request timeout");
    }
    response
}

/// Fallback for unknown routes
pub async fn method_not_found() -> AppError {
    AppError::NotFound("method not found".to_string())
}

/// Response for a handler that panicked
pub fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    error!("Request handler panicked");
    envelope(StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal.generic_message())
}
