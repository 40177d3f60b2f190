//! Authentication middleware
//!
//! Verifies the bearer token before a protected handler runs and records
//! the caller as a request extension.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

/// Authenticated caller, inserted into request extensions by `auth_middleware`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Reject requests without a valid access token
///
/// Applied with `route_layer` so unknown routes still fall through to the
/// not-found handler.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let user_id = state.auth.verify_access_token(header)?;
    tracing::Span::current().record("user_id", user_id);

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}
