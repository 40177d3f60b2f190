//! Request extractors
//!
//! `RequestInfo` carries the trace id, the authenticated caller and the
//! request deadline into the service layer. `ValidJson` decodes and validates
//! a JSON body in one step.

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, FromRef, FromRequest, FromRequestParts, Request},
    http::{request::Parts, HeaderName},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::auth::AuthUser;
use crate::context::RequestInfo;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the per-request trace id
pub const TRACE_ID_HEADER: HeaderName = HeaderName::from_static("trace-id");

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestInfo
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        // SetRequestIdLayer fills this in; the fallback only matters when the
        // router is mounted without it.
        let trace_id = parts
            .headers
            .get(&TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut info = RequestInfo::new(trace_id);
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            info = info.with_user(user.user_id);
        }

        let timeout_secs = state.config().server.request_timeout_secs;
        if timeout_secs > 0 {
            info = info.with_timeout(Duration::from_secs(timeout_secs));
        }

        Ok(info)
    }
}

/// JSON body that has passed field validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::BadRequest(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| AppError::BadRequest(errors.to_string()))?;

        Ok(ValidJson(value))
    }
}
