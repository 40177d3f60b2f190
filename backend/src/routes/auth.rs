//! Login route
//!
//! Password verification runs on the blocking thread pool inside the
//! service, so a slow hash never stalls the runtime.

use axum::{extract::State, routing::post, Json, Router};
use fiqh_qa_shared::{ApiResponse, LoginRequest, LoginResponse};
use secrecy::Secret;

use super::extract::ValidJson;
use super::response::ApiResult;
use crate::context::RequestInfo;
use crate::services::Credential;
use crate::state::AppState;

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Exchange a username and password for an access token
///
/// POST /login
async fn login(
    State(state): State<AppState>,
    ctx: RequestInfo,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let output = state
        .auth
        .login(
            &ctx,
            Credential {
                username: req.username,
                password: Secret::new(req.password),
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        access_token: output.access_token,
        token_type: "Bearer".to_string(),
        expires_in: output.expires_in,
        user: output.user.into(),
    })))
}
