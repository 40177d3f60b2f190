//! Account routes
//!
//! Registration is public; everything under `/users/me` acts on the caller
//! identified by the bearer token.

use axum::{
    extract::State,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use fiqh_qa_shared::{
    AddUserRequest, ApiResponse, ChangePasswordRequest, UpdateUserRequest, UserProfile,
};
use secrecy::Secret;

use super::extract::ValidJson;
use super::response::ApiResult;
use crate::auth::auth_middleware;
use crate::context::RequestInfo;
use crate::services::{AddUser, ChangePassword, UpdateUser};
use crate::state::AppState;

/// Create account routes
pub fn user_routes(state: AppState) -> Router<AppState> {
    let me = Router::new()
        .route("/users/me", get(get_me).put(update_me))
        .route("/users/me/password", patch(change_password))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().route("/users", post(add_user)).merge(me)
}

/// Register a new account
///
/// POST /users
async fn add_user(
    State(state): State<AppState>,
    ctx: RequestInfo,
    ValidJson(req): ValidJson<AddUserRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let user = state
        .users
        .add(
            &ctx,
            AddUser {
                username: req.username,
                name: req.name,
                password: Secret::new(req.password),
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(user.into())))
}

/// GET /users/me
async fn get_me(
    State(state): State<AppState>,
    ctx: RequestInfo,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let id = ctx.current_user()?;
    let user = state.users.get_by_id(&ctx, id).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

/// Update username and/or display name
///
/// PUT /users/me
async fn update_me(
    State(state): State<AppState>,
    ctx: RequestInfo,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let id = ctx.current_user()?;
    let user = state
        .users
        .update(
            &ctx,
            UpdateUser {
                id,
                username: req.username,
                name: req.name,
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(user.into())))
}

/// PATCH /users/me/password
async fn change_password(
    State(state): State<AppState>,
    ctx: RequestInfo,
    ValidJson(req): ValidJson<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id = ctx.current_user()?;
    state
        .users
        .change_password(
            &ctx,
            ChangePassword {
                id,
                current_password: Secret::new(req.current_password),
                new_password: Secret::new(req.new_password),
            },
        )
        .await?;

    Ok(Json(ApiResponse::empty()))
}
