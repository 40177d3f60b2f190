//! Route definitions for the Fiqh QA API
//!
//! This module organizes all API routes and applies middleware.

use crate::state::AppState;
use axum::{
    body::Body,
    http::{header, Method, Request},
    middleware,
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;

mod auth;
mod extract;
mod health;
mod response;
mod users;


pub use auth::auth_routes;
pub use extract::{ValidJson, TRACE_ID_HEADER};
pub use response::{expose_error_details, method_not_found, ApiResult};
pub use users::user_routes;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Extra time the outer timeout allows past the request deadline, so the
/// core rolls back and answers first
const TIMEOUT_GRACE: Duration = Duration::from_secs(1);

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let timeout =
        Duration::from_secs(state.config().server.request_timeout_secs.max(1)) + TIMEOUT_GRACE;

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .merge(auth_routes())
        .merge(user_routes(state.clone()))
        .fallback(method_not_found)
        // Apply middleware layers; the last one added sees the request first
        .layer(middleware::from_fn_with_state(state.clone(), expose_error_details))
        .layer(CatchPanicLayer::custom(response::handle_panic))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::map_response(response::timeout_envelope))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, TRACE_ID_HEADER]),
        )
        .layer(PropagateRequestIdLayer::new(TRACE_ID_HEADER))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let trace_id = request
                        .headers()
                        .get(&TRACE_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default();
                    tracing::info_span!(
                        "request",
                        trace_id = %trace_id,
                        method = %request.method(),
                        path = %request.uri().path(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(SetRequestIdLayer::new(TRACE_ID_HEADER, MakeRequestUuid))
        .with_state(state)
}
