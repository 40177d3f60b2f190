//! Health check endpoints
//!
//! - /health - Basic health check
//! - /health/ready - Readiness probe (round trip to storage)
//! - /health/live - Liveness probe (always OK while the process serves)

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub storage: CheckStatus,
}

/// Status of an individual check
#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn simple(status: &str) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    })
}

pub async fn health_check() -> Json<HealthResponse> {
    simple("healthy")
}

/// Readiness probe; 503 while storage is unreachable
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (ready, storage) = match state.transactions.ping().await {
        Ok(()) => (
            true,
            CheckStatus {
                status: "healthy".to_string(),
                message: None,
            },
        ),
        Err(e) => {
            let message = if state.config().server.detailed_errors {
                e.to_string()
            } else {
                e.kind().generic_message().to_string()
            };
            (
                false,
                CheckStatus {
                    status: "unhealthy".to_string(),
                    message: Some(message),
                },
            )
        }
    };

    let response = HealthResponse {
        status: if ready { "ready" } else { "not_ready" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(HealthChecks { storage }),
    };

    if ready {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

pub async fn liveness_check() -> Json<HealthResponse> {
    simple("alive")
}
