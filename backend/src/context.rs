//! Per-request context threaded through every core call

use std::time::Duration;

use tokio::time::Instant;

use crate::error::{AppError, AppResult};

/// Ambient information about the request being served
///
/// Created by the transport for each request and passed by reference into
/// services. Never stored globally.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub trace_id: String,
    /// Set once the bearer token has been verified
    pub user_id: Option<i64>,
    /// Point after which in-flight transactions are abandoned and rolled back
    pub deadline: Option<Instant>,
}

impl RequestInfo {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            user_id: None,
            deadline: None,
        }
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Id of the authenticated caller
    pub fn current_user(&self) -> AppResult<i64> {
        self.user_id
            .ok_or_else(|| AppError::Unauthorized("request is not authenticated".to_string()))
    }
}
