//! API request and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{check_name, check_password, check_username};

/// Response envelope shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            status: 200,
            message: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Failed response without a payload
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    /// Successful response with an empty payload
    pub fn empty() -> Self {
        Self {
            status: 200,
            message: "ok".to_string(),
            data: None,
        }
    }
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddUserRequest {
    #[validate(custom(function = "check_username"))]
    pub username: String,
    #[validate(custom(function = "check_name"))]
    pub name: String,
    #[validate(custom(function = "check_password"))]
    pub password: String,
}

/// Profile update request; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[validate(custom(function = "check_username"))]
    pub username: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "check_name"))]
    pub name: Option<String>,
}

/// Password change request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "current password is required"))]
    pub current_password: String,
    #[validate(custom(function = "check_password"))]
    pub new_password: String,
}

/// Public user fields; never includes the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Successful login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}
