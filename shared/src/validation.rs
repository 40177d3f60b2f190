//! Input validation functions
//!
//! Plain validators return `Result<(), String>`; the `check_*` wrappers adapt
//! them to the `validator` crate so request types can derive `Validate`.

use std::borrow::Cow;

use validator::ValidationError;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 32;
pub const MAX_NAME_LENGTH: usize = 64;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Validate a username (login handle)
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if len < MIN_USERNAME_LENGTH {
        return Err(format!(
            "Username must be at least {MIN_USERNAME_LENGTH} characters"
        ));
    }
    if len > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Username must be at most {MAX_USERNAME_LENGTH} characters"
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(
            "Username may only contain letters, digits, '_', '.' and '-'".to_string(),
        );
    }
    Ok(())
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Name must be at most {MAX_NAME_LENGTH} characters"));
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err("Password too long".to_string());
    }
    Ok(())
}

fn to_validation_error(code: &'static str, result: Result<(), String>) -> Result<(), ValidationError> {
    result.map_err(|message| {
        let mut err = ValidationError::new(code);
        err.message = Some(Cow::Owned(message));
        err
    })
}

pub fn check_username(username: &str) -> Result<(), ValidationError> {
    to_validation_error("username", validate_username(username))
}

pub fn check_name(name: &str) -> Result<(), ValidationError> {
    to_validation_error("name", validate_name(name))
}

pub fn check_password(password: &str) -> Result<(), ValidationError> {
    to_validation_error("password", validate_password(password))
}
