//! Account use cases: registration, profile update, password change and lookup
//!
//! Every operation runs inside one unit of work, so each either fully
//! commits or leaves no trace.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::auth::password::{self, CredentialHasher};
use crate::context::RequestInfo;
use crate::error::{AppError, AppResult};
use crate::repositories::{run_in_transaction, NewUser, TransactionManager, User, UserChanges};

/// Registration command
#[derive(Debug)]
pub struct AddUser {
    pub username: String,
    pub name: String,
    pub password: SecretString,
}

/// Profile update command; `None` leaves a field unchanged
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub id: i64,
    pub username: Option<String>,
    pub name: Option<String>,
}

/// Password change command
#[derive(Debug)]
pub struct ChangePassword {
    pub id: i64,
    pub current_password: SecretString,
    pub new_password: SecretString,
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// User account service
#[derive(Clone)]
pub struct UserService {
    transactions: Arc<dyn TransactionManager>,
    hasher: Arc<dyn CredentialHasher>,
}

impl UserService {
    pub fn new(transactions: Arc<dyn TransactionManager>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            transactions,
            hasher,
        }
    }

    /// Register a new user
    ///
    /// The password is hashed before the transaction opens so the row lock
    /// is never held across the expensive part.
    pub async fn add(&self, ctx: &RequestInfo, input: AddUser) -> AppResult<User> {
        let password_hash =
            password::hash_async(self.hasher.clone(), input.password.expose_secret().clone())
                .await?;

        let new_user = NewUser {
            username: input.username,
            name: input.name,
            password_hash,
        };

        let user = run_in_transaction(&*self.transactions, ctx, move |repo| {
            Box::pin(async move { repo.insert(&new_user).await })
        })
        .await?;

        info!(trace_id = %ctx.trace_id, user_id = user.id, "User registered");
        Ok(user)
    }

    /// Apply profile changes to an existing user
    pub async fn update(&self, ctx: &RequestInfo, input: UpdateUser) -> AppResult<User> {
        let UpdateUser { id, username, name } = input;
        let changes = UserChanges { username, name };

        let user = run_in_transaction(&*self.transactions, ctx, move |repo| {
            Box::pin(async move {
                let current = repo
                    .find_by_id_for_update(id)
                    .await?
                    .ok_or_else(user_not_found)?;

                if changes.is_empty() {
                    return Ok(current);
                }
                repo.update_profile(id, &changes).await
            })
        })
        .await?;

        info!(trace_id = %ctx.trace_id, user_id = user.id, "User profile updated");
        Ok(user)
    }

    /// Verify the current password and replace it, atomically
    pub async fn change_password(&self, ctx: &RequestInfo, input: ChangePassword) -> AppResult<()> {
        let ChangePassword {
            id,
            current_password,
            new_password,
        } = input;
        let hasher = self.hasher.clone();

        run_in_transaction(&*self.transactions, ctx, move |repo| {
            Box::pin(async move {
                let user = repo
                    .find_by_id_for_update(id)
                    .await?
                    .ok_or_else(user_not_found)?;

                let valid = password::verify_async(
                    hasher.clone(),
                    current_password.expose_secret().clone(),
                    user.password_hash,
                )
                .await?;
                if !valid {
                    return Err(AppError::InvalidCredentials);
                }

                let new_hash =
                    password::hash_async(hasher, new_password.expose_secret().clone()).await?;
                repo.update_password(id, &new_hash).await
            })
        })
        .await?;

        info!(trace_id = %ctx.trace_id, user_id = id, "User password changed");
        Ok(())
    }

    /// Look up a user by id
    pub async fn get_by_id(&self, ctx: &RequestInfo, id: i64) -> AppResult<User> {
        run_in_transaction(&*self.transactions, ctx, move |repo| {
            Box::pin(async move { repo.find_by_id(id).await?.ok_or_else(user_not_found) })
        })
        .await
    }
}
