//! User records and the repository interface used inside a unit of work

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fiqh_qa_shared::UserProfile;

use crate::error::AppResult;

/// User record as stored
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Insert payload; the id and timestamps are assigned by the store
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub password_hash: String,
}

/// Fields a user may change on their own profile
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub name: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.name.is_none()
    }
}

/// User persistence, only reachable through a `UnitOfWork`
///
/// Implementations report a taken username as `AppError::Conflict` and a
/// missing row on update as `AppError::NotFound`.
#[async_trait]
pub trait UserRepository: Send {
    async fn insert(&mut self, user: &NewUser) -> AppResult<User>;

    async fn find_by_id(&mut self, id: i64) -> AppResult<Option<User>>;

    /// Like `find_by_id`, but locks the row until the unit of work ends
    async fn find_by_id_for_update(&mut self, id: i64) -> AppResult<Option<User>>;

    async fn find_by_username(&mut self, username: &str) -> AppResult<Option<User>>;

    async fn update_profile(&mut self, id: i64, changes: &UserChanges) -> AppResult<User>;

    async fn update_password(&mut self, id: i64, password_hash: &str) -> AppResult<()>;
}
