//! In-memory user store
//!
//! Backs the `memory` storage backend and the test suite. A unit of work
//! holds the table lock for its whole lifetime and writes to a staged copy,
//! so units are serialized and an uncommitted unit simply vanishes on drop.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{AppError, AppResult};
use crate::repositories::transaction::{TransactionManager, UnitOfWork};
use crate::repositories::user::{NewUser, User, UserChanges, UserRepository};

#[derive(Debug, Clone, Default)]
struct Table {
    users: BTreeMap<i64, User>,
    last_id: i64,
}

impl Table {
    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }
}

/// Transaction manager over a process-local table
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    table: Arc<Mutex<Table>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed users, ordered by id
    pub async fn snapshot(&self) -> Vec<User> {
        self.table.lock().await.users.values().cloned().collect()
    }
}

#[async_trait]
impl TransactionManager for InMemoryUserStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let committed = self.table.clone().lock_owned().await;
        let staged = committed.clone();
        Ok(Box::new(MemoryUnitOfWork { committed, staged }))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

struct MemoryUnitOfWork {
    committed: OwnedMutexGuard<Table>,
    staged: Table,
}

impl UnitOfWork for MemoryUnitOfWork {
    fn users(&mut self) -> &mut dyn UserRepository {
        self
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, AppResult<()>> {
        let MemoryUnitOfWork {
            mut committed,
            staged,
        } = *self;
        *committed = staged;
        Box::pin(async { Ok(()) })
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'static, AppResult<()>> {
        drop(self);
        Box::pin(async { Ok(()) })
    }
}

#[async_trait]
impl UserRepository for MemoryUnitOfWork {
    async fn insert(&mut self, user: &NewUser) -> AppResult<User> {
        if self.staged.username_taken(&user.username, None) {
            return Err(AppError::Conflict("username already taken".to_string()));
        }

        self.staged.last_id += 1;
        let now = Utc::now();
        let record = User {
            id: self.staged.last_id,
            username: user.username.clone(),
            name: user.name.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        self.staged.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&mut self, id: i64) -> AppResult<Option<User>> {
        Ok(self.staged.users.get(&id).cloned())
    }

    async fn find_by_id_for_update(&mut self, id: i64) -> AppResult<Option<User>> {
        // The whole table is already locked by this unit of work.
        self.find_by_id(id).await
    }

    async fn find_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .staged
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_profile(&mut self, id: i64, changes: &UserChanges) -> AppResult<User> {
        if let Some(username) = &changes.username {
            if self.staged.username_taken(username, Some(id)) {
                return Err(AppError::Conflict("username already taken".to_string()));
            }
        }

        let user = self
            .staged
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_password(&mut self, id: i64, password_hash: &str) -> AppResult<()> {
        let user = self
            .staged
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }
}
