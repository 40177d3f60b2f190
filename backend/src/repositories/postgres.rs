//! PostgreSQL-backed transaction manager and user repository

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};

use crate::db;
use crate::error::{AppError, AppResult};
use crate::repositories::transaction::{TransactionManager, UnitOfWork};
use crate::repositories::user::{NewUser, User, UserChanges, UserRepository};

const USER_COLUMNS: &str = "id, username, name, password_hash, created_at, updated_at";

/// Map driver errors, surfacing unique violations as conflicts
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Conflict("username already taken".to_string());
        }
    }
    AppError::Database(err)
}

/// Transaction manager over a Postgres pool
#[derive(Clone)]
pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> AppResult<()> {
        db::health_check(&self.pool).await.map_err(AppError::Internal)
    }
}

/// An open Postgres transaction; sqlx rolls it back if dropped uncommitted
struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl UnitOfWork for PgUnitOfWork {
    fn users(&mut self) -> &mut dyn UserRepository {
        self
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, AppResult<()>> {
        Box::pin(async move { self.tx.commit().await.map_err(AppError::Database) })
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'static, AppResult<()>> {
        Box::pin(async move { self.tx.rollback().await.map_err(AppError::Database) })
    }
}

#[async_trait]
impl UserRepository for PgUnitOfWork {
    async fn insert(&mut self, user: &NewUser) -> AppResult<User> {
        let query = format!(
            "INSERT INTO users (username, name, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.password_hash)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_id(&mut self, id: i64) -> AppResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_id_for_update(&mut self, id: i64) -> AppResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_profile(&mut self, id: i64, changes: &UserChanges) -> AppResult<User> {
        let query = format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                name = COALESCE($3, name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(changes.username.as_deref())
            .bind(changes.name.as_deref())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn update_password(&mut self, id: i64, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}
