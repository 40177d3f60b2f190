//! Scoped transactions around repository operations
//!
//! A unit of work either commits as a whole or leaves no trace. Dropping a
//! `UnitOfWork` without committing rolls it back, which covers panics and
//! cancelled futures as well as explicit errors.

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::context::RequestInfo;
use crate::error::{AppError, AppResult};
use crate::repositories::user::UserRepository;

/// One open transaction
pub trait UnitOfWork: Send {
    /// Repository bound to this transaction
    fn users(&mut self) -> &mut dyn UserRepository;

    fn commit(self: Box<Self>) -> BoxFuture<'static, AppResult<()>>;

    fn rollback(self: Box<Self>) -> BoxFuture<'static, AppResult<()>>;
}

/// Source of units of work
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;

    /// Cheap round trip used by readiness probes
    async fn ping(&self) -> AppResult<()>;
}

/// Run `operation` inside a single transaction.
///
/// Commits when the operation returns `Ok`, rolls back and propagates the
/// error otherwise. When the request carries a deadline the whole unit is
/// abandoned (and rolled back by drop) once it passes.
pub async fn run_in_transaction<T, F>(
    manager: &dyn TransactionManager,
    ctx: &RequestInfo,
    operation: F,
) -> AppResult<T>
where
    T: Send,
    F: for<'a> FnOnce(&'a mut dyn UserRepository) -> BoxFuture<'a, AppResult<T>> + Send,
{
    let unit = async {
        let mut uow = manager.begin().await?;

        let outcome = operation(uow.users()).await;

        match outcome {
            Ok(value) => {
                uow.commit().await?;
                Ok(value)
            }
            Err(err) => {
                debug!(trace_id = %ctx.trace_id, error = %err, "Rolling back transaction");
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(trace_id = %ctx.trace_id, error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    };

    match ctx.deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, unit)
            .await
            .unwrap_or_else(|_| {
                warn!(trace_id = %ctx.trace_id, "Transaction abandoned at request deadline");
                Err(AppError::internal("request deadline exceeded"))
            }),
        None => unit.await,
    }
}
