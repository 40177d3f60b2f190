//! Data access layer
//!
//! Repositories are only reachable through a `UnitOfWork` handed out by a
//! `TransactionManager`.

pub mod memory;
pub mod postgres;
pub mod transaction;
pub mod user;

pub use memory::InMemoryUserStore;
pub use postgres::PgTransactionManager;
pub use transaction::{run_in_transaction, TransactionManager, UnitOfWork};
pub use user::{NewUser, User, UserChanges, UserRepository};
