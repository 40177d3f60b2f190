//! Business logic services
//!
//! Services orchestrate the hasher, token service and repositories.
//! They never depend on the HTTP layer.

pub mod auth;
pub mod user;

pub use auth::{AuthService, Credential, LoginOutput};
pub use user::{AddUser, ChangePassword, UpdateUser, UserService};
