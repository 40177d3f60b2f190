//! Authentication module
//!
//! Provides JWT access tokens, argon2 password hashing and the bearer
//! token middleware.

pub mod jwt;
mod middleware;
pub mod password;

pub use jwt::{Claims, TokenService};
pub use middleware::{auth_middleware, AuthUser};
pub use password::{CredentialHasher, PasswordService};
