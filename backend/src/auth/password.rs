//! Password hashing using argon2
//!
//! Provides salted one-way hashing and verification of credentials.
//!
//! # Performance Considerations
//!
//! Argon2 is intentionally CPU-intensive. Async callers should go through
//! `hash_async` / `verify_async`, which run on the blocking thread pool.

use std::sync::Arc;

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::debug;

/// One-way, salted credential hashing
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password with a freshly generated salt
    fn hash(&self, password: &str) -> Result<String>;

    /// Check a plaintext password against a stored hash.
    ///
    /// Returns `false` for a mismatch and for a malformed hash; never errors.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id password hashing service
///
/// Argon2id resists both side-channel and GPU-based attacks. The PHC
/// string it produces embeds the salt and parameters, so verification
/// needs nothing but the stored hash.
#[derive(Debug, Clone, Default)]
pub struct PasswordService;

impl CredentialHasher for PasswordService {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Rejecting malformed password hash: {}", e);
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a password on the blocking thread pool
pub async fn hash_async(hasher: Arc<dyn CredentialHasher>, password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
}

/// Verify a password on the blocking thread pool
pub async fn verify_async(
    hasher: Arc<dyn CredentialHasher>,
    password: String,
    hash: String,
) -> Result<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))
}
