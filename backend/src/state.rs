//! Application state management
//!
//! Shared state passed to every handler via Axum's state extraction. It is
//! built once at startup, is read-only afterwards, and every field is cheap
//! to clone (`Arc` or `Arc`-backed).

use crate::auth::{CredentialHasher, PasswordService, TokenService};
use crate::config::AppConfig;
use crate::repositories::TransactionManager;
use crate::services::{AuthService, UserService};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub transactions: Arc<dyn TransactionManager>,
    pub auth: AuthService,
    pub users: UserService,
}

impl AppState {
    /// Wire services over the given storage
    ///
    /// Derives the signing keys from the configured secret, so call this
    /// once at startup.
    pub fn new(transactions: Arc<dyn TransactionManager>, config: AppConfig) -> Self {
        let tokens = TokenService::new(&config.jwt.secret, config.jwt.access_token_expiry_secs);
        let hasher: Arc<dyn CredentialHasher> = Arc::new(PasswordService);

        Self {
            auth: AuthService::new(transactions.clone(), hasher.clone(), tokens),
            users: UserService::new(transactions.clone(), hasher),
            transactions,
            config: Arc::new(config),
        }
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
