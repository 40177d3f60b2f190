//! Login and access token verification

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::auth::password::{self, CredentialHasher};
use crate::auth::TokenService;
use crate::context::RequestInfo;
use crate::error::{AppError, AppResult};
use crate::repositories::{run_in_transaction, TransactionManager, User};

/// Login input; the password never leaves this struct unredacted
#[derive(Debug)]
pub struct Credential {
    pub username: String,
    pub password: SecretString,
}

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub access_token: String,
    pub expires_in: i64,
    pub user: User,
}

/// Authentication service
///
/// Stateless: login reads storage but never writes it, and token checks
/// never touch storage at all.
#[derive(Clone)]
pub struct AuthService {
    transactions: Arc<dyn TransactionManager>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        transactions: Arc<dyn TransactionManager>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenService,
    ) -> Self {
        Self {
            transactions,
            hasher,
            tokens,
        }
    }

    /// Check a credential and issue an access token
    ///
    /// An unknown username and a wrong password fail identically with
    /// `InvalidCredentials`.
    pub async fn login(&self, ctx: &RequestInfo, credential: Credential) -> AppResult<LoginOutput> {
        let username = credential.username;
        let found = run_in_transaction(&*self.transactions, ctx, move |repo| {
            Box::pin(async move { repo.find_by_username(&username).await })
        })
        .await?;

        let Some(user) = found else {
            info!(trace_id = %ctx.trace_id, "Login rejected");
            return Err(AppError::InvalidCredentials);
        };

        let valid = password::verify_async(
            self.hasher.clone(),
            credential.password.expose_secret().clone(),
            user.password_hash.clone(),
        )
        .await?;

        if !valid {
            info!(trace_id = %ctx.trace_id, "Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(user.id)?;
        info!(trace_id = %ctx.trace_id, user_id = user.id, "User logged in");

        Ok(LoginOutput {
            access_token,
            expires_in: self.tokens.ttl_secs(),
            user,
        })
    }

    /// Resolve an `Authorization` header value to a user id
    ///
    /// Accepts `Bearer <token>` (scheme matched case-insensitively) as well
    /// as a bare token.
    pub fn verify_access_token(&self, header: &str) -> AppResult<i64> {
        let token = match header.trim().split_once(' ') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest,
            _ => header,
        }
        .trim();
        if token.is_empty() {
            return Err(AppError::Unauthorized("missing access token".to_string()));
        }

        self.tokens
            .verify(token)
            .map_err(|e| AppError::Unauthorized(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PasswordService;
    use crate::repositories::InMemoryUserStore;
    use crate::services::user::{AddUser, ChangePassword, UserService};
    use fiqh_qa_shared::ErrorKind;

    struct Fixture {
        auth: AuthService,
        users: UserService,
        tokens: TokenService,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn TransactionManager> = Arc::new(InMemoryUserStore::new());
        let hasher: Arc<dyn CredentialHasher> = Arc::new(PasswordService);
        let tokens = TokenService::new("test-secret", 3600);
        Fixture {
            auth: AuthService::new(store.clone(), hasher.clone(), tokens.clone()),
            users: UserService::new(store, hasher),
            tokens,
        }
    }

    fn credential(username: &str, password: &str) -> Credential {
        Credential {
            username: username.to_string(),
            password: SecretString::new(password.to_string()),
        }
    }

    fn ctx() -> RequestInfo {
        RequestInfo::new("test-trace")
    }

    async fn register(users: &UserService, username: &str, password: &str) -> User {
        users
            .add(
                &ctx(),
                AddUser {
                    username: username.to_string(),
                    name: "Amina".to_string(),
                    password: SecretString::new(password.to_string()),
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_issues_token_for_user() {
        let f = fixture();
        let user = register(&f.users, "amina", "secret1").await;

        let output = f.auth.login(&ctx(), credential("amina", "secret1")).await.unwrap();

        assert_eq!(output.user.id, user.id);
        assert_eq!(output.expires_in, 3600);
        assert_eq!(f.tokens.verify(&output.access_token), Ok(user.id));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let f = fixture();
        register(&f.users, "amina", "secret1").await;

        let ghost = f.auth.login(&ctx(), credential("ghost", "x")).await.unwrap_err();
        let wrong = f.auth.login(&ctx(), credential("amina", "wrong")).await.unwrap_err();

        assert_eq!(ghost.kind(), ErrorKind::InvalidCredentials);
        assert_eq!(wrong.kind(), ErrorKind::InvalidCredentials);
        assert_eq!(ghost.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_password_change_scenario() {
        let f = fixture();
        let user = register(&f.users, "amina", "secret1").await;
        assert_eq!(user.id, 1);

        assert!(f.auth.login(&ctx(), credential("amina", "secret1")).await.is_ok());
        assert_eq!(
            f.auth
                .login(&ctx(), credential("amina", "wrong"))
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidCredentials
        );

        f.users
            .change_password(
                &ctx(),
                ChangePassword {
                    id: 1,
                    current_password: SecretString::new("secret1".to_string()),
                    new_password: SecretString::new("secret2".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            f.auth
                .login(&ctx(), credential("amina", "secret1"))
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidCredentials
        );
        assert!(f.auth.login(&ctx(), credential("amina", "secret2")).await.is_ok());
    }

    #[test]
    fn test_verify_access_token_header_forms() {
        let f = fixture();
        let token = f.tokens.issue(9).unwrap();

        assert_eq!(f.auth.verify_access_token(&format!("Bearer {}", token)).unwrap(), 9);
        assert_eq!(f.auth.verify_access_token(&token).unwrap(), 9);
        assert_eq!(f.auth.verify_access_token(&format!("bearer {}", token)).unwrap(), 9);
        assert_eq!(f.auth.verify_access_token(&format!("BEARER  {}", token)).unwrap(), 9);
        assert_eq!(
            f.auth.verify_access_token("").unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            f.auth.verify_access_token("Bearer ").unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            f.auth.verify_access_token("Basic dXNlcjpwYXNz").unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let f = fixture();
        let expired = TokenService::new("test-secret", -5).issue(1).unwrap();

        let err = f.auth.verify_access_token(&format!("Bearer {}", expired)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(err.to_string().contains("expired"));
    }
}
