//! JWT access token issuance and verification
//!
//! Tokens are stateless HS256 JWTs carrying the user id and an absolute
//! expiry. Nothing is stored server side, so a token stays valid until it
//! expires.

use anyhow::Result;
use chrono::{Duration, Utc};
use fiqh_qa_shared::TokenError;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Pre-computed JWT keys, derived once from the signing secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// Issues and verifies signed, time-limited access tokens
///
/// Cheap to clone; keys are shared behind `Arc`.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    validation: Arc<Validation>,
    ttl_secs: i64,
}

impl TokenService {
    /// Create a token service. Call once at startup.
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            keys: JwtKeys::new(secret),
            validation: Arc::new(validation),
            ttl_secs,
        }
    }

    /// Issue a token for `user_id`, expiring `ttl_secs` from now
    pub fn issue(&self, user_id: i64) -> Result<String> {
        let now = Utc::now();
        let exp = Duration::try_seconds(self.ttl_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| anyhow::anyhow!("Token lifetime out of range: {}s", self.ttl_secs))?;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to generate access token: {}", e))
    }

    /// Verify a token and return the user id it names
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        let token_data = decode::<Claims>(token, &self.keys.decoding, &self.validation).map_err(
            |e| match e.kind() {
                JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            },
        )?;

        token_data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::Malformed)
    }

    /// Lifetime of issued tokens in seconds
    #[inline]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }
}
