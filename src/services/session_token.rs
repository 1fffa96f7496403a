//! Stateless session tokens.
//!
//! A token is an HS256 JWT carrying the user id, email, issue instant, expiry
//! (exactly one hour after issue) and a unique token id. Expiry is checked here
//! against an explicit clock reading rather than inside `jsonwebtoken`, so the
//! boundary is exact: a token is valid while `now < exp`.
//!
//! Logging out records the token id in a revocation set until the token would
//! have expired anyway.

use std::collections::HashMap;
use std::sync::Mutex;
use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const TOKEN_TTL_SECONDS: i64 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("no session token supplied")]
    Missing,

    #[error("session token has expired")]
    Expired,

    #[error("session token is invalid")]
    Invalid,

    #[error("session token has been revoked")]
    Revoked,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// The verified identity a token speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    revoked: Mutex<HashMap<String, i64>>,
}

impl SessionTokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            revoked: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, user_id: &str, email: &str) -> anyhow::Result<String> {
        self.issue_at(user_id, email, now())
    }

    pub fn issue_at(&self, user_id: &str, email: &str, issued_at: i64) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECONDS,
            jti: Uuid::new_v4().simple().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign session token")
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, now())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<Identity, TokenError> {
        let claims = self.verified_claims(token, now)?;
        Ok(Identity {
            user_id: claims.sub,
            email: claims.email,
        })
    }

    /// Revokes a currently valid token. Tokens that already fail verification
    /// are left alone and reported as such.
    pub fn revoke(&self, token: &str) -> Result<(), TokenError> {
        let now = now();
        let claims = self.verified_claims(token, now)?;

        let mut revoked = self.revoked.lock().unwrap_or_else(|e| e.into_inner());
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(claims.jti, claims.exp);
        Ok(())
    }

    fn verified_claims(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Missing);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Invalid)?
            .claims;

        if claims.exp != claims.iat + TOKEN_TTL_SECONDS {
            return Err(TokenError::Invalid);
        }
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        if self.is_revoked(&claims.jti) {
            return Err(TokenError::Revoked);
        }

        Ok(claims)
    }

    fn is_revoked(&self, jti: &str) -> bool {
        self.revoked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(jti)
    }
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
