//! # Access Control Module
//!
//! ## Purpose
//! Issues and verifies signed, time-limited session tokens for students and
//! administrators, and wraps password hashing/verification.
//!
//! ## Key Features
//! - HS256 tokens with a 7-day expiry carrying id, email, and name claims
//! - Admin tokens additionally carry a fixed `role: "admin"` marker
//! - Verification returns `Option<Claims>`: absent, malformed, expired, and
//!   wrongly-scoped tokens all collapse to `None`, so callers treat every
//!   failure alike
//! - bcrypt password hashing with a configurable cost

use crate::config::AuthConfig;
use crate::errors::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Role marker carried by admin tokens.
pub const ADMIN_ROLE: &str = "admin";

/// Identity claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    pub name: String,
    /// "admin" on admin tokens, absent otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// Token signer/verifier bound to one secret.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl TokenSigner {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::default();
        // exp is the only registered claim these tokens carry.
        validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            token_ttl: Duration::days(config.token_ttl_days),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    fn claims(&self, user_id: &str, email: &str, name: &str, role: Option<&str>) -> Claims {
        let now = Utc::now();
        Claims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            role: role.map(|r| r.to_string()),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        }
    }

    /// Issue a student session token.
    pub fn sign_token(&self, user_id: &str, email: &str, name: &str) -> Result<String> {
        let claims = self.claims(user_id, email, name, None);
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Issue an admin session token carrying the role marker.
    pub fn sign_admin_token(&self, user_id: &str, email: &str, name: &str) -> Result<String> {
        let claims = self.claims(user_id, email, name, Some(ADMIN_ROLE));
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verify a raw or "Bearer "-prefixed token. Any failure is `None`.
    pub fn verify_token(&self, token: Option<&str>) -> Option<Claims> {
        let raw = strip_bearer(token?);
        if raw.is_empty() {
            return None;
        }
        decode::<Claims>(raw, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .ok()
    }

    /// Verify an admin token: same as `verify_token` plus the role marker
    /// and required-field checks. Any failure is `None`.
    pub fn verify_admin_token(&self, token: Option<&str>) -> Option<Claims> {
        let claims = self.verify_token(token)?;
        if claims.role.as_deref() != Some(ADMIN_ROLE) {
            return None;
        }
        if claims.user_id.is_empty() || claims.email.is_empty() || claims.name.is_empty() {
            return None;
        }
        Some(claims)
    }

    /// Hash a password with the configured bcrypt cost.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, self.bcrypt_cost)?)
    }

    /// Verify a password against a stored bcrypt hash. Hash-parse failures
    /// count as a mismatch rather than an error.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}

fn strip_bearer(token: &str) -> &str {
    token.strip_prefix("Bearer ").unwrap_or(token)
}
