//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the College Chalo API, covering the whole
//! taxonomy the endpoints surface: validation, authorization, not-found,
//! rate limiting, and storage failures.
//!
//! ## Key Features
//! - One error enum with detailed context per variant
//! - A crate-wide `Result` alias
//! - HTTP mapping via `actix_web::ResponseError`, so handlers can use `?`
//! - Internal detail is logged, never returned to the client

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, ChaloError>;

/// Error types for the College Chalo API
#[derive(Debug, Error)]
pub enum ChaloError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors on request input
    #[error("Validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// Missing, invalid, or expired credentials. All causes are reported
    /// alike; callers never learn whether a token was absent, forged, or
    /// stale.
    #[error("Unauthorized")]
    Unauthorized,

    /// Requested entity does not resolve to a record
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Fixed-window limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The backing store failed
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Token signing failed
    #[error("Token error: {message}")]
    Token { message: String },

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ChaloError {
    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            ChaloError::Config { .. } => "configuration",
            ChaloError::Validation { .. } => "validation",
            ChaloError::Unauthorized => "auth",
            ChaloError::NotFound { .. } => "not_found",
            ChaloError::RateLimited { .. } => "rate_limit",
            ChaloError::Storage { .. } => "storage",
            ChaloError::Token { .. } => "auth",
            ChaloError::Internal { .. } => "internal",
        }
    }

    /// Message safe to return to the client. Storage and internal detail
    /// stays in the logs.
    fn public_message(&self) -> String {
        match self {
            ChaloError::Storage { .. } | ChaloError::Internal { .. } | ChaloError::Token { .. } => {
                "Something went wrong. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl actix_web::ResponseError for ChaloError {
    fn status_code(&self) -> StatusCode {
        match self {
            ChaloError::Validation { .. } => StatusCode::BAD_REQUEST,
            ChaloError::Unauthorized => StatusCode::UNAUTHORIZED,
            ChaloError::NotFound { .. } => StatusCode::NOT_FOUND,
            ChaloError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ChaloError::Config { .. }
            | ChaloError::Storage { .. }
            | ChaloError::Token { .. }
            | ChaloError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!(category = self.category(), "{}", self);
        }

        let mut builder = HttpResponse::build(self.status_code());
        if let ChaloError::RateLimited { retry_after_secs } = self {
            builder.insert_header(("Retry-After", retry_after_secs.to_string()));
        }
        builder.json(serde_json::json!({
            "success": false,
            "error": self.public_message(),
        }))
    }
}

impl From<std::io::Error> for ChaloError {
    fn from(err: std::io::Error) -> Self {
        ChaloError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<sled::Error> for ChaloError {
    fn from(err: sled::Error) -> Self {
        ChaloError::Storage {
            message: err.to_string(),
        }
    }
}

impl From<bincode::Error> for ChaloError {
    fn from(err: bincode::Error) -> Self {
        ChaloError::Storage {
            message: format!("Encoding error: {}", err),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ChaloError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ChaloError::Token {
            message: err.to_string(),
        }
    }
}

impl From<bcrypt::BcryptError> for ChaloError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ChaloError::Internal {
            message: format!("Password hashing error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        let err = ChaloError::Validation {
            field: "email".to_string(),
            reason: "missing".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ChaloError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ChaloError::RateLimited { retry_after_secs: 5 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn storage_detail_is_not_leaked() {
        let err = ChaloError::Storage {
            message: "tree 'users' corrupted at page 7".to_string(),
        };
        assert!(!err.public_message().contains("page 7"));
    }
}
