//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the College Chalo API, loaded from a TOML
//! file with environment-variable overrides and validation.
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Command line arguments (highest priority)
//! 2. Environment variables (`COLLEGE_CHALO_*`)
//! 3. Configuration file
//! 4. Default values (lowest priority)

use crate::errors::{ChaloError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Storage and database settings
    pub storage: StorageConfig,
    /// Token and password settings
    pub auth: AuthConfig,
    /// Fixed-window rate limits per guarded action
    pub rate_limit: RateLimitConfig,
    /// Logging and monitoring
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Number of HTTP worker threads
    pub workers: usize,
}

/// Storage and database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file path. When unset, every store runs in memory.
    pub db_path: Option<PathBuf>,
}

/// Token and password configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens
    pub jwt_secret: String,
    /// Token lifetime in days
    pub token_ttl_days: i64,
    /// bcrypt cost factor
    pub bcrypt_cost: u32,
}

/// Fixed-window rate limits. Window lengths are per action because lead
/// submission uses an hour-long window while the auth endpoints use a minute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Login attempts per window
    pub login_max: u32,
    /// Registrations per window
    pub register_max: u32,
    /// Admin login attempts per window
    pub admin_login_max: u32,
    /// Contact messages per window
    pub contact_max: u32,
    /// Window for the above, in seconds
    pub window_secs: u64,
    /// Lead submissions per lead window
    pub leads_max: u32,
    /// Lead submission window, in seconds
    pub leads_window_secs: u64,
}

/// Logging and monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ChaloError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| ChaloError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("COLLEGE_CHALO_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("COLLEGE_CHALO_PORT") {
            self.server.port = port.parse().map_err(|_| ChaloError::Config {
                message: "Invalid port number in COLLEGE_CHALO_PORT".to_string(),
            })?;
        }
        if let Ok(db_path) = std::env::var("COLLEGE_CHALO_DB_PATH") {
            self.storage.db_path = Some(PathBuf::from(db_path));
        }
        if let Ok(secret) = std::env::var("COLLEGE_CHALO_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(level) = std::env::var("COLLEGE_CHALO_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ChaloError::Validation {
                field: "server.port".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(ChaloError::Validation {
                field: "auth.jwt_secret".to_string(),
                reason: "Token secret cannot be empty".to_string(),
            });
        }

        if !(4..=16).contains(&self.auth.bcrypt_cost) {
            return Err(ChaloError::Validation {
                field: "auth.bcrypt_cost".to_string(),
                reason: "bcrypt cost must be between 4 and 16".to_string(),
            });
        }

        if self.auth.token_ttl_days <= 0 {
            return Err(ChaloError::Validation {
                field: "auth.token_ttl_days".to_string(),
                reason: "Token lifetime must be positive".to_string(),
            });
        }

        if self.rate_limit.window_secs == 0 || self.rate_limit.leads_window_secs == 0 {
            return Err(ChaloError::Validation {
                field: "rate_limit.window_secs".to_string(),
                reason: "Rate-limit windows must be positive".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                enable_cors: true,
                workers: num_cpus::get(),
            },
            storage: StorageConfig { db_path: None },
            auth: AuthConfig {
                jwt_secret: "your-secret-key-change-in-production".to_string(),
                token_ttl_days: 7,
                bcrypt_cost: 10,
            },
            rate_limit: RateLimitConfig {
                login_max: 20,
                register_max: 10,
                admin_login_max: 8,
                contact_max: 8,
                window_secs: 60,
                leads_max: 10,
                leads_window_secs: 3600,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}
