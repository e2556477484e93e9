//! # College Chalo API
//!
//! ## Overview
//! This library implements the backend for College Chalo, a student-facing
//! service for discovering, comparing, and applying to colleges in India,
//! together with the admin surface for catalog management and usage
//! analytics.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `catalog`: the authoritative college catalog with stable ids
//! - `filters`: pure filtering over the catalog (state, type, search, ranges)
//! - `recommend`: profile-driven scoring and diversified shortlisting
//! - `quiz`: one-shot quiz recommendations with a relaxed fallback filter
//! - `auth`: signed session tokens and password verification
//! - `rate_limit`: fixed-window request counting for abuse prevention
//! - `users`, `preferences`, `reviews`, `notifications`, `records`: keyed
//!   stores with an optional embedded database tier
//! - `storage`: sled-backed persistence shared by the stores
//! - `api`: REST endpoints
//! - `config`: configuration management and settings
//! - `errors`: centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests (filter queries, quiz answers, credentials)
//! - **Output**: JSON responses (college lists, scored shortlists, tokens)
//! - **Fallback**: every store runs in memory when no database is configured

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod filters;
pub mod notifications;
pub mod preferences;
pub mod quiz;
pub mod rate_limit;
pub mod recommend;
pub mod records;
pub mod reviews;
pub mod storage;
pub mod users;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{ChaloError, Result};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Whether a college is state-funded or privately run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollegeType {
    Government,
    Private,
}

impl CollegeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollegeType::Government => "Government",
            CollegeType::Private => "Private",
        }
    }
}

impl std::str::FromStr for CollegeType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Government" => Ok(CollegeType::Government),
            "Private" => Ok(CollegeType::Private),
            _ => Err(()),
        }
    }
}

/// A catalog entry. Ids are stable for the lifetime of the record:
/// `college_<n>` for seed data (assigned once at load) or
/// `college_custom_<millis>` for admin-created entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct College {
    /// Stable identifier
    pub id: String,
    /// Official name
    pub name: String,
    /// City / campus location
    pub location: String,
    /// State the campus is in
    pub state: String,
    /// Government or Private
    #[serde(rename = "type")]
    pub college_type: CollegeType,
    /// Founding year
    pub founded: u32,
    /// National ranking, lower is better (0 = unranked)
    pub ranking: u32,
    /// Annual fees in rupees
    pub fees: u64,
    /// Placement rate, 0-100
    #[serde(rename = "placementRate")]
    pub placement_rate: f64,
    /// Aggregate rating, 0-5
    pub rating: f64,
    /// Number of reviews behind the rating
    #[serde(rename = "reviewsCount")]
    pub reviews_count: u32,
    /// Free-text description
    pub description: String,
    /// Offered course names
    pub courses: Vec<String>,
    /// Cover image URL
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    /// Official website, if known
    pub website: Option<String>,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub catalog: Arc<catalog::CatalogStore>,
    pub users: Arc<users::UserStore>,
    pub preferences: Arc<preferences::PreferenceStore>,
    pub reviews: Arc<reviews::ReviewStore>,
    pub notifications: Arc<notifications::NotificationStore>,
    pub records: Arc<records::EngagementStore>,
    pub auth: Arc<auth::TokenSigner>,
    pub rate_limiter: Arc<rate_limit::RateLimiter>,
    pub storage: Option<Arc<storage::Storage>>,
    pub started_at: std::time::Instant,
}
