//! # User Store Module
//!
//! ## Purpose
//! Accounts for students and administrators: registration, lookup by email,
//! and owner-only academic profile updates. Seeded with two development
//! accounts so login works out of the box; persisted to the database tier
//! when one is configured.

use crate::recommend::AcademicProfile;
use crate::storage::Tree;
use crate::utils::IdUtils;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// A stored account. The password is kept only as a bcrypt hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Unique, case-sensitive as stored
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Academic signals, set by the owner after registration
    pub board: Option<String>,
    pub percentage: Option<f64>,
    pub jee_score: Option<f64>,
    pub neet_score: Option<f64>,
    pub state: Option<String>,
    pub bio: Option<String>,
}

impl User {
    /// The signals the recommendation engine scores against.
    pub fn academic_profile(&self) -> AcademicProfile {
        AcademicProfile {
            jee_score: self.jee_score,
            neet_score: self.neet_score,
            percentage: self.percentage,
            state: self.state.clone(),
        }
    }
}

/// Owner-editable academic profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub board: Option<String>,
    pub percentage: Option<f64>,
    #[serde(rename = "jeeScore")]
    pub jee_score: Option<f64>,
    #[serde(rename = "neetScore")]
    pub neet_score: Option<f64>,
    pub state: Option<String>,
    pub bio: Option<String>,
}

/// User store: in-memory map with an optional database tier.
pub struct UserStore {
    users: DashMap<String, User>,
    tree: Option<Tree>,
}

impl UserStore {
    pub fn new(tree: Option<Tree>) -> Self {
        let store = Self {
            users: DashMap::new(),
            tree,
        };

        for user in seed_users() {
            store.users.insert(user.id.clone(), user);
        }

        if let Some(tree) = &store.tree {
            if tree.is_empty() {
                for entry in store.users.iter() {
                    if let Err(e) = tree.put(entry.key(), entry.value()) {
                        tracing::warn!("Failed to seed user into database: {}", e);
                    }
                }
            }
        }

        store
    }

    /// Case-sensitive email lookup: database first, then memory.
    pub fn find_by_email(&self, email: &str) -> Option<User> {
        if let Some(tree) = &self.tree {
            match tree.all::<User>() {
                Ok(users) => {
                    if let Some(user) = users.into_iter().find(|u| u.email == email) {
                        return Some(user);
                    }
                }
                Err(e) => {
                    tracing::warn!("User database lookup failed, falling back to memory: {}", e);
                }
            }
        }

        self.users
            .iter()
            .find(|entry| entry.value().email == email)
            .map(|entry| entry.value().clone())
    }

    pub fn find_by_id(&self, id: &str) -> Option<User> {
        if let Some(tree) = &self.tree {
            match tree.get::<User>(id) {
                Ok(Some(user)) => return Some(user),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("User database lookup failed, falling back to memory: {}", e);
                }
            }
        }
        self.users.get(id).map(|entry| entry.value().clone())
    }

    /// Create a student account. The caller must have checked email
    /// uniqueness already (the register handler does, under rate limiting).
    pub fn create(&self, name: &str, email: &str, password_hash: &str, phone: &str) -> User {
        let user = User {
            id: IdUtils::record_id("user"),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            phone: phone.to_string(),
            role: Role::User,
            created_at: Utc::now(),
            board: None,
            percentage: None,
            jee_score: None,
            neet_score: None,
            state: None,
            bio: None,
        };

        self.users.insert(user.id.clone(), user.clone());
        if let Some(tree) = &self.tree {
            if let Err(e) = tree.put(&user.id, &user) {
                tracing::warn!("User database write failed, kept in memory only: {}", e);
            }
        }
        user
    }

    /// Every known account. Used by the analytics endpoint.
    pub fn all(&self) -> Vec<User> {
        if let Some(tree) = &self.tree {
            match tree.all::<User>() {
                Ok(users) if !users.is_empty() => return users,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("User database scan failed, falling back to memory: {}", e);
                }
            }
        }
        self.users.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Apply an owner-only profile update. None when the id is unknown.
    pub fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Option<User> {
        let mut user = self.find_by_id(user_id)?;

        if let Some(name) = &update.name {
            if !name.trim().is_empty() {
                user.name = name.trim().to_string();
            }
        }
        if let Some(phone) = &update.phone {
            user.phone = phone.trim().to_string();
        }
        if let Some(board) = &update.board {
            user.board = Some(board.trim().to_string());
        }
        if update.percentage.is_some() {
            user.percentage = update.percentage;
        }
        if update.jee_score.is_some() {
            user.jee_score = update.jee_score;
        }
        if update.neet_score.is_some() {
            user.neet_score = update.neet_score;
        }
        if let Some(state) = &update.state {
            user.state = Some(state.trim().to_string());
        }
        if let Some(bio) = &update.bio {
            user.bio = Some(bio.trim().to_string());
        }

        self.users.insert(user.id.clone(), user.clone());
        if let Some(tree) = &self.tree {
            if let Err(e) = tree.put(&user.id, &user) {
                tracing::warn!("User database write failed, kept in memory only: {}", e);
            }
        }
        Some(user)
    }
}

/// Development accounts: a student ("password123") and an admin
/// ("admin123"), with their bcrypt hashes fixed so login is reproducible.
fn seed_users() -> Vec<User> {
    let now = Utc::now();
    vec![
        User {
            id: "user_test_001".to_string(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$2a$10$l1k2EazBsDp6QV1wNYUh7eXV8sUhdS7m4MkCTegmIYMhruxMmHGqW".to_string(),
            phone: "+1234567890".to_string(),
            role: Role::User,
            created_at: now,
            board: None,
            percentage: None,
            jee_score: None,
            neet_score: None,
            state: None,
            bio: None,
        },
        User {
            id: "user_admin_001".to_string(),
            name: "Admin".to_string(),
            email: "admin@collegechalo.com".to_string(),
            password_hash: "$2a$10$iLUk06RiSclaYDRlxpepM.tFFhjNMl//OOCS6pFVVU/4Tiw8vi47e".to_string(),
            phone: "+1234567890".to_string(),
            role: Role::Admin,
            created_at: now,
            board: None,
            percentage: None,
            jee_score: None,
            neet_score: None,
            state: None,
            bio: None,
        },
    ]
}
