//! # Engagement Records Module
//!
//! ## Purpose
//! The four write-mostly engagement stores: saved colleges, submitted
//! applications, counselling leads, and contact messages. Saved colleges
//! upsert on the user and college pair; the public-facing lead and contact
//! stores are capped so anonymous traffic cannot grow them without bound.

use crate::storage::Tree;
use crate::utils::ValidationUtils;
use crate::{ChaloError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub const MAX_LEADS: usize = 500;
pub const MAX_CONTACT_MESSAGES: usize = 200;
pub const MIN_CONTACT_MESSAGE_LEN: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCollege {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "collegeId")]
    pub college_id: String,
    #[serde(rename = "collegeName")]
    pub college_name: String,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "collegeId")]
    pub college_id: String,
    #[serde(rename = "collegeName")]
    pub college_name: String,
    pub course: Option<String>,
    /// "pending" until an admin reviews it
    pub status: String,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub state: String,
    pub course: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeadInput {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub state: String,
    pub course: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Engagement store backed by memory with optional database trees.
///
/// Leads and contact messages keep an in-memory ring under a mutex so the
/// cap applies atomically; saved colleges and applications shard naturally
/// by user in a concurrent map.
pub struct EngagementStore {
    saved: DashMap<String, SavedCollege>,
    applications: DashMap<String, Application>,
    leads: Mutex<Vec<Lead>>,
    contact: Mutex<Vec<ContactMessage>>,
    saved_tree: Option<Tree>,
    applications_tree: Option<Tree>,
    leads_tree: Option<Tree>,
    contact_tree: Option<Tree>,
}

impl EngagementStore {
    pub fn new(
        saved_tree: Option<Tree>,
        applications_tree: Option<Tree>,
        leads_tree: Option<Tree>,
        contact_tree: Option<Tree>,
    ) -> Self {
        let store = Self {
            saved: DashMap::new(),
            applications: DashMap::new(),
            leads: Mutex::new(Vec::new()),
            contact: Mutex::new(Vec::new()),
            saved_tree,
            applications_tree,
            leads_tree,
            contact_tree,
        };
        store.hydrate();
        store
    }

    /// Load existing database rows into memory so caps and upserts see them.
    fn hydrate(&self) {
        if let Some(tree) = &self.saved_tree {
            if let Ok(entries) = tree.all::<SavedCollege>() {
                for entry in entries {
                    let key = Self::saved_key(&entry.user_id, &entry.college_id);
                    self.saved.insert(key, entry);
                }
            }
        }
        if let Some(tree) = &self.applications_tree {
            if let Ok(entries) = tree.all::<Application>() {
                for entry in entries {
                    self.applications.insert(entry.id.clone(), entry);
                }
            }
        }
        if let Some(tree) = &self.leads_tree {
            if let Ok(mut entries) = tree.all::<Lead>() {
                entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                entries.truncate(MAX_LEADS);
                *self.leads.lock() = entries;
            }
        }
        if let Some(tree) = &self.contact_tree {
            if let Ok(mut entries) = tree.all::<ContactMessage>() {
                entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                entries.truncate(MAX_CONTACT_MESSAGES);
                *self.contact.lock() = entries;
            }
        }
    }

    fn saved_key(user_id: &str, college_id: &str) -> String {
        format!("{}::{}", user_id, college_id)
    }

    /// Save a college for a user. Saving the same pair again refreshes the
    /// timestamp instead of duplicating the row.
    pub fn save_college(
        &self,
        user_id: &str,
        college_id: &str,
        college_name: &str,
    ) -> SavedCollege {
        let key = Self::saved_key(user_id, college_id);
        let record = SavedCollege {
            id: self
                .saved
                .get(&key)
                .map(|e| e.id.clone())
                .unwrap_or_else(|| crate::utils::IdUtils::record_id("saved")),
            user_id: user_id.to_string(),
            college_id: college_id.to_string(),
            college_name: college_name.to_string(),
            saved_at: Utc::now(),
        };
        self.saved.insert(key.clone(), record.clone());
        if let Some(tree) = &self.saved_tree {
            if let Err(e) = tree.put(&key, &record) {
                tracing::warn!("Saved-college write failed, kept in memory only: {}", e);
            }
        }
        record
    }

    /// Saved colleges for a user, newest first.
    pub fn saved_for(&self, user_id: &str) -> Vec<SavedCollege> {
        let mut list: Vec<SavedCollege> = self
            .saved
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        list.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        list
    }

    /// Submit an application. College id and name are required.
    pub fn submit_application(
        &self,
        user_id: &str,
        college_id: &str,
        college_name: &str,
        course: Option<String>,
    ) -> Result<Application> {
        if college_id.trim().is_empty() || college_name.trim().is_empty() {
            return Err(ChaloError::Validation {
                field: "collegeId".to_string(),
                reason: "collegeId and collegeName are required".to_string(),
            });
        }

        let application = Application {
            id: crate::utils::IdUtils::record_id("app"),
            user_id: user_id.to_string(),
            college_id: college_id.trim().to_string(),
            college_name: college_name.trim().to_string(),
            course,
            status: "pending".to_string(),
            submitted_at: Utc::now(),
        };
        self.applications
            .insert(application.id.clone(), application.clone());
        if let Some(tree) = &self.applications_tree {
            if let Err(e) = tree.put(&application.id, &application) {
                tracing::warn!("Application write failed, kept in memory only: {}", e);
            }
        }
        Ok(application)
    }

    /// Applications for a user, newest first.
    pub fn applications_for(&self, user_id: &str) -> Vec<Application> {
        let mut list: Vec<Application> = self
            .applications
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        list.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        list
    }

    /// Every application, for the admin analytics rollup.
    pub fn all_applications(&self) -> Vec<Application> {
        self.applications
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Record a counselling lead from the public form.
    pub fn add_lead(&self, input: &LeadInput) -> Result<Lead> {
        let name = input.name.trim();
        let email = input.email.trim();
        let mobile = input.mobile.trim();
        let state = input.state.trim();

        if name.is_empty() {
            return Err(validation("name", "name is required"));
        }
        if !ValidationUtils::is_valid_email(email) {
            return Err(validation("email", "a valid email is required"));
        }
        if !ValidationUtils::is_valid_mobile(mobile) {
            return Err(validation("mobile", "a valid mobile number is required"));
        }
        if state.is_empty() {
            return Err(validation("state", "state is required"));
        }

        let lead = Lead {
            id: crate::utils::IdUtils::record_id("lead"),
            name: name.to_string(),
            email: email.to_string(),
            mobile: mobile.to_string(),
            state: state.to_string(),
            course: input.course.clone(),
            created_at: Utc::now(),
        };

        {
            let mut leads = self.leads.lock();
            leads.insert(0, lead.clone());
            while leads.len() > MAX_LEADS {
                if let Some(evicted) = leads.pop() {
                    if let Some(tree) = &self.leads_tree {
                        let _ = tree.remove(&evicted.id);
                    }
                }
            }
        }
        if let Some(tree) = &self.leads_tree {
            if let Err(e) = tree.put(&lead.id, &lead) {
                tracing::warn!("Lead write failed, kept in memory only: {}", e);
            }
        }
        Ok(lead)
    }

    /// Leads, newest first.
    pub fn leads(&self) -> Vec<Lead> {
        self.leads.lock().clone()
    }

    /// Record a contact message from the public form.
    pub fn add_contact(
        &self,
        name: &str,
        email: &str,
        subject: Option<String>,
        message: &str,
    ) -> Result<ContactMessage> {
        let name = name.trim();
        let message = message.trim();

        if name.is_empty() {
            return Err(validation("name", "name is required"));
        }
        if !ValidationUtils::is_valid_email(email.trim()) {
            return Err(validation("email", "a valid email is required"));
        }
        if message.len() < MIN_CONTACT_MESSAGE_LEN {
            return Err(validation(
                "message",
                "message must be at least 10 characters",
            ));
        }

        let record = ContactMessage {
            id: crate::utils::IdUtils::record_id("contact"),
            name: name.to_string(),
            email: email.trim().to_string(),
            subject,
            message: message.to_string(),
            created_at: Utc::now(),
        };

        {
            let mut messages = self.contact.lock();
            messages.insert(0, record.clone());
            while messages.len() > MAX_CONTACT_MESSAGES {
                if let Some(evicted) = messages.pop() {
                    if let Some(tree) = &self.contact_tree {
                        let _ = tree.remove(&evicted.id);
                    }
                }
            }
        }
        if let Some(tree) = &self.contact_tree {
            if let Err(e) = tree.put(&record.id, &record) {
                tracing::warn!("Contact write failed, kept in memory only: {}", e);
            }
        }
        Ok(record)
    }

    /// Contact messages, newest first.
    pub fn contact_messages(&self) -> Vec<ContactMessage> {
        self.contact.lock().clone()
    }
}

fn validation(field: &str, reason: &str) -> ChaloError {
    ChaloError::Validation {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
