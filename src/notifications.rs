//! # Notification Store Module
//!
//! ## Purpose
//! Per-user in-app notifications, newest first, capped at 100 per user so
//! an abandoned account never grows without bound.

use crate::storage::Tree;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Oldest entries past this count are dropped.
pub const MAX_PER_USER: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Notification store keyed by user id, with an optional database tier.
///
/// The database tier stores the whole per-user list under one key, so the
/// cap and ordering survive restarts without per-entry bookkeeping.
pub struct NotificationStore {
    notifications: DashMap<String, Vec<Notification>>,
    tree: Option<Tree>,
}

impl NotificationStore {
    pub fn new(tree: Option<Tree>) -> Self {
        Self {
            notifications: DashMap::new(),
            tree,
        }
    }

    /// Notifications for a user, newest first.
    pub fn list(&self, user_id: &str) -> Vec<Notification> {
        self.load(user_id)
    }

    /// Append a notification, evicting the oldest past the cap.
    pub fn push(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> Notification {
        let notification = Notification {
            id: crate::utils::IdUtils::record_id("notif"),
            user_id: user_id.to_string(),
            title: title.trim().to_string(),
            message: message.trim().to_string(),
            kind,
            read: false,
            created_at: Utc::now(),
        };

        let mut list = self.load(user_id);
        list.insert(0, notification.clone());
        list.truncate(MAX_PER_USER);
        self.store(user_id, list);

        notification
    }

    /// Mark every unread notification read. Returns how many changed.
    pub fn mark_all_read(&self, user_id: &str) -> usize {
        let mut list = self.load(user_id);
        let mut changed = 0;
        for notification in &mut list {
            if !notification.read {
                notification.read = true;
                changed += 1;
            }
        }
        if changed > 0 {
            self.store(user_id, list);
        }
        changed
    }

    /// Unread count, for badge rendering.
    pub fn unread_count(&self, user_id: &str) -> usize {
        self.load(user_id).iter().filter(|n| !n.read).count()
    }

    fn load(&self, user_id: &str) -> Vec<Notification> {
        if let Some(tree) = &self.tree {
            match tree.get::<Vec<Notification>>(user_id) {
                Ok(Some(list)) => return list,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        "Notification database lookup failed, falling back to memory: {}",
                        e
                    );
                }
            }
        }
        self.notifications
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn store(&self, user_id: &str, list: Vec<Notification>) {
        if let Some(tree) = &self.tree {
            if let Err(e) = tree.put(user_id, &list) {
                tracing::warn!(
                    "Notification database write failed, kept in memory only: {}",
                    e
                );
            }
        }
        self.notifications.insert(user_id.to_string(), list);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_orders_newest_first() {
        let store = NotificationStore::new(None);
        store.push("u1", "First", "m", NotificationKind::Info);
        store.push("u1", "Second", "m", NotificationKind::Success);

        let list = store.list("u1");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].title, "Second");
        assert_eq!(list[0].kind, NotificationKind::Success);
        assert!(!list[0].read);
    }

    #[test]
    fn per_user_cap_evicts_oldest() {
        let store = NotificationStore::new(None);
        for i in 0..(MAX_PER_USER + 5) {
            store.push("u1", &format!("n{}", i), "m", NotificationKind::Info);
        }
        let list = store.list("u1");
        assert_eq!(list.len(), MAX_PER_USER);
        // The newest survives, the very first is gone.
        assert_eq!(list[0].title, format!("n{}", MAX_PER_USER + 4));
        assert!(list.iter().all(|n| n.title != "n0"));
    }

    #[test]
    fn mark_all_read_counts_changes() {
        let store = NotificationStore::new(None);
        store.push("u1", "a", "m", NotificationKind::Info);
        store.push("u1", "b", "m", NotificationKind::Warning);

        assert_eq!(store.unread_count("u1"), 2);
        assert_eq!(store.mark_all_read("u1"), 2);
        assert_eq!(store.unread_count("u1"), 0);
        // Second pass changes nothing.
        assert_eq!(store.mark_all_read("u1"), 0);
    }

    #[test]
    fn users_are_isolated() {
        let store = NotificationStore::new(None);
        store.push("u1", "a", "m", NotificationKind::Info);
        assert!(store.list("u2").is_empty());
        assert_eq!(store.mark_all_read("u2"), 0);
    }

    #[test]
    fn database_tier_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = crate::storage::Storage::open(dir.path().join("db")).unwrap();
        let store = NotificationStore::new(Some(storage.notifications.clone()));
        store.push("u1", "Saved", "m", NotificationKind::Success);

        let reopened = NotificationStore::new(Some(storage.notifications.clone()));
        assert_eq!(reopened.list("u1").len(), 1);
    }
}
