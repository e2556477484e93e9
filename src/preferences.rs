//! # Preference Store Module
//!
//! ## Purpose
//! Per-user search preferences that shape the recommendation pre-filter:
//! preferred states, college type, fee ceiling, placement floor, and an
//! optional course. A user who never saved preferences gets the defaults.

use crate::storage::Tree;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Most states anyone can realistically shortlist.
pub const MAX_PREFERRED_STATES: usize = 10;

/// College type preference. `Any` disables the type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PreferredType {
    #[default]
    Any,
    Government,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "preferredStates")]
    pub preferred_states: Vec<String>,
    #[serde(rename = "preferredType")]
    pub preferred_type: PreferredType,
    #[serde(rename = "maxFees")]
    pub max_fees: u64,
    #[serde(rename = "minPlacement")]
    pub min_placement: f64,
    #[serde(rename = "preferredCourse")]
    pub preferred_course: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    pub fn default_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            preferred_states: Vec::new(),
            preferred_type: PreferredType::Any,
            max_fees: 300_000,
            min_placement: 70.0,
            preferred_course: None,
            updated_at: Utc::now(),
        }
    }
}

/// Incoming preference payload. Missing fields fall back to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    #[serde(rename = "preferredStates")]
    pub preferred_states: Option<Vec<String>>,
    #[serde(rename = "preferredType")]
    pub preferred_type: Option<PreferredType>,
    #[serde(rename = "maxFees")]
    pub max_fees: Option<u64>,
    #[serde(rename = "minPlacement")]
    pub min_placement: Option<f64>,
    #[serde(rename = "preferredCourse")]
    pub preferred_course: Option<String>,
}

/// Preference store keyed by user id, with an optional database tier.
pub struct PreferenceStore {
    prefs: DashMap<String, UserPreferences>,
    tree: Option<Tree>,
}

impl PreferenceStore {
    pub fn new(tree: Option<Tree>) -> Self {
        Self {
            prefs: DashMap::new(),
            tree,
        }
    }

    /// Stored preferences, or the defaults when none were ever saved.
    pub fn get(&self, user_id: &str) -> UserPreferences {
        if let Some(tree) = &self.tree {
            match tree.get::<UserPreferences>(user_id) {
                Ok(Some(prefs)) => return prefs,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        "Preference database lookup failed, falling back to memory: {}",
                        e
                    );
                }
            }
        }
        self.prefs
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| UserPreferences::default_for(user_id))
    }

    /// Full overwrite: absent or out-of-range fields revert to defaults,
    /// the state list is trimmed of blanks and capped, and `updatedAt` is
    /// stamped server-side. A fee ceiling must be positive and a placement
    /// floor non-negative.
    pub fn put(&self, user_id: &str, update: &PreferencesUpdate) -> UserPreferences {
        let mut states: Vec<String> = update
            .preferred_states
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        states.truncate(MAX_PREFERRED_STATES);

        let defaults = UserPreferences::default_for(user_id);
        let prefs = UserPreferences {
            user_id: user_id.to_string(),
            preferred_states: states,
            preferred_type: update.preferred_type.unwrap_or_default(),
            max_fees: update
                .max_fees
                .filter(|&fees| fees > 0)
                .unwrap_or(defaults.max_fees),
            min_placement: update
                .min_placement
                .filter(|&p| p.is_finite() && p >= 0.0)
                .unwrap_or(defaults.min_placement),
            preferred_course: update
                .preferred_course
                .clone()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            updated_at: Utc::now(),
        };

        self.prefs.insert(user_id.to_string(), prefs.clone());
        if let Some(tree) = &self.tree {
            if let Err(e) = tree.put(user_id, &prefs) {
                tracing::warn!(
                    "Preference database write failed, kept in memory only: {}",
                    e
                );
            }
        }
        prefs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_gets_defaults() {
        let store = PreferenceStore::new(None);
        let prefs = store.get("user_x");
        assert_eq!(prefs.max_fees, 300_000);
        assert!((prefs.min_placement - 70.0).abs() < f64::EPSILON);
        assert_eq!(prefs.preferred_type, PreferredType::Any);
        assert!(prefs.preferred_states.is_empty());
    }

    #[test]
    fn put_overwrites_and_stamps() {
        let store = PreferenceStore::new(None);
        let update = PreferencesUpdate {
            preferred_states: Some(vec!["  Maharashtra ".to_string(), "".to_string()]),
            preferred_type: Some(PreferredType::Government),
            max_fees: Some(500_000),
            ..Default::default()
        };
        let saved = store.put("user_x", &update);
        assert_eq!(saved.preferred_states, vec!["Maharashtra"]);
        assert_eq!(saved.preferred_type, PreferredType::Government);
        assert_eq!(saved.max_fees, 500_000);

        // A second put without states reverts that field to its default.
        let saved = store.put("user_x", &PreferencesUpdate::default());
        assert!(saved.preferred_states.is_empty());
        assert_eq!(saved.max_fees, 300_000);
    }

    #[test]
    fn out_of_range_values_revert_to_defaults() {
        let store = PreferenceStore::new(None);
        let update = PreferencesUpdate {
            max_fees: Some(0),
            min_placement: Some(-5.0),
            ..Default::default()
        };
        let saved = store.put("user_x", &update);
        assert_eq!(saved.max_fees, 300_000);
        assert!((saved.min_placement - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn state_list_is_capped() {
        let store = PreferenceStore::new(None);
        let states: Vec<String> = (0..15).map(|i| format!("State {}", i)).collect();
        let update = PreferencesUpdate {
            preferred_states: Some(states),
            ..Default::default()
        };
        let saved = store.put("user_x", &update);
        assert_eq!(saved.preferred_states.len(), MAX_PREFERRED_STATES);
    }

    #[test]
    fn database_tier_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = crate::storage::Storage::open(dir.path().join("db")).unwrap();
        let store = PreferenceStore::new(Some(storage.preferences.clone()));

        let update = PreferencesUpdate {
            max_fees: Some(800_000),
            ..Default::default()
        };
        store.put("user_x", &update);

        // A fresh store over the same tree sees the write.
        let reopened = PreferenceStore::new(Some(storage.preferences.clone()));
        assert_eq!(reopened.get("user_x").max_fees, 800_000);
    }
}
