//! # Utilities Module
//!
//! ## Purpose
//! Common helpers used throughout the College Chalo API: stable id
//! generation and lightweight input validation.

use regex::Regex;
use std::sync::OnceLock;

/// Id and key helpers
pub struct IdUtils;

/// Validation utilities
pub struct ValidationUtils;

impl IdUtils {
    /// Create a stable index-based id (`college_1`, `college_2`, ...).
    /// Assigned once at data-load time and never recomputed from position.
    pub fn index_id(prefix: &str, index: usize) -> String {
        format!("{}_{}", prefix, index + 1)
    }

    /// Parse an index-based id back to its zero-based index.
    pub fn parse_index_id(prefix: &str, id: &str) -> Option<usize> {
        let rest = id.strip_prefix(prefix)?.strip_prefix('_')?;
        let n: usize = rest.parse().ok()?;
        n.checked_sub(1)
    }

    /// Random id for generated records (`review_<uuid>`, `lead_<uuid>`, ...).
    pub fn record_id(prefix: &str) -> String {
        format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn mobile_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9+\-\s]{8,15}$").unwrap())
}

impl ValidationUtils {
    /// Loose email shape check, matching the lead-capture form validation.
    pub fn is_valid_email(email: &str) -> bool {
        email_regex().is_match(email)
    }

    /// Mobile numbers: digits, +, -, spaces; 8 to 15 characters.
    pub fn is_valid_mobile(mobile: &str) -> bool {
        mobile_regex().is_match(mobile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_ids_are_one_based() {
        assert_eq!(IdUtils::index_id("college", 0), "college_1");
        assert_eq!(IdUtils::index_id("college", 14), "college_15");
    }

    #[test]
    fn parse_round_trips() {
        assert_eq!(IdUtils::parse_index_id("college", "college_1"), Some(0));
        assert_eq!(IdUtils::parse_index_id("college", "college_42"), Some(41));
        assert_eq!(IdUtils::parse_index_id("college", "college_0"), None);
        assert_eq!(IdUtils::parse_index_id("college", "student_3"), None);
        assert_eq!(IdUtils::parse_index_id("college", "college_abc"), None);
    }

    #[test]
    fn email_validation() {
        assert!(ValidationUtils::is_valid_email("student@example.com"));
        assert!(!ValidationUtils::is_valid_email("not-an-email"));
        assert!(!ValidationUtils::is_valid_email("a b@example.com"));
    }

    #[test]
    fn mobile_validation() {
        assert!(ValidationUtils::is_valid_mobile("+91 98765 4321"));
        assert!(ValidationUtils::is_valid_mobile("9876543210"));
        assert!(!ValidationUtils::is_valid_mobile("12345"));
        assert!(!ValidationUtils::is_valid_mobile("abcdefghij"));
    }
}
