//! # Filter Engine Module
//!
//! ## Purpose
//! Pure filtering over the catalog. Every supplied criterion must hold
//! (logical AND); absent or blank criteria are ignored rather than matching
//! nothing; zero criteria returns the catalog unchanged in order and count.
//! An empty result is a valid response, not an error.

use crate::{College, CollegeType};
use serde::{Deserialize, Serialize};

/// Zero or more filter criteria.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollegeFilter {
    /// Case-insensitive exact state match
    pub state: Option<String>,
    /// Government or Private
    pub college_type: Option<CollegeType>,
    /// Substring match against name, location, or state
    pub search: Option<String>,
    pub min_rank: Option<u32>,
    pub max_rank: Option<u32>,
    pub min_placement: Option<f64>,
    pub max_placement: Option<f64>,
}

impl CollegeFilter {
    /// Whether a single college passes every supplied criterion.
    pub fn matches(&self, college: &College) -> bool {
        if let Some(state) = non_blank(&self.state) {
            if !college.state.eq_ignore_ascii_case(state) {
                return false;
            }
        }

        if let Some(college_type) = self.college_type {
            if college.college_type != college_type {
                return false;
            }
        }

        if let Some(search) = non_blank(&self.search) {
            let query = search.to_lowercase();
            let hit = college.name.to_lowercase().contains(&query)
                || college.location.to_lowercase().contains(&query)
                || college.state.to_lowercase().contains(&query);
            if !hit {
                return false;
            }
        }

        if let Some(min) = self.min_rank {
            if college.ranking < min {
                return false;
            }
        }
        if let Some(max) = self.max_rank {
            if college.ranking > max {
                return false;
            }
        }

        if let Some(min) = self.min_placement {
            if college.placement_rate < min {
                return false;
            }
        }
        if let Some(max) = self.max_placement {
            if college.placement_rate > max {
                return false;
            }
        }

        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Apply a filter to a catalog slice, preserving input order.
pub fn filter_colleges(colleges: &[College], filter: &CollegeFilter) -> Vec<College> {
    colleges
        .iter()
        .filter(|c| filter.matches(c))
        .cloned()
        .collect()
}

/// Find a single college by its exact id.
pub fn by_id<'a>(colleges: &'a [College], id: &str) -> Option<&'a College> {
    colleges.iter().find(|c| c.id == id)
}

/// Colleges in a state, case-insensitive.
pub fn by_state(colleges: &[College], state: &str) -> Vec<College> {
    filter_colleges(
        colleges,
        &CollegeFilter {
            state: Some(state.to_string()),
            ..Default::default()
        },
    )
}

/// Colleges of one type.
pub fn by_type(colleges: &[College], college_type: CollegeType) -> Vec<College> {
    filter_colleges(
        colleges,
        &CollegeFilter {
            college_type: Some(college_type),
            ..Default::default()
        },
    )
}

/// Free-text search against name, location, and state.
pub fn search(colleges: &[College], query: &str) -> Vec<College> {
    filter_colleges(
        colleges,
        &CollegeFilter {
            search: Some(query.to_string()),
            ..Default::default()
        },
    )
}

/// Colleges whose ranking lies in the inclusive range.
pub fn by_ranking_range(colleges: &[College], min: u32, max: u32) -> Vec<College> {
    filter_colleges(
        colleges,
        &CollegeFilter {
            min_rank: Some(min),
            max_rank: Some(max),
            ..Default::default()
        },
    )
}

/// Colleges whose placement rate lies in the inclusive range.
pub fn by_placement_range(colleges: &[College], min: f64, max: f64) -> Vec<College> {
    filter_colleges(
        colleges,
        &CollegeFilter {
            min_placement: Some(min),
            max_placement: Some(max),
            ..Default::default()
        },
    )
}

/// The ten catalog entries with the best (lowest) ranking.
pub fn top_ten(colleges: &[College]) -> Vec<College> {
    let mut sorted: Vec<College> = colleges.to_vec();
    sorted.sort_by_key(|c| if c.ranking == 0 { 9999 } else { c.ranking });
    sorted.truncate(10);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_catalog;

    #[test]
    fn no_criteria_returns_catalog_unchanged() {
        let catalog = seed_catalog();
        let all = filter_colleges(&catalog, &CollegeFilter::default());
        assert_eq!(all.len(), catalog.len());
        for (a, b) in all.iter().zip(catalog.iter()) {
            assert_eq!(a.id, b.id);
        }
    }

    #[test]
    fn blank_criteria_are_ignored() {
        let catalog = seed_catalog();
        let filter = CollegeFilter {
            state: Some("   ".to_string()),
            search: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filter_colleges(&catalog, &filter).len(), catalog.len());
    }

    #[test]
    fn by_id_finds_exact_match_only() {
        let catalog = seed_catalog();
        let first = by_id(&catalog, "college_1");
        assert!(first.is_some());
        assert!(by_id(&catalog, "college_999").is_none());
        assert!(by_id(&catalog, "COLLEGE_1").is_none());
    }

    #[test]
    fn state_filter_is_case_insensitive_and_exact() {
        let catalog = seed_catalog();
        let result = by_state(&catalog, "maharashtra");
        assert!(!result.is_empty());
        assert!(result.iter().all(|c| c.state.eq_ignore_ascii_case("Maharashtra")));
    }

    #[test]
    fn type_filter_selects_only_that_type() {
        let catalog = seed_catalog();
        let private = by_type(&catalog, CollegeType::Private);
        assert!(!private.is_empty());
        assert!(private.iter().all(|c| c.college_type == CollegeType::Private));
    }

    #[test]
    fn search_matches_name_location_or_state() {
        let catalog = seed_catalog();
        let indian = search(&catalog, "Indian");
        assert!(indian.iter().any(|c| c.name == "Indian Institute of Technology Bombay"));

        let oxford = search(&catalog, "Oxford");
        assert!(oxford.is_empty());

        // Location substring also hits
        let mumbai = search(&catalog, "mumbai");
        assert!(!mumbai.is_empty());
    }

    #[test]
    fn placement_range_is_inclusive() {
        let catalog = seed_catalog();
        let result = by_placement_range(&catalog, 95.0, 100.0);
        assert!(!result.is_empty());
        assert!(result
            .iter()
            .all(|c| c.placement_rate >= 95.0 && c.placement_rate <= 100.0));
    }

    #[test]
    fn ranking_range_is_inclusive() {
        let catalog = seed_catalog();
        let result = by_ranking_range(&catalog, 1, 5);
        assert!(result.iter().all(|c| (1..=5).contains(&c.ranking)));
        assert!(result.iter().any(|c| c.ranking == 1));
        assert!(result.iter().any(|c| c.ranking == 5));
    }

    #[test]
    fn combined_criteria_are_anded() {
        let catalog = seed_catalog();
        let filter = CollegeFilter {
            state: Some("Tamil Nadu".to_string()),
            college_type: Some(CollegeType::Private),
            min_placement: Some(85.0),
            ..Default::default()
        };
        let result = filter_colleges(&catalog, &filter);
        assert!(result.iter().all(|c| {
            c.state == "Tamil Nadu"
                && c.college_type == CollegeType::Private
                && c.placement_rate >= 85.0
        }));
    }

    #[test]
    fn filtering_is_idempotent() {
        let catalog = seed_catalog();
        let filter = CollegeFilter {
            search: Some("institute".to_string()),
            ..Default::default()
        };
        let first = filter_colleges(&catalog, &filter);
        let second = filter_colleges(&catalog, &filter);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
        }
    }

    #[test]
    fn top_ten_is_ranked() {
        let catalog = seed_catalog();
        let top = top_ten(&catalog);
        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|w| w[0].ranking <= w[1].ranking));
    }
}
