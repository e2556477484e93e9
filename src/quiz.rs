//! # Quiz Engine Module
//!
//! ## Purpose
//! A stateless variant of the recommendation engine driven by one-shot quiz
//! answers instead of a stored profile. Applies a budget/stream pre-filter
//! before ranking and relaxes to a placement-only filter when the pre-filter
//! empties the pool, so the student is never shown nothing.

use crate::{College, CollegeType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Quiz output size cap, wider than the profile-based shortlist.
pub const QUIZ_LIMIT: usize = 10;

/// Normalized quiz answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAnswers {
    /// Study stream, lowercased ("engineering", "medical", ...)
    pub stream: String,
    /// Preferred state, lowercased; empty means any
    #[serde(rename = "preferredState")]
    pub preferred_state: String,
    /// Fee ceiling derived from the budget tier
    pub budget: u64,
    /// Minimum acceptable placement rate
    #[serde(rename = "placementPriority")]
    pub placement_priority: f64,
    /// Requested college type, or "Any"
    #[serde(rename = "collegeType")]
    pub college_type: String,
}

/// A quiz result entry with its bounded quiz-match score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRecommendation {
    #[serde(flatten)]
    pub college: College,
    #[serde(rename = "quizMatch")]
    pub quiz_match: u8,
}

/// Map a budget tier to a fee ceiling.
pub fn parse_budget(tier: &str) -> u64 {
    match tier {
        "low" => 150_000,
        "medium" => 250_000,
        _ => 9_999_999,
    }
}

fn medical_course_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)MBBS|Medical|BDS|M\.?D").unwrap())
}

fn offers_medical(college: &College) -> bool {
    college
        .courses
        .iter()
        .any(|course| medical_course_regex().is_match(course))
        || college.name.contains("Medical")
}

fn effective_ranking(college: &College) -> u32 {
    if college.ranking == 0 {
        999
    } else {
        college.ranking
    }
}

fn quiz_match(college: &College) -> u8 {
    let rank = effective_ranking(college).min(100) as f64;
    let raw = ((college.placement_rate + 100.0 - rank) / 2.0).round() as i64;
    raw.clamp(72, 99) as u8
}

/// Run the quiz over the catalog: pre-filter, relaxed fallback, rank, cap.
pub fn quiz_recommend(catalog: &[College], answers: &QuizAnswers) -> Vec<QuizRecommendation> {
    let mut pool: Vec<&College> = catalog
        .iter()
        .filter(|college| {
            if !answers.preferred_state.is_empty()
                && !college.state.eq_ignore_ascii_case(&answers.preferred_state)
            {
                return false;
            }
            match answers.college_type.as_str() {
                "Government" => {
                    if college.college_type != CollegeType::Government {
                        return false;
                    }
                }
                "Private" => {
                    if college.college_type != CollegeType::Private {
                        return false;
                    }
                }
                _ => {}
            }
            if college.fees > answers.budget {
                return false;
            }
            if college.placement_rate < answers.placement_priority {
                return false;
            }
            if answers.stream == "medical" && !offers_medical(college) {
                return false;
            }
            true
        })
        .collect();

    // Relaxed fallback over the unfiltered catalog: never show nothing.
    if pool.is_empty() {
        let floor = (answers.placement_priority - 10.0).max(70.0);
        pool = catalog
            .iter()
            .filter(|college| college.placement_rate >= floor)
            .collect();
    }

    pool.sort_by(|a, b| {
        match effective_ranking(a).cmp(&effective_ranking(b)) {
            Ordering::Equal => b
                .placement_rate
                .partial_cmp(&a.placement_rate)
                .unwrap_or(Ordering::Equal),
            other => other,
        }
    });

    pool.into_iter()
        .take(QUIZ_LIMIT)
        .map(|college| QuizRecommendation {
            college: college.clone(),
            quiz_match: quiz_match(college),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_catalog;

    fn answers(
        stream: &str,
        state: &str,
        budget_tier: &str,
        priority: f64,
        college_type: &str,
    ) -> QuizAnswers {
        QuizAnswers {
            stream: stream.to_string(),
            preferred_state: state.to_lowercase(),
            budget: parse_budget(budget_tier),
            placement_priority: priority,
            college_type: college_type.to_string(),
        }
    }

    #[test]
    fn budget_tiers_map_to_ceilings() {
        assert_eq!(parse_budget("low"), 150_000);
        assert_eq!(parse_budget("medium"), 250_000);
        assert_eq!(parse_budget("high"), 9_999_999);
        assert_eq!(parse_budget("anything-else"), 9_999_999);
    }

    #[test]
    fn results_respect_budget_and_priority() {
        let catalog = seed_catalog();
        let result = quiz_recommend(&catalog, &answers("engineering", "", "low", 80.0, "Any"));
        assert!(!result.is_empty());
        assert!(result
            .iter()
            .all(|r| r.college.fees <= 150_000 && r.college.placement_rate >= 80.0));
    }

    #[test]
    fn medical_stream_needs_medical_courses() {
        let catalog = seed_catalog();
        let result = quiz_recommend(&catalog, &answers("medical", "", "high", 0.0, "Any"));
        assert!(!result.is_empty());
        assert!(result.iter().all(|r| {
            r.college
                .courses
                .iter()
                .any(|c| medical_course_regex().is_match(c))
                || r.college.name.contains("Medical")
        }));
    }

    #[test]
    fn impossible_criteria_fall_back_to_placement_filter() {
        let catalog = seed_catalog();
        // low budget + impossible priority: strict pool is empty, but the
        // relaxed filter (placement >= max(70, 99.5 - 10)) still matches.
        let result = quiz_recommend(&catalog, &answers("engineering", "", "low", 99.5, "Any"));
        assert!(!result.is_empty());
        assert!(result.iter().all(|r| r.college.placement_rate >= 89.5));
    }

    #[test]
    fn fallback_floor_never_drops_below_seventy() {
        let catalog = seed_catalog();
        // Strict pool empty (impossible type+state combo), low priority:
        // relaxed floor is max(70, 5-10) = 70.
        let result = quiz_recommend(&catalog, &answers("engineering", "goa", "low", 5.0, "Private"));
        assert!(!result.is_empty());
        assert!(result.iter().all(|r| r.college.placement_rate >= 70.0));
    }

    #[test]
    fn output_is_capped_and_rank_sorted() {
        let catalog = seed_catalog();
        let result = quiz_recommend(&catalog, &answers("engineering", "", "high", 0.0, "Any"));
        assert!(result.len() <= QUIZ_LIMIT);
        assert!(result
            .windows(2)
            .all(|w| effective_ranking(&w[0].college) <= effective_ranking(&w[1].college)));
    }

    #[test]
    fn quiz_match_stays_bounded() {
        let catalog = seed_catalog();
        let result = quiz_recommend(&catalog, &answers("engineering", "", "high", 0.0, "Any"));
        assert!(result.iter().all(|r| (72..=99).contains(&r.quiz_match)));
    }

    #[test]
    fn state_and_type_prefilters_apply() {
        let catalog = seed_catalog();
        let result = quiz_recommend(
            &catalog,
            &answers("engineering", "tamil nadu", "high", 0.0, "Private"),
        );
        assert!(!result.is_empty());
        assert!(result.iter().all(|r| {
            r.college.state.eq_ignore_ascii_case("tamil nadu")
                && r.college.college_type == CollegeType::Private
        }));
    }
}
