//! # Recommendation/Matching Engine Module
//!
//! ## Purpose
//! Turns a student's academic profile and a candidate list into a ranked,
//! diversified shortlist of at most six colleges, each annotated with a
//! bounded match score.
//!
//! ## Key Features
//! - Additive weighted scoring over placement, fees, ranking, location
//!   affinity, and rating
//! - A selectivity penalty so ultra-competitive institutions are not pushed
//!   at students whose stated scores make admission unrealistic
//! - Two-phase shortlist construction: a diversity-capped pass (at most two
//!   per institution family and per state), then an unconstrained backfill
//!   in score order so six slots are filled whenever six candidates exist

use crate::{College, CollegeType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Shortlist size cap.
pub const SHORTLIST_LIMIT: usize = 6;

/// Per-bucket and per-state cap during the constrained pass.
const DIVERSITY_CAP: usize = 2;

/// Academic signals used for scoring. The first available of JEE, NEET, and
/// 12th percentage is the profile score; 70 when none is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcademicProfile {
    #[serde(rename = "jeeScore", skip_serializing_if = "Option::is_none")]
    pub jee_score: Option<f64>,
    #[serde(rename = "neetScore", skip_serializing_if = "Option::is_none")]
    pub neet_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    /// Home-state hint for the location-affinity bonus
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AcademicProfile {
    pub fn profile_score(&self) -> f64 {
        self.jee_score
            .or(self.neet_score)
            .or(self.percentage)
            .unwrap_or(70.0)
    }
}

/// Coarse institution family, used only to diversify the shortlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstitutionBucket {
    Iit,
    Nit,
    Private,
    Gov,
    Other,
}

/// Classify by name substring, falling back to the declared type.
pub fn institution_bucket(college: &College) -> InstitutionBucket {
    let name = college.name.to_lowercase();
    if name.contains("indian institute of technology") || name.contains("iit") {
        return InstitutionBucket::Iit;
    }
    if name.contains("national institute of technology") || name.contains("nit") {
        return InstitutionBucket::Nit;
    }
    match college.college_type {
        CollegeType::Private => InstitutionBucket::Private,
        CollegeType::Government => InstitutionBucket::Gov,
    }
}

/// A shortlist entry: the college plus its bounded match score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub college: College,
    #[serde(rename = "matchScore")]
    pub match_score: u8,
}

struct ScoredCandidate {
    college: College,
    raw_score: f64,
    match_score: u8,
}

/// Raw additive score for one candidate against one profile.
fn raw_score(college: &College, profile: &AcademicProfile) -> f64 {
    let mut score = 0.0;

    // Placement rate contributes its own value (0-100).
    score += college.placement_rate;

    // Fee-affordability bonus.
    if college.fees < 5_000_000 {
        score += 20.0;
    } else if college.fees < 10_000_000 {
        score += 10.0;
    }

    // Ranking bonus: rank 1 contributes 99, rank 100+ contributes 0.
    score += (100.0 - college.ranking as f64).max(0.0);

    // Location affinity against the home-state hint.
    if let Some(state) = profile.state.as_deref() {
        if !state.is_empty() && college.location.contains(state) {
            score += 15.0;
        }
    }

    // Rating bonus.
    score += college.rating * 10.0;

    // Selectivity penalty: keep very high-cutoff colleges from dominating
    // shortlists for students whose scores make admission unrealistic.
    let profile_score = profile.profile_score();
    if college.ranking >= 1 && college.ranking <= 10 && profile_score < 80.0 {
        score -= 18.0;
    } else if college.ranking >= 1 && college.ranking <= 20 && profile_score < 75.0 {
        score -= 10.0;
    }

    score
}

fn bound_score(raw: f64) -> u8 {
    ((raw / 3.0).round() as i64).clamp(55, 99) as u8
}

/// State key for the diversity pass: the state field when present, else the
/// location string, lowercased.
fn state_key(college: &College) -> String {
    if college.state.trim().is_empty() {
        college.location.to_lowercase()
    } else {
        college.state.to_lowercase()
    }
}

/// Produce the diversified shortlist. Empty candidates in, empty list out.
pub fn recommend(profile: &AcademicProfile, candidates: &[College]) -> Vec<Recommendation> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|college| {
            let raw = raw_score(college, profile);
            ScoredCandidate {
                college: college.clone(),
                raw_score: raw,
                match_score: bound_score(raw),
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.raw_score
            .partial_cmp(&a.raw_score)
            .unwrap_or(Ordering::Equal)
    });

    // Constrained pass: cap picks per institution family and per state.
    let mut picked: Vec<&ScoredCandidate> = Vec::new();
    let mut bucket_counts: HashMap<InstitutionBucket, usize> = HashMap::new();
    let mut state_counts: HashMap<String, usize> = HashMap::new();

    for candidate in &scored {
        if picked.len() >= SHORTLIST_LIMIT {
            break;
        }
        let bucket = institution_bucket(&candidate.college);
        let state = state_key(&candidate.college);
        let bucket_count = bucket_counts.get(&bucket).copied().unwrap_or(0);
        let state_count = state_counts.get(&state).copied().unwrap_or(0);
        if bucket_count >= DIVERSITY_CAP || state_count >= DIVERSITY_CAP {
            continue;
        }
        picked.push(candidate);
        bucket_counts.insert(bucket, bucket_count + 1);
        state_counts.insert(state, state_count + 1);
    }

    // Backfill pass: rescan in score order ignoring the caps so the
    // shortlist reaches six whenever six distinct candidates exist.
    if picked.len() < SHORTLIST_LIMIT {
        for candidate in &scored {
            if picked.len() >= SHORTLIST_LIMIT {
                break;
            }
            if !picked.iter().any(|p| p.college.id == candidate.college.id) {
                picked.push(candidate);
            }
        }
    }

    picked
        .into_iter()
        .map(|c| Recommendation {
            college: c.college.clone(),
            match_score: c.match_score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_catalog;

    fn strong_profile() -> AcademicProfile {
        AcademicProfile {
            jee_score: Some(95.0),
            ..Default::default()
        }
    }

    #[test]
    fn empty_candidates_yield_empty_shortlist() {
        let result = recommend(&strong_profile(), &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn shortlist_length_is_min_of_six_and_candidates() {
        let catalog = seed_catalog();
        let full = recommend(&strong_profile(), &catalog);
        assert_eq!(full.len(), SHORTLIST_LIMIT);

        let three = recommend(&strong_profile(), &catalog[..3]);
        assert_eq!(three.len(), 3);
    }

    #[test]
    fn match_scores_stay_bounded() {
        let catalog = seed_catalog();
        for rec in recommend(&strong_profile(), &catalog) {
            assert!((55..=99).contains(&rec.match_score));
        }
        // A profile with no signals defaults to 70 and still stays bounded.
        for rec in recommend(&AcademicProfile::default(), &catalog) {
            assert!((55..=99).contains(&rec.match_score));
        }
    }

    #[test]
    fn diversity_caps_hold_when_pool_is_varied() {
        let catalog = seed_catalog();
        let shortlist = recommend(&strong_profile(), &catalog);
        assert!(shortlist.len() >= 3);

        let mut buckets: HashMap<InstitutionBucket, usize> = HashMap::new();
        let mut states: HashMap<String, usize> = HashMap::new();
        for rec in &shortlist {
            *buckets.entry(institution_bucket(&rec.college)).or_default() += 1;
            *states.entry(state_key(&rec.college)).or_default() += 1;
        }
        assert!(buckets.values().all(|&n| n <= DIVERSITY_CAP));
        assert!(states.values().all(|&n| n <= DIVERSITY_CAP));
    }

    #[test]
    fn backfill_fills_all_slots_from_a_uniform_pool() {
        // Seven IITs in one state: the constrained pass can only pick two,
        // backfill must still deliver six.
        let template = &seed_catalog()[0];
        let pool: Vec<College> = (0..7)
            .map(|i| {
                let mut c = template.clone();
                c.id = format!("college_{}", i + 1);
                c.name = format!("Indian Institute of Technology Clone {}", i + 1);
                c
            })
            .collect();
        let shortlist = recommend(&strong_profile(), &pool);
        assert_eq!(shortlist.len(), SHORTLIST_LIMIT);

        // No duplicates despite the rescan.
        let mut ids: Vec<&str> = shortlist.iter().map(|r| r.college.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), SHORTLIST_LIMIT);
    }

    #[test]
    fn selectivity_penalty_demotes_top_ranks_for_weak_profiles() {
        let catalog = seed_catalog();
        let weak = AcademicProfile {
            percentage: Some(60.0),
            ..Default::default()
        };
        let top_college = &catalog[0];
        assert_eq!(top_college.ranking, 1);

        let penalized = raw_score(top_college, &weak);
        let unpenalized = raw_score(top_college, &strong_profile());
        assert!((unpenalized - penalized - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_signals_default_to_seventy() {
        let profile = AcademicProfile::default();
        assert!((profile.profile_score() - 70.0).abs() < f64::EPSILON);
        // 70 < 80, so the rank<=10 penalty applies against the default.
        let catalog = seed_catalog();
        let top = &catalog[0];
        let with_default = raw_score(top, &profile);
        let with_strong = raw_score(top, &strong_profile());
        assert!(with_default < with_strong);
    }

    #[test]
    fn location_affinity_rewards_home_state() {
        let catalog = seed_catalog();
        let college = &catalog[0]; // located in "Mumbai, Maharashtra"
        let home = AcademicProfile {
            jee_score: Some(95.0),
            state: Some("Maharashtra".to_string()),
            ..Default::default()
        };
        let away = strong_profile();
        assert!((raw_score(college, &home) - raw_score(college, &away) - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn buckets_classify_by_name_then_type() {
        let catalog = seed_catalog();
        let iit = catalog
            .iter()
            .find(|c| c.name.contains("Technology Bombay"))
            .unwrap();
        assert_eq!(institution_bucket(iit), InstitutionBucket::Iit);

        let nit = catalog
            .iter()
            .find(|c| c.name.contains("Tiruchirappalli"))
            .unwrap();
        assert_eq!(institution_bucket(nit), InstitutionBucket::Nit);

        let private = catalog.iter().find(|c| c.name.contains("Amity")).unwrap();
        assert_eq!(institution_bucket(private), InstitutionBucket::Private);
    }
}
