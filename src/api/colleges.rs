//! Catalog, quiz, recommendation, and review endpoints.

use crate::errors::{ChaloError, Result};
use crate::filters::CollegeFilter;
use crate::quiz::QuizAnswers;
use crate::{AppState, College, CollegeType};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

/// Query parameters accepted by `GET /api/colleges`.
#[derive(Debug, Default, Deserialize)]
pub struct CollegeQuery {
    pub id: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "type")]
    pub college_type: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "minRank")]
    pub min_rank: Option<u32>,
    #[serde(rename = "maxRank")]
    pub max_rank: Option<u32>,
    #[serde(rename = "minPlacement")]
    pub min_placement: Option<f64>,
    #[serde(rename = "maxPlacement")]
    pub max_placement: Option<f64>,
}

fn parse_type(value: &Option<String>) -> Result<Option<CollegeType>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case("government") => Ok(Some(CollegeType::Government)),
        Some(raw) if raw.eq_ignore_ascii_case("private") => Ok(Some(CollegeType::Private)),
        Some(raw) => Err(ChaloError::Validation {
            field: "type".to_string(),
            reason: format!("unknown college type '{}'", raw),
        }),
    }
}

/// `GET /api/colleges` — single lookup with `?id=`, otherwise a filtered
/// listing over the merged catalog.
pub async fn list_handler(
    app_state: web::Data<AppState>,
    query: web::Query<CollegeQuery>,
) -> Result<HttpResponse> {
    if let Some(id) = query.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let college = app_state
            .catalog
            .lookup(id)
            .ok_or_else(|| ChaloError::NotFound {
                resource: "College".to_string(),
            })?;
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "college": college,
        })));
    }

    let filter = CollegeFilter {
        state: query.state.clone(),
        college_type: parse_type(&query.college_type)?,
        search: query.search.clone(),
        min_rank: query.min_rank,
        max_rank: query.max_rank,
        min_placement: query.min_placement,
        max_placement: query.max_placement,
    };

    let (colleges, source) = app_state.catalog.list(&filter);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": colleges.len(),
        "source": source.as_str(),
        "colleges": colleges,
    })))
}

/// Raw quiz payload as submitted by the frontend. Every field is optional;
/// missing answers fall back to the most permissive choice.
#[derive(Debug, Default, Deserialize)]
pub struct QuizPayload {
    pub stream: Option<String>,
    #[serde(rename = "preferredState")]
    pub preferred_state: Option<String>,
    /// Budget tier: "low", "medium", or anything else for no ceiling
    pub budget: Option<String>,
    #[serde(rename = "placementPriority")]
    pub placement_priority: Option<f64>,
    #[serde(rename = "collegeType")]
    pub college_type: Option<String>,
}

impl QuizPayload {
    fn normalize(&self) -> QuizAnswers {
        QuizAnswers {
            stream: self
                .stream
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_lowercase(),
            preferred_state: self
                .preferred_state
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_lowercase(),
            budget: crate::quiz::parse_budget(
                self.budget.as_deref().unwrap_or_default().trim(),
            ),
            placement_priority: self.placement_priority.unwrap_or(80.0),
            college_type: self
                .college_type
                .as_deref()
                .unwrap_or("Any")
                .trim()
                .to_string(),
        }
    }
}

/// `POST /api/quiz` — one-shot quiz recommendation with meta echo.
pub async fn quiz_handler(
    app_state: web::Data<AppState>,
    payload: web::Json<QuizPayload>,
) -> Result<HttpResponse> {
    let answers = payload.normalize();
    let catalog = app_state.catalog.all();
    let recommendations = crate::quiz::quiz_recommend(&catalog, &answers);

    let preferred_state = if answers.preferred_state.is_empty() {
        "any"
    } else {
        answers.preferred_state.as_str()
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": recommendations.len(),
        "meta": {
            "stream": answers.stream,
            "preferredState": preferred_state,
            "budget": answers.budget,
            "placementPriority": answers.placement_priority,
            "collegeType": answers.college_type,
        },
        "recommendations": recommendations,
    })))
}

/// Preference pre-filter for the recommendation pool. When it eliminates
/// everything it is dropped entirely so the shortlist is never empty for
/// a non-empty catalog.
fn preference_pool(
    catalog: Vec<College>,
    prefs: &crate::preferences::UserPreferences,
) -> Vec<College> {
    let filtered: Vec<College> = catalog
        .iter()
        .filter(|c| {
            if !prefs.preferred_states.is_empty()
                && !prefs
                    .preferred_states
                    .iter()
                    .any(|s| c.state.eq_ignore_ascii_case(s))
            {
                return false;
            }
            match prefs.preferred_type {
                crate::preferences::PreferredType::Any => {}
                crate::preferences::PreferredType::Government => {
                    if c.college_type != CollegeType::Government {
                        return false;
                    }
                }
                crate::preferences::PreferredType::Private => {
                    if c.college_type != CollegeType::Private {
                        return false;
                    }
                }
            }
            if c.fees > prefs.max_fees {
                return false;
            }
            if c.placement_rate < prefs.min_placement {
                return false;
            }
            if let Some(course) = prefs
                .preferred_course
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
            {
                let wanted = course.to_lowercase();
                if !c
                    .courses
                    .iter()
                    .any(|offered| offered.to_lowercase().contains(&wanted))
                {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect();

    if filtered.is_empty() {
        catalog
    } else {
        filtered
    }
}

/// `GET /api/recommendations` — profile-driven shortlist for the caller.
pub async fn recommendations_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;

    let profile = match app_state.users.find_by_id(&claims.user_id) {
        Some(user) => user.academic_profile(),
        None => crate::recommend::AcademicProfile::default(),
    };
    let prefs = app_state.preferences.get(&claims.user_id);
    let (merged, _) = app_state.catalog.list(&CollegeFilter::default());
    let pool = preference_pool(merged, &prefs);
    let recommendations = crate::recommend::recommend(&profile, &pool);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": recommendations.len(),
        "recommendations": recommendations,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    #[serde(rename = "collegeId")]
    pub college_id: Option<String>,
}

/// `GET /api/reviews?collegeId=` — reviews for one college, newest first.
pub async fn reviews_get_handler(
    app_state: web::Data<AppState>,
    query: web::Query<ReviewQuery>,
) -> Result<HttpResponse> {
    let college_id = query
        .college_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ChaloError::Validation {
            field: "collegeId".to_string(),
            reason: "collegeId is required".to_string(),
        })?;

    let college = app_state
        .catalog
        .lookup(college_id)
        .ok_or_else(|| ChaloError::NotFound {
            resource: "College".to_string(),
        })?;

    let reviews = app_state.reviews.list(&college);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": reviews.len(),
        "reviews": reviews,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ReviewPayload {
    #[serde(rename = "collegeId")]
    pub college_id: String,
    pub rating: u8,
    pub comment: String,
    pub name: Option<String>,
}

/// `POST /api/reviews` — record a review. A valid token names the
/// reviewer; otherwise the provided name or "Anonymous" is used.
pub async fn reviews_post_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<ReviewPayload>,
) -> Result<HttpResponse> {
    let college = app_state
        .catalog
        .lookup(payload.college_id.trim())
        .ok_or_else(|| ChaloError::NotFound {
            resource: "College".to_string(),
        })?;

    let claims = app_state.auth.verify_token(super::auth_header(&request));
    let (user_id, user_name) = match &claims {
        Some(claims) => (claims.user_id.clone(), claims.name.clone()),
        None => (
            "anonymous".to_string(),
            payload
                .name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("Anonymous")
                .to_string(),
        ),
    };

    let review = app_state.reviews.add(
        &college.id,
        &user_id,
        &user_name,
        payload.rating,
        &payload.comment,
    )?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "review": review,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_quiz_payload_normalizes_to_documented_defaults() {
        let answers = QuizPayload::default().normalize();
        assert!(answers.stream.is_empty());
        assert!(answers.preferred_state.is_empty());
        assert_eq!(answers.budget, 9_999_999);
        assert!((answers.placement_priority - 80.0).abs() < f64::EPSILON);
        assert_eq!(answers.college_type, "Any");
    }
}
