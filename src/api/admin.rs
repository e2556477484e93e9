//! Admin endpoints: login, catalog management, analytics, and health.

use crate::errors::{ChaloError, Result};
use crate::users::Role;
use crate::{AppState, College, CollegeType};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AdminLoginPayload {
    pub email: String,
    pub password: String,
}

/// `POST /api/admin/auth/login` — admin session. A valid student account
/// is rejected with 403 so the UI can say the account lacks access, while
/// bad credentials stay a uniform 401.
pub async fn login_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<AdminLoginPayload>,
) -> Result<HttpResponse> {
    let limits = &app_state.config.rate_limit;
    super::enforce_limit(
        &app_state,
        &request,
        "admin_login",
        limits.admin_login_max,
        Duration::from_secs(limits.window_secs),
    )?;

    let user = app_state
        .users
        .find_by_email(payload.email.trim())
        .ok_or(ChaloError::Unauthorized)?;

    if user.role != Role::Admin {
        tracing::warn!(user_id = %user.id, "Non-admin attempted admin login");
        return Ok(HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": "This account does not have admin access",
        })));
    }

    if !app_state
        .auth
        .verify_password(&payload.password, &user.password_hash)
    {
        return Err(ChaloError::Unauthorized);
    }

    let token = app_state
        .auth
        .sign_admin_token(&user.id, &user.email, &user.name)?;

    tracing::info!(user_id = %user.id, "Admin login succeeded");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "token": token,
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role,
        },
    })))
}

/// College fields as submitted by the admin panel. Only the name is
/// required; everything else falls back to a documented default.
#[derive(Debug, Default, Deserialize)]
pub struct CollegePayload {
    pub name: String,
    pub location: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "type")]
    pub college_type: Option<String>,
    pub founded: Option<u32>,
    pub ranking: Option<u32>,
    pub fees: Option<u64>,
    #[serde(rename = "placementRate")]
    pub placement_rate: Option<f64>,
    pub rating: Option<f64>,
    #[serde(rename = "reviewsCount")]
    pub reviews_count: Option<u32>,
    pub description: Option<String>,
    pub courses: Option<Vec<String>>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub website: Option<String>,
}

impl CollegePayload {
    fn normalize(&self) -> Result<College> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ChaloError::Validation {
                field: "name".to_string(),
                reason: "name is required".to_string(),
            });
        }

        let college_type = match self.college_type.as_deref().map(str::trim) {
            None | Some("") => CollegeType::Government,
            Some(raw) if raw.eq_ignore_ascii_case("private") => CollegeType::Private,
            Some(raw) if raw.eq_ignore_ascii_case("government") => CollegeType::Government,
            Some(raw) => {
                return Err(ChaloError::Validation {
                    field: "type".to_string(),
                    reason: format!("unknown college type '{}'", raw),
                })
            }
        };

        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(ChaloError::Validation {
                    field: "rating".to_string(),
                    reason: "rating must be between 0 and 5".to_string(),
                });
            }
        }
        if let Some(placement) = self.placement_rate {
            if !(0.0..=100.0).contains(&placement) {
                return Err(ChaloError::Validation {
                    field: "placementRate".to_string(),
                    reason: "placement rate must be between 0 and 100".to_string(),
                });
            }
        }

        Ok(College {
            id: String::new(), // assigned by the catalog
            name: name.to_string(),
            location: self.location.clone().unwrap_or_default(),
            state: self.state.clone().unwrap_or_default(),
            college_type,
            founded: self.founded.unwrap_or(2000),
            ranking: self.ranking.unwrap_or(999),
            fees: self.fees.unwrap_or(0),
            placement_rate: self.placement_rate.unwrap_or(0.0),
            rating: self.rating.unwrap_or(0.0),
            reviews_count: self.reviews_count.unwrap_or(0),
            description: self.description.clone().unwrap_or_default(),
            courses: self.courses.clone().unwrap_or_default(),
            image_url: self.image_url.clone().unwrap_or_default(),
            website: self.website.clone().filter(|w| !w.trim().is_empty()),
        })
    }
}

/// `GET /api/admin/colleges` — full catalog including database overlays,
/// ranked ascending with unranked entries last.
pub async fn colleges_list_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse> {
    super::require_admin(&app_state, &request)?;
    let colleges = app_state.catalog.admin_list();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": colleges.len(),
        "colleges": colleges,
    })))
}

/// `POST /api/admin/colleges` — create a catalog entry.
pub async fn colleges_create_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<CollegePayload>,
) -> Result<HttpResponse> {
    let claims = super::require_admin(&app_state, &request)?;
    let college = app_state.catalog.admin_create(payload.normalize()?);

    tracing::info!(admin = %claims.user_id, college_id = %college.id, "College created");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "college": college,
    })))
}

/// `PUT /api/admin/colleges/{id}` — replace a catalog entry.
pub async fn colleges_update_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    path: web::Path<String>,
    payload: web::Json<CollegePayload>,
) -> Result<HttpResponse> {
    let claims = super::require_admin(&app_state, &request)?;
    let id = path.into_inner();
    let college = app_state
        .catalog
        .admin_update(&id, payload.normalize()?)
        .ok_or_else(|| ChaloError::NotFound {
            resource: "College".to_string(),
        })?;

    tracing::info!(admin = %claims.user_id, college_id = %id, "College updated");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "college": college,
    })))
}

/// `DELETE /api/admin/colleges/{id}` — remove a catalog entry.
pub async fn colleges_delete_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let claims = super::require_admin(&app_state, &request)?;
    let id = path.into_inner();

    if !app_state.catalog.admin_delete(&id) {
        return Err(ChaloError::NotFound {
            resource: "College".to_string(),
        });
    }

    tracing::info!(admin = %claims.user_id, college_id = %id, "College deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "deleted": id,
    })))
}

/// `GET /api/admin/analytics` — usage rollup for the dashboard.
pub async fn analytics_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse> {
    super::require_admin(&app_state, &request)?;

    let users = app_state.users.all();
    let admins = users.iter().filter(|u| u.role == Role::Admin).count();
    let week_ago = Utc::now() - ChronoDuration::days(7);
    let new_users_7d = users.iter().filter(|u| u.created_at >= week_ago).count();

    let applications = app_state.records.all_applications();
    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    for application in &applications {
        *by_status.entry(application.status.clone()).or_default() += 1;
    }

    // Applications per user, as a percentage with one decimal.
    let conversion_rate = if users.is_empty() {
        0.0
    } else {
        (applications.len() as f64 / users.len() as f64 * 1000.0).round() / 10.0
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "analytics": {
            "totalColleges": app_state.catalog.admin_list().len(),
            "totalUsers": users.len(),
            "adminUsers": admins,
            "studentUsers": users.len() - admins,
            "newUsers7d": new_users_7d,
            "totalApplications": applications.len(),
            "applicationsByStatus": by_status,
            "totalLeads": app_state.records.leads().len(),
            "totalContactMessages": app_state.records.contact_messages().len(),
            "conversionRate": conversion_rate,
        },
    })))
}

/// `GET /api/admin/health` — storage mode, record counts, and uptime.
pub async fn health_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse> {
    super::require_admin(&app_state, &request)?;

    let (mode, stats) = match &app_state.storage {
        Some(storage) => ("database", Some(storage.stats()?)),
        None => ("in-memory", None),
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "health": {
            "storageMode": mode,
            "storage": stats,
            "uptimeSeconds": app_state.started_at.elapsed().as_secs(),
            "rateLimitKeys": app_state.rate_limiter.tracked_keys(),
        },
    })))
}
