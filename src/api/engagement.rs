//! Saved-college, application, lead, and contact endpoints.

use crate::errors::{ChaloError, Result};
use crate::records::LeadInput;
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::time::Duration;

/// `GET /api/saved` — the caller's saved colleges, newest first.
pub async fn saved_get_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;
    let saved = app_state.records.saved_for(&claims.user_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": saved.len(),
        "saved": saved,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SavePayload {
    #[serde(rename = "collegeId")]
    pub college_id: String,
}

/// `POST /api/saved` — save a college. Saving it again refreshes the
/// timestamp instead of duplicating.
pub async fn saved_post_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<SavePayload>,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;
    let college = app_state
        .catalog
        .lookup(payload.college_id.trim())
        .ok_or_else(|| ChaloError::NotFound {
            resource: "College".to_string(),
        })?;

    let record = app_state
        .records
        .save_college(&claims.user_id, &college.id, &college.name);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "saved": record,
    })))
}

/// `GET /api/applications` — the caller's applications, newest first.
pub async fn applications_get_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;
    let applications = app_state.records.applications_for(&claims.user_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": applications.len(),
        "applications": applications,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ApplicationPayload {
    #[serde(rename = "collegeId")]
    pub college_id: String,
    #[serde(rename = "collegeName")]
    pub college_name: Option<String>,
    pub course: Option<String>,
}

/// `POST /api/applications` — submit an application with status "pending".
/// The college name is resolved from the catalog when the payload omits it.
pub async fn applications_post_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<ApplicationPayload>,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;

    let college_name = match payload
        .college_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(name) => name.to_string(),
        None => app_state
            .catalog
            .lookup(payload.college_id.trim())
            .map(|c| c.name)
            .unwrap_or_default(),
    };

    let application = app_state.records.submit_application(
        &claims.user_id,
        payload.college_id.trim(),
        &college_name,
        payload.course.clone(),
    )?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "application": application,
    })))
}

/// `POST /api/leads` — anonymous counselling lead, rate-limited hourly.
pub async fn leads_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<LeadInput>,
) -> Result<HttpResponse> {
    let limits = &app_state.config.rate_limit;
    super::enforce_limit(
        &app_state,
        &request,
        "leads",
        limits.leads_max,
        Duration::from_secs(limits.leads_window_secs),
    )?;

    let lead = app_state.records.add_lead(&payload)?;

    tracing::info!(lead_id = %lead.id, state = %lead.state, "Lead captured");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "lead": lead,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

/// `POST /api/contact` — anonymous contact message, rate-limited.
pub async fn contact_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<ContactPayload>,
) -> Result<HttpResponse> {
    let limits = &app_state.config.rate_limit;
    super::enforce_limit(
        &app_state,
        &request,
        "contact",
        limits.contact_max,
        Duration::from_secs(limits.window_secs),
    )?;

    let record = app_state.records.add_contact(
        &payload.name,
        &payload.email,
        payload.subject.clone(),
        &payload.message,
    )?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": record,
    })))
}
