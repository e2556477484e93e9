//! Registration, login, and profile endpoints.

use crate::errors::{ChaloError, Result};
use crate::users::{ProfileUpdate, User};
use crate::utils::ValidationUtils;
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::time::Duration;

const MIN_PASSWORD_LEN: usize = 6;

/// Account fields safe to return to the client.
fn user_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "phone": user.phone,
        "role": user.role,
        "board": user.board,
        "percentage": user.percentage,
        "jeeScore": user.jee_score,
        "neetScore": user.neet_score,
        "state": user.state,
        "bio": user.bio,
        "createdAt": user.created_at,
    })
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: String,
}

/// `POST /api/auth/register` — create a student account.
pub async fn register_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<RegisterPayload>,
) -> Result<HttpResponse> {
    let limits = &app_state.config.rate_limit;
    super::enforce_limit(
        &app_state,
        &request,
        "register",
        limits.register_max,
        Duration::from_secs(limits.window_secs),
    )?;

    let name = payload.name.trim();
    let email = payload.email.trim();

    if name.is_empty() {
        return Err(ChaloError::Validation {
            field: "name".to_string(),
            reason: "name is required".to_string(),
        });
    }
    if !ValidationUtils::is_valid_email(email) {
        return Err(ChaloError::Validation {
            field: "email".to_string(),
            reason: "a valid email is required".to_string(),
        });
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ChaloError::Validation {
            field: "password".to_string(),
            reason: format!("password must be at least {} characters", MIN_PASSWORD_LEN),
        });
    }

    if app_state.users.find_by_email(email).is_some() {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "success": false,
            "error": "An account with this email already exists",
        })));
    }

    let hash = app_state.auth.hash_password(&payload.password)?;
    let user = app_state
        .users
        .create(name, email, &hash, payload.phone.trim());
    let token = app_state.auth.sign_token(&user.id, &user.email, &user.name)?;

    tracing::info!(user_id = %user.id, "Account registered");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "token": token,
        "user": user_json(&user),
    })))
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/login` — exchange credentials for a session token.
/// Unknown email and wrong password respond identically.
pub async fn login_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<LoginPayload>,
) -> Result<HttpResponse> {
    let limits = &app_state.config.rate_limit;
    super::enforce_limit(
        &app_state,
        &request,
        "login",
        limits.login_max,
        Duration::from_secs(limits.window_secs),
    )?;

    let user = app_state
        .users
        .find_by_email(payload.email.trim())
        .filter(|user| app_state.auth.verify_password(&payload.password, &user.password_hash))
        .ok_or(ChaloError::Unauthorized)?;

    let token = app_state.auth.sign_token(&user.id, &user.email, &user.name)?;

    tracing::info!(user_id = %user.id, "Login succeeded");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "token": token,
        "user": user_json(&user),
    })))
}

/// `GET /api/profile` — the caller's account.
pub async fn profile_get_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;
    let user = app_state
        .users
        .find_by_id(&claims.user_id)
        .ok_or_else(|| ChaloError::NotFound {
            resource: "User".to_string(),
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user_json(&user),
    })))
}

/// `PUT /api/profile` — owner-only academic profile update.
pub async fn profile_put_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;
    let user = app_state
        .users
        .update_profile(&claims.user_id, &payload)
        .ok_or_else(|| ChaloError::NotFound {
            resource: "User".to_string(),
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user_json(&user),
    })))
}
