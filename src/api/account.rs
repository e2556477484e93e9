//! Preference and notification endpoints. All of them require a user token.

use crate::errors::{ChaloError, Result};
use crate::notifications::NotificationKind;
use crate::preferences::PreferencesUpdate;
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

/// `GET /api/preferences` — stored preferences or the defaults.
pub async fn preferences_get_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;
    let prefs = app_state.preferences.get(&claims.user_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "preferences": prefs,
    })))
}

/// `PUT /api/preferences` — full overwrite with server-side timestamp.
pub async fn preferences_put_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<PreferencesUpdate>,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;
    let prefs = app_state.preferences.put(&claims.user_id, &payload);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "preferences": prefs,
    })))
}

/// `GET /api/notifications` — newest first, with the unread count.
pub async fn notifications_get_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;
    let notifications = app_state.notifications.list(&claims.user_id);
    let unread = notifications.iter().filter(|n| !n.read).count();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": notifications.len(),
        "unread": unread,
        "notifications": notifications,
    })))
}

#[derive(Debug, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
}

/// `POST /api/notifications` — append a notification for the caller.
pub async fn notifications_post_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
    payload: web::Json<NotificationPayload>,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;

    if payload.title.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(ChaloError::Validation {
            field: "title".to_string(),
            reason: "title and message are required".to_string(),
        });
    }

    let notification = app_state.notifications.push(
        &claims.user_id,
        &payload.title,
        &payload.message,
        payload.kind,
    );

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "notification": notification,
    })))
}

/// `PATCH /api/notifications` — mark everything read.
pub async fn notifications_read_all_handler(
    app_state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse> {
    let claims = super::require_user(&app_state, &request)?;
    let updated = app_state.notifications.mark_all_read(&claims.user_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "updated": updated,
    })))
}
