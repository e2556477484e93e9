//! # API Server Module
//!
//! ## Purpose
//! REST API server exposing the catalog, recommendation, quiz, account,
//! engagement, and admin endpoints behind a consistent JSON envelope.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with filter queries, quiz answers, credentials
//! - **Output**: JSON responses shaped `{"success": bool, ...}`
//! - **Auth**: bearer tokens on account and admin routes
//!
//! ## Key Features
//! - CORS support for web frontends
//! - Fixed-window rate limiting on the abuse-prone endpoints
//! - Structured error responses with `Retry-After` on 429

mod account;
mod admin;
mod auth_routes;
mod colleges;
mod engagement;

use crate::auth::Claims;
use crate::errors::{ChaloError, Result};
use crate::AppState;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use std::time::Duration;

/// Application state wrapper for the API server
pub struct ApiServer {
    app_state: AppState,
}

impl ApiServer {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server until the process is asked to stop.
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.config.server.host, self.app_state.config.server.port
        );
        let enable_cors = self.app_state.config.server.enable_cors;
        let workers = self.app_state.config.server.workers;

        tracing::info!("Starting API server on {}", bind_addr);

        let app_state = self.app_state;
        let mut server = HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
                    .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
                    .max_age(3600)
            } else {
                Cors::default()
            };

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(app_state.clone()))
                .route("/health", web::get().to(health_handler))
                .service(api_scope())
        })
        .bind(&bind_addr)
        .map_err(|e| ChaloError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?;

        if workers > 0 {
            server = server.workers(workers);
        }

        server.run().await.map_err(|e| ChaloError::Internal {
            message: format!("Server error: {}", e),
        })?;

        Ok(())
    }
}

/// The `/api` route table, shared between the server and the tests.
fn api_scope() -> actix_web::Scope {
    web::scope("/api")
        .route("/colleges", web::get().to(colleges::list_handler))
        .route("/quiz", web::post().to(colleges::quiz_handler))
        .route(
            "/recommendations",
            web::get().to(colleges::recommendations_handler),
        )
        .route("/reviews", web::get().to(colleges::reviews_get_handler))
        .route("/reviews", web::post().to(colleges::reviews_post_handler))
        .route("/auth/register", web::post().to(auth_routes::register_handler))
        .route("/auth/login", web::post().to(auth_routes::login_handler))
        .route("/profile", web::get().to(auth_routes::profile_get_handler))
        .route("/profile", web::put().to(auth_routes::profile_put_handler))
        .route("/preferences", web::get().to(account::preferences_get_handler))
        .route("/preferences", web::put().to(account::preferences_put_handler))
        .route(
            "/notifications",
            web::get().to(account::notifications_get_handler),
        )
        .route(
            "/notifications",
            web::post().to(account::notifications_post_handler),
        )
        .route(
            "/notifications",
            web::patch().to(account::notifications_read_all_handler),
        )
        .route("/saved", web::get().to(engagement::saved_get_handler))
        .route("/saved", web::post().to(engagement::saved_post_handler))
        .route(
            "/applications",
            web::get().to(engagement::applications_get_handler),
        )
        .route(
            "/applications",
            web::post().to(engagement::applications_post_handler),
        )
        .route("/leads", web::post().to(engagement::leads_handler))
        .route("/contact", web::post().to(engagement::contact_handler))
        .route("/admin/auth/login", web::post().to(admin::login_handler))
        .route("/admin/colleges", web::get().to(admin::colleges_list_handler))
        .route(
            "/admin/colleges",
            web::post().to(admin::colleges_create_handler),
        )
        .route(
            "/admin/colleges/{id}",
            web::put().to(admin::colleges_update_handler),
        )
        .route(
            "/admin/colleges/{id}",
            web::delete().to(admin::colleges_delete_handler),
        )
        .route("/admin/analytics", web::get().to(admin::analytics_handler))
        .route("/admin/health", web::get().to(admin::health_handler))
}

/// Liveness probe: process is up and the storage tier, if any, responds.
async fn health_handler(app_state: web::Data<AppState>) -> HttpResponse {
    let storage_status = match &app_state.storage {
        Some(storage) => match storage.health_check() {
            Ok(()) => "healthy",
            Err(e) => {
                tracing::warn!("Storage health check failed: {}", e);
                "unhealthy"
            }
        },
        None => "in-memory",
    };

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "status": "ok",
        "storage": storage_status,
        "uptimeSeconds": app_state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Bearer token from the Authorization header, if present.
fn auth_header(request: &HttpRequest) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// Verified claims for a user route, or 401.
fn require_user(app_state: &AppState, request: &HttpRequest) -> Result<Claims> {
    app_state
        .auth
        .verify_token(auth_header(request))
        .ok_or(ChaloError::Unauthorized)
}

/// Verified claims for an admin route, or 401.
fn require_admin(app_state: &AppState, request: &HttpRequest) -> Result<Claims> {
    app_state
        .auth
        .verify_admin_token(auth_header(request))
        .ok_or(ChaloError::Unauthorized)
}

/// Apply a fixed-window limit to this client for one action. Denials
/// become 429 responses with `Retry-After`.
fn enforce_limit(
    app_state: &AppState,
    request: &HttpRequest,
    action: &str,
    max: u32,
    window: Duration,
) -> Result<()> {
    let client = crate::rate_limit::client_identifier(request);
    let key = format!("{}:{}", action, client);
    let decision = app_state.rate_limiter.check(&key, max, window);
    if decision.allowed {
        Ok(())
    } else {
        tracing::warn!(action, client = %client, "Rate limit exceeded");
        Err(ChaloError::RateLimited {
            retry_after_secs: decision.retry_after_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use actix_web::{test, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn test_state(config: Config) -> AppState {
        let config = Arc::new(config);
        AppState {
            auth: Arc::new(crate::auth::TokenSigner::new(&config.auth)),
            config,
            catalog: Arc::new(crate::catalog::CatalogStore::new(None)),
            users: Arc::new(crate::users::UserStore::new(None)),
            preferences: Arc::new(crate::preferences::PreferenceStore::new(None)),
            reviews: Arc::new(crate::reviews::ReviewStore::new(None)),
            notifications: Arc::new(crate::notifications::NotificationStore::new(None)),
            records: Arc::new(crate::records::EngagementStore::new(None, None, None, None)),
            rate_limiter: Arc::new(crate::rate_limit::RateLimiter::new()),
            storage: None,
            started_at: std::time::Instant::now(),
        }
    }

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.auth.bcrypt_cost = 4;
        config
    }

    macro_rules! test_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .route("/health", web::get().to(super::health_handler))
                    .service(super::api_scope()),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn colleges_search_and_single_lookup() {
        let app = test_app!(test_state(fast_config()));

        let req = test::TestRequest::get()
            .uri("/api/colleges?search=Indian")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert!(body["count"].as_u64().unwrap() >= 1);
        assert_eq!(body["source"], "static");

        let req = test::TestRequest::get()
            .uri("/api/colleges?id=college_1")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["college"]["name"],
            "Indian Institute of Technology Bombay"
        );

        let req = test::TestRequest::get()
            .uri("/api/colleges?id=college_9999")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn rank_range_query_params_filter_the_listing() {
        let app = test_app!(test_state(fast_config()));

        let req = test::TestRequest::get()
            .uri("/api/colleges?minRank=1&maxRank=5")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["count"], 5);
        for college in body["colleges"].as_array().unwrap() {
            let ranking = college["ranking"].as_u64().unwrap();
            assert!((1..=5).contains(&ranking));
        }
    }

    #[actix_web::test]
    async fn register_login_and_token_gated_routes() {
        let app = test_app!(test_state(fast_config()));

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "name": "Asha",
                "email": "asha@example.com",
                "password": "secret123",
                "phone": "9876543210",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        let token = body["token"].as_str().unwrap().to_string();

        // Re-registering the same email conflicts.
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "name": "Asha",
                "email": "asha@example.com",
                "password": "secret123",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);

        // Wrong password is a uniform 401.
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "asha@example.com", "password": "wrong"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "asha@example.com", "password": "secret123"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        // Token-gated preferences: missing token is 401, valid token gets
        // the documented defaults.
        let req = test::TestRequest::get().uri("/api/preferences").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/api/preferences")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["preferences"]["maxFees"], 300_000);
    }

    #[actix_web::test]
    async fn recommendations_require_a_token_and_cap_at_six() {
        let state = test_state(fast_config());
        let token = state
            .auth
            .sign_token("user_test_001", "test@example.com", "Test User")
            .unwrap();
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/recommendations")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/api/recommendations")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["count"], 6);
        for rec in body["recommendations"].as_array().unwrap() {
            let score = rec["matchScore"].as_u64().unwrap();
            assert!((55..=99).contains(&score));
        }
    }

    #[actix_web::test]
    async fn recommendations_cover_database_added_colleges() {
        let dir = tempfile::tempdir().unwrap();
        let storage = crate::storage::Storage::open(dir.path().join("db")).unwrap();
        let mut state = test_state(fast_config());
        state.catalog = Arc::new(crate::catalog::CatalogStore::new(Some(
            storage.colleges.clone(),
        )));
        state.catalog.seed_database().unwrap();

        let custom = state.catalog.admin_create(crate::College {
            id: String::new(),
            name: "Premier Institute of Research".to_string(),
            location: "Panaji, Goa".to_string(),
            state: "Goa".to_string(),
            college_type: crate::CollegeType::Government,
            founded: 1995,
            ranking: 1,
            fees: 100_000,
            placement_rate: 100.0,
            rating: 5.0,
            reviews_count: 10,
            description: String::new(),
            courses: vec!["B.Tech Computer Science".to_string()],
            image_url: String::new(),
            website: None,
        });

        let token = state
            .auth
            .sign_token("user_test_001", "test@example.com", "Test User")
            .unwrap();
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/recommendations")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        let ids: Vec<&str> = body["recommendations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&custom.id.as_str()));
    }

    #[actix_web::test]
    async fn quiz_defaults_echo_meta() {
        let app = test_app!(test_state(fast_config()));

        let req = test::TestRequest::post()
            .uri("/api/quiz")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["meta"]["preferredState"], "any");
        assert_eq!(body["meta"]["budget"], 9_999_999);
        assert_eq!(body["meta"]["placementPriority"], 80.0);
        assert_eq!(body["meta"]["collegeType"], "Any");
        assert!(body["count"].as_u64().unwrap() >= 1);
    }

    #[actix_web::test]
    async fn admin_routes_are_role_gated() {
        let state = test_state(fast_config());
        let admin_token = state
            .auth
            .sign_admin_token("user_admin_001", "admin@collegechalo.com", "Admin")
            .unwrap();
        let user_token = state
            .auth
            .sign_token("user_test_001", "test@example.com", "Test User")
            .unwrap();
        let app = test_app!(state);

        // A student account on the admin login endpoint is 403, not 401.
        let req = test::TestRequest::post()
            .uri("/api/admin/auth/login")
            .set_json(json!({"email": "test@example.com", "password": "anything"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);

        // A user token cannot reach admin catalog management.
        let req = test::TestRequest::get()
            .uri("/api/admin/colleges")
            .insert_header(("Authorization", format!("Bearer {}", user_token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        // Create with defaults, then delete.
        let req = test::TestRequest::post()
            .uri("/api/admin/colleges")
            .insert_header(("Authorization", format!("Bearer {}", admin_token)))
            .set_json(json!({"name": "Test Institute of Technology"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        let id = body["college"]["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("college_custom_"));
        assert_eq!(body["college"]["founded"], 2000);
        assert_eq!(body["college"]["ranking"], 999);
        assert_eq!(body["college"]["type"], "Government");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/colleges/{}", id))
            .insert_header(("Authorization", format!("Bearer {}", admin_token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/colleges/{}", id))
            .insert_header(("Authorization", format!("Bearer {}", admin_token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn login_attempts_are_rate_limited() {
        let mut config = fast_config();
        config.rate_limit.login_max = 2;
        let app = test_app!(test_state(config));

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({"email": "nobody@example.com", "password": "x"}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 401);
        }

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "nobody@example.com", "password": "x"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 429);
        assert!(resp.headers().contains_key("Retry-After"));
    }

    #[actix_web::test]
    async fn lead_capture_validates_and_stores() {
        let app = test_app!(test_state(fast_config()));

        let req = test::TestRequest::post()
            .uri("/api/leads")
            .set_json(json!({
                "name": "Asha",
                "email": "bad-email",
                "mobile": "9876543210",
                "state": "Karnataka",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/leads")
            .set_json(json!({
                "name": "Asha",
                "email": "asha@example.com",
                "mobile": "9876543210",
                "state": "Karnataka",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
    }

    #[actix_web::test]
    async fn liveness_probe_reports_storage_mode() {
        let app = test_app!(test_state(fast_config()));

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["storage"], "in-memory");
    }
}
