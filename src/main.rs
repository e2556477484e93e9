//! # College Chalo Server Main Driver
//!
//! ## Purpose
//! Main entry point for the College Chalo backend. Orchestrates component
//! initialization and starts the web server for handling API requests.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration file, command line arguments, environment variables
//! - **Output**: Running web server with catalog, account, and admin endpoints
//! - **Initialization**: Opens storage (when configured), seeds catalog, health checks
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Open the embedded database when a path is configured
//! 4. Build the stores and shared application state
//! 5. Start the web API server
//! 6. Handle shutdown signals gracefully

use clap::{Arg, Command};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use college_chalo::{
    api::ApiServer,
    auth::TokenSigner,
    catalog::CatalogStore,
    config::Config,
    errors::{ChaloError, Result},
    notifications::NotificationStore,
    preferences::PreferenceStore,
    rate_limit::RateLimiter,
    records::EngagementStore,
    reviews::ReviewStore,
    storage::Storage,
    users::UserStore,
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("college-chalo-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("College discovery, comparison, and application backend")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed the configured database with the built-in catalog and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check-health")
                .long("check-health")
                .help("Run health checks and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");
    let mut config = Config::from_file(config_path)?;

    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let config = Arc::new(config);

    init_logging(&config)?;

    info!("Starting College Chalo v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", config_path);

    if matches.get_flag("check-health") {
        return run_health_checks(&config);
    }

    let app_state = initialize_components(config.clone())?;

    if matches.get_flag("seed") {
        let seeded = app_state.catalog.seed_database()?;
        info!("Seed run complete, {} colleges written", seeded);
        return Ok(());
    }

    let server = ApiServer::new(app_state.clone());

    info!(
        "College Chalo started successfully on {}:{}",
        config.server.host, config.server.port
    );

    // The actix server future is not Send, so it stays on the main task.
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
            warn!("Server stopped unexpectedly");
        }
    }

    shutdown_components(&app_state)?;
    info!("College Chalo shut down successfully");

    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone()));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }

    info!("Logging initialized with level: {}", config.logging.level);
    Ok(())
}

/// Build the stores and shared application state.
fn initialize_components(config: Arc<Config>) -> Result<AppState> {
    info!("Initializing application components...");

    let storage = match &config.storage.db_path {
        Some(path) => {
            info!("Opening database at {:?}", path);
            match Storage::open(path) {
                Ok(storage) => Some(storage),
                Err(e) => {
                    warn!("Database unavailable ({}), running fully in memory", e);
                    None
                }
            }
        }
        None => {
            info!("No database configured, running fully in memory");
            None
        }
    };

    let catalog = Arc::new(CatalogStore::new(
        storage.as_ref().map(|s| s.colleges.clone()),
    ));
    catalog.seed_database()?;

    let users = Arc::new(UserStore::new(storage.as_ref().map(|s| s.users.clone())));
    let preferences = Arc::new(PreferenceStore::new(
        storage.as_ref().map(|s| s.preferences.clone()),
    ));
    let reviews = Arc::new(ReviewStore::new(
        storage.as_ref().map(|s| s.reviews.clone()),
    ));
    let notifications = Arc::new(NotificationStore::new(
        storage.as_ref().map(|s| s.notifications.clone()),
    ));
    let records = Arc::new(EngagementStore::new(
        storage.as_ref().map(|s| s.saved.clone()),
        storage.as_ref().map(|s| s.applications.clone()),
        storage.as_ref().map(|s| s.leads.clone()),
        storage.as_ref().map(|s| s.contact.clone()),
    ));
    let auth = Arc::new(TokenSigner::new(&config.auth));
    let rate_limiter = Arc::new(RateLimiter::new());

    if let Some(storage) = &storage {
        storage.health_check()?;
        info!("Storage is healthy");
    }

    let app_state = AppState {
        config,
        catalog,
        users,
        preferences,
        reviews,
        notifications,
        records,
        auth,
        rate_limiter,
        storage,
        started_at: std::time::Instant::now(),
    };

    info!("All components initialized successfully");
    Ok(app_state)
}

/// Run standalone health checks against the configuration.
fn run_health_checks(config: &Config) -> Result<()> {
    info!("Running health checks...");

    if let Some(path) = &config.storage.db_path {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| ChaloError::Config {
                    message: format!("Cannot create database directory {:?}: {}", parent, e),
                })?;
                info!("Created directory: {:?}", parent);
            }
        }
        let storage = Storage::open(path)?;
        storage.health_check()?;
        info!("Database is reachable and writable");
    } else {
        info!("No database configured, nothing to probe");
    }

    info!("All health checks passed");
    Ok(())
}

/// Flush pending writes before the process exits.
fn shutdown_components(app_state: &AppState) -> Result<()> {
    info!("Shutting down components...");

    if let Some(storage) = &app_state.storage {
        storage.flush()?;
        info!("Storage flushed");
    }

    info!("All components shut down successfully");
    Ok(())
}
