//! Fiqh QA Backend
//!
//! HTTP service for the Fiqh QA user accounts.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! - Routes: HTTP request handling, envelopes and middleware
//! - Services: Account and login use cases
//! - Repositories: Transactional user storage (PostgreSQL or in-memory)

use std::sync::Arc;

use anyhow::Result;
use fiqh_qa_backend::{
    config::{self, StorageBackend},
    db,
    repositories::{InMemoryUserStore, PgTransactionManager, TransactionManager},
    routes,
    state::AppState,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = %config::AppConfig::environment(),
        "Starting Fiqh QA Backend"
    );

    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    let transactions = open_storage(&config).await?;
    let state = AppState::new(transactions, config.clone());

    let app = routes::create_router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Open the configured user storage
async fn open_storage(config: &config::AppConfig) -> Result<Arc<dyn TransactionManager>> {
    match config.database.backend {
        StorageBackend::Postgres => {
            info!("Connecting to database...");
            let pool = db::create_pool(&config.database).await?;

            // Production deployments run migrations as a separate job
            if !config::AppConfig::is_production() {
                info!("Running database migrations...");
                db::run_migrations(&pool).await?;
            }

            Ok(Arc::new(PgTransactionManager::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; accounts are lost on restart");
            Ok(Arc::new(InMemoryUserStore::new()))
        }
    }
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "fiqh_qa_backend=info,tower_http=info".into()
        } else {
            "fiqh_qa_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Refuse to start in production with unsafe settings
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let issues = config.production_issues();

    if config.server.detailed_errors {
        warn!("Detailed error messages are enabled in production");
    }
    if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
        warn!("Database URL contains localhost - ensure this is intentional for production");
    }

    if !issues.is_empty() {
        for issue in &issues {
            error!("Configuration error: {}", issue);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
