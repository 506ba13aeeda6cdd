use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dbod_api::config::ServerConfig;
use dbod_api::router::build_app_router;
use dbod_api::state::AppState;
use dbod_core::monitoring::{Dialect, MonitoringSettings};
use dbod_db::repositories::MonitoringRepo;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbod_api=debug,dbod_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    tracing::info!(addr = %config.bind_addr(), "Loaded server configuration");

    let settings = MonitoringSettings::from_env().context("Invalid monitoring settings")?;
    tracing::info!(
        window_days = settings.window_days,
        bridge_threshold_secs = settings.bridge_threshold_secs,
        bridge_margin_secs = settings.bridge_margin_secs,
        bridge_disabled = ?settings.bridge_disabled,
        "Loaded monitoring settings"
    );
    for dialect in Dialect::ALL {
        let excluded: Vec<&str> = settings.exclusions.codes(dialect).collect();
        tracing::info!(%dialect, ?excluded, "Catalog exclusions");
    }

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = dbod_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    dbod_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    dbod_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- App state ---
    let repo = Arc::new(MonitoringRepo::new(pool));
    let state = AppState {
        catalog: repo.clone(),
        samples: repo,
        settings: Arc::new(settings),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = config.bind_addr();
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
