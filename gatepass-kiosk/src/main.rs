//! Gatepass kiosk (gatepass-kiosk) - Main entry point
//!
//! Serves the visitor intake wizard to the gate kiosk and the live visit
//! feed to the staff console.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatepass_common::config::{load_toml_config, prepare_root_folder, resolve_root_folder};
use gatepass_kiosk::sync::spawn_feed_poller;
use gatepass_kiosk::wizard::{spawn_session_sweeper, SESSION_IDLE_TIMEOUT};
use gatepass_kiosk::{build_router, AppState};

/// Folder under the root that holds bucket directories
const STORAGE_DIR: &str = "storage";

/// How often abandoned sessions are swept
const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Command-line arguments for gatepass-kiosk
#[derive(Parser, Debug)]
#[command(name = "gatepass-kiosk")]
#[command(about = "Visitor intake kiosk and live gate feed")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "GATEPASS_PORT")]
    port: Option<u16>,

    /// Root folder holding the database and the selfie bucket
    #[arg(short, long, env = "GATEPASS_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Path to gatepass.toml
    #[arg(short, long, env = "GATEPASS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatepass_kiosk=info,gatepass_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting gatepass-kiosk v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GATEPASS_REVISION"),
        env!("GATEPASS_BUILT_AT"),
        env!("GATEPASS_PROFILE")
    );

    let args = Args::parse();

    let config = load_toml_config(args.config.as_deref());
    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    info!("Root folder: {}", root_folder.display());

    let db_path = prepare_root_folder(&root_folder).context("Failed to prepare root folder")?;
    let pool = gatepass_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready: {}", db_path.display());

    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", config.bind_address, port);
    let poll_interval = config.feed.poll_interval_secs;

    let state = AppState::from_pool(pool, config, &root_folder.join(STORAGE_DIR))
        .context("Failed to configure storage or notifier")?;
    info!(
        secure_context = state.config.is_secure_context(),
        camera_enabled = state.config.camera.enabled,
        bucket = %state.config.storage.bucket,
        "Application state initialized"
    );

    if let Err(e) = state.feed.refresh().await {
        tracing::warn!(error = %e, "Initial live feed load failed");
    }
    let poller = (poll_interval > 0)
        .then(|| spawn_feed_poller(state.feed.clone(), Duration::from_secs(poll_interval)));
    let sweeper = spawn_session_sweeper(
        state.sessions.clone(),
        state.event_bus.clone(),
        SESSION_IDLE_TIMEOUT,
        SESSION_SWEEP_PERIOD,
    );

    let app = build_router(state);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    if let Some(poller) = poller {
        poller.abort();
    }
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
