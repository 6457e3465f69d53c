//! Audiocast Player - Main entry point
//!
//! Streaming audio playback control service: drives a media transport
//! through its lifecycle on behalf of HTTP clients and announces every
//! change on an SSE event stream.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use audiocast_player::config::Config;
use audiocast_player::engine::{Engine, EngineDeps, NullHostResources};
use audiocast_player::notify::LogPresenter;
use audiocast_player::resume::SqliteResumeStore;
use audiocast_player::transport::sim::SimTransport;
use audiocast_player::{api, SharedState};

/// Command-line arguments for audiocast-player
#[derive(Parser, Debug)]
#[command(name = "audiocast-player")]
#[command(about = "Streaming audio playback control service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "AUDIOCAST_PORT")]
    port: u16,

    /// Data directory for the resume-position store
    #[arg(short, long, env = "AUDIOCAST_DATA_DIR")]
    data_dir: Option<String>,

    /// Idle seconds before an inactive session tears itself down
    #[arg(long, default_value = "60", env = "AUDIOCAST_WATCHDOG_SECS")]
    watchdog_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audiocast_player=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let data_dir =
        audiocast_common::config::resolve_data_dir(args.data_dir.as_deref(), "AUDIOCAST_DATA_DIR")
            .context("Failed to resolve data directory")?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    info!("Starting Audiocast Player on port {}", args.port);
    info!("Data directory: {}", data_dir.display());

    // Resume-position store
    let db_path = data_dir.join("resume.db");
    let pool = SqlitePoolOptions::new()
        .connect_with(
            SqliteConnectOptions::new()
                .filename(&db_path)
                .create_if_missing(true),
        )
        .await
        .context("Failed to open resume-position database")?;
    let resume = Arc::new(
        SqliteResumeStore::new(pool)
            .await
            .context("Failed to initialize resume-position store")?,
    );

    let config = Config {
        port: args.port,
        watchdog_timeout: Duration::from_secs(args.watchdog_secs),
        ..Config::default()
    };

    // Engine with the simulated transport (no platform decoder attached)
    let shared = Arc::new(SharedState::new());
    let engine = Engine::spawn(
        EngineDeps {
            transport_factory: SimTransport::factory(Duration::from_millis(300), None),
            resume,
            presenter: Box::new(LogPresenter),
            host: Box::new(NullHostResources),
            position_interval: config.position_interval,
            watchdog_timeout: config.watchdog_timeout,
        },
        shared,
    );
    info!("Playback engine started");

    tokio::select! {
        result = api::run(config, engine) => {
            result.context("HTTP server error")?;
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
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
