//! bbq-pu (Player Universe) - Main entry point
//!
//! Serves the player universe API: admin CSV upload, SFBB feed sync
//! (on demand and scheduled), and the player store reads behind the admin
//! players table.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bbq_common::config::{
    default_config_path, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use bbq_common::db::init_database;
use bbq_pu::scheduler::spawn_sync_schedule;
use bbq_pu::services::FeedClient;
use bbq_pu::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for bbq-pu
#[derive(Parser, Debug)]
#[command(name = "bbq-pu")]
#[command(about = "Player Universe service for BBQ")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config)
    #[arg(short, long, env = "BBQ_PU_PORT")]
    port: Option<u16>,

    /// Root folder holding bbq.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "BBQ_CONFIG")]
    config: Option<PathBuf>,

    /// Run one feed sync (replace mode) and exit
    #[arg(long)]
    sync_once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so its log level can seed the filter;
    // the outcome is logged once tracing is up.
    let config_path = args.config.clone().or_else(default_config_path);
    let loaded = config_path.as_deref().map(TomlConfig::load);
    let config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => TomlConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = &config.logging.level;
                format!("bbq_pu={level},bbq_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting BBQ Player Universe (bbq-pu) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match (&config_path, &loaded) {
        (Some(path), Some(Ok(_))) => info!("Loaded config file: {}", path.display()),
        (Some(path), Some(Err(e))) => {
            warn!("Ignoring config file {}: {} (using defaults)", path.display(), e)
        }
        _ => info!("No config file found, using compiled defaults"),
    }

    let root_folder = RootFolderResolver::new("bbq-pu")
        .with_cli_arg(args.root_folder.clone())
        .with_toml_config(&config)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let feed = FeedClient::new(&config.feed).context("Failed to build feed client")?;
    info!("Player feed: {}", feed.url());

    if config.auth.trust_all {
        warn!("auth.trust_all is set: every caller is treated as admin");
    }

    let state = AppState::new(pool, feed)
        .with_batch_size(config.import.batch_size)
        .with_trust_all(config.auth.trust_all);

    if args.sync_once {
        return match bbq_pu::scheduler::run_scheduled_sync(&state).await {
            Some(_) => Ok(()),
            None => anyhow::bail!("Player sync failed"),
        };
    }

    if let Some(period) = config.sync.period() {
        spawn_sync_schedule(state.clone(), period);
    }

    let app = build_router(state);

    let host = config.server.host.as_str();
    let port = args.port.unwrap_or(config.server.port);
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", host, port))?;

    info!("bbq-pu listening on http://{}:{}", host, port);
    info!("Health check: http://{}:{}/health", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
