//! wx API server
//!
//! Serves stored METAR, TAF and airport data as JSON.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use storage::{PoolConfig, RedisStore, WeatherStore};
use wx_server::build_router;
use wx_server::config::ServerConfig;
use wx_server::state::AppState;

/// wx API server
#[derive(Parser, Debug)]
#[command(name = "wx-server")]
#[command(about = "Read-only JSON API for METAR, TAF and ICAO location data")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:9990", env = "WX_LISTEN_ADDR")]
    listen: SocketAddr,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis_url: String,

    /// Max idle Redis connections
    #[arg(long, env = "REDIS_MAX_IDLE", default_value = "50")]
    redis_max_idle: usize,

    /// Max Redis connections in use at once, 0 for no limit
    #[arg(long, env = "REDIS_MAX_ACTIVE", default_value = "10000")]
    redis_max_active: usize,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Write JSON without indentation
    #[arg(long)]
    compact_json: bool,

    /// Send `application/json` instead of `application-json`
    #[arg(long)]
    standard_content_type: bool,

    /// Do not send CORS headers
    #[arg(long)]
    disable_cors: bool,

    /// Seconds before a request is aborted with 408
    #[arg(long, default_value = "15", env = "WX_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: u64,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            pretty_json: !self.compact_json,
            legacy_content_type: !self.standard_content_type,
            enable_cors: !self.disable_cors,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_idle: self.redis_max_idle,
            max_active: self.redis_max_active,
            ..PoolConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    info!("Starting wx API server");

    let store = RedisStore::new(&args.redis_url, args.pool_config())
        .context("Failed to create Redis store")?;
    if let Err(e) = store.ping().await {
        warn!(error = %e, "Redis is not reachable, data requests will fail until it is");
    }

    let state = Arc::new(AppState::new(Arc::new(store), args.server_config()));
    let app = build_router(state);

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!("wx API listening on {}", args.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("wx API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Received shutdown signal");
}
