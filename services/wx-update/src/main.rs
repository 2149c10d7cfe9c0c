//! Aviation weather feed updater.
//!
//! Keeps the METAR, TAF and airport metadata in Redis current:
//! - METAR and TAF feeds are polled every minute
//! - the airport database is imported once a day
//! - each feed is downloaded only when its `Last-Modified` changed
//! - optional Prometheus exporter for ingestion counters

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use ingestion::{run_periodic, FeedFetcher, FeedIngestor, PeriodicTask};
use storage::{RedisStore, WeatherStore};

use config::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .init();

    info!("Starting weather feed updater");

    if let Some(addr) = args.metrics_listen {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to start Prometheus exporter")?;
        info!(addr = %addr, "Prometheus metrics exporter listening");
    }

    let store: Arc<dyn WeatherStore> = Arc::new(
        RedisStore::new(&args.redis_url, args.pool_config())
            .context("Failed to create Redis store")?,
    );
    if let Err(e) = store.ping().await {
        warn!(error = %e, "Redis is not reachable, feed updates will fail until it is");
    }
    let fetcher = FeedFetcher::new(args.fetch_timeout())?;

    let schedules = args.schedules();
    let mut ingestors: Vec<FeedIngestor> = schedules
        .iter()
        .map(|s| FeedIngestor::new(s.kind, s.url.clone(), fetcher.clone(), store.clone()))
        .collect();

    if args.once {
        info!(feeds = ingestors.len(), "Running single update of each feed");
        let results = join_all(ingestors.iter_mut().map(|feed| feed.run_cycle())).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        for (schedule, result) in schedules.iter().zip(&results) {
            if let Err(e) = result {
                error!(feed = %schedule.kind, error = %e, "Feed update failed");
            }
        }
        if failed > 0 {
            anyhow::bail!("{} feed update(s) failed", failed);
        }
        return Ok(());
    }

    // Shutdown signal
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Each feed runs on its own task and owns its own state
    let mut handles = Vec::with_capacity(ingestors.len());
    for (schedule, mut feed) in schedules.iter().zip(ingestors) {
        let interval = schedule.interval;
        let shutdown = shutdown_tx.subscribe();
        info!(
            feed = %schedule.kind,
            url = %schedule.url,
            interval_secs = interval.as_secs(),
            "Scheduling feed"
        );
        handles.push(tokio::spawn(async move {
            let runs = run_periodic(&mut feed, interval, shutdown).await;
            (feed.name().to_string(), runs)
        }));
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Received shutdown signal");
    shutdown_tx.send(()).ok();

    for joined in join_all(handles).await {
        match joined {
            Ok((feed, runs)) => info!(feed = %feed, runs, "Feed stopped"),
            Err(e) => error!(error = %e, "Feed task panicked"),
        }
    }

    info!("Weather feed updater stopped");
    Ok(())
}
