//! Command line and environment configuration.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use ingestion::FeedKind;
use storage::PoolConfig;

#[derive(Parser, Debug)]
#[command(name = "wx-update")]
#[command(about = "Keeps METAR, TAF and airport data current in Redis")]
pub struct Args {
    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// Max idle Redis connections
    #[arg(long, env = "REDIS_MAX_IDLE", default_value = "50")]
    pub redis_max_idle: usize,

    /// Max Redis connections in use at once, 0 for no limit
    #[arg(long, env = "REDIS_MAX_ACTIVE", default_value = "10000")]
    pub redis_max_active: usize,

    #[arg(long, env = "WX_METAR_URL", default_value = ingestion::feeds::METAR_FEED_URL)]
    pub metar_url: String,

    #[arg(long, env = "WX_TAF_URL", default_value = ingestion::feeds::TAF_FEED_URL)]
    pub taf_url: String,

    #[arg(long, env = "WX_AIRPORTS_URL", default_value = ingestion::feeds::AIRPORTS_FEED_URL)]
    pub airports_url: String,

    /// Seconds between the end of one METAR update and the start of the next
    #[arg(long, default_value = "60")]
    pub metar_interval_secs: u64,

    /// Seconds between TAF updates
    #[arg(long, default_value = "60")]
    pub taf_interval_secs: u64,

    /// Seconds between airport database imports
    #[arg(long, default_value = "86400")]
    pub airports_interval_secs: u64,

    /// Connect and overall timeout of feed downloads
    #[arg(long, env = "WX_FETCH_TIMEOUT_SECS", default_value = "60")]
    pub fetch_timeout_secs: u64,

    /// Run one update of each feed and exit
    #[arg(long)]
    pub once: bool,

    /// Only update this feed (metar, taf or airports)
    #[arg(long)]
    pub feed: Option<FeedKind>,

    /// Address of the Prometheus metrics listener (disabled when unset)
    #[arg(long, env = "WX_METRICS_LISTEN")]
    pub metrics_listen: Option<SocketAddr>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,
}

/// Schedule of one feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSchedule {
    pub kind: FeedKind,
    pub url: String,
    pub interval: Duration,
}

impl Args {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_idle: self.redis_max_idle,
            max_active: self.redis_max_active,
            ..PoolConfig::default()
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Feeds to run, restricted by `--feed`.
    pub fn schedules(&self) -> Vec<FeedSchedule> {
        FeedKind::ALL
            .iter()
            .filter(|kind| self.feed.map_or(true, |only| only == **kind))
            .map(|kind| {
                let (url, secs) = match kind {
                    FeedKind::Metar => (&self.metar_url, self.metar_interval_secs),
                    FeedKind::Taf => (&self.taf_url, self.taf_interval_secs),
                    FeedKind::Airports => (&self.airports_url, self.airports_interval_secs),
                };
                FeedSchedule {
                    kind: *kind,
                    url: url.clone(),
                    interval: Duration::from_secs(secs),
                }
            })
            .collect()
    }
}
