//! Aviation weather feed ingestion.
//!
//! Downloads the METAR, TAF and airport metadata CSV feeds and writes their
//! rows through a [`storage::WeatherStore`].
//!
//! # Architecture
//!
//! - [`header`] finds the column names in loosely formatted CSV
//! - [`feeds`] maps rows of each feed to records
//! - [`fetch`] downloads a feed only when it changed
//! - [`ingester`] runs one fetch-parse-store cycle per feed
//! - [`scheduler`] repeats a cycle with a delay counted from its completion

pub mod error;
pub mod feeds;
pub mod fetch;
pub mod header;
pub mod ingester;
pub mod scheduler;

// Re-exports
pub use error::{IngestionError, Result, RowError};
pub use feeds::{FeedKind, FeedRecord};
pub use fetch::{FeedFetcher, FetchedFeed, DEFAULT_FETCH_TIMEOUT};
pub use header::{FeedReader, HeaderError, NextRow};
pub use ingester::{CycleOutcome, CycleStats, FeedIngestor};
pub use scheduler::{run_periodic, PeriodicTask};
