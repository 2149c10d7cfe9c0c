//! One ingestion cycle of a feed: fetch, resolve header, parse and store rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use storage::{CreateOutcome, WeatherStore};

use crate::error::{Result, RowError};
use crate::feeds::{FeedKind, FeedRecord};
use crate::fetch::FeedFetcher;
use crate::header::{FeedReader, NextRow};
use crate::scheduler::PeriodicTask;

/// Counts of one completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Records written to storage
    pub written: u64,
    /// Rows skipped because they failed to parse or validate
    pub skipped: u64,
    /// Location records that already existed
    pub unchanged: u64,
    pub download_time: Duration,
    pub processing_time: Duration,
}

/// Result of a cycle that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The feed was not modified since the last update
    NotModified,
    Completed(CycleStats),
}

/// Ingestor for one feed.
///
/// Owns the feed's "last updated" marker; only this ingestor's own cycles
/// read or write it.
pub struct FeedIngestor {
    kind: FeedKind,
    url: String,
    fetcher: FeedFetcher,
    store: Arc<dyn WeatherStore>,
    last_updated: Option<DateTime<Utc>>,
}

impl FeedIngestor {
    pub fn new(
        kind: FeedKind,
        url: impl Into<String>,
        fetcher: FeedFetcher,
        store: Arc<dyn WeatherStore>,
    ) -> Self {
        Self {
            kind,
            url: url.into(),
            fetcher,
            store,
            last_updated: None,
        }
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Time of the last completed download, if any.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Run one cycle.
    ///
    /// Transport, header and storage failures abort the cycle and are
    /// returned; failures of single rows are counted and skipped.
    #[instrument(skip(self), fields(feed = %self.kind))]
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        info!(url = %self.url, "Updating feed");
        let start = Instant::now();

        let fetched = match self
            .fetcher
            .fetch_if_modified(&self.url, self.last_updated)
            .await
        {
            Ok(Some(fetched)) => fetched,
            Ok(None) => {
                info!("Feed not updated since last update");
                self.count_cycle("not_modified");
                return Ok(CycleOutcome::NotModified);
            }
            Err(e) => {
                self.count_cycle("failed");
                return Err(e);
            }
        };

        // Advance only once the download is complete, so a failed fetch is
        // retried on the next cycle
        self.last_updated = Some(Utc::now());
        let download_time = start.elapsed();
        info!(
            bytes = fetched.body.len(),
            last_modified = ?fetched.last_modified,
            duration_ms = download_time.as_millis() as u64,
            "Downloaded feed"
        );

        match self.ingest_body(&fetched.body).await {
            Ok(mut stats) => {
                stats.download_time = download_time;
                self.count_cycle("completed");
                Ok(CycleOutcome::Completed(stats))
            }
            Err(e) => {
                self.count_cycle("failed");
                Err(e)
            }
        }
    }

    /// Parse a feed body and write its records.
    pub async fn ingest_body(&self, body: &[u8]) -> Result<CycleStats> {
        let start = Instant::now();
        let feed = self.kind.name();

        let mut reader = FeedReader::new(body);
        let columns = reader.resolve_header(self.kind.columns())?;
        if !self.kind.enforces_width() {
            reader.relax_width();
        }

        let mut stats = CycleStats::default();
        loop {
            let row = match reader.next_row()? {
                NextRow::End => break,
                NextRow::Record(row) => row,
                NextRow::Malformed { line, error } => {
                    self.skip_row(line, &error, &mut stats);
                    continue;
                }
            };

            let record = match self.kind.parse_row(&columns, &row, Utc::now()) {
                Ok(record) => record,
                Err(error) => {
                    let line = row.position().map(|p| p.line()).unwrap_or_default();
                    self.skip_row(line, &error, &mut stats);
                    continue;
                }
            };

            self.store_record(&record, &mut stats).await?;
        }

        stats.processing_time = start.elapsed();
        counter!("wx_ingest_records_written_total", "feed" => feed).increment(stats.written);
        counter!("wx_ingest_records_skipped_total", "feed" => feed).increment(stats.skipped);

        info!(
            written = stats.written,
            skipped = stats.skipped,
            unchanged = stats.unchanged,
            duration_ms = stats.processing_time.as_millis() as u64,
            "Processed feed"
        );
        Ok(stats)
    }

    async fn store_record(&self, record: &FeedRecord, stats: &mut CycleStats) -> Result<()> {
        match record {
            FeedRecord::Report {
                kind,
                location,
                text,
                ttl_secs,
            } => {
                self.store
                    .upsert_with_ttl(*kind, location, text, *ttl_secs)
                    .await?;
                stats.written += 1;
            }
            FeedRecord::Location(location) => {
                match self.store.create_location_if_absent(location).await? {
                    CreateOutcome::Created => stats.written += 1,
                    CreateOutcome::Unchanged => stats.unchanged += 1,
                }
            }
        }
        Ok(())
    }

    fn skip_row(&self, line: u64, error: &RowError, stats: &mut CycleStats) {
        stats.skipped += 1;
        match error {
            // The airport feed lists many closed and non-ICAO fields
            RowError::Closed(_) | RowError::InvalidLocation(_) if self.kind == FeedKind::Airports => {
                debug!(line, reason = error.reason(), error = %error, "Skipping row");
            }
            _ => warn!(line, reason = error.reason(), error = %error, "Skipping row"),
        }
    }

    fn count_cycle(&self, outcome: &'static str) {
        counter!("wx_ingest_cycles_total", "feed" => self.kind.name(), "outcome" => outcome)
            .increment(1);
    }
}

#[async_trait]
impl PeriodicTask for FeedIngestor {
    fn name(&self) -> &str {
        self.kind.name()
    }

    async fn run_once(&mut self) {
        if let Err(e) = self.run_cycle().await {
            error!(feed = %self.kind, error = %e, "Feed update failed");
        }
    }
}
