//! Storage contract shared by the ingestion pipeline and the API.

use async_trait::async_trait;
use std::fmt;

use wx_common::{LocationRecord, WxResult};

/// The three independent keyspaces, keyed by ICAO location code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyspace {
    Location,
    Metar,
    Taf,
}

impl Keyspace {
    /// Key prefix in the backing key-value store.
    pub fn prefix(&self) -> &'static str {
        match self {
            Keyspace::Location => "wx:icao:loc:",
            Keyspace::Metar => "wx:icao:metar:",
            Keyspace::Taf => "wx:icao:taf:",
        }
    }

    /// Full key for a location code.
    pub fn key(&self, code: &str) -> String {
        format!("{}{}", self.prefix(), code)
    }
}

/// Keyspaces holding TTL-bound raw report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Metar,
    Taf,
}

impl ReportKind {
    pub fn keyspace(&self) -> Keyspace {
        match self {
            ReportKind::Metar => Keyspace::Metar,
            ReportKind::Taf => Keyspace::Taf,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Metar => write!(f, "metar"),
            ReportKind::Taf => write!(f, "taf"),
        }
    }
}

/// Result of a conditional location create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Unchanged,
}

/// Key-value capability set consumed by the feed ingestors and the API.
///
/// Implementations do not validate location codes and do not limit the
/// number of codes in batch reads. Reads across keyspaces are independent;
/// no operation spans more than one keyspace atomically.
#[async_trait]
pub trait WeatherStore: Send + Sync {
    /// Fetch the metadata record for one location.
    async fn get_location(&self, code: &str) -> WxResult<Option<LocationRecord>>;

    /// Fetch metadata records, positionally aligned with `codes`.
    async fn batch_get_locations(&self, codes: &[String]) -> WxResult<Vec<Option<LocationRecord>>>;

    /// Fetch report text, positionally aligned with `codes`.
    ///
    /// Missing or expired reports yield an empty string.
    async fn batch_get(&self, kind: ReportKind, codes: &[String]) -> WxResult<Vec<String>>;

    /// Store a location record unless one already exists for its code.
    async fn create_location_if_absent(&self, record: &LocationRecord) -> WxResult<CreateOutcome>;

    /// Store report text that expires after `ttl_secs`.
    ///
    /// A non-positive TTL expires the report immediately.
    async fn upsert_with_ttl(
        &self,
        kind: ReportKind,
        code: &str,
        value: &str,
        ttl_secs: i64,
    ) -> WxResult<()>;

    /// Whether location metadata exists for a code.
    async fn exists(&self, code: &str) -> WxResult<bool>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> WxResult<()>;
}
