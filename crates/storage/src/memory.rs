//! In-process weather store.
//!
//! Implements the same contract as the Redis store: write-once locations,
//! report text with lazy TTL expiration on read. Used by tests and local runs
//! without a Redis server.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use wx_common::{LocationRecord, WxError, WxResult};

use crate::store::{CreateOutcome, ReportKind, WeatherStore};

struct StoredReport {
    text: String,
    expires_at: Instant,
}

impl StoredReport {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory implementation of [`WeatherStore`].
#[derive(Default)]
pub struct MemoryStore {
    locations: RwLock<HashMap<String, LocationRecord>>,
    reports: RwLock<HashMap<(ReportKind, String), StoredReport>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a storage error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored, unexpired reports of a kind.
    pub async fn report_count(&self, kind: ReportKind) -> usize {
        self.reports
            .read()
            .await
            .iter()
            .filter(|((k, _), report)| *k == kind && !report.is_expired())
            .count()
    }

    /// Number of stored locations.
    pub async fn location_count(&self) -> usize {
        self.locations.read().await.len()
    }

    fn check_available(&self) -> WxResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(WxError::StorageError("memory store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WeatherStore for MemoryStore {
    async fn get_location(&self, code: &str) -> WxResult<Option<LocationRecord>> {
        self.check_available()?;
        Ok(self.locations.read().await.get(code).cloned())
    }

    async fn batch_get_locations(&self, codes: &[String]) -> WxResult<Vec<Option<LocationRecord>>> {
        self.check_available()?;
        let locations = self.locations.read().await;
        Ok(codes.iter().map(|c| locations.get(c).cloned()).collect())
    }

    async fn batch_get(&self, kind: ReportKind, codes: &[String]) -> WxResult<Vec<String>> {
        self.check_available()?;
        let reports = self.reports.read().await;
        Ok(codes
            .iter()
            .map(|code| match reports.get(&(kind, code.clone())) {
                Some(report) if !report.is_expired() => report.text.clone(),
                _ => String::new(),
            })
            .collect())
    }

    async fn create_location_if_absent(&self, record: &LocationRecord) -> WxResult<CreateOutcome> {
        self.check_available()?;
        let mut locations = self.locations.write().await;
        if locations.contains_key(&record.location) {
            return Ok(CreateOutcome::Unchanged);
        }
        locations.insert(record.location.clone(), record.clone());
        Ok(CreateOutcome::Created)
    }

    async fn upsert_with_ttl(
        &self,
        kind: ReportKind,
        code: &str,
        value: &str,
        ttl_secs: i64,
    ) -> WxResult<()> {
        self.check_available()?;
        let mut reports = self.reports.write().await;
        let key = (kind, code.to_string());
        if ttl_secs <= 0 {
            reports.remove(&key);
            return Ok(());
        }
        reports.insert(
            key,
            StoredReport {
                text: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_secs as u64),
            },
        );
        Ok(())
    }

    async fn exists(&self, code: &str) -> WxResult<bool> {
        self.check_available()?;
        Ok(self.locations.read().await.contains_key(code))
    }

    async fn ping(&self) -> WxResult<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, name: &str) -> LocationRecord {
        LocationRecord {
            location: code.to_string(),
            name: name.to_string(),
            city: "Lviv".to_string(),
            country_code: "UA".to_string(),
            latitude: 49.8125,
            longitude: 23.9561,
            altitude_feet: 1071,
        }
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_upsert_then_batch_get() {
        let store = MemoryStore::new();
        store
            .upsert_with_ttl(ReportKind::Metar, "UKLL", "METAR text", 600)
            .await
            .unwrap();

        let values = store.batch_get(ReportKind::Metar, &codes(&["UKLL"])).await.unwrap();
        assert_eq!(values, vec!["METAR text".to_string()]);
    }

    #[tokio::test]
    async fn test_batch_get_is_positional() {
        let store = MemoryStore::new();
        store.upsert_with_ttl(ReportKind::Taf, "UKBB", "TAF B", 600).await.unwrap();
        store.upsert_with_ttl(ReportKind::Taf, "UKLL", "TAF L", 600).await.unwrap();

        let values = store
            .batch_get(ReportKind::Taf, &codes(&["UKLL", "ZZZZ", "UKBB"]))
            .await
            .unwrap();
        assert_eq!(values, vec!["TAF L", "", "TAF B"]);
    }

    #[tokio::test]
    async fn test_keyspaces_are_independent() {
        let store = MemoryStore::new();
        store.upsert_with_ttl(ReportKind::Metar, "UKLL", "METAR", 600).await.unwrap();

        let tafs = store.batch_get(ReportKind::Taf, &codes(&["UKLL"])).await.unwrap();
        assert_eq!(tafs, vec![""]);
        assert!(!store.exists("UKLL").await.unwrap());
    }

    #[tokio::test]
    async fn test_non_positive_ttl_expires_immediately() {
        let store = MemoryStore::new();
        store.upsert_with_ttl(ReportKind::Metar, "UKLL", "old", 600).await.unwrap();
        store.upsert_with_ttl(ReportKind::Metar, "UKLL", "stale", 0).await.unwrap();
        store.upsert_with_ttl(ReportKind::Metar, "UKBB", "stale", -30).await.unwrap();

        let values = store
            .batch_get(ReportKind::Metar, &codes(&["UKLL", "UKBB"]))
            .await
            .unwrap();
        assert_eq!(values, vec!["", ""]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_expires_after_ttl() {
        let store = MemoryStore::new();
        store.upsert_with_ttl(ReportKind::Metar, "UKLL", "METAR", 600).await.unwrap();

        tokio::time::advance(Duration::from_secs(599)).await;
        assert_eq!(store.report_count(ReportKind::Metar).await, 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        let values = store.batch_get(ReportKind::Metar, &codes(&["UKLL"])).await.unwrap();
        assert_eq!(values, vec![""]);
    }

    #[tokio::test]
    async fn test_create_location_never_overwrites() {
        let store = MemoryStore::new();
        let first = store.create_location_if_absent(&record("UKLL", "First")).await.unwrap();
        let second = store.create_location_if_absent(&record("UKLL", "Second")).await.unwrap();

        assert_eq!(first, CreateOutcome::Created);
        assert_eq!(second, CreateOutcome::Unchanged);
        let stored = store.get_location("UKLL").await.unwrap().unwrap();
        assert_eq!(stored.name, "First");
        assert!(store.exists("UKLL").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_store_one_record() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_location_if_absent(&record("UKLL", &format!("Writer {}", i)))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() == CreateOutcome::Created {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.location_count().await, 1);
    }

    #[tokio::test]
    async fn test_batch_get_locations() {
        let store = MemoryStore::new();
        store.create_location_if_absent(&record("UKLL", "Lviv")).await.unwrap();

        let found = store
            .batch_get_locations(&codes(&["ZZZZ", "UKLL"]))
            .await
            .unwrap();
        assert!(found[0].is_none());
        assert_eq!(found[1].as_ref().unwrap().name, "Lviv");
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.ping().await.is_err());
        assert!(store.exists("UKLL").await.is_err());

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }
}
