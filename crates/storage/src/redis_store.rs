//! Redis-backed weather store.
//!
//! Layout:
//! - `wx:icao:loc:{CODE}` hash with `name`, `city`, `country`, `lat`, `lon`, `alt_ft`,
//!   created by a check-and-set script and never overwritten
//! - `wx:icao:metar:{CODE}` string with expiry
//! - `wx:icao:taf:{CODE}` string with expiry

use async_trait::async_trait;
use redis::{RedisResult, Script};
use std::collections::HashMap;
use tracing::instrument;

use wx_common::{LocationRecord, WxError, WxResult};

use crate::pool::{PoolConfig, RedisPool};
use crate::store::{CreateOutcome, Keyspace, ReportKind, WeatherStore};

const FIELD_NAME: &str = "name";
const FIELD_CITY: &str = "city";
const FIELD_COUNTRY: &str = "country";
const FIELD_LATITUDE: &str = "lat";
const FIELD_LONGITUDE: &str = "lon";
const FIELD_ALTITUDE_FEET: &str = "alt_ft";

/// Writes the hash only when the key is absent; returns 1 when created.
const CREATE_IF_ABSENT_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV))
return 1
";

/// Weather store on top of a pooled Redis client.
pub struct RedisStore {
    pool: RedisPool,
    create_script: Script,
}

impl RedisStore {
    /// Create a store. No connection is opened until the first operation.
    pub fn new(redis_url: &str, config: PoolConfig) -> WxResult<Self> {
        Ok(Self {
            pool: RedisPool::new(redis_url, config)?,
            create_script: Script::new(CREATE_IF_ABSENT_SCRIPT),
        })
    }

    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }
}

fn storage_error(op: &str, e: redis::RedisError) -> WxError {
    WxError::StorageError(format!("{} failed: {}", op, e))
}

/// Hash fields of a location record, in `HSET` argument order.
fn encode_location(record: &LocationRecord) -> Vec<(&'static str, String)> {
    vec![
        (FIELD_NAME, record.name.clone()),
        (FIELD_CITY, record.city.clone()),
        (FIELD_COUNTRY, record.country_code.clone()),
        (FIELD_LATITUDE, record.latitude.to_string()),
        (FIELD_LONGITUDE, record.longitude.to_string()),
        (FIELD_ALTITUDE_FEET, record.altitude_feet.to_string()),
    ]
}

/// Rebuild a location record from its hash fields.
fn decode_location(code: &str, fields: &HashMap<String, String>) -> WxResult<LocationRecord> {
    let key = Keyspace::Location.key(code);
    let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
    let corrupt = |name: &str, value: String| WxError::CorruptRecord {
        key: key.clone(),
        message: format!("field {} has value '{}'", name, value),
    };

    let altitude_feet = field(FIELD_ALTITUDE_FEET)
        .parse::<i32>()
        .map_err(|_| corrupt(FIELD_ALTITUDE_FEET, field(FIELD_ALTITUDE_FEET)))?;
    let latitude = field(FIELD_LATITUDE)
        .parse::<f64>()
        .map_err(|_| corrupt(FIELD_LATITUDE, field(FIELD_LATITUDE)))?;
    let longitude = field(FIELD_LONGITUDE)
        .parse::<f64>()
        .map_err(|_| corrupt(FIELD_LONGITUDE, field(FIELD_LONGITUDE)))?;

    Ok(LocationRecord {
        location: code.to_string(),
        name: field(FIELD_NAME),
        city: field(FIELD_CITY),
        country_code: field(FIELD_COUNTRY),
        latitude,
        longitude,
        altitude_feet,
    })
}

#[async_trait]
impl WeatherStore for RedisStore {
    async fn get_location(&self, code: &str) -> WxResult<Option<LocationRecord>> {
        let mut conn = self.pool.get().await?;
        let result: RedisResult<HashMap<String, String>> = redis::cmd("HGETALL")
            .arg(Keyspace::Location.key(code))
            .query_async(&mut *conn)
            .await;
        let fields = conn.check(result).map_err(|e| storage_error("HGETALL", e))?;

        if fields.is_empty() {
            return Ok(None);
        }
        decode_location(code, &fields).map(Some)
    }

    #[instrument(skip(self, codes), fields(count = codes.len()))]
    async fn batch_get_locations(&self, codes: &[String]) -> WxResult<Vec<Option<LocationRecord>>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for code in codes {
            pipe.cmd("HGETALL").arg(Keyspace::Location.key(code));
        }

        let mut conn = self.pool.get().await?;
        let result: RedisResult<Vec<HashMap<String, String>>> = pipe.query_async(&mut *conn).await;
        let hashes = conn.check(result).map_err(|e| storage_error("HGETALL", e))?;

        codes
            .iter()
            .zip(hashes.iter())
            .map(|(code, fields)| {
                if fields.is_empty() {
                    Ok(None)
                } else {
                    decode_location(code, fields).map(Some)
                }
            })
            .collect()
    }

    #[instrument(skip(self, codes), fields(kind = %kind, count = codes.len()))]
    async fn batch_get(&self, kind: ReportKind, codes: &[String]) -> WxResult<Vec<String>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = codes.iter().map(|c| kind.keyspace().key(c)).collect();

        let mut conn = self.pool.get().await?;
        let result: RedisResult<Vec<Option<String>>> =
            redis::cmd("MGET").arg(&keys).query_async(&mut *conn).await;
        let values = conn.check(result).map_err(|e| storage_error("MGET", e))?;

        Ok(values.into_iter().map(Option::unwrap_or_default).collect())
    }

    async fn create_location_if_absent(&self, record: &LocationRecord) -> WxResult<CreateOutcome> {
        let mut invocation = self.create_script.key(Keyspace::Location.key(&record.location));
        for (field, value) in encode_location(record) {
            invocation.arg(field).arg(value);
        }

        // Existence check and write run atomically in one script
        let mut conn = self.pool.get().await?;
        let result: RedisResult<i64> = invocation.invoke_async(&mut *conn).await;
        let created = conn.check(result).map_err(|e| storage_error("EVALSHA", e))?;

        Ok(if created == 1 {
            CreateOutcome::Created
        } else {
            CreateOutcome::Unchanged
        })
    }

    async fn upsert_with_ttl(
        &self,
        kind: ReportKind,
        code: &str,
        value: &str,
        ttl_secs: i64,
    ) -> WxResult<()> {
        let key = kind.keyspace().key(code);
        let mut conn = self.pool.get().await?;

        // Redis rejects a non-positive EX, so an expired report is removed instead
        let result: RedisResult<()> = if ttl_secs > 0 {
            redis::cmd("SET")
                .arg(&key)
                .arg(value)
                .arg("EX")
                .arg(ttl_secs)
                .query_async(&mut *conn)
                .await
        } else {
            redis::cmd("DEL").arg(&key).query_async(&mut *conn).await
        };
        conn.check(result).map_err(|e| storage_error("SET", e))
    }

    async fn exists(&self, code: &str) -> WxResult<bool> {
        let mut conn = self.pool.get().await?;
        let result: RedisResult<bool> = redis::cmd("EXISTS")
            .arg(Keyspace::Location.key(code))
            .query_async(&mut *conn)
            .await;
        conn.check(result).map_err(|e| storage_error("EXISTS", e))
    }

    async fn ping(&self) -> WxResult<()> {
        let mut conn = self.pool.get().await?;
        let result: RedisResult<String> = redis::cmd("PING").query_async(&mut *conn).await;
        conn.check(result).map_err(|e| storage_error("PING", e))?;
        Ok(())
    }
}
