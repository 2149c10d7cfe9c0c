//! Conditional feed download.
//!
//! A HEAD request reads `Last-Modified`; the body is downloaded only when the
//! feed changed after the previous successful update.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{header::LAST_MODIFIED, Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::{IngestionError, Result};

/// Default connect and overall timeout of feed requests.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// A downloaded feed body.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    pub body: Bytes,
    pub last_modified: Option<DateTime<Utc>>,
}

/// HTTP client for feed downloads.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(IngestionError::Client)?;
        Ok(Self { client })
    }

    /// Download `url` unless it was not modified after `since`.
    ///
    /// Returns `None` when the feed is unchanged. A feed without a
    /// `Last-Modified` header is always downloaded.
    pub async fn fetch_if_modified(
        &self,
        url: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<FetchedFeed>> {
        let head = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|source| IngestionError::Transport {
                url: url.to_string(),
                source,
            })?;
        if head.status() != StatusCode::OK {
            return Err(IngestionError::HttpStatus {
                method: "HEAD",
                url: url.to_string(),
                status: head.status().as_u16(),
            });
        }

        let last_modified = match head.headers().get(LAST_MODIFIED) {
            Some(value) => Some(parse_http_date(url, value.to_str().unwrap_or_default())?),
            None => None,
        };

        if let (Some(modified), Some(since)) = (last_modified, since) {
            if modified <= since {
                debug!(url = %url, last_modified = %modified, "Feed not modified");
                return Ok(None);
            }
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| IngestionError::Transport {
                url: url.to_string(),
                source,
            })?;
        if response.status() != StatusCode::OK {
            return Err(IngestionError::HttpStatus {
                method: "GET",
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| IngestionError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(Some(FetchedFeed {
            body,
            last_modified,
        }))
    }
}

/// Parse an HTTP date (`Tue, 12 May 2020 11:35:00 GMT`).
fn parse_http_date(url: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| IngestionError::LastModified {
            url: url.to_string(),
            value: value.to_string(),
        })
}
