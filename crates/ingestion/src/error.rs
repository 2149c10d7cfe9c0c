//! Error types for the ingestion crate.

use thiserror::Error;
use wx_common::{TimeParseError, WxError};

use crate::header::HeaderError;

/// Errors that abort an ingestion cycle.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} request to {url} resulted in code {status}")]
    HttpStatus {
        method: &'static str,
        url: String,
        status: u16,
    },

    #[error("Cannot parse Last-Modified '{value}' (requested {url})")]
    LastModified { url: String, value: String },

    #[error("Failed to parse CSV header: {0}")]
    Header(#[from] HeaderError),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] WxError),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;

/// Errors that skip a single feed row.
#[derive(Error, Debug)]
pub enum RowError {
    #[error("row has {actual} fields, header has {expected}")]
    Width { expected: usize, actual: usize },

    #[error("row is not valid UTF-8")]
    Encoding,

    #[error("row has no column {0}")]
    MissingField(usize),

    #[error("invalid location code '{0}'")]
    InvalidLocation(String),

    #[error("location {0} is closed")]
    Closed(String),

    #[error(transparent)]
    Timestamp(#[from] TimeParseError),

    #[error("field {field} has non-numeric value '{value}'")]
    Number { field: &'static str, value: String },
}

impl RowError {
    /// Short label for log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            RowError::Width { .. } => "width",
            RowError::Encoding => "encoding",
            RowError::MissingField(_) => "missing_field",
            RowError::InvalidLocation(_) => "invalid_location",
            RowError::Closed(_) => "closed",
            RowError::Timestamp(_) => "timestamp",
            RowError::Number { .. } => "number",
        }
    }
}
