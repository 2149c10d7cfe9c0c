//! Error types for wx services.

use thiserror::Error;

/// Result type alias using WxError.
pub type WxResult<T> = Result<T, WxError>;

/// Primary error type for API and storage operations.
#[derive(Debug, Error)]
pub enum WxError {
    // === Request Errors ===
    #[error("Unable to parse URL path {0}")]
    InvalidPath(String),

    #[error("Unable to parse URL query {query}: {message}")]
    InvalidQuery { query: String, message: String },

    #[error("Unknown endpoint or path {0}")]
    UnknownPath(String),

    #[error("Unknown endpoint {0}")]
    UnknownEndpoint(String),

    #[error("Location not specified")]
    MissingLocation,

    #[error("Single location {single} and multiple locations {batch:?} must not be specified in the same request")]
    ConflictingLocations { single: String, batch: Vec<String> },

    #[error("{count} locations specified while maximum of {max} is allowed")]
    TooManyLocations { count: usize, max: usize },

    #[error("Invalid ICAO location code format {0}")]
    InvalidLocation(String),

    #[error("Location {0} is not found")]
    LocationNotFound(String),

    // === Storage Errors ===
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Storage pool exhausted: {0}")]
    PoolExhausted(String),

    #[error("Corrupt record {key}: {message}")]
    CorruptRecord { key: String, message: String },

    // === Infrastructure Errors ===
    #[error("Error converting to JSON: {0}")]
    EncodingError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl WxError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            WxError::InvalidPath(_) | WxError::InvalidQuery { .. } => 400,

            WxError::UnknownPath(_) | WxError::TooManyLocations { .. } => 403,

            WxError::LocationNotFound(_) => 404,

            WxError::UnknownEndpoint(_)
            | WxError::MissingLocation
            | WxError::ConflictingLocations { .. }
            | WxError::InvalidLocation(_) => 422,

            _ => 500,
        }
    }

    /// Whether the error stems from the client request rather than the service.
    pub fn is_client_error(&self) -> bool {
        self.http_status_code() < 500
    }
}

impl From<serde_json::Error> for WxError {
    fn from(err: serde_json::Error) -> Self {
        WxError::EncodingError(err.to_string())
    }
}
