//! Server behavior settings.

use std::time::Duration;

/// JSON content type used by existing clients of the API.
pub const LEGACY_JSON_CONTENT_TYPE: &str = "application-json";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Methods served by every path.
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Indent JSON responses
    pub pretty_json: bool,
    /// Send `application-json` instead of `application/json`
    pub legacy_content_type: bool,
    /// Answer CORS preflight requests and add CORS headers to responses
    pub enable_cors: bool,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            pretty_json: true,
            legacy_content_type: true,
            enable_cors: true,
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl ServerConfig {
    pub fn json_content_type(&self) -> &'static str {
        if self.legacy_content_type {
            LEGACY_JSON_CONTENT_TYPE
        } else {
            JSON_CONTENT_TYPE
        }
    }
}
