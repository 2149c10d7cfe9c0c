//! Common types and utilities shared across the wx services.

pub mod error;
pub mod icao;
pub mod location;
pub mod time;

pub use error::{WxError, WxResult};
pub use icao::{is_valid_icao, MAX_LOCATIONS};
pub use location::{LocationRecord, LocationView};
pub use time::{expire_seconds, expire_seconds_at, TimeParseError};
