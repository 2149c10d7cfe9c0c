//! Location metadata and the per-location response view.

use serde::{Deserialize, Serialize};

/// Static metadata for an ICAO location, imported once from the airport feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// ICAO location code (primary key)
    pub location: String,
    pub name: String,
    pub city: String,
    /// ISO 3166 country code
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_feet: i32,
}

impl LocationRecord {
    /// Altitude in meters, truncated to whole meters.
    pub fn altitude_meters(&self) -> i32 {
        feet_to_meters(self.altitude_feet)
    }
}

/// Convert feet to whole meters (1 ft = 0.3048 m) with integer arithmetic.
pub fn feet_to_meters(feet: i32) -> i32 {
    (i64::from(feet) * 3048 / 10000) as i32
}

/// Data returned for one location.
///
/// Composed per request from the location, METAR and TAF keyspaces. Empty
/// strings and zero numbers are omitted from the JSON encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationView {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metar: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub taf: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country_code: String,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub latitude: f64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub altitude_meters: i32,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub altitude_feet: i32,
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

impl LocationView {
    /// A view carrying only the location code.
    pub fn code_only(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }

    /// Copy metadata fields from a stored record.
    pub fn with_record(mut self, record: &LocationRecord) -> Self {
        self.name = record.name.clone();
        self.city = record.city.clone();
        self.country_code = record.country_code.clone();
        self.latitude = record.latitude;
        self.longitude = record.longitude;
        self.altitude_feet = record.altitude_feet;
        self.altitude_meters = record.altitude_meters();
        self
    }
}

impl From<&LocationRecord> for LocationView {
    fn from(record: &LocationRecord) -> Self {
        LocationView::code_only(record.location.clone()).with_record(record)
    }
}
