//! Feed definitions: which columns each feed needs and how a row becomes a
//! stored record.

use chrono::{DateTime, Utc};
use csv::StringRecord;
use std::fmt;
use std::str::FromStr;

use storage::ReportKind;
use wx_common::{expire_seconds_at, is_valid_icao, LocationRecord};

use crate::error::RowError;

pub const METAR_FEED_URL: &str =
    "https://www.aviationweather.gov/adds/dataserver_current/current/metars.cache.csv";
pub const TAF_FEED_URL: &str =
    "https://www.aviationweather.gov/adds/dataserver_current/current/tafs.cache.csv";
pub const AIRPORTS_FEED_URL: &str = "https://ourairports.com/data/airports.csv";

/// METAR reports stay fresh for three hours after observation.
pub const METAR_WINDOW_SECS: i64 = 3 * 3600;
/// TAF reports expire exactly at the end of their validity period.
pub const TAF_WINDOW_SECS: i64 = 0;

const METAR_COLUMNS: &[&str] = &["raw_text", "station_id", "observation_time", "metar_type"];
const TAF_COLUMNS: &[&str] = &["raw_text", "station_id", "valid_time_to"];
const AIRPORT_COLUMNS: &[&str] = &[
    "type",
    "name",
    "latitude_deg",
    "longitude_deg",
    "elevation_ft",
    "iso_country",
    "iso_region",
    "municipality",
    "gps_code",
];

/// The three upstream feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Metar,
    Taf,
    Airports,
}

impl FeedKind {
    pub const ALL: [FeedKind; 3] = [FeedKind::Metar, FeedKind::Taf, FeedKind::Airports];

    pub fn name(&self) -> &'static str {
        match self {
            FeedKind::Metar => "metar",
            FeedKind::Taf => "taf",
            FeedKind::Airports => "airports",
        }
    }

    /// Column names looked up in the feed header, in the order the row
    /// parser expects them.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            FeedKind::Metar => METAR_COLUMNS,
            FeedKind::Taf => TAF_COLUMNS,
            FeedKind::Airports => AIRPORT_COLUMNS,
        }
    }

    /// TAF rows carry a variable number of forecast group columns.
    pub fn enforces_width(&self) -> bool {
        !matches!(self, FeedKind::Taf)
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            FeedKind::Metar => METAR_FEED_URL,
            FeedKind::Taf => TAF_FEED_URL,
            FeedKind::Airports => AIRPORTS_FEED_URL,
        }
    }

    /// Turn one data row into a record to store.
    ///
    /// `columns` are the indices resolved for [`columns`](Self::columns).
    pub fn parse_row(
        &self,
        columns: &[usize],
        row: &StringRecord,
        now: DateTime<Utc>,
    ) -> Result<FeedRecord, RowError> {
        let fields = Fields { columns, row };
        match self {
            FeedKind::Metar => parse_metar(&fields, now),
            FeedKind::Taf => parse_taf(&fields, now),
            FeedKind::Airports => parse_airport(&fields),
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "metar" | "metars" => Ok(FeedKind::Metar),
            "taf" | "tafs" => Ok(FeedKind::Taf),
            "airports" | "airport" | "locations" => Ok(FeedKind::Airports),
            other => Err(format!("unknown feed '{}'", other)),
        }
    }
}

/// A parsed feed row.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedRecord {
    Report {
        kind: ReportKind,
        location: String,
        text: String,
        ttl_secs: i64,
    },
    Location(LocationRecord),
}

impl FeedRecord {
    pub fn location(&self) -> &str {
        match self {
            FeedRecord::Report { location, .. } => location,
            FeedRecord::Location(record) => &record.location,
        }
    }
}

struct Fields<'a> {
    columns: &'a [usize],
    row: &'a StringRecord,
}

impl Fields<'_> {
    /// Value of the n-th requested column.
    fn get(&self, n: usize) -> Result<&str, RowError> {
        let idx = self.columns.get(n).copied().ok_or(RowError::MissingField(n))?;
        self.row.get(idx).ok_or(RowError::MissingField(idx))
    }

    fn location(&self, n: usize) -> Result<String, RowError> {
        let code = self.get(n)?;
        if !is_valid_icao(code) {
            return Err(RowError::InvalidLocation(code.to_string()));
        }
        Ok(code.to_string())
    }
}

fn parse_number<T: FromStr>(field: &'static str, value: &str) -> Result<T, RowError> {
    value.parse().map_err(|_| RowError::Number {
        field,
        value: value.to_string(),
    })
}

fn parse_metar(fields: &Fields<'_>, now: DateTime<Utc>) -> Result<FeedRecord, RowError> {
    let location = fields.location(1)?;
    let ttl_secs = expire_seconds_at(fields.get(2)?, METAR_WINDOW_SECS, now)?;
    let text = format!("{} {}", fields.get(3)?, fields.get(0)?);
    Ok(FeedRecord::Report {
        kind: ReportKind::Metar,
        location,
        text,
        ttl_secs,
    })
}

fn parse_taf(fields: &Fields<'_>, now: DateTime<Utc>) -> Result<FeedRecord, RowError> {
    let location = fields.location(1)?;
    let ttl_secs = expire_seconds_at(fields.get(2)?, TAF_WINDOW_SECS, now)?;
    Ok(FeedRecord::Report {
        kind: ReportKind::Taf,
        location,
        text: fields.get(0)?.to_string(),
        ttl_secs,
    })
}

fn parse_airport(fields: &Fields<'_>) -> Result<FeedRecord, RowError> {
    let location = fields.location(8)?;
    if fields.get(0)? == "closed" {
        return Err(RowError::Closed(location));
    }

    let altitude_feet = parse_number("elevation_ft", fields.get(4)?)?;
    let latitude = parse_number("latitude_deg", fields.get(2)?)?;
    let longitude = parse_number("longitude_deg", fields.get(3)?)?;

    Ok(FeedRecord::Location(LocationRecord {
        location,
        name: fields.get(1)?.to_string(),
        city: fields.get(7)?.to_string(),
        country_code: fields.get(5)?.to_string(),
        latitude,
        longitude,
        altitude_feet,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 12, 12, 0, 0).unwrap()
    }

    fn row(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_metar_row() {
        let record = FeedKind::Metar
            .parse_row(
                &[0, 1, 2, 3],
                &row(&[
                    "UKLL 121130Z 27005MPS CAVOK 18/06 Q1016 NOSIG",
                    "UKLL",
                    "2020-05-12T11:30:00Z",
                    "METAR",
                ]),
                now(),
            )
            .unwrap();

        assert_eq!(
            record,
            FeedRecord::Report {
                kind: ReportKind::Metar,
                location: "UKLL".to_string(),
                text: "METAR UKLL 121130Z 27005MPS CAVOK 18/06 Q1016 NOSIG".to_string(),
                ttl_secs: 9000,
            }
        );
    }

    #[test]
    fn test_taf_row_expires_at_valid_to() {
        let record = FeedKind::Taf
            .parse_row(
                &[2, 0, 1],
                &row(&["UKLL", "2020-05-12T18:00:00Z", "TAF UKLL 121100Z 1212/1218 27005MPS CAVOK", "extra"]),
                now(),
            )
            .unwrap();

        match record {
            FeedRecord::Report { kind, ttl_secs, text, .. } => {
                assert_eq!(kind, ReportKind::Taf);
                assert_eq!(ttl_secs, 6 * 3600);
                assert!(text.starts_with("TAF UKLL"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_timestamp_skips_row() {
        let err = FeedKind::Metar
            .parse_row(&[0, 1, 2, 3], &row(&["text", "UKLL", "yesterday", "METAR"]), now())
            .unwrap_err();
        assert_eq!(err.reason(), "timestamp");
    }

    #[test]
    fn test_invalid_station() {
        let err = FeedKind::Taf
            .parse_row(&[0, 1, 2], &row(&["text", "ukll", "2020-05-12T18:00:00Z"]), now())
            .unwrap_err();
        assert!(matches!(err, RowError::InvalidLocation(code) if code == "ukll"));
    }

    fn airport(kind: &str, gps_code: &str, elevation: &str) -> StringRecord {
        row(&[
            "4419",
            "UKLL",
            kind,
            "Lviv International Airport",
            "49.8125",
            "23.9561",
            elevation,
            "EU",
            "UA",
            "UA-46",
            "Lviv",
            "yes",
            gps_code,
        ])
    }

    const AIRPORT_INDICES: &[usize] = &[2, 3, 4, 5, 6, 8, 9, 10, 12];

    #[test]
    fn test_airport_row() {
        let record = FeedKind::Airports
            .parse_row(AIRPORT_INDICES, &airport("large_airport", "UKLL", "1071"), now())
            .unwrap();

        match record {
            FeedRecord::Location(loc) => {
                assert_eq!(loc.location, "UKLL");
                assert_eq!(loc.name, "Lviv International Airport");
                assert_eq!(loc.city, "Lviv");
                assert_eq!(loc.country_code, "UA");
                assert_eq!(loc.altitude_feet, 1071);
                assert!((loc.longitude - 23.9561).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_closed_airport_skipped() {
        let err = FeedKind::Airports
            .parse_row(AIRPORT_INDICES, &airport("closed", "UKLL", "1071"), now())
            .unwrap_err();
        assert!(matches!(err, RowError::Closed(_)));
    }

    #[test]
    fn test_airport_without_icao_code_skipped() {
        let err = FeedKind::Airports
            .parse_row(AIRPORT_INDICES, &airport("heliport", "", "1071"), now())
            .unwrap_err();
        assert!(matches!(err, RowError::InvalidLocation(_)));
    }

    #[test]
    fn test_airport_bad_elevation_skipped() {
        let err = FeedKind::Airports
            .parse_row(AIRPORT_INDICES, &airport("small_airport", "UKLL", ""), now())
            .unwrap_err();
        assert!(matches!(err, RowError::Number { field: "elevation_ft", .. }));
    }

    fn airport_at(latitude: &str, longitude: &str) -> StringRecord {
        let base = airport("medium_airport", "UKLL", "1071");
        let mut fields: Vec<&str> = base.iter().collect();
        fields[4] = latitude;
        fields[5] = longitude;
        row(&fields)
    }

    #[test]
    fn test_airport_bad_coordinates_skipped() {
        let err = FeedKind::Airports
            .parse_row(AIRPORT_INDICES, &airport_at("north", "23.9561"), now())
            .unwrap_err();
        assert!(matches!(err, RowError::Number { field: "latitude_deg", value } if value == "north"));

        let err = FeedKind::Airports
            .parse_row(AIRPORT_INDICES, &airport_at("49.8125", ""), now())
            .unwrap_err();
        assert!(matches!(err, RowError::Number { field: "longitude_deg", .. }));
    }

    #[test]
    fn test_feed_kind_from_str() {
        assert_eq!("METAR".parse::<FeedKind>().unwrap(), FeedKind::Metar);
        assert_eq!("airports".parse::<FeedKind>().unwrap(), FeedKind::Airports);
        assert!("pireps".parse::<FeedKind>().is_err());
    }

    #[test]
    fn test_only_taf_relaxes_width() {
        assert!(FeedKind::Metar.enforces_width());
        assert!(!FeedKind::Taf.enforces_width());
        assert!(FeedKind::Airports.enforces_width());
    }
}
