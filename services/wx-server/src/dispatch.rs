//! Request dispatch: URL path and query to endpoint and location selector.
//!
//! Path forms are `/{endpoint}` and `/{endpoint}/{CODE}`; the batch form
//! passes codes in the query as `?location=CODE1,CODE2` (repeatable).

use std::fmt;

use percent_encoding::percent_decode_str;
use url::form_urlencoded;
use wx_common::{is_valid_icao, WxError, WxResult, MAX_LOCATIONS};

const PARAM_LOCATION: &str = "location";

/// Data endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Metar,
    Taf,
    /// Location metadata only
    Location,
    /// Metadata, METAR and TAF
    All,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [Endpoint::Metar, Endpoint::Taf, Endpoint::Location, Endpoint::All];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Metar => "metar",
            Endpoint::Taf => "taf",
            Endpoint::Location => "location",
            Endpoint::All => "all",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which locations a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `/{endpoint}/{CODE}`: one object in the response
    Single(String),
    /// `?location=...`: an array in the response
    Batch(Vec<String>),
}

/// A validated data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub selector: Selector,
}

/// Percent-decode a raw request path.
///
/// Escapes that do not decode to UTF-8 make the path invalid.
pub fn decode_path(raw: &str) -> WxResult<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|path| path.into_owned())
        .map_err(|_| WxError::InvalidPath(raw.to_string()))
}

/// Whether the first path segment names a data endpoint.
pub fn is_endpoint_path(path: &str) -> bool {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let first = trimmed.split('/').next().unwrap_or_default();
    Endpoint::from_name(first).is_some()
}

/// Split a URL path into endpoint name and optional single location.
///
/// The location is uppercased. A single trailing `/` is ignored.
pub fn parse_path(path: &str) -> WxResult<(String, Option<String>)> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err(WxError::InvalidPath(path.to_string()));
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    match segments.as_slice() {
        [endpoint] => Ok((endpoint.to_string(), None)),
        [endpoint, location] if location.is_empty() => Ok((endpoint.to_string(), None)),
        [endpoint, location] => Ok((endpoint.to_string(), Some(location.to_uppercase()))),
        _ => Err(WxError::InvalidPath(path.to_string())),
    }
}

/// Parse the location list out of a raw URL query.
///
/// Every `location` value is split on commas and uppercased; repeated
/// parameters are concatenated in order. Empty items are kept. Any other
/// parameter is an error.
pub fn parse_query(query: &str) -> WxResult<Vec<String>> {
    check_escapes(query).map_err(|message| WxError::InvalidQuery {
        query: query.to_string(),
        message,
    })?;

    let mut locations = Vec::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key != PARAM_LOCATION {
            return Err(WxError::InvalidQuery {
                query: query.to_string(),
                message: format!("Unknown parameter {}", key),
            });
        }
        locations.extend(value.split(',').map(str::to_uppercase));
    }
    Ok(locations)
}

/// Reject malformed percent escapes and `;` separators.
fn check_escapes(query: &str) -> Result<(), String> {
    let bytes = query.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let valid = bytes
                    .get(i + 1..i + 3)
                    .map_or(false, |hex| hex.iter().all(u8::is_ascii_hexdigit));
                if !valid {
                    let end = (i + 3).min(bytes.len());
                    return Err(format!(
                        "invalid URL escape {}",
                        String::from_utf8_lossy(&bytes[i..end])
                    ));
                }
                i += 3;
            }
            b';' => return Err("invalid semicolon separator in query".to_string()),
            _ => i += 1,
        }
    }
    Ok(())
}

/// Turn a request path and query into a validated [`ApiRequest`].
///
/// Error precedence: path and query syntax (400), unknown endpoint (422),
/// missing or conflicting selectors (422), batch size (403), location code
/// syntax (422).
pub fn dispatch(path: &str, query: Option<&str>) -> WxResult<ApiRequest> {
    let (endpoint_name, single) = parse_path(path)?;
    let batch = parse_query(query.unwrap_or_default())?;

    let endpoint = Endpoint::from_name(&endpoint_name)
        .ok_or_else(|| WxError::UnknownEndpoint(endpoint_name.clone()))?;

    let selector = match (single, batch.is_empty()) {
        (Some(code), true) => {
            validate_location(&code)?;
            Selector::Single(code)
        }
        (None, false) => {
            if batch.len() > MAX_LOCATIONS {
                return Err(WxError::TooManyLocations {
                    count: batch.len(),
                    max: MAX_LOCATIONS,
                });
            }
            for code in &batch {
                validate_location(code)?;
            }
            Selector::Batch(batch)
        }
        (None, true) => return Err(WxError::MissingLocation),
        (Some(single), false) => return Err(WxError::ConflictingLocations { single, batch }),
    };

    Ok(ApiRequest { endpoint, selector })
}

fn validate_location(code: &str) -> WxResult<()> {
    if is_valid_icao(code) {
        Ok(())
    } else {
        Err(WxError::InvalidLocation(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(n: usize) -> String {
        (0..n)
            .map(|i| format!("K{:03}", i))
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(
            parse_path("/metar/UKLL").unwrap(),
            ("metar".to_string(), Some("UKLL".to_string()))
        );
        assert_eq!(parse_path("/taf").unwrap(), ("taf".to_string(), None));
        assert_eq!(parse_path("/taf/").unwrap(), ("taf".to_string(), None));
        assert_eq!(
            parse_path("/all/ukll/").unwrap(),
            ("all".to_string(), Some("UKLL".to_string()))
        );
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/metar/UK%4CL").unwrap(), "/metar/UKLL");
        assert_eq!(decode_path("/%6Detar/ukll").unwrap(), "/metar/ukll");
        assert_eq!(decode_path("/taf").unwrap(), "/taf");
        assert!(matches!(decode_path("/metar/%FF%FE"), Err(WxError::InvalidPath(_))));
    }

    #[test]
    fn test_parse_path_errors() {
        assert!(matches!(parse_path("/a/b/c"), Err(WxError::InvalidPath(_))));
        assert!(matches!(parse_path("/"), Err(WxError::InvalidPath(_))));
        assert!(matches!(parse_path("/metar/UKLL//"), Err(WxError::InvalidPath(_))));
    }

    #[test]
    fn test_parse_query() {
        let locations = parse_query("location=ukll,UKBB&location=egll").unwrap();
        assert_eq!(locations, vec!["UKLL", "UKBB", "EGLL"]);
        assert!(parse_query("").unwrap().is_empty());
        assert_eq!(parse_query("location=UKLL,").unwrap(), vec!["UKLL", ""]);
    }

    #[test]
    fn test_parse_query_errors() {
        assert!(matches!(
            parse_query("location=UKLL&format=xml"),
            Err(WxError::InvalidQuery { .. })
        ));
        assert!(matches!(parse_query("location=UK%zzL"), Err(WxError::InvalidQuery { .. })));
        assert!(matches!(parse_query("location=UKLL%2"), Err(WxError::InvalidQuery { .. })));
        assert!(matches!(parse_query("location=UKLL;x=1"), Err(WxError::InvalidQuery { .. })));
        assert_eq!(parse_query("location=UKLL%2CUKBB").unwrap(), vec!["UKLL", "UKBB"]);
    }

    #[test]
    fn test_dispatch_single() {
        let request = dispatch("/metar/UKLL", None).unwrap();
        assert_eq!(request.endpoint, Endpoint::Metar);
        assert_eq!(request.selector, Selector::Single("UKLL".to_string()));
    }

    #[test]
    fn test_dispatch_batch() {
        let request = dispatch("/all", Some("location=UKLL,UKBB")).unwrap();
        assert_eq!(request.endpoint, Endpoint::All);
        assert_eq!(
            request.selector,
            Selector::Batch(vec!["UKLL".to_string(), "UKBB".to_string()])
        );
    }

    #[test]
    fn test_dispatch_selector_errors() {
        assert!(matches!(dispatch("/metar", None), Err(WxError::MissingLocation)));
        assert!(matches!(dispatch("/metar/", Some("")), Err(WxError::MissingLocation)));
        assert!(matches!(
            dispatch("/metar/UKLL", Some("location=UKBB")),
            Err(WxError::ConflictingLocations { .. })
        ));
        assert!(matches!(
            dispatch("/weather/UKLL", None),
            Err(WxError::UnknownEndpoint(name)) if name == "weather"
        ));
    }

    #[test]
    fn test_dispatch_location_limit() {
        let query = format!("location={}", codes(MAX_LOCATIONS));
        assert!(dispatch("/taf", Some(&query)).is_ok());

        let query = format!("location={}", codes(MAX_LOCATIONS + 1));
        assert!(matches!(
            dispatch("/taf", Some(&query)),
            Err(WxError::TooManyLocations { count: 17, max: 16 })
        ));
    }

    #[test]
    fn test_size_checked_before_codes() {
        let query = format!("location={}", vec!["bad!"; 17].join(","));
        assert!(matches!(
            dispatch("/taf", Some(&query)),
            Err(WxError::TooManyLocations { .. })
        ));
    }

    #[test]
    fn test_one_invalid_code_rejects_batch() {
        assert!(matches!(
            dispatch("/metar", Some("location=UKLL,1KLL,UKBB")),
            Err(WxError::InvalidLocation(code)) if code == "1KLL"
        ));
        assert!(matches!(
            dispatch("/metar", Some("location=UKLL,")),
            Err(WxError::InvalidLocation(code)) if code.is_empty()
        ));
        assert!(matches!(dispatch("/metar/UKLLL", None), Err(WxError::InvalidLocation(_))));
    }

    #[test]
    fn test_is_endpoint_path() {
        assert!(is_endpoint_path("/metar"));
        assert!(is_endpoint_path("/location/UKLL"));
        assert!(is_endpoint_path("/all/a/b"));
        assert!(!is_endpoint_path("/metars"));
        assert!(!is_endpoint_path("/a/b/c"));
        assert!(!is_endpoint_path("/"));
    }
}
