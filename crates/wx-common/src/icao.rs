//! ICAO location code validation.

/// Maximum number of locations accepted in a single batch request.
pub const MAX_LOCATIONS: usize = 16;

/// Check a string against the ICAO location pattern `[A-Z][A-Z0-9]{3}`.
pub fn is_valid_icao(code: &str) -> bool {
    let bytes = code.as_bytes();
    if bytes.len() != 4 {
        return false;
    }
    if !bytes[0].is_ascii_uppercase() {
        return false;
    }
    bytes[1..]
        .iter()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
