//! Parsing of human-readable byte sizes reported by the mailcow API.
//!
//! mailcow reports storage figures as strings such as `"12.4GB"` or `"512K"`.
//! All units are decimal (1000-based).

use thiserror::Error;

/// Unit suffixes and their scale, in match order.
///
/// Two-letter units come before the bare `B` and the single-letter units so
/// that `"12MB"` is never read as bytes or as a one-letter unit.
const UNITS: [(&str, f64); 9] = [
    ("KB", 1e3),
    ("MB", 1e6),
    ("GB", 1e9),
    ("TB", 1e12),
    ("B", 1.0),
    ("K", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SizeParseError {
    #[error("unrecognized size unit in {0:?}")]
    UnknownUnit(String),

    #[error("invalid size magnitude in {0:?}")]
    InvalidNumber(String),
}

/// Converts a unit-suffixed size string into a byte count.
///
/// The magnitude may be fractional; the scaled result is truncated toward
/// zero. Negative magnitudes are passed through.
pub fn parse_size(input: &str) -> Result<i64, SizeParseError> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (suffix, scale) = UNITS
        .iter()
        .find(|(suffix, _)| upper.ends_with(suffix))
        .ok_or_else(|| SizeParseError::UnknownUnit(input.to_string()))?;

    let magnitude = trimmed[..trimmed.len() - suffix.len()].trim();
    // "42XB" or "12GiB": a number followed by letters that are not a known unit.
    let digits = magnitude.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if digits.len() < magnitude.len() && digits.trim().parse::<f64>().is_ok() {
        return Err(SizeParseError::UnknownUnit(input.to_string()));
    }
    if magnitude.is_empty() {
        return Err(SizeParseError::InvalidNumber(input.to_string()));
    }

    let value: f64 = magnitude
        .parse()
        .map_err(|_| SizeParseError::InvalidNumber(input.to_string()))?;
    if !value.is_finite() {
        return Err(SizeParseError::InvalidNumber(input.to_string()));
    }

    Ok((value * scale) as i64)
}
