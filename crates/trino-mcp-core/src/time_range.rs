//! Relative time ranges.
//!
//! Tool arguments such as `"1h"`, `"24h"` or `"7d"` are turned into a
//! negative offset in seconds from "now". Queries anchor the window as
//! `[now + offset, now)`, with "now" rendered as `0`.

/// Offset used when a time range cannot be parsed: one hour back.
pub const DEFAULT_OFFSET_SECONDS: i64 = -3_600;

/// Convert a `<integer><m|h|d>` string into a negative offset in seconds.
///
/// Malformed input falls back to [`DEFAULT_OFFSET_SECONDS`] rather than
/// failing the tool call.
pub fn to_offset_seconds(spec: &str) -> i64 {
    parse_offset(spec).unwrap_or(DEFAULT_OFFSET_SECONDS)
}

/// Strict variant of [`to_offset_seconds`]: `None` for malformed input.
pub fn parse_offset(spec: &str) -> Option<i64> {
    let unit = spec.chars().last()?;
    let magnitude = &spec[..spec.len() - unit.len_utf8()];
    let unit_seconds: i64 = match unit {
        'm' => 60,
        'h' => 3_600,
        'd' => 86_400,
        _ => return None,
    };
    if magnitude.is_empty() || !magnitude.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude: i64 = magnitude.parse().ok()?;
    magnitude.checked_mul(unit_seconds).map(|seconds| -seconds)
}
