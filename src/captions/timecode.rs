//! Conversion between fractional seconds and caption timestamp text.
//!
//! Two textual shapes are understood: `HH:MM:SS.mmm` as written by WebVTT and
//! `HH:MM:SS,mmm` as written by SRT. Hours may be omitted on input.

use once_cell::sync::Lazy;
use regex::Regex;

/// Strict WebVTT timestamp: optional hours, two-digit minutes and seconds, dot, three-digit millis.
static VTT_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(\d{2,}):)?([0-5]\d):([0-5]\d)\.(\d{3})$").unwrap());

/// Parse `HH:MM:SS.mmm` or `MM:SS.mmm` (comma or dot before the fraction).
///
/// Text that fits neither shape yields `0.0`.
pub fn parse_timestamp(text: &str) -> f64 {
    try_parse_timestamp(text).unwrap_or(0.0)
}

/// Like [`parse_timestamp`] but reports unparseable text as `None`.
pub fn try_parse_timestamp(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (parse_whole(h)?, parse_whole(m)?, parse_seconds(s)?),
        [m, s] => (0, parse_whole(m)?, parse_seconds(s)?),
        _ => return None,
    };

    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

/// Parse a timestamp in the strict form a WebVTT cue timing line requires.
pub fn parse_vtt_timestamp(text: &str) -> Option<f64> {
    let caps = VTT_TIMESTAMP.captures(text)?;
    let hours: u64 = caps.get(1).map_or(Some(0), |h| h.as_str().parse().ok())?;
    let minutes: u64 = caps[2].parse().ok()?;
    let seconds: u64 = caps[3].parse().ok()?;
    let millis: u64 = caps[4].parse().ok()?;

    let whole = hours.checked_mul(3600)?.checked_add(minutes * 60 + seconds)?;
    Some(whole as f64 + millis as f64 / 1000.0)
}

/// Format seconds as `HH:MM:SS,mmm`. Hours are not wrapped at 24.
pub fn format_srt_timestamp(seconds: f64) -> String {
    let (hours, minutes, secs, millis) = split_millis(seconds);
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Format seconds as `HH:MM:SS.mmm`.
pub fn format_vtt_timestamp(seconds: f64) -> String {
    let (hours, minutes, secs, millis) = split_millis(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

/// Round to millisecond precision.
pub fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

fn split_millis(seconds: f64) -> (u64, u64, u64, u64) {
    // Negative and NaN input saturate to zero.
    let total = (seconds.max(0.0) * 1000.0).round() as u64;
    (
        total / 3_600_000,
        (total % 3_600_000) / 60_000,
        (total % 60_000) / 1000,
        total % 1000,
    )
}

fn parse_whole(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_seconds(text: &str) -> Option<f64> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };
    parse_whole(whole)?;
    if let Some(fraction) = fraction {
        parse_whole(fraction)?;
    }
    text.parse().ok()
}
