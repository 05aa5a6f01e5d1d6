//! Time and Calendar Utilities Module
//!
//! Converts local wall-clock timestamps to UTC with a fixed offset, extracts the
//! ordinal day, and parses the date/time strings accepted on the command line.
//! There is no timezone database here: the caller supplies the offset, and no
//! daylight-saving rule is ever applied.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc,
};
use chrono_english::{Dialect, parse_date_string};

/// Timestamp format used for local date-times on input and in exported tables.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ===================== CALENDAR =====================

/// Ordinal day of the year (1..=366), leap years included.
pub fn day_of_year<D: Datelike>(date: &D) -> u32 {
    date.ordinal()
}

/// Convert a local wall-clock time to UTC by subtracting a fixed offset.
///
/// # Arguments
/// * `local` - Local date and time
/// * `utc_offset_hours` - Offset of local time from UTC in hours (may be fractional, e.g. 5.5)
pub fn to_utc(local: NaiveDateTime, utc_offset_hours: f64) -> NaiveDateTime {
    local - offset_duration(utc_offset_hours)
}

/// Decimal hour of day (0.0 ..< 24.0) of a UTC instant, including seconds.
pub fn decimal_hour(utc: &NaiveDateTime) -> f64 {
    utc.hour() as f64
        + utc.minute() as f64 / 60.0
        + (utc.second() as f64 + utc.nanosecond() as f64 * 1e-9) / 3600.0
}

fn offset_duration(utc_offset_hours: f64) -> Duration {
    // Whole seconds are plenty: offsets in practice are multiples of 15 minutes.
    Duration::seconds((utc_offset_hours * 3600.0).round() as i64)
}

/// Build a chrono `FixedOffset` from an hour offset, if it is representable.
pub fn fixed_offset(utc_offset_hours: f64) -> Option<FixedOffset> {
    FixedOffset::east_opt((utc_offset_hours * 3600.0).round() as i32)
}

// ===================== PARSING =====================

/// Parse a local date-time in `YYYY-MM-DD HH:MM[:SS]` (or ISO `T`-separated) form.
///
/// # Errors
/// Returns an error message if none of the accepted formats match
pub fn parse_local_datetime(s: &str) -> Result<NaiveDateTime, String> {
    let formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s.trim(), fmt) {
            return Ok(dt);
        }
    }
    Err(format!("Invalid date-time '{}'. Use YYYY-MM-DD HH:MM[:SS]", s))
}

/// Parse a calendar date.
///
/// Accepts ISO `YYYY-MM-DD` as well as English phrases such as "today" or
/// "tomorrow", which are resolved against `now` expressed at the given offset.
pub fn parse_local_date(
    s: &str,
    now: DateTime<Utc>,
    utc_offset_hours: f64,
) -> Result<NaiveDate, String> {
    if let Ok(d) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
        return Ok(d);
    }

    let offset = fixed_offset(utc_offset_hours)
        .ok_or_else(|| format!("UTC offset {} h is out of range", utc_offset_hours))?;
    let anchor = now.with_timezone(&offset);
    parse_date_string(s, anchor, Dialect::Us)
        .map(|dt| dt.date_naive())
        .map_err(|e| format!("Invalid date '{}': {}", s, e))
}

// ===================== TESTS =====================
