//! Conversion between the configured local zone and canonical UTC instants.
//!
//! Storage and comparisons only ever see `DateTime<Utc>`. User input is parsed
//! here and rendering back to local time happens here.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::TimeParseError;

pub const DEFAULT_ZONE: &str = "America/Bogota";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const DATE_ONLY_LEN: usize = 10;
/// Hour of day assigned to date-only input.
const DATE_ONLY_HOUR: u32 = 9;

/// Placeholder rendered for a missing instant.
pub const NO_DATE: &str = "-";

pub fn parse_zone(name: &str) -> Result<Tz, TimeParseError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TimeParseError::UnknownZone(name.to_string()))
}

/// Parse `YYYY-MM-DD` (09:00 local) or `YYYY-MM-DD HH:MM` in `zone`.
///
/// An ambiguous local time resolves to the earlier instant; a local time that
/// falls into a DST gap is rejected.
pub fn parse_local(text: &str, zone: Tz) -> Result<DateTime<Utc>, TimeParseError> {
    let text = text.trim();
    let naive = if text.len() == DATE_ONLY_LEN {
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(DATE_ONLY_HOUR, 0, 0))
    } else {
        NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT).ok()
    }
    .ok_or_else(|| TimeParseError::InvalidFormat(text.to_string()))?;

    match zone.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(TimeParseError::NonexistentLocalTime {
            input: text.to_string(),
            zone: zone.name().to_string(),
        }),
    }
}

/// Render as `YYYY-MM-DD HH:MM` in `zone`, or `-` when absent.
pub fn format_local(instant: Option<DateTime<Utc>>, zone: Tz) -> String {
    match instant {
        Some(dt) => dt.with_timezone(&zone).format(DATE_TIME_FORMAT).to_string(),
        None => NO_DATE.to_string(),
    }
}

/// Calendar date of `instant` in UTC, the same calendar `month_range` uses.
pub fn format_utc_date(instant: DateTime<Utc>) -> String {
    instant.format(DATE_FORMAT).to_string()
}

/// Half-open UTC range `[first of month, first of next month)`.
pub fn month_range(
    year: i32,
    month: u32,
) -> Result<(DateTime<Utc>, DateTime<Utc>), TimeParseError> {
    let invalid = || TimeParseError::InvalidMonth { year, month };
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        year.checked_add(1)
            .and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1))
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    let midnight = |d: NaiveDate| d.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    Ok((
        midnight(start).ok_or_else(invalid)?,
        midnight(end).ok_or_else(invalid)?,
    ))
}
