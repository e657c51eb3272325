//! ISO-8601 week-date calculator
//!
//! Maps a calendar date to its ISO week-numbering year and week number,
//! plus the canonical `YYYY-MM-DD` day key used for daily bucketing.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{KeepsakeError, Result};

/// ISO week-date information derived from a single calendar date.
///
/// Computed fresh per candidate and never cached; the struct only exists
/// for the duration of one classification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDateInfo {
    /// The original date rendered as `YYYY-MM-DD`
    pub day_key: String,
    /// ISO week-numbering year (can differ from the calendar year near
    /// year boundaries)
    pub iso_year: i32,
    /// ISO week number, 1-53
    pub iso_week: u32,
}

/// Compute the ISO week-numbering year and week for `date`.
///
/// The date is shifted to the Thursday of its ISO week first; the ISO year
/// is that Thursday's calendar year and the week number is derived from the
/// Thursday's ordinal day. Computing week/year from the unshifted date gives
/// wrong answers at year edges (Jan 1 can fall in week 52/53 of the prior
/// ISO year, late December in week 1 of the next).
pub fn iso_date_info(date: NaiveDate) -> Result<IsoDateInfo> {
    // Monday = 1 .. Sunday = 7
    let weekday = i64::from(date.weekday().number_from_monday());
    let thursday = date
        .checked_add_signed(Duration::days(4 - weekday))
        .ok_or_else(|| KeepsakeError::Calendar(date.to_string()))?;

    Ok(IsoDateInfo {
        day_key: date.format("%Y-%m-%d").to_string(),
        iso_year: thursday.year(),
        iso_week: 1 + (thursday.ordinal() - 1) / 7,
    })
}
