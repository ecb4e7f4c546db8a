//! Calendar primitives: analysis windows and date coercion.
//!
//! Upstream extraction hands over dates in several shapes (ISO-8601 strings,
//! native timestamps, epoch milliseconds, `{seconds, nanoseconds}` objects).
//! [`coerce_date`] is the one place where all of them become a calendar day,
//! so that format differences never silently drop a record.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::invalid_format(
                "date_range",
                format!("start {} is after end {}", start, end),
            ));
        }
        Ok(Self { start, end })
    }

    /// The `days`-long window that ends on (and includes) `end`.
    ///
    /// A zero-length lookback is treated as a single day. Fails when the
    /// start would fall before the earliest representable date.
    pub fn ending_on(end: NaiveDate, days: u32) -> Result<Self, ValidationError> {
        let span = i64::from(days.max(1)) - 1;
        let start = end.checked_sub_signed(Duration::days(span)).ok_or_else(|| {
            ValidationError::invalid_format(
                "lookback_days",
                format!("{} days before {} is outside the calendar", days, end),
            )
        })?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the window, both ends included.
    pub fn len_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Zero-based position of `date` within the window.
    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        self.contains(date)
            .then(|| (date - self.start).num_days() as usize)
    }

    /// Every day of the window in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.len_days() as i64).map(move |offset| start + Duration::days(offset))
    }
}

/// A date as delivered by upstream extraction, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    /// Plain calendar day (`2024-05-01`).
    Day(NaiveDate),
    /// Zoned timestamp (`2024-05-01T21:14:00+02:00`).
    Native(DateTime<Utc>),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// Document-store timestamp object.
    EpochParts {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(alias = "_nanoseconds", default)]
        nanoseconds: u32,
    },
    /// Anything else; parsed leniently by [`coerce_date`].
    Text(String),
}

impl From<NaiveDate> for RawDate {
    fn from(date: NaiveDate) -> Self {
        RawDate::Day(date)
    }
}

impl From<DateTime<Utc>> for RawDate {
    fn from(dt: DateTime<Utc>) -> Self {
        RawDate::Native(dt)
    }
}

impl From<&str> for RawDate {
    fn from(s: &str) -> Self {
        RawDate::Text(s.to_string())
    }
}

/// Normalizes any [`RawDate`] to the UTC calendar day it denotes.
pub fn coerce_date(raw: &RawDate) -> Result<NaiveDate, ValidationError> {
    match raw {
        RawDate::Day(date) => Ok(*date),
        RawDate::Native(dt) => Ok(dt.date_naive()),
        RawDate::EpochMillis(millis) => from_epoch_millis(*millis),
        RawDate::EpochParts {
            seconds,
            nanoseconds,
        } => Utc
            .timestamp_opt(*seconds, *nanoseconds)
            .single()
            .map(|dt| dt.date_naive())
            .ok_or_else(|| {
                ValidationError::invalid_format("date", format!("epoch seconds {} out of range", seconds))
            }),
        RawDate::Text(text) => parse_date_text(text),
    }
}

fn from_epoch_millis(millis: i64) -> Result<NaiveDate, ValidationError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.date_naive())
        .ok_or_else(|| {
            ValidationError::invalid_format("date", format!("epoch millis {} out of range", millis))
        })
}

fn parse_date_text(text: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field("date"));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y/%m/%d") {
        return Ok(date);
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(number) = trimmed.parse::<i64>() {
            // Ten digits or fewer reads as epoch seconds.
            let millis = if trimmed.len() <= 10 { number.saturating_mul(1000) } else { number };
            return from_epoch_millis(millis);
        }
    }

    Err(ValidationError::invalid_format(
        "date",
        format!("unrecognized date '{}'", trimmed),
    ))
}
