//! # Temporal Values — UTC Canonicalization
//!
//! Dates travel as JSON strings. Two textual shapes are understood:
//!
//! - an RFC 3339 instant with any offset, canonicalized to UTC with a `Z`
//!   suffix (`2026-01-15T12:00:00Z`, sub-seconds kept only when non-zero);
//! - a calendar day `YYYY-MM-DD`, kept as written.
//!
//! Bounds on date models compare epoch milliseconds; a calendar day counts
//! as midnight UTC.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// A parsed date value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    Instant(DateTime<Utc>),
    Day(NaiveDate),
}

impl Temporal {
    /// Parse an RFC 3339 instant or a `YYYY-MM-DD` day.
    pub fn parse(text: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(Temporal::Instant(dt.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(text, DAY_FORMAT).ok().map(Temporal::Day)
    }

    /// The instant `millis` milliseconds after the Unix epoch.
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Temporal::Instant)
    }

    /// Milliseconds since the Unix epoch.
    pub fn epoch_millis(&self) -> Option<i64> {
        match self {
            Temporal::Instant(dt) => Some(dt.timestamp_millis()),
            Temporal::Day(day) => day
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc().timestamp_millis()),
        }
    }

    /// The UTC calendar day of this value.
    pub fn day(&self) -> NaiveDate {
        match self {
            Temporal::Instant(dt) => dt.date_naive(),
            Temporal::Day(day) => *day,
        }
    }

    /// Canonical string form.
    pub fn to_canonical(&self) -> String {
        match self {
            Temporal::Instant(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Temporal::Day(day) => day.format(DAY_FORMAT).to_string(),
        }
    }

    /// Canonical instant form; a day becomes midnight UTC.
    pub fn to_instant_string(&self) -> Option<String> {
        match self {
            Temporal::Instant(_) => Some(self.to_canonical()),
            Temporal::Day(day) => day
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }

    /// Canonical day form.
    pub fn to_day_string(&self) -> String {
        self.day().format(DAY_FORMAT).to_string()
    }
}
