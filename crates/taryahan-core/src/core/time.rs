// crates/taryahan-core/src/core/time.rs
// ============================================================================
// Module: Taryahan Time Model
// Description: Calendar dates and UTC timestamps carried by records.
// Purpose: Provide canonical, serializable date values with strict parsing.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Records carry two kinds of time values: a calendar [`MatchDate`] supplied by
//! callers, and store-stamped [`Timestamp`]s. The core never reads wall-clock
//! time directly; hosts pass the current timestamp into every write and
//! statistics call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;
use time::Date;
use time::Duration;
use time::Month;
use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Calendar Dates
// ============================================================================

/// Calendar date without time-of-day, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchDate(Date);

impl MatchDate {
    /// Wraps a calendar date.
    #[must_use]
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    /// Builds a date from numeric components.
    #[must_use]
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = Month::try_from(month).ok()?;
        Date::from_calendar_date(year, month, day).ok().map(Self)
    }

    /// Parses `YYYY-MM-DD`, or an RFC 3339 timestamp truncated to its date.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.len() > 10 {
            OffsetDateTime::parse(trimmed, &Rfc3339).ok()?;
        }
        parse_calendar_date(trimmed.get(..10)?)
    }

    /// Returns the wrapped calendar date.
    #[must_use]
    pub const fn date(self) -> Date {
        self.0
    }

    /// Returns the first day (Monday) of the week containing this date.
    #[must_use]
    pub fn week_start(self) -> Self {
        let offset = i64::from(self.0.weekday().number_days_from_monday());
        Self(self.0.checked_sub(Duration::days(offset)).unwrap_or(self.0))
    }

    /// Returns true when both dates fall in the same Monday-based week.
    #[must_use]
    pub fn same_week(self, other: Self) -> bool {
        self.week_start() == other.week_start()
    }

    /// Returns true when both dates fall in the same calendar month.
    #[must_use]
    pub fn same_month(self, other: Self) -> bool {
        self.0.year() == other.0.year() && self.0.month() == other.0.month()
    }
}

impl fmt::Display for MatchDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year(), u8::from(self.0.month()), self.0.day())
    }
}

impl Serialize for MatchDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MatchDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
    }
}

/// Parses a strict `YYYY-MM-DD` string.
fn parse_calendar_date(value: &str) -> Option<MatchDate> {
    let mut parts = value.split('-');
    let year = parts.next()?;
    let month = parts.next()?;
    let day = parts.next()?;
    if parts.next().is_some() || year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return None;
    }
    if !(year.bytes().chain(month.bytes()).chain(day.bytes())).all(|b| b.is_ascii_digit()) {
        return None;
    }
    MatchDate::from_ymd(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

// ============================================================================
// SECTION: Timestamps
// ============================================================================

/// UTC timestamp with second precision, rendered as RFC 3339.
///
/// # Invariants
/// - The offset is always UTC and the sub-second component is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Normalizes a date-time to UTC with whole seconds.
    #[must_use]
    pub fn from_datetime(value: OffsetDateTime) -> Self {
        let utc = value.checked_to_offset(UtcOffset::UTC).unwrap_or(value);
        Self(utc.replace_nanosecond(0).unwrap_or(utc))
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(OffsetDateTime::now_utc())
    }

    /// Builds a timestamp from unix seconds.
    #[must_use]
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(seconds).ok().map(Self::from_datetime)
    }

    /// Parses an RFC 3339 timestamp.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        OffsetDateTime::parse(value.trim(), &Rfc3339).ok().map(Self::from_datetime)
    }

    /// Returns seconds since the unix epoch.
    #[must_use]
    pub const fn unix_seconds(self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Returns the UTC calendar date of this timestamp.
    #[must_use]
    pub const fn date(self) -> MatchDate {
        MatchDate(self.0.date())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}T{:02}:{:02}:{:02}Z",
            self.date(),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
