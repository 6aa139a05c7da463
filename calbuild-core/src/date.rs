//! Date text handling.
//!
//! Event dates travel through the pipeline as text. This module knows the two
//! accepted textual shapes, turns text into instants for sorting and export,
//! and decomposes instants into wall-clock parts in the export zone.

use std::fmt;
use std::sync::OnceLock;

use chrono::{
    DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::{CalBuildError, CalBuildResult};

static DATE_TIME_SHAPE: OnceLock<Regex> = OnceLock::new();
static DATE_SHAPE: OnceLock<Regex> = OnceLock::new();

/// `YYYY-MM-DDTHH:MM` followed by anything (seconds, fraction, offset)
fn date_time_shape() -> &'static Regex {
    DATE_TIME_SHAPE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}").expect("Invalid date-time shape pattern")
    })
}

/// Bare `YYYY-MM-DD`
fn date_shape() -> &'static Regex {
    DATE_SHAPE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid date shape pattern")
    })
}

/// Length of a bare `YYYY-MM-DD` date.
pub const BARE_DATE_LEN: usize = 10;

/// Whether `text` is a full date-time or a bare date.
pub fn has_accepted_shape(text: &str) -> bool {
    date_time_shape().is_match(text) || date_shape().is_match(text)
}

pub fn is_bare_date(text: &str) -> bool {
    date_shape().is_match(text)
}

/// The zone wall-clock values are interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The system's local zone
    #[default]
    Local,
    Named(Tz),
}

impl Zone {
    pub fn utc() -> Self {
        Zone::Named(Tz::UTC)
    }

    /// Look up an IANA zone name such as `Europe/Berlin`.
    pub fn from_name(name: &str) -> CalBuildResult<Self> {
        name.trim()
            .parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| CalBuildError::UnknownTimezone(name.to_string()))
    }

    /// Anchor a wall-clock time in this zone. Ambiguous times resolve to the
    /// earlier instant; times inside a DST gap have no instant.
    pub fn anchor(&self, wall: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Zone::Local => Local
                .from_local_datetime(&wall)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            Zone::Named(tz) => tz
                .from_local_datetime(&wall)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// Wall-clock time of `instant` in this zone.
    pub fn wall_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Zone::Local => instant.with_timezone(&Local).naive_local(),
            Zone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Zone::Local => write!(f, "local"),
            Zone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// Parse event date text into an instant.
///
/// Accepts RFC 3339 (`Z` or numeric offset, seconds optional), offset-less
/// `YYYY-MM-DDTHH:MM[:SS[.fff]]` and bare `YYYY-MM-DD`. Offset-less values are
/// wall-clock times in `zone`; bare dates are midnight in `zone`.
pub fn parse_instant(text: &str, zone: &Zone) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    // RFC 3339 without seconds, e.g. 2024-06-03T09:00Z
    let with_offset = match text.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => text.to_string(),
    };
    if let Ok(dt) = DateTime::parse_from_str(&with_offset, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&Utc));
    }

    parse_wall_time(text).and_then(|wall| zone.anchor(wall))
}

fn parse_wall_time(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Render an instant the way converted calendar times are stored.
pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Calendar components of a date, down to the day or down to the minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateParts {
    Day {
        year: i32,
        month: u32,
        day: u32,
    },
    Minute {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    },
}

impl DateParts {
    /// Decompose date text in `zone`. Seconds are discarded.
    ///
    /// A bare date asked for as an all-day value decomposes from the date
    /// itself, without passing through an instant.
    pub fn decompose(text: &str, all_day: bool, zone: &Zone) -> Option<Self> {
        let text = text.trim();

        if all_day && is_bare_date(text) {
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
            return Some(Self::day_of(date));
        }

        let wall = zone.wall_time(parse_instant(text, zone)?);
        if all_day {
            return Some(Self::day_of(wall.date()));
        }

        Some(DateParts::Minute {
            year: wall.year(),
            month: wall.month(),
            day: wall.day(),
            hour: wall.hour(),
            minute: wall.minute(),
        })
    }

    fn day_of(date: NaiveDate) -> Self {
        DateParts::Day {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    /// Rebuild the calendar date, if the tuple names a real one.
    pub fn date(&self) -> Option<NaiveDate> {
        match *self {
            DateParts::Day { year, month, day } | DateParts::Minute { year, month, day, .. } => {
                NaiveDate::from_ymd_opt(year, month, day)
            }
        }
    }

    /// Rebuild the wall-clock time; all-day parts yield `None`.
    pub fn wall_time(&self) -> Option<NaiveDateTime> {
        match *self {
            DateParts::Day { .. } => None,
            DateParts::Minute { hour, minute, .. } => self.date()?.and_hms_opt(hour, minute, 0),
        }
    }
}
