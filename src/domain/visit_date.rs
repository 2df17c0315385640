//! The "next visit" date value and its day arithmetic
//!
//! Persisted as a single line `DD,MM,YYYY,HH,MM` in local wall-clock time.
//! Time zone rules are consulted only when converting to absolute instants
//! for `days_until` and `shift_days`.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike};
use std::path::PathBuf;

/// strftime layout of the persisted line
pub const VISIT_DATE_FORMAT: &str = "%d,%m,%Y,%H,%M";

const SECONDS_PER_DAY: i64 = 86_400;

/// Upper bound on the minute-by-minute search out of a DST gap
const MAX_GAP_MINUTES: i64 = 24 * 60;

#[derive(Debug, thiserror::Error)]
pub enum VisitDateError {
    /// Persisted line is malformed or names an impossible date/time.
    #[error("invalid visit date {line:?}: {reason}")]
    Parse { line: String, reason: String },

    /// Visit file could not be read or written.
    #[error("visit file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VisitDateError {
    fn parse(line: &str, reason: impl Into<String>) -> Self {
        Self::Parse { line: line.to_string(), reason: reason.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Local date and time of the next visit, minute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisitDate(NaiveDateTime);

impl VisitDate {
    /// Wrap a local date/time, dropping seconds
    pub fn new(local: NaiveDateTime) -> Self {
        let truncated = local.date().and_hms_opt(local.hour(), local.minute(), 0).unwrap_or(local);
        Self(truncated)
    }

    pub fn from_fields(day: u32, month: u32, year: i32, hour: u32, minute: u32) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        Some(Self(date.and_time(time)))
    }

    /// 00:00 on the given calendar day
    pub fn start_of_day(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN))
    }

    /// Parse one persisted line.
    ///
    /// Field widths are lenient (`1,5,2022,9,5` is accepted) and trailing
    /// whitespace is ignored; anything else must be digits in calendar range.
    pub fn parse(line: &str) -> Result<Self, VisitDateError> {
        let text = line.trim();
        if text.is_empty() {
            return Err(VisitDateError::parse(line, "empty"));
        }

        let fields: Vec<&str> = text.split(',').collect();
        if fields.len() != 5 {
            return Err(VisitDateError::parse(
                line,
                format!("expected 5 comma-separated fields, found {}", fields.len()),
            ));
        }

        let day = parse_field(line, "day", fields[0], 2)?;
        let month = parse_field(line, "month", fields[1], 2)?;
        let year = parse_field(line, "year", fields[2], 4)?;
        let hour = parse_field(line, "hour", fields[3], 2)?;
        let minute = parse_field(line, "minute", fields[4], 2)?;

        let date = NaiveDate::from_ymd_opt(year as i32, month, day)
            .ok_or_else(|| VisitDateError::parse(line, "no such calendar date"))?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| VisitDateError::parse(line, "hour or minute out of range"))?;

        Ok(Self(date.and_time(time)))
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl std::fmt::Display for VisitDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(VISIT_DATE_FORMAT))
    }
}

fn parse_field(line: &str, name: &str, raw: &str, max_width: usize) -> Result<u32, VisitDateError> {
    if raw.is_empty() || raw.len() > max_width || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VisitDateError::parse(
            line,
            format!("{} must be 1-{} digits, got {:?}", name, max_width, raw),
        ));
    }
    raw.parse::<u32>().map_err(|e| VisitDateError::parse(line, format!("{}: {}", name, e)))
}

/// Whole days between local midnight of `now`'s calendar date and `target`.
///
/// `floor((target - midnight) / 86400s)`, negative for past targets.
pub fn days_until<Tz: TimeZone>(tz: &Tz, target: &VisitDate, now: NaiveDateTime) -> i64 {
    days_from_midnight(tz, &resolve_local(tz, target.0), now)
}

/// As `days_until`, for a target already pinned to an instant
pub fn days_from_midnight<Tz: TimeZone>(tz: &Tz, target: &DateTime<Tz>, now: NaiveDateTime) -> i64 {
    let midnight = resolve_local(tz, now.date().and_time(NaiveTime::MIN));
    (target.timestamp() - midnight.timestamp()).div_euclid(SECONDS_PER_DAY)
}

/// Move an instant by `delta` periods of 24 hours of absolute time.
///
/// The offset travels with the instant, so across a DST change the wall-clock
/// hour moves with it and shifting back by the same amount restores the
/// original reading, including inside a fall-back overlap. Out of range
/// shifts leave the instant unchanged.
pub fn shift_days<Tz: TimeZone>(instant: &DateTime<Tz>, delta: i64) -> DateTime<Tz> {
    TimeDelta::try_days(delta)
        .and_then(|step| instant.clone().checked_add_signed(step))
        .unwrap_or_else(|| instant.clone())
}

/// Map a wall-clock reading to an instant.
///
/// Ambiguous readings (DST overlap) take the earliest instant; readings inside
/// a DST gap move forward to the first minute that exists.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            for minutes in 1..=MAX_GAP_MINUTES {
                let candidate = local + TimeDelta::minutes(minutes);
                if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
                    return dt;
                }
            }
            tz.from_utc_datetime(&local)
        }
    }
}
