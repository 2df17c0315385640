//! What the display shows: countdown tiers and the per-mode view model

use chrono::NaiveDateTime;

use super::visit_date::VisitDate;

/// Current date/time line under the countdown headline
pub const CLOCK_FORMAT: &str = "%a %d %b %H:%M";

/// Visit date shown while setting it
pub const VISIT_LABEL_FORMAT: &str = "%a %d %b";

/// Headline tier for a whole-day countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownText {
    Today,
    OneDay,
    Days(i64),
}

impl CountdownText {
    /// Anything below one day (including past visits) reads "today"
    pub fn from_days(days: i64) -> Self {
        if days < 1 {
            Self::Today
        } else if days < 2 {
            Self::OneDay
        } else {
            Self::Days(days)
        }
    }
}

impl std::fmt::Display for CountdownText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Today => f.write_str("today"),
            Self::OneDay => f.write_str("1 day"),
            Self::Days(days) => write!(f, "{} days", days),
        }
    }
}

/// View model handed to the renderer each frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Countdown { headline: CountdownText, clock: String },
    VisitDate { label: String },
}

impl Screen {
    pub fn countdown(days: i64, now: NaiveDateTime) -> Self {
        Self::Countdown {
            headline: CountdownText::from_days(days),
            clock: now.format(CLOCK_FORMAT).to_string(),
        }
    }

    pub fn visit_date(visit: &VisitDate) -> Self {
        Self::VisitDate { label: visit.as_naive().format(VISIT_LABEL_FORMAT).to_string() }
    }
}
