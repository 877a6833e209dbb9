//! Calendar rules deciding when a scheduled job fires.
//!
//! Rules are plain data read from `config.toml`:
//!
//! ```toml
//! rule = { every = "day" }
//! rule = { every = "week", weekday = "Mon" }
//! rule = { every = "month", days = [1, 15] }
//! rule = { every = "year", month = 1, day = 1 }
//! ```
//!
//! A day of month past the end of a short month fires on that month's last day.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Longest gap between two fires of any valid rule, with slack for leap years.
const SEARCH_HORIZON_DAYS: i64 = 800;

/// When a job fires, at its configured time of day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "every", rename_all = "lowercase")]
pub enum CalendarRule {
    /// Every day
    Day,
    /// Once a week on `weekday`
    Week {
        /// Day of the week to fire on
        weekday: Weekday,
    },
    /// On each listed day of every month
    Month {
        /// Days of month, 1-31
        days: Vec<u32>,
    },
    /// Once a year
    Year {
        /// Month, 1-12
        month: u32,
        /// Day of month, 1-31
        day: u32,
    },
}

impl CalendarRule {
    /// Checks the rule can ever fire.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::Day | Self::Week { .. } => Ok(()),
            Self::Month { days } => {
                if days.is_empty() {
                    return Err("monthly rule needs at least one day".to_string());
                }
                match days.iter().find(|d| !(1..=31).contains(*d)) {
                    Some(bad) => Err(format!("day {bad} is outside 1-31")),
                    None => Ok(()),
                }
            }
            Self::Year { month, day } => {
                if !(1..=12).contains(month) {
                    return Err(format!("month {month} is outside 1-12"));
                }
                if !(1..=31).contains(day) {
                    return Err(format!("day {day} is outside 1-31"));
                }
                Ok(())
            }
        }
    }

    /// Whether the rule fires on `date`.
    #[must_use]
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            Self::Day => true,
            Self::Week { weekday } => date.weekday() == *weekday,
            Self::Month { days } => days.iter().any(|&d| falls_on(date, d)),
            Self::Year { month, day } => date.month() == *month && falls_on(date, *day),
        }
    }

    /// First fire instant strictly after `after`, firing at `at` (UTC).
    ///
    /// Returns `None` only for rules that fail [`CalendarRule::validate`].
    #[must_use]
    pub fn next_after(&self, after: DateTime<Utc>, at: NaiveTime) -> Option<DateTime<Utc>> {
        let start = after.date_naive();
        (0..=SEARCH_HORIZON_DAYS)
            .map(|offset| start + Duration::days(offset))
            .filter(|date| self.matches(*date))
            .map(|date| date.and_time(at).and_utc())
            .find(|candidate| *candidate > after)
    }
}

/// Number of days in the given month.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// Whether `date` is the day a "day `day` of the month" schedule lands on,
/// clamping days past the month's end to its last day.
#[must_use]
pub fn falls_on(date: NaiveDate, day: u32) -> bool {
    date.day() == day.min(days_in_month(date.year(), date.month()))
}
