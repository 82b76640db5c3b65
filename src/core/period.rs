//! Named analytics periods and the concrete windows they resolve to.

use super::error::AnalyticsError;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodToken {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    All,
}

impl Display for PeriodToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PeriodToken::Week => "week",
                PeriodToken::Month => "month",
                PeriodToken::Quarter => "quarter",
                PeriodToken::Year => "year",
                PeriodToken::All => "all",
            }
        )
    }
}

impl FromStr for PeriodToken {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(PeriodToken::Week),
            "month" => Ok(PeriodToken::Month),
            "quarter" => Ok(PeriodToken::Quarter),
            "year" => Ok(PeriodToken::Year),
            "all" => Ok(PeriodToken::All),
            _ => Err(AnalyticsError::InvalidPeriod(s.to_string())),
        }
    }
}

/// A closed `[start, end]` interval. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub period: PeriodToken,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    /// Transactions carry no time of day; they are placed at local midnight.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(date.and_time(chrono::NaiveTime::MIN))
    }

    /// The window of equal length that ends 1ms before this one starts.
    ///
    /// `None` for `all`, and for windows whose duration is not positive.
    pub fn previous(&self) -> Option<Window> {
        if self.period == PeriodToken::All {
            return None;
        }
        let length = self.duration();
        if length <= TimeDelta::zero() {
            return None;
        }
        let end = self.start - TimeDelta::milliseconds(1);
        Some(Window {
            period: self.period,
            start: end - length,
            end,
        })
    }
}

/// Moves `at` by whole calendar months, keeping the day of month and the time.
///
/// A day that does not exist in the target month overflows into the next one,
/// so Mar 31 minus one month is Mar 3 (Mar 2 in leap years).
pub fn shift_months(at: NaiveDateTime, months: i32) -> NaiveDateTime {
    let total = at.year() * 12 + at.month0() as i32 + months;
    let (year, month) = (total.div_euclid(12), total.rem_euclid(12) as u32 + 1);
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_days(Days::new(u64::from(at.day() - 1))))
        .map(|date| date.and_time(at.time()))
        .unwrap_or(at)
}

/// Resolves a period token into the window ending at `now`.
pub fn resolve_period(token: PeriodToken, now: NaiveDateTime) -> Window {
    let start = match token {
        PeriodToken::Week => now - TimeDelta::days(7),
        PeriodToken::Month => shift_months(now, -1),
        PeriodToken::Quarter => shift_months(now, -3),
        PeriodToken::Year => shift_months(now, -12),
        PeriodToken::All => DateTime::<Utc>::UNIX_EPOCH.naive_utc(),
    };
    Window {
        period: token,
        start,
        end: now,
    }
}
