//! Calendar months and the rolling three-month agenda window.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::time::TimeWindow;

/// Number of months covered by one agenda run (current month included).
pub const AGENDA_MONTHS: usize = 3;

/// A calendar month, identified by year and 1-based month number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a year/month, returning `None` when the month is out of range
    /// or the year is not representable.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Returns the month that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns the first day of this month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("validated on construction")
    }

    /// Returns the following month, wrapping December into January.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Returns the agenda file name for this month (`YYYY-MM.org`).
    pub fn file_name(&self) -> String {
        format!("{self}.org")
    }

    /// Returns true if `instant`, seen on the wall clock of `tz`, falls in this month.
    pub fn contains<Tz: TimeZone>(&self, instant: DateTime<Utc>, tz: &Tz) -> bool {
        let local = instant.with_timezone(tz);
        local.year() == self.year && local.month() == self.month
    }

    /// Returns the UTC instant of local midnight on the first day of this month.
    pub fn start_in<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Utc> {
        let midnight = self.first_day().and_time(NaiveTime::MIN);
        tz.from_local_datetime(&midnight)
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
            .with_timezone(&Utc)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Returns the month containing `today` followed by the next two months.
///
/// Each step adds 32 days to the first of the current month and truncates back
/// to day 1, which always lands in the following month.
pub fn target_months(today: NaiveDate) -> [YearMonth; AGENDA_MONTHS] {
    let first = YearMonth::containing(today).first_day();
    std::array::from_fn(|i| YearMonth::containing(first + Duration::days(32 * i as i64)))
}

/// Returns the fetch window spanning `first` through the end of `last`,
/// using local midnights in `tz`.
pub fn fetch_window<Tz: TimeZone>(first: YearMonth, last: YearMonth, tz: &Tz) -> TimeWindow {
    TimeWindow::new(first.start_in(tz), last.next().start_in(tz))
}
