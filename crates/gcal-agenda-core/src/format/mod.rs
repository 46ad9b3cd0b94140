//! Org-mode agenda formatting.
//!
//! [`AgendaFormatter`] turns [`AgendaEvent`]s into Org entries and whole
//! monthly files:
//!
//! ```text
//! #+title: 2025-08
//!
//! * Standup
//! <2025-08-27 Wed 09:00-09:30>
//! ```
//!
//! Timed events are converted to the display timezone. The date and weekday
//! always come from the start, and the end is printed as a bare time even when
//! the event runs past midnight. All-day events become a fixed 06:00-06:30
//! slot on their date.
//!
//! # Example
//!
//! ```rust
//! use gcal_agenda_core::format::AgendaFormatter;
//! use gcal_agenda_core::{AgendaEvent, EventTime};
//! use chrono::NaiveDate;
//!
//! let formatter = AgendaFormatter::default();
//! let day = NaiveDate::from_ymd_opt(2025, 9, 5).unwrap();
//! let event = AgendaEvent::new("evt-1", "primary")
//!     .with_title("Holiday")
//!     .with_start(EventTime::from_date(day));
//!
//! let entry = formatter.render(&event).unwrap();
//! assert_eq!(entry.to_string(), "* Holiday\n<2025-09-05 Fri 06:00-06:30>");
//! ```

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use tracing::debug;

use crate::event::AgendaEvent;
use crate::month::YearMonth;
use crate::time::{DEFAULT_DISPLAY_TIMEZONE, EventTime};

/// Local wall-clock slot (hour, minute) used for all-day events.
const ALL_DAY_START: (u32, u32) = (6, 0);
const ALL_DAY_END: (u32, u32) = (6, 30);

/// One rendered agenda entry: a heading and its active timestamp range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaEntry {
    /// Heading text (already trimmed).
    pub title: String,
    /// Local start in the display timezone.
    pub start: NaiveDateTime,
    /// Local end in the display timezone.
    pub end: NaiveDateTime,
}

impl AgendaEntry {
    /// Returns the Org active timestamp, e.g. `<2025-08-27 Wed 09:00-09:30>`.
    pub fn timestamp(&self) -> String {
        format!(
            "<{} {}-{}>",
            self.start.format("%Y-%m-%d %a"),
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
        )
    }
}

impl fmt::Display for AgendaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "* {}\n{}", self.title, self.timestamp())
    }
}

/// Renders events and monthly agenda files in a fixed display timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgendaFormatter {
    tz: Tz,
}

impl Default for AgendaFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_TIMEZONE)
    }
}

impl AgendaFormatter {
    /// Creates a formatter that renders in `tz`.
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Returns the display timezone.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Renders a single event.
    ///
    /// Returns `None` when the event has no start, or a timed start without a
    /// timed end.
    pub fn render(&self, event: &AgendaEvent) -> Option<AgendaEntry> {
        let (start, end) = match (event.start?, event.end) {
            (EventTime::DateTime(start), Some(EventTime::DateTime(end))) => (
                start.with_timezone(&self.tz).naive_local(),
                end.with_timezone(&self.tz).naive_local(),
            ),
            (EventTime::AllDay(date), _) => all_day_slot(date)?,
            _ => return None,
        };

        Some(AgendaEntry {
            title: event.effective_title().to_string(),
            start,
            end,
        })
    }

    /// Returns true if the event's start instant falls in `month` on the
    /// display timezone's calendar.
    pub fn in_month(&self, event: &AgendaEvent, month: YearMonth) -> bool {
        month.contains(event.start_instant(), &self.tz)
    }

    /// Renders the complete agenda file for `month`.
    ///
    /// `events` must already be sorted chronologically; entries are emitted in
    /// input order. Events the formatter cannot render are skipped.
    pub fn render_month(&self, events: &[AgendaEvent], month: YearMonth) -> String {
        let mut lines = vec![format!("#+title: {month}"), String::new()];

        let entries: Vec<String> = events
            .iter()
            .filter(|event| self.in_month(event, month))
            .filter_map(|event| self.render(event))
            .map(|entry| entry.to_string())
            .collect();

        debug!("{} entries for {}", entries.len(), month);
        lines.extend(entries);
        lines.join("\n")
    }
}

fn all_day_slot(date: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = date.and_hms_opt(ALL_DAY_START.0, ALL_DAY_START.1, 0)?;
    let end = date.and_hms_opt(ALL_DAY_END.0, ALL_DAY_END.1, 0)?;
    Some((start, end))
}
