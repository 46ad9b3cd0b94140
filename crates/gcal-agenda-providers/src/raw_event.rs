//! Raw event records as returned by an event source.
//!
//! [`RawEvent`] keeps what the service sent, before normalization into a core
//! [`AgendaEvent`](gcal_agenda_core::AgendaEvent). Start and end are optional
//! because the service does not guarantee either.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Start or end of a raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RawEventTime {
    /// A specific instant, converted to UTC.
    DateTime(DateTime<Utc>),
    /// An all-day date.
    Date(NaiveDate),
}

impl RawEventTime {
    /// Parses an RFC 3339 timestamp such as `2025-08-27T09:00:00-07:00` or
    /// `2025-08-27T16:00:00Z`.
    ///
    /// A timestamp without any offset is read as UTC. Returns `None` (with a
    /// warning) when the text is not a timestamp.
    pub fn parse_date_time(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(Self::DateTime(dt.with_timezone(&Utc)));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Some(Self::DateTime(naive.and_utc()));
            }
        }
        warn!("ignoring unparseable timestamp {:?}", text);
        None
    }

    /// Parses an all-day date (`YYYY-MM-DD`).
    pub fn parse_date(text: &str) -> Option<Self> {
        match NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
            Ok(date) => Some(Self::Date(date)),
            Err(e) => {
                warn!("ignoring unparseable date {:?}: {}", text, e);
                None
            }
        }
    }
}

/// A raw calendar event from an event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Identifier of the event within its calendar.
    pub id: String,

    /// The calendar this event was fetched from.
    pub calendar_id: String,

    /// The event title, untrimmed.
    pub summary: Option<String>,

    pub start: Option<RawEventTime>,

    pub end: Option<RawEventTime>,

    /// Event status as sent by the service ("confirmed", "tentative",
    /// "cancelled").
    pub status: Option<String>,
}

impl RawEvent {
    /// Creates an event with no title, times or status.
    pub fn new(id: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            summary: None,
            start: None,
            end: None,
            status: None,
        }
    }

    /// Returns true if the service marked the event as cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_times(mut self, start: RawEventTime, end: RawEventTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_start(mut self, start: RawEventTime) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}
