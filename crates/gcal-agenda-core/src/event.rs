//! Normalized agenda events.
//!
//! [`AgendaEvent`] is the provider-agnostic record the formatter works on.
//! `start` and `end` are optional; an event without a start sorts at the Unix
//! epoch and is dropped by the formatter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::EventTime;

/// Title used for events without a usable summary.
pub const NO_TITLE: &str = "No Title";

/// A calendar event normalized for agenda rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaEvent {
    /// Provider identifier of the event.
    pub id: String,
    /// Calendar the event was fetched from.
    pub calendar_id: String,
    /// Event title as given by the provider, untrimmed.
    pub title: Option<String>,
    /// When the event starts, if known.
    pub start: Option<EventTime>,
    /// When the event ends, if known.
    pub end: Option<EventTime>,
}

impl AgendaEvent {
    /// Creates an event with no title and no times.
    pub fn new(id: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            title: None,
            start: None,
            end: None,
        }
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method to set start and end.
    pub fn with_times(mut self, start: EventTime, end: EventTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Builder method to set only the start.
    pub fn with_start(mut self, start: EventTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Returns the trimmed title, or [`NO_TITLE`] when it is empty or absent.
    pub fn effective_title(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(NO_TITLE)
    }

    /// Returns the instant used for ordering and month bucketing.
    ///
    /// Timed starts are used as-is, all-day starts map to midnight UTC, and an
    /// event without a start sorts at the Unix epoch.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start
            .map(|start| start.to_utc_datetime())
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Sorts events by [`AgendaEvent::start_instant`], keeping input order for ties.
pub fn sort_chronologically(events: &mut [AgendaEvent]) {
    events.sort_by_key(AgendaEvent::start_instant);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn timed(id: &str, h: u32) -> AgendaEvent {
        let start = Utc.with_ymd_and_hms(2025, 8, 27, h, 0, 0).unwrap();
        AgendaEvent::new(id, "primary").with_times(
            EventTime::from_utc(start),
            EventTime::from_utc(start + chrono::Duration::minutes(30)),
        )
    }

    #[test]
    fn effective_title_trims_and_falls_back() {
        let event = AgendaEvent::new("a", "primary");
        assert_eq!(event.effective_title(), NO_TITLE);
        assert_eq!(event.clone().with_title("   ").effective_title(), NO_TITLE);
        assert_eq!(
            event.with_title("  Standup \n").effective_title(),
            "Standup"
        );
    }

    #[test]
    fn start_instant_for_timed_event() {
        let event = timed("a", 16);
        assert_eq!(
            event.start_instant(),
            Utc.with_ymd_and_hms(2025, 8, 27, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn start_instant_for_all_day_event() {
        let event = AgendaEvent::new("a", "primary")
            .with_start(EventTime::from_date(NaiveDate::from_ymd_opt(2025, 9, 5).unwrap()));
        assert_eq!(
            event.start_instant(),
            Utc.with_ymd_and_hms(2025, 9, 5, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn start_instant_without_start_is_epoch() {
        let event = AgendaEvent::new("a", "primary");
        assert_eq!(event.start_instant(), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn sort_is_chronological_and_stable() {
        let mut events = vec![
            timed("late", 18),
            AgendaEvent::new("broken", "primary"),
            timed("early-1", 9),
            timed("early-2", 9),
        ];
        sort_chronologically(&mut events);
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["broken", "early-1", "early-2", "late"]);
    }
}
