//! RawEvent to AgendaEvent conversion.
//!
//! Normalization is a field mapping. It never filters: cancelled records are
//! dropped by the event source, and events without usable times are dropped
//! later by the formatter.

use gcal_agenda_core::{AgendaEvent, EventTime};

use crate::raw_event::{RawEvent, RawEventTime};

/// Converts a [`RawEvent`] to an [`AgendaEvent`].
pub fn normalize_event(raw: &RawEvent) -> AgendaEvent {
    AgendaEvent {
        id: raw.id.clone(),
        calendar_id: raw.calendar_id.clone(),
        title: raw.summary.clone(),
        start: raw.start.map(convert_time),
        end: raw.end.map(convert_time),
    }
}

/// Converts a batch of raw events, preserving order.
pub fn normalize_events(raws: &[RawEvent]) -> Vec<AgendaEvent> {
    raws.iter().map(normalize_event).collect()
}

fn convert_time(raw: RawEventTime) -> EventTime {
    match raw {
        RawEventTime::DateTime(dt) => EventTime::from_utc(dt),
        RawEventTime::Date(date) => EventTime::from_date(date),
    }
}
