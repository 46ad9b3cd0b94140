//! EventSource trait definition.
//!
//! An [`EventSource`] lists calendars and the events of one calendar inside
//! a time window. Implementations guarantee that cancelled events never reach
//! the caller; nothing downstream filters them again.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use gcal_agenda_core::TimeWindow;

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::RawEvent;

/// Upper bound on events returned for one calendar per query. Anything past
/// it is dropped by the service; there is no pagination.
pub const MAX_EVENTS_PER_CALENDAR: usize = 2500;

/// Information about a calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInfo {
    pub id: String,
    /// Display name, as shown in the calendar UI.
    pub name: String,
    pub is_primary: bool,
}

impl CalendarInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_primary: false,
        }
    }

    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }
}

/// Parameters for [`EventSource::list_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub calendar_id: String,
    /// Events starting in this window are returned. Recurring events are
    /// expanded into their instances.
    pub window: TimeWindow,
    pub max_results: usize,
}

impl EventQuery {
    pub fn new(calendar_id: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            window,
            max_results: MAX_EVENTS_PER_CALENDAR,
        }
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }
}

/// A boxed future for async trait methods.
///
/// Boxing keeps the trait object-safe so the sync loop can hold a
/// `Box<dyn EventSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A read-only calendar backend.
pub trait EventSource: Send + Sync {
    /// Returns the name of this source, e.g. "google".
    fn name(&self) -> &str;

    /// Lists the events of one calendar, ordered by start time, with
    /// cancelled events removed.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network, authentication or response errors.
    fn list_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>>;

    /// Lists the calendars visible to the account.
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>>;
}

/// An in-memory source serving fixed calendars and events.
///
/// Calendars can be marked as failing to simulate a remote error.
#[derive(Debug, Default)]
pub struct StaticEventSource {
    calendars: Vec<CalendarInfo>,
    events: HashMap<String, Vec<RawEvent>>,
    failing: HashMap<String, ProviderError>,
}

impl StaticEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a calendar and its events.
    pub fn with_calendar(mut self, calendar: CalendarInfo, events: Vec<RawEvent>) -> Self {
        self.events.insert(calendar.id.clone(), events);
        self.calendars.push(calendar);
        self
    }

    /// Makes `list_events` fail for `calendar_id`.
    pub fn with_failure(mut self, calendar_id: impl Into<String>, error: ProviderError) -> Self {
        self.failing.insert(calendar_id.into(), error);
        self
    }
}

impl EventSource for StaticEventSource {
    fn name(&self) -> &str {
        "static"
    }

    fn list_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        let result = match self.failing.get(&query.calendar_id) {
            Some(error) => Err(copy_error(error, self.name())),
            None => match self.events.get(&query.calendar_id) {
                Some(events) => Ok(events
                    .iter()
                    .filter(|event| !event.is_cancelled())
                    .take(query.max_results)
                    .cloned()
                    .collect()),
                None => Err(ProviderError::not_found(format!(
                    "calendar '{}' not found",
                    query.calendar_id
                ))
                .with_provider(self.name())),
            },
        };
        Box::pin(async move { result })
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        let calendars = self.calendars.clone();
        Box::pin(async move { Ok(calendars) })
    }
}

/// A source that always returns an error.
///
/// Used as a placeholder when a real source fails to initialize.
#[derive(Debug)]
pub struct ErrorSource {
    name: String,
    error: ProviderError,
}

impl ErrorSource {
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl EventSource for ErrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_events(&self, _query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        let error = copy_error(&self.error, &self.name);
        Box::pin(async move { Err(error) })
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        let error = copy_error(&self.error, &self.name);
        Box::pin(async move { Err(error) })
    }
}

// ProviderError carries a boxed source and cannot be cloned.
fn copy_error(error: &ProviderError, provider: &str) -> ProviderError {
    ProviderError::new(error.code(), error.message()).with_provider(provider)
}
