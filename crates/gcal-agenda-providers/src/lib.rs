//! Event sources for gcal-agenda.
//!
//! - [`EventSource`] - read-only calendar backend trait
//! - [`RawEvent`] - event records as the backend sent them
//! - [`normalize_event`] - conversion into core [`AgendaEvent`](gcal_agenda_core::AgendaEvent)s
//! - [`ProviderError`] - errors raised by sources
//!
//! ```text
//! Google Calendar API
//!          │
//!          ▼
//!  ┌────────────────┐
//!  │ GoogleProvider │  drops cancelled events
//!  └───────┬────────┘
//!          │ EventSource
//!          ▼
//!    ┌───────────┐
//!    │ RawEvent  │
//!    └─────┬─────┘
//!          ▼ normalize_event()
//!   ┌─────────────┐
//!   │ AgendaEvent │
//!   └─────────────┘
//! ```

pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod normalize;
pub mod provider;
pub mod raw_event;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{normalize_event, normalize_events};
pub use provider::{
    BoxFuture, CalendarInfo, ErrorSource, EventQuery, EventSource, MAX_EVENTS_PER_CALENDAR,
    StaticEventSource,
};
pub use raw_event::{RawEvent, RawEventTime};
