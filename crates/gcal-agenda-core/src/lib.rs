//! Core types: time, months, events, agenda formatting

pub mod event;
pub mod format;
pub mod month;
pub mod time;
pub mod tracing;

pub use event::{AgendaEvent, NO_TITLE, sort_chronologically};
pub use format::{AgendaEntry, AgendaFormatter};
pub use month::{AGENDA_MONTHS, YearMonth, fetch_window, target_months};
pub use time::{DEFAULT_DISPLAY_TIMEZONE, EventTime, TimeWindow, TimezoneError, parse_timezone};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
