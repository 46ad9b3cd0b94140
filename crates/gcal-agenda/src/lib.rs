//! Google Calendar to monthly Org agenda files.
//!
//! This crate provides the `gcal-agenda` command-line tool: it resolves the
//! selected calendars, fetches three months of events and rewrites one
//! `YYYY-MM.org` file per month.

pub mod calendars;
pub mod cli;
pub mod config;
pub mod error;
pub mod regenerate;
pub mod source;
pub mod sync;

pub use calendars::{CalendarSelection, ResolvedCalendars};
pub use cli::Cli;
pub use config::{FileConfig, Settings};
pub use error::{ClientError, ClientResult};
pub use source::event_source;
pub use sync::{AgendaSync, SyncReport};
