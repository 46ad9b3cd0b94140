//! Calendar selection by display name.

use tracing::{debug, warn};

use gcal_agenda_providers::{CalendarInfo, EventSource};

use crate::error::ClientResult;

/// Calendar id that always refers to the account's own calendar.
pub const PRIMARY_CALENDAR: &str = "primary";

/// Calendar display names to export, as configured.
///
/// An empty selection means the primary calendar only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarSelection {
    names: Vec<String>,
}

impl CalendarSelection {
    /// Parses a `|`-separated list of names. Names are trimmed and empty
    /// segments ignored.
    pub fn parse(value: &str) -> Self {
        let names = value
            .split('|')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// True when nothing but the primary calendar is selected.
    pub fn is_primary_only(&self) -> bool {
        self.names.iter().all(|name| name == PRIMARY_CALENDAR)
    }

    /// Maps the selected names to calendar ids.
    ///
    /// `primary` needs no lookup. Other names are compared case-insensitively
    /// with the calendar list, fetched at most once. A non-fatal failure to
    /// list calendars leaves those names unresolved.
    pub async fn resolve(&self, source: &dyn EventSource) -> ClientResult<ResolvedCalendars> {
        let mut resolved = ResolvedCalendars::default();
        if self.names.is_empty() {
            resolved.push(PRIMARY_CALENDAR, PRIMARY_CALENDAR);
            return Ok(resolved);
        }

        let mut listing: Option<Vec<CalendarInfo>> = None;

        for name in &self.names {
            if name == PRIMARY_CALENDAR {
                resolved.push(PRIMARY_CALENDAR, PRIMARY_CALENDAR);
                continue;
            }

            if listing.is_none() {
                listing = Some(match source.list_calendars().await {
                    Ok(calendars) => {
                        debug!("{} calendars available", calendars.len());
                        calendars
                    }
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => {
                        warn!("could not list calendars: {}", e);
                        Vec::new()
                    }
                });
            }

            let wanted = name.to_lowercase();
            let found = listing
                .iter()
                .flatten()
                .find(|calendar| calendar.name.to_lowercase() == wanted);

            match found {
                Some(calendar) => {
                    debug!("calendar '{}' is {}", name, calendar.id);
                    resolved.push(&calendar.id, name);
                }
                None => {
                    warn!("calendar '{}' not found, skipping", name);
                    resolved.unresolved.push(name.clone());
                }
            }
        }

        Ok(resolved)
    }
}

/// Outcome of [`CalendarSelection::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCalendars {
    /// `(calendar id, configured name)` in selection order, without
    /// duplicate ids.
    pub calendars: Vec<(String, String)>,
    /// Names that matched no calendar.
    pub unresolved: Vec<String>,
}

impl ResolvedCalendars {
    fn push(&mut self, id: &str, name: &str) {
        if !self.calendars.iter().any(|(known, _)| known == id) {
            self.calendars.push((id.to_string(), name.to_string()));
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.calendars.iter().map(|(id, _)| id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcal_agenda_providers::{ErrorSource, ProviderError, StaticEventSource};

    fn source() -> StaticEventSource {
        StaticEventSource::new()
            .with_calendar(
                CalendarInfo::new("me@example.com", "me@example.com").with_primary(true),
                vec![],
            )
            .with_calendar(CalendarInfo::new("work-id", "Work"), vec![])
            .with_calendar(CalendarInfo::new("family-id", "Family"), vec![])
    }

    #[test]
    fn parse_trims_and_drops_empty_names() {
        let selection = CalendarSelection::parse(" Work | |Family|");
        assert_eq!(selection.names(), ["Work", "Family"]);

        assert!(CalendarSelection::parse("").is_primary_only());
        assert!(CalendarSelection::parse(" | ").names().is_empty());
        assert!(!CalendarSelection::parse("Work").is_primary_only());
    }

    #[tokio::test]
    async fn empty_selection_is_primary() {
        let resolved = CalendarSelection::default()
            .resolve(&ErrorSource::new("google", ProviderError::server("down")))
            .await
            .unwrap();

        assert_eq!(resolved.ids().collect::<Vec<_>>(), ["primary"]);
        assert!(resolved.unresolved.is_empty());
    }

    #[tokio::test]
    async fn names_match_case_insensitively() {
        let resolved = CalendarSelection::parse("work|FAMILY|primary|Work")
            .resolve(&source())
            .await
            .unwrap();

        assert_eq!(
            resolved.ids().collect::<Vec<_>>(),
            ["work-id", "family-id", "primary"]
        );
        assert_eq!(resolved.calendars[0].1, "work");
    }

    #[tokio::test]
    async fn unknown_names_are_unresolved() {
        let resolved = CalendarSelection::parse("Work|Holidays")
            .resolve(&source())
            .await
            .unwrap();

        assert_eq!(resolved.ids().collect::<Vec<_>>(), ["work-id"]);
        assert_eq!(resolved.unresolved, ["Holidays"]);
    }

    #[tokio::test]
    async fn primary_needs_no_listing() {
        let failing = ErrorSource::new("google", ProviderError::authentication("expired"));

        let resolved = CalendarSelection::parse("primary")
            .resolve(&failing)
            .await
            .unwrap();

        assert_eq!(resolved.ids().collect::<Vec<_>>(), ["primary"]);
    }

    #[tokio::test]
    async fn listing_failure_leaves_names_unresolved() {
        let failing = ErrorSource::new("google", ProviderError::server("HTTP 503"));

        let resolved = CalendarSelection::parse("primary|Work")
            .resolve(&failing)
            .await
            .unwrap();

        assert_eq!(resolved.ids().collect::<Vec<_>>(), ["primary"]);
        assert_eq!(resolved.unresolved, ["Work"]);
    }

    #[tokio::test]
    async fn fatal_listing_failure_propagates() {
        let failing = ErrorSource::new("google", ProviderError::authentication("revoked"));

        let result = CalendarSelection::parse("Work").resolve(&failing).await;

        assert!(result.is_err());
    }
}
