//! One agenda run: fetch, render, write.

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use gcal_agenda_core::{
    AgendaEvent, AgendaFormatter, YearMonth, fetch_window, sort_chronologically, target_months,
};
use gcal_agenda_providers::{EventQuery, EventSource, normalize_events};

use crate::calendars::CalendarSelection;
use crate::error::ClientResult;
use crate::regenerate::regenerate;

/// What a run fetched and wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub months: Vec<YearMonth>,
    /// `(calendar name, events fetched)` for each calendar that answered.
    pub fetched: Vec<(String, usize)>,
    /// Calendars whose fetch failed.
    pub skipped: Vec<String>,
    /// Selected names that matched no calendar.
    pub unresolved: Vec<String>,
    pub written: Vec<PathBuf>,
}

impl SyncReport {
    pub fn total_events(&self) -> usize {
        self.fetched.iter().map(|(_, count)| count).sum()
    }

    /// True when some selected calendar contributed nothing because it
    /// failed or was not found.
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty() || !self.unresolved.is_empty()
    }

    /// One-line description of the run, naming any missing calendars.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} events from {} calendars, {} files written",
            self.total_events(),
            self.fetched.len(),
            self.written.len()
        );
        if !self.skipped.is_empty() {
            summary.push_str(&format!("; failed: {}", self.skipped.join(", ")));
        }
        if !self.unresolved.is_empty() {
            summary.push_str(&format!("; not found: {}", self.unresolved.join(", ")));
        }
        summary
    }
}

/// Regenerates the agenda files from an [`EventSource`].
pub struct AgendaSync {
    source: Box<dyn EventSource>,
    formatter: AgendaFormatter,
    selection: CalendarSelection,
    output_dir: PathBuf,
}

impl AgendaSync {
    pub fn new(
        source: Box<dyn EventSource>,
        formatter: AgendaFormatter,
        selection: CalendarSelection,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            formatter,
            selection,
            output_dir: output_dir.into(),
        }
    }

    /// Runs once for the three months starting at `today`'s month.
    ///
    /// A calendar that fails to load is skipped unless the error is fatal
    /// (bad credentials or configuration), which aborts the run before any
    /// file is touched.
    pub async fn run(&self, today: NaiveDate) -> ClientResult<SyncReport> {
        let months = target_months(today);
        let tz = self.formatter.timezone();
        let window = fetch_window(months[0], months[months.len() - 1], &tz);
        info!(
            "Processing months: {}",
            months.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );
        debug!("fetch window {} to {} ({})", window.start, window.end, tz);

        let resolved = self.selection.resolve(self.source.as_ref()).await?;
        let mut report = SyncReport {
            months: months.to_vec(),
            unresolved: resolved.unresolved.clone(),
            ..Default::default()
        };

        let mut events: Vec<AgendaEvent> = Vec::new();
        for (id, name) in &resolved.calendars {
            match self.source.list_events(EventQuery::new(id, window)).await {
                Ok(raws) => {
                    info!("Fetched {} events from calendar: {}", raws.len(), name);
                    report.fetched.push((name.clone(), raws.len()));
                    events.extend(normalize_events(&raws));
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!("skipping calendar {}: {}", name, e);
                    report.skipped.push(name.clone());
                }
            }
        }

        sort_chronologically(&mut events);

        let rendered: Vec<(YearMonth, String)> = months
            .iter()
            .map(|&month| (month, self.formatter.render_month(&events, month)))
            .collect();

        report.written = regenerate(&self.output_dir, &rendered)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use gcal_agenda_providers::{
        CalendarInfo, ErrorSource, ProviderError, RawEvent, RawEventTime, StaticEventSource,
    };
    use std::fs;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()
    }

    fn timed(id: &str, calendar: &str, title: &str, start: DateTime<Utc>, minutes: i64) -> RawEvent {
        RawEvent::new(id, calendar).with_summary(title).with_times(
            RawEventTime::DateTime(start),
            RawEventTime::DateTime(start + chrono::Duration::minutes(minutes)),
        )
    }

    fn sync(source: StaticEventSource, selection: &str, out: &std::path::Path) -> AgendaSync {
        AgendaSync::new(
            Box::new(source),
            AgendaFormatter::new("Etc/GMT+7".parse().unwrap()),
            CalendarSelection::parse(selection),
            out,
        )
    }

    #[tokio::test]
    async fn writes_three_month_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = StaticEventSource::new().with_calendar(
            CalendarInfo::new("primary", "me@example.com").with_primary(true),
            vec![timed("s", "primary", "Standup", utc(2025, 8, 27, 16, 0), 30)],
        );

        let report = sync(source, "", dir.path()).run(today()).await.unwrap();

        assert!(!report.is_partial());
        assert_eq!(report.summary(), "1 events from 1 calendars, 3 files written");
        assert_eq!(report.months.len(), 3);
        assert_eq!(report.fetched, [("primary".to_string(), 1)]);
        assert_eq!(report.total_events(), 1);
        assert_eq!(
            report.written,
            ["2025-08.org", "2025-09.org", "2025-10.org"].map(|name| dir.path().join(name))
        );

        let august = fs::read_to_string(dir.path().join("2025-08.org")).unwrap();
        insta::assert_snapshot!(august, @r"
        #+title: 2025-08

        * Standup
        <2025-08-27 Wed 09:00-09:30>
        ");
        assert_eq!(
            fs::read_to_string(dir.path().join("2025-09.org")).unwrap(),
            "#+title: 2025-09\n"
        );
    }

    #[tokio::test]
    async fn merges_calendars_in_start_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = StaticEventSource::new()
            .with_calendar(
                CalendarInfo::new("work-id", "Work"),
                vec![
                    timed("w1", "work-id", "Review", utc(2025, 9, 3, 17, 0), 60),
                    RawEvent::new("w2", "work-id")
                        .with_summary("Dropped")
                        .with_status("cancelled")
                        .with_start(RawEventTime::DateTime(utc(2025, 9, 1, 16, 0))),
                ],
            )
            .with_calendar(
                CalendarInfo::new("family-id", "Family"),
                vec![
                    RawEvent::new("f1", "family-id").with_summary("Picnic").with_times(
                        RawEventTime::Date(NaiveDate::from_ymd_opt(2025, 9, 2).unwrap()),
                        RawEventTime::Date(NaiveDate::from_ymd_opt(2025, 9, 3).unwrap()),
                    ),
                ],
            );

        let report = sync(source, "Work|Family", dir.path()).run(today()).await.unwrap();

        assert_eq!(
            report.fetched,
            [("Work".to_string(), 1), ("Family".to_string(), 1)]
        );
        let september = fs::read_to_string(dir.path().join("2025-09.org")).unwrap();
        insta::assert_snapshot!(september, @r"
        #+title: 2025-09

        * Picnic
        <2025-09-02 Tue 06:00-06:30>
        * Review
        <2025-09-03 Wed 10:00-11:00>
        ");
    }

    #[tokio::test]
    async fn failing_calendar_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = StaticEventSource::new()
            .with_calendar(
                CalendarInfo::new("primary", "Me"),
                vec![timed("s", "primary", "Standup", utc(2025, 8, 27, 16, 0), 30)],
            )
            .with_calendar(CalendarInfo::new("work-id", "Work"), vec![])
            .with_failure("work-id", ProviderError::server("HTTP 500"));

        let report = sync(source, "Work|primary|Holidays", dir.path())
            .run(today())
            .await
            .unwrap();

        assert_eq!(report.skipped, ["Work"]);
        assert_eq!(report.unresolved, ["Holidays"]);
        assert_eq!(report.fetched, [("primary".to_string(), 1)]);
        assert!(report.is_partial());
        assert_eq!(
            report.summary(),
            "1 events from 1 calendars, 3 files written; failed: Work; not found: Holidays"
        );
        assert!(
            fs::read_to_string(dir.path().join("2025-08.org"))
                .unwrap()
                .contains("* Standup")
        );
    }

    #[tokio::test]
    async fn fatal_error_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("2025-08.org");
        fs::write(&stale, "#+title: 2025-08\n\n* Old").unwrap();

        let sync = AgendaSync::new(
            Box::new(ErrorSource::new(
                "google",
                ProviderError::authentication("token revoked"),
            )),
            AgendaFormatter::default(),
            CalendarSelection::default(),
            dir.path(),
        );

        assert!(sync.run(today()).await.is_err());
        assert_eq!(fs::read_to_string(&stale).unwrap(), "#+title: 2025-08\n\n* Old");
        assert!(!dir.path().join("2025-09.org").exists());
    }

    #[cfg(feature = "google")]
    #[tokio::test]
    async fn unreadable_token_file_leaves_agenda_untouched() {
        use gcal_agenda_providers::google::{
            FileCredentialStore, GoogleConfig, GoogleProvider, OAuthCredentials,
        };

        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("google-token.json");
        fs::write(&token_path, "not json").unwrap();
        let out = dir.path().join("agenda");
        fs::create_dir_all(&out).unwrap();
        let august = out.join("2025-08.org");
        let existing = "#+title: 2025-08\n\n* Real meeting\n<2025-08-27 Wed 09:00-09:30>";
        fs::write(&august, existing).unwrap();

        let provider = GoogleProvider::new(
            GoogleConfig::new(OAuthCredentials::new(
                "123-abc.apps.googleusercontent.com",
                "secret",
            )),
            Box::new(FileCredentialStore::new(&token_path)),
        )
        .unwrap();
        let sync = AgendaSync::new(
            Box::new(provider),
            AgendaFormatter::default(),
            CalendarSelection::parse("primary|Work"),
            &out,
        );

        let err = sync.run(today()).await.unwrap_err();

        assert!(matches!(err, crate::ClientError::Provider(ref e) if e.is_fatal()));
        assert_eq!(fs::read_to_string(&august).unwrap(), existing);
        assert!(!out.join("2025-09.org").exists());
    }

    #[tokio::test]
    async fn rerun_replaces_stale_entries() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("2025-08.org");
        fs::write(&stale, "#+title: 2025-08\n\n* Gone\n<2025-08-01 Fri 10:00-11:00>").unwrap();
        let source = StaticEventSource::new().with_calendar(
            CalendarInfo::new("primary", "Me"),
            vec![timed("s", "primary", "Standup", utc(2025, 8, 27, 16, 0), 30)],
        );
        let sync = sync(source, "", dir.path());

        sync.run(today()).await.unwrap();
        let first = fs::read_to_string(&stale).unwrap();
        sync.run(today()).await.unwrap();
        let second = fs::read_to_string(&stale).unwrap();

        assert!(!first.contains("Gone"));
        assert_eq!(first, second);
    }
}
