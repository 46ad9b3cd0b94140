//! Google Calendar API v3 client.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{CalendarInfo, EventQuery};
use crate::raw_event::{RawEvent, RawEventTime};

use super::config::GoogleConfig;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Builds the HTTP client shared by the OAuth and Calendar requests.
pub(crate) fn build_http_client(config: &GoogleConfig) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))
}

/// Thin wrapper over the `events.list` and `calendarList.list` endpoints.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
}

impl GoogleCalendarClient {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Fetches one page of events for `query`.
    ///
    /// Recurring events are expanded by the service and ordered by start
    /// time. Only the first page is read; when the service reports more, the
    /// rest is dropped with a warning. Cancelled events are removed here.
    pub async fn list_events(
        &self,
        access_token: &str,
        query: &EventQuery,
    ) -> ProviderResult<Vec<RawEvent>> {
        let url = format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(&query.calendar_id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", query.window.start.to_rfc3339()),
                ("timeMax", query.window.end.to_rfc3339()),
                ("maxResults", query.max_results.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("showDeleted", "false".to_string()),
            ])
            .send()
            .await
            .map_err(request_error)?;

        let body = read_body(response).await?;
        let page: EventListResponse = parse_body(&body)?;

        if page.next_page_token.is_some() {
            warn!(
                "calendar {} has more than {} events in range; the rest are skipped",
                query.calendar_id, query.max_results
            );
        }

        let events = events_from_page(page, &query.calendar_id);
        debug!("fetched {} events from calendar {}", events.len(), query.calendar_id);
        Ok(events)
    }

    /// Lists every calendar on the account's calendar list.
    pub async fn list_calendars(&self, access_token: &str) -> ProviderResult<Vec<CalendarInfo>> {
        let url = format!("{}/users/me/calendarList", CALENDAR_API_BASE);
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http_client.get(&url).bearer_auth(access_token);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request.send().await.map_err(request_error)?;
            let body = read_body(response).await?;
            let page: CalendarListResponse = parse_body(&body)?;

            calendars.extend(page.items.into_iter().map(|entry| {
                CalendarInfo::new(entry.id, entry.summary).with_primary(entry.primary)
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("found {} calendars", calendars.len());
        Ok(calendars)
    }
}

fn request_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        "request timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    ProviderError::network(message).with_source(e)
}

async fn read_body(response: reqwest::Response) -> ProviderResult<String> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, &body));
    }
    response
        .text()
        .await
        .map_err(|e| ProviderError::network("failed to read response").with_source(e))
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> ProviderResult<T> {
    serde_json::from_str(body)
        .map_err(|e| ProviderError::invalid_response("failed to parse response").with_source(e))
}

/// Maps a non-success HTTP status to a provider error.
fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let detail = format!("HTTP {}: {}", status.as_u16(), body.trim());
    match status {
        StatusCode::UNAUTHORIZED => ProviderError::authentication(detail),
        StatusCode::FORBIDDEN => ProviderError::authorization(detail),
        StatusCode::NOT_FOUND => ProviderError::not_found(detail),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(detail),
        _ => ProviderError::server(detail),
    }
}

fn events_from_page(page: EventListResponse, calendar_id: &str) -> Vec<RawEvent> {
    page.items
        .into_iter()
        .filter_map(|event| convert_event(event, calendar_id))
        .filter(|event| !event.is_cancelled())
        .collect()
}

fn convert_event(event: ApiEvent, calendar_id: &str) -> Option<RawEvent> {
    let Some(id) = event.id else {
        warn!("skipping event without id in calendar {}", calendar_id);
        return None;
    };

    Some(RawEvent {
        id,
        calendar_id: calendar_id.to_string(),
        summary: event.summary,
        start: event.start.as_ref().and_then(ApiEventTime::to_raw),
        end: event.end.as_ref().and_then(ApiEventTime::to_raw),
        status: event.status,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

impl ApiEventTime {
    /// A timed value wins over a date when both are present.
    fn to_raw(&self) -> Option<RawEventTime> {
        match (&self.date_time, &self.date) {
            (Some(date_time), _) => RawEventTime::parse_date_time(date_time),
            (None, Some(date)) => RawEventTime::parse_date(date),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListEntry {
    id: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    primary: bool,
}
