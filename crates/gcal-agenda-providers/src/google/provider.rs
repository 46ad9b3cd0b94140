//! [`EventSource`] implementation for Google Calendar.

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarInfo, EventQuery, EventSource};
use crate::raw_event::RawEvent;

use super::client::{GoogleCalendarClient, build_http_client};
use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::{CredentialStore, TokenInfo};

const PROVIDER_NAME: &str = "google";

/// Google Calendar event source.
///
/// Tokens come from the injected [`CredentialStore`]. When none are stored,
/// or they lack the configured scopes, the first request runs the browser
/// consent flow; expired tokens are refreshed. New tokens are saved back to
/// the store.
pub struct GoogleProvider {
    config: GoogleConfig,
    store: Box<dyn CredentialStore>,
    oauth_client: OAuthClient,
    api_client: GoogleCalendarClient,
    /// Tokens for this process, loaded from the store on first use.
    tokens: Mutex<Option<TokenInfo>>,
}

impl GoogleProvider {
    /// Creates the provider. No network traffic happens until the first
    /// request.
    pub fn new(config: GoogleConfig, store: Box<dyn CredentialStore>) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;

        let http_client = build_http_client(&config)?;
        let oauth_client = OAuthClient::new(config.credentials.clone(), http_client.clone());

        Ok(Self {
            config,
            store,
            oauth_client,
            api_client: GoogleCalendarClient::new(http_client),
            tokens: Mutex::new(None),
        })
    }

    /// Returns a usable access token, authorizing or refreshing as needed.
    ///
    /// Any failure here, including an unreadable token store or a failed
    /// refresh, is reported as an authentication error so the run stops
    /// before output is touched.
    async fn access_token(&self) -> ProviderResult<String> {
        self.obtain_token()
            .await
            .map_err(ProviderError::into_authentication)
    }

    async fn obtain_token(&self) -> ProviderResult<String> {
        let mut cached = self.tokens.lock().await;

        if cached.is_none() {
            *cached = self.store.load()?;
        }

        let tokens = match cached.take() {
            Some(tokens) if !tokens.has_scopes(&self.config.scopes) => {
                info!("stored Google token lacks required scopes, authorizing again");
                self.authorize().await?
            }
            Some(tokens) if tokens.is_expired() => match tokens.refresh_token.clone() {
                Some(refresh_token) => {
                    debug!("refreshing expired access token");
                    let (access_token, expires_in) =
                        self.oauth_client.refresh(&refresh_token).await?;
                    let tokens = tokens.refreshed(access_token, expires_in);
                    self.store.save(&tokens)?;
                    tokens
                }
                None => {
                    info!("stored Google token expired without a refresh token");
                    self.authorize().await?
                }
            },
            Some(tokens) => tokens,
            None => {
                info!("no stored Google token, starting authorization");
                self.authorize().await?
            }
        };

        let access_token = tokens.access_token.clone();
        *cached = Some(tokens);
        Ok(access_token)
    }

    async fn authorize(&self) -> ProviderResult<TokenInfo> {
        let tokens = self
            .oauth_client
            .authorize(&self.config.scopes, self.config.loopback_port_range)
            .await?;
        self.store.save(&tokens)?;
        Ok(tokens)
    }

    async fn list_events_impl(&self, query: EventQuery) -> ProviderResult<Vec<RawEvent>> {
        let token = self.access_token().await?;
        self.api_client.list_events(&token, &query).await
    }

    async fn list_calendars_impl(&self) -> ProviderResult<Vec<CalendarInfo>> {
        let token = self.access_token().await?;
        self.api_client.list_calendars(&token).await
    }
}

impl EventSource for GoogleProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move {
            self.list_events_impl(query)
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        Box::pin(async move {
            self.list_calendars_impl()
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::google::config::OAuthCredentials;
    use crate::google::tokens::MemoryCredentialStore;

    fn test_config() -> GoogleConfig {
        GoogleConfig::new(OAuthCredentials::new(
            "test-client.apps.googleusercontent.com",
            "test-secret",
        ))
    }

    fn valid_tokens() -> TokenInfo {
        TokenInfo::new(
            "cached-access",
            Some("refresh".to_string()),
            Some(3600),
            vec![GoogleConfig::DEFAULT_SCOPE.to_string()],
        )
    }

    #[test]
    fn rejects_invalid_credentials() {
        let config = GoogleConfig::new(OAuthCredentials::new("bad-id", "secret"));
        let err = GoogleProvider::new(config, Box::new(MemoryCredentialStore::new())).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.provider(), Some("google"));
    }

    #[test]
    fn name_is_google() {
        let provider =
            GoogleProvider::new(test_config(), Box::new(MemoryCredentialStore::new())).unwrap();
        assert_eq!(provider.name(), "google");
    }

    #[tokio::test]
    async fn valid_stored_token_is_used_without_network() {
        let store = MemoryCredentialStore::with_tokens(valid_tokens());
        let provider = GoogleProvider::new(test_config(), Box::new(store)).unwrap();

        assert_eq!(provider.access_token().await.unwrap(), "cached-access");
        // Second call is served from the in-process cache.
        assert_eq!(provider.access_token().await.unwrap(), "cached-access");
    }

    struct BrokenStore;

    impl CredentialStore for BrokenStore {
        fn load(&self) -> ProviderResult<Option<TokenInfo>> {
            Err(ProviderError::internal("failed to read token file"))
        }

        fn save(&self, _tokens: &TokenInfo) -> ProviderResult<()> {
            Err(ProviderError::internal("read-only"))
        }
    }

    #[tokio::test]
    async fn unreadable_store_is_an_authentication_error() {
        let provider = GoogleProvider::new(test_config(), Box::new(BrokenStore)).unwrap();
        let now = chrono::Utc::now();

        let err = provider
            .list_events(EventQuery::new(
                "primary",
                gcal_agenda_core::TimeWindow::new(now, now),
            ))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.provider(), Some("google"));
        assert!(err.is_fatal());
        assert!(err.message().contains("token file"));
    }
}
