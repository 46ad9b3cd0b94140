//! OAuth tokens and the stores that persist them between runs.
//!
//! [`GoogleProvider`](super::GoogleProvider) receives a
//! [`CredentialStore`] instead of reading a fixed path itself. The binary
//! uses [`FileCredentialStore`]; tests use [`MemoryCredentialStore`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Tokens are treated as expired this long before the server says so.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An OAuth token set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,

    pub refresh_token: Option<String>,

    /// Expiry of the access token, already shortened by a safety margin.
    pub expires_at: Option<DateTime<Utc>>,

    /// Scopes granted with this token.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl TokenInfo {
    /// Builds a token set from a token endpoint response.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(expiry_from_now),
            scopes,
        }
    }

    /// Returns true if the access token is expired or about to expire.
    /// Tokens without an expiry never expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() >= expires_at)
    }

    /// Returns true if every scope in `required` was granted.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Replaces the access token after a refresh. The refresh token and
    /// scopes are kept.
    pub fn refreshed(mut self, access_token: impl Into<String>, expires_in_secs: Option<i64>) -> Self {
        self.access_token = access_token.into();
        self.expires_at = expires_in_secs.map(expiry_from_now);
        self
    }
}

fn expiry_from_now(secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_MARGIN_SECS)
}

/// Where OAuth tokens are kept between runs.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored tokens, or `None` when nothing has been saved yet.
    fn load(&self) -> ProviderResult<Option<TokenInfo>>;

    /// Replaces the stored tokens.
    fn save(&self, tokens: &TokenInfo) -> ProviderResult<()>;
}

/// Stores tokens as JSON in a single file.
///
/// Writes go through a temporary file and a rename. On Unix the file is
/// made readable by the owner only.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> ProviderResult<Option<TokenInfo>> {
        if !self.path.exists() {
            debug!("no token file at {:?}", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::internal(format!("failed to read token file {:?}", self.path))
                .with_source(e)
        })?;

        let tokens: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::internal(format!("failed to parse token file {:?}", self.path))
                .with_source(e)
        })?;

        debug!("loaded tokens from {:?}", self.path);
        Ok(Some(tokens))
    }

    fn save(&self, tokens: &TokenInfo) -> ProviderResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::internal("failed to create token directory").with_source(e)
            })?;
        }

        let content = serde_json::to_string_pretty(tokens).map_err(|e| {
            ProviderError::internal("failed to serialize tokens").with_source(e)
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .map_err(|e| ProviderError::internal("failed to write token file").with_source(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                ProviderError::internal("failed to restrict token file permissions").with_source(e)
            })?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| ProviderError::internal("failed to replace token file").with_source(e))?;

        debug!("saved tokens to {:?}", self.path);
        Ok(())
    }
}

/// Keeps tokens in memory only.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tokens: Mutex<Option<TokenInfo>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `tokens`.
    pub fn with_tokens(tokens: TokenInfo) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> ProviderResult<Option<TokenInfo>> {
        let guard = self
            .tokens
            .lock()
            .map_err(|_| ProviderError::internal("credential store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, tokens: &TokenInfo) -> ProviderResult<()> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|_| ProviderError::internal("credential store lock poisoned"))?;
        *guard = Some(tokens.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tokens() -> TokenInfo {
        TokenInfo::new(
            "access-token",
            Some("refresh-token".to_string()),
            Some(3600),
            vec!["scope1".to_string()],
        )
    }

    #[test]
    fn new_token_is_not_expired() {
        let token = sample_tokens();
        assert!(!token.is_expired());
        assert!(token.expires_at.unwrap() < Utc::now() + Duration::seconds(3600));
    }

    #[test]
    fn past_expiry_is_expired() {
        let mut token = sample_tokens();
        token.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(token.is_expired());

        token.expires_at = None;
        assert!(!token.is_expired());
    }

    #[test]
    fn short_lived_token_is_expired_within_margin() {
        let token = TokenInfo::new("access", None, Some(30), vec![]);
        assert!(token.is_expired());
    }

    #[test]
    fn scope_check() {
        let token = TokenInfo::new(
            "access",
            None,
            None,
            vec!["scope1".to_string(), "scope2".to_string()],
        );

        assert!(token.has_scopes(&["scope1".to_string()]));
        assert!(token.has_scopes(&["scope1".to_string(), "scope2".to_string()]));
        assert!(!token.has_scopes(&["scope3".to_string()]));
    }

    #[test]
    fn refreshed_keeps_refresh_token() {
        let mut token = sample_tokens();
        token.expires_at = Some(Utc::now() - Duration::hours(1));

        let token = token.refreshed("new-access", Some(3600));

        assert_eq!(token.access_token, "new-access");
        assert_eq!(token.refresh_token.as_deref(), Some("refresh-token"));
        assert!(!token.is_expired());
    }

    #[test]
    fn file_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("token.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");
        let store = FileCredentialStore::new(&path);

        let tokens = sample_tokens();
        store.save(&tokens).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.load().unwrap(), Some(tokens));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("token.json"));
        store.save(&sample_tokens()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{ not json").unwrap();

        let err = FileCredentialStore::new(&path).load().unwrap_err();
        assert!(err.message().contains("parse"));
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().unwrap().is_none());

        let tokens = sample_tokens();
        store.save(&tokens).unwrap();
        assert_eq!(store.load().unwrap(), Some(tokens));

        let seeded = MemoryCredentialStore::with_tokens(sample_tokens());
        assert!(seeded.load().unwrap().is_some());
    }
}
