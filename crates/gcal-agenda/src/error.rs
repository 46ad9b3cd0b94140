//! Client error types.

use std::path::PathBuf;

use thiserror::Error;

use gcal_agenda_core::TracingError;
use gcal_agenda_providers::ProviderError;

const SETUP_INSTRUCTIONS: &str = "\
To create OAuth client credentials:
  1. Open the Google Cloud Console (https://console.cloud.google.com/)
  2. Enable the Google Calendar API for your project
  3. Create OAuth 2.0 credentials of type \"Desktop app\"
  4. Download the JSON file and save it as credentials.json,
     or point --credentials / GCAL_CREDENTIALS at it";

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that end a `gcal-agenda` run.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid configuration file, flag or environment value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The OAuth client secret file does not exist.
    #[error("OAuth credentials file '{}' not found", path.display())]
    CredentialsMissing { path: PathBuf },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tracing(#[from] TracingError),
}

impl ClientError {
    /// Steps for creating the OAuth client file, when that is what is missing.
    pub fn setup_instructions(&self) -> Option<&'static str> {
        match self {
            Self::CredentialsMissing { .. } => Some(SETUP_INSTRUCTIONS),
            _ => None,
        }
    }
}
