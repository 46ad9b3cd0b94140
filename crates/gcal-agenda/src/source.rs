//! Builds the configured [`EventSource`].

use gcal_agenda_providers::EventSource;

use crate::config::Settings;
use crate::error::{ClientError, ClientResult};

/// Returns the Google Calendar source for `settings`.
///
/// The OAuth client file must exist; no token is requested until the first
/// fetch.
#[cfg(feature = "google")]
pub fn event_source(settings: &Settings) -> ClientResult<Box<dyn EventSource>> {
    use gcal_agenda_providers::google::{
        FileCredentialStore, GoogleConfig, GoogleProvider, OAuthCredentials,
    };

    check_credentials_file(settings)?;

    let credentials = OAuthCredentials::from_file(&settings.credentials_file)?;
    let store = FileCredentialStore::new(&settings.token_path);
    let provider = GoogleProvider::new(GoogleConfig::new(credentials), Box::new(store))?;
    Ok(Box::new(provider))
}

#[cfg(not(feature = "google"))]
pub fn event_source(settings: &Settings) -> ClientResult<Box<dyn EventSource>> {
    check_credentials_file(settings)?;
    Err(ClientError::Config(
        "built without the `google` feature; no calendar source available".to_string(),
    ))
}

/// Fails with [`ClientError::CredentialsMissing`] unless the OAuth client
/// file exists.
pub fn check_credentials_file(settings: &Settings) -> ClientResult<()> {
    if settings.credentials_file.is_file() {
        Ok(())
    } else {
        Err(ClientError::CredentialsMissing {
            path: settings.credentials_file.clone(),
        })
    }
}
