//! Google Calendar event source.
//!
//! Authorization uses the OAuth 2.0 installed-app flow with PKCE and a
//! loopback redirect. The user supplies their own OAuth client
//! (`credentials.json` from the Google Cloud Console); tokens are persisted
//! through a [`CredentialStore`].
//!
//! # Example
//!
//! ```ignore
//! use gcal_agenda_providers::google::{
//!     FileCredentialStore, GoogleConfig, GoogleProvider, OAuthCredentials,
//! };
//!
//! let credentials = OAuthCredentials::from_file("credentials.json")?;
//! let store = FileCredentialStore::new("/home/me/.local/share/gcal-agenda/google-token.json");
//! let provider = GoogleProvider::new(GoogleConfig::new(credentials), Box::new(store))?;
//! let calendars = provider.list_calendars().await?;
//! ```

mod client;
mod config;
mod oauth;
mod provider;
mod tokens;

pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::OAuthClient;
pub use provider::GoogleProvider;
pub use tokens::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TokenInfo};
