//! Configuration file and resolved run settings.
//!
//! Settings come from, in order of precedence: command-line flags (and their
//! environment variables), `config.toml`, then built-in defaults. The file
//! lives at `~/.config/gcal-agenda/config.toml` by default:
//!
//! ```toml
//! [agenda]
//! output_dir = "~/org/calendar"
//! timezone = "America/Los_Angeles"
//! calendars = "Work|Family"
//!
//! [google]
//! credentials_file = "~/.config/gcal-agenda/credentials.json"
//! token_path = "~/.local/share/gcal-agenda/google-token.json"
//! ```

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use gcal_agenda_core::{DEFAULT_DISPLAY_TIMEZONE, parse_timezone};

use crate::calendars::CalendarSelection;
use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};

const APP_DIR: &str = "gcal-agenda";
const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";
const TOKEN_FILE: &str = "google-token.json";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub agenda: AgendaSettings,
    pub google: GoogleSettings,
}

/// `[agenda]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaSettings {
    pub output_dir: Option<PathBuf>,
    /// IANA timezone name.
    pub timezone: Option<String>,
    /// Calendar names separated by `|`.
    pub calendars: Option<String>,
}

/// `[google]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    pub credentials_file: Option<PathBuf>,
    pub token_path: Option<PathBuf>,
}

impl FileConfig {
    /// Loads the file at `path`, which must exist.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Loads the default file, or an empty configuration when it does not
    /// exist.
    pub fn load_default() -> ClientResult<Self> {
        let path = default_config_path();
        if path.exists() {
            debug!("loading configuration from {}", path.display());
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }
}

/// `~/.config/gcal-agenda/config.toml` (platform config dir).
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// `~/.local/share/gcal-agenda/google-token.json` (platform data dir).
pub fn default_token_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(TOKEN_FILE)
}

/// Everything a run needs, after merging flags, file and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub credentials_file: PathBuf,
    pub token_path: PathBuf,
    pub calendars: CalendarSelection,
    pub timezone: Tz,
}

impl Settings {
    /// Merges command-line values over the configuration file.
    pub fn resolve(cli: &Cli, file: &FileConfig) -> ClientResult<Self> {
        let output_dir = cli
            .output_dir
            .clone()
            .or_else(|| file.agenda.output_dir.clone())
            .map(|p| expand_home(&p))
            .unwrap_or_else(|| PathBuf::from("."));

        let credentials_file = cli
            .credentials
            .clone()
            .or_else(|| file.google.credentials_file.clone())
            .map(|p| expand_home(&p))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE));

        let token_path = cli
            .token_path
            .clone()
            .or_else(|| file.google.token_path.clone())
            .map(|p| expand_home(&p))
            .unwrap_or_else(default_token_path);

        let calendars = cli
            .calendars
            .as_deref()
            .or(file.agenda.calendars.as_deref())
            .map(CalendarSelection::parse)
            .unwrap_or_default();

        let timezone = match cli.timezone.as_deref().or(file.agenda.timezone.as_deref()) {
            Some(name) => parse_timezone(name).map_err(|e| ClientError::Config(e.to_string()))?,
            None => DEFAULT_DISPLAY_TIMEZONE,
        };

        Ok(Self {
            output_dir,
            credentials_file,
            token_path,
            calendars,
            timezone,
        })
    }
}

/// Replaces a leading `~` with the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
