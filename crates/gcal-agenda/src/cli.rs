//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// gcal-agenda - Google Calendar to monthly Org agenda files
///
/// Writes `YYYY-MM.org` for the current month and the next two, replacing
/// any files a previous run left for those months.
#[derive(Debug, Default, Parser)]
#[command(name = "gcal-agenda")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to write the .org files to [default: .]
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// OAuth client credentials downloaded from the Google Cloud Console
    /// [default: credentials.json]
    #[arg(long, value_name = "PATH", env = "GCAL_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Where to cache the OAuth token between runs
    #[arg(long, value_name = "PATH", env = "GCAL_TOKEN_PATH")]
    pub token_path: Option<PathBuf>,

    /// Calendar names to export, separated by '|' [default: primary]
    #[arg(long, value_name = "NAMES", env = "GCAL_CALENDARS")]
    pub calendars: Option<String>,

    /// IANA timezone for agenda timestamps [default: America/Los_Angeles]
    #[arg(long, value_name = "TZ", env = "GCAL_AGENDA_TIMEZONE")]
    pub timezone: Option<String>,

    /// Path to configuration file
    #[arg(long, short, env = "GCAL_AGENDA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "gcal-agenda",
            "--output-dir",
            "/tmp/agenda",
            "--credentials",
            "client.json",
            "--calendars",
            "Work|Family",
            "--timezone",
            "Europe/Paris",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/agenda")));
        assert_eq!(cli.credentials, Some(PathBuf::from("client.json")));
        assert_eq!(cli.calendars.as_deref(), Some("Work|Family"));
        assert_eq!(cli.timezone.as_deref(), Some("Europe/Paris"));
        assert!(cli.debug);
    }
}
