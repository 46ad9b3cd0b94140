//! gcal-agenda entry point.

use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing::{info, warn};

use gcal_agenda::cli::Cli;
use gcal_agenda::config::{FileConfig, Settings};
use gcal_agenda::error::ClientResult;
use gcal_agenda::source::event_source;
use gcal_agenda::sync::AgendaSync;
use gcal_agenda_core::{AgendaFormatter, TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(steps) = e.setup_instructions() {
                eprintln!();
                eprintln!("{}", steps);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let file = match cli.config {
        Some(ref path) => FileConfig::load_from(path)?,
        None => FileConfig::load_default()?,
    };
    let settings = Settings::resolve(&cli, &file)?;

    let sync = AgendaSync::new(
        event_source(&settings)?,
        AgendaFormatter::new(settings.timezone),
        settings.calendars.clone(),
        &settings.output_dir,
    );

    let report = sync.run(Local::now().date_naive()).await?;
    if report.is_partial() {
        warn!("Done with missing calendars: {}", report.summary());
    } else {
        info!("Done: {}", report.summary());
    }
    Ok(())
}
