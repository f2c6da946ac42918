//! taskdeck
//!
//! Command-line task manager with densely ordered subtasks and subtask
//! groups, backed by SQLite.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use taskdeck::cli::{AppContext, Cli};
use taskdeck::config::Config;
use taskdeck::db::Database;
use taskdeck::error::ErrorReport;
use taskdeck::format::OutputFormat;
use taskdeck::logging::{self, LogTarget};
use tracing::{debug, error};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    if let Err(e) = logging::init(&LogTarget::parse(&cli.log), cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let mut format = cli.format.unwrap_or_default();
    match run(cli, &mut format).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let report = ErrorReport::from(e);
            error!(code = ?report.code, "{}", report.message);
            match format {
                OutputFormat::Json => match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(_) => eprintln!("Error: {report}"),
                },
                OutputFormat::Text => eprintln!("Error: {report}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// Resolve config, open the database and run the command.
///
/// `format` is updated as soon as the effective output format is known so
/// errors are reported in it.
async fn run(cli: Cli, format: &mut OutputFormat) -> Result<String> {
    let mut config = Config::resolve(cli.config.as_deref())?;

    // Override from CLI arguments
    if let Some(db_path) = &cli.database {
        config.database.path = db_path.clone();
    }
    if let Some(cli_format) = cli.format {
        config.output.format = cli_format;
    }
    *format = config.output.format;

    config.ensure_db_dir()?;
    debug!(path = %config.database.path.display(), "Opening database");
    let db = Database::open(&config.database.path)?;
    let ctx = AppContext::new(db);

    let output = cli.command.run(&ctx).await?;
    output.render(config.output.format)
}
