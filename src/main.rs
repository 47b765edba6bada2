//! profit-ops: a calendar task list and daily body-stat log.
//!
//! Tasks are ordered by due date, newest first within a day. Body
//! measurements and training flags are kept as one record per date, and
//! every write for a date merges into that record field by field.

mod app;
mod cli;
mod data;

use anyhow::Result;
use cli::{AppConfig, Cli};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();
    let config = AppConfig::from_cli(&cli);

    let stdout = std::io::stdout();
    app::run(&config, cli.command, &mut stdout.lock())?;

    Ok(())
}
