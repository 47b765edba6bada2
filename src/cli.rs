//! Command-line interface argument parsing for profit-ops.
//!
//! - `profit-ops task add "Leg day" --due 2025-06-01`
//! - `profit-ops task toggle 3`
//! - `profit-ops metric log --weight 70.2 --body-fat 18.5`
//! - `profit-ops metric train upper`

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::data::{BodyField, TrainingCategory, DEFAULT_BUSY_TIMEOUT};

/// Environment variable that overrides the default database location
pub const DB_ENV_VAR: &str = "PROFIT_OPS_DB";

/// Calendar task list and daily body-stat log.
#[derive(Parser, Debug)]
#[command(name = "profit-ops")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the SQLite database file
    /// Defaults to $PROFIT_OPS_DB, then the platform data directory
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Milliseconds to wait for a locked database before failing
    #[arg(long, global = true)]
    pub busy_timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage calendar tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Record and review body stats and training days
    #[command(subcommand)]
    Metric(MetricCommand),
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a new task
    Add {
        /// Task title
        content: String,
        /// Notes shown with the task
        #[arg(short, long)]
        description: Option<String>,
        /// Due date in YYYY-MM-DD, defaults to today
        #[arg(long)]
        due: Option<String>,
        /// Reference to an already uploaded image
        #[arg(long)]
        image: Option<String>,
    },
    /// List tasks, soonest due first
    List {
        /// Only tasks due on this date (YYYY-MM-DD)
        #[arg(long)]
        on: Option<String>,
    },
    /// Show a single task
    Show { id: i64 },
    /// Replace a task's title, description and due date
    Edit {
        id: i64,
        /// New task title
        content: String,
        /// New description (empty if omitted)
        #[arg(short, long, default_value = "")]
        description: String,
        /// New due date in YYYY-MM-DD
        #[arg(long)]
        due: String,
    },
    /// Flip a task between done and not done
    Toggle { id: i64 },
    /// Delete a task
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum MetricCommand {
    /// Record body measurements; omitted values keep what is stored
    Log {
        #[command(flatten)]
        date: DateArg,
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        body_fat: Option<f64>,
    },
    /// Mark (or with --off, unmark) a training session
    Train {
        category: TrainingCategory,
        #[command(flatten)]
        date: DateArg,
        /// Clear the session instead of marking it
        #[arg(long)]
        off: bool,
    },
    /// Show the record for one date
    Show {
        #[command(flatten)]
        date: DateArg,
    },
    /// Show the most recent record, the latest known stats
    Latest,
    /// Show the most recent daily records
    Recent {
        #[arg(short = 'n', long, default_value = "7")]
        limit: usize,
    },
    /// Show one measurement over recent days, oldest first
    Chart {
        field: BodyField,
        #[arg(short = 'n', long, default_value = "30")]
        limit: usize,
    },
}

#[derive(Args, Debug)]
pub struct DateArg {
    /// Date in YYYY-MM-DD, defaults to today
    #[arg(long)]
    pub date: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
    pub json: bool,
}

impl AppConfig {
    /// Resolve configuration, reading the environment for anything not given
    pub fn from_cli(cli: &Cli) -> Self {
        Self::resolve(
            cli.db_path.clone(),
            std::env::var_os(DB_ENV_VAR).map(PathBuf::from),
            cli.busy_timeout_ms,
            cli.json,
        )
    }

    fn resolve(
        db_path: Option<PathBuf>,
        env_db_path: Option<PathBuf>,
        busy_timeout_ms: Option<u64>,
        json: bool,
    ) -> Self {
        let db_path = db_path.or(env_db_path).unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|dir| dir.join("profit-ops"))
                .unwrap_or_else(|| PathBuf::from("."))
                .join("profit-ops.db")
        });

        AppConfig {
            db_path,
            busy_timeout: busy_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_BUSY_TIMEOUT),
            json,
        }
    }
}
