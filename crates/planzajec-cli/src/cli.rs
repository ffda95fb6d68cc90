//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use planzajec_core::{OutputFormat, ScheduleType};

/// planzajec - UEK class schedules from the command line
#[derive(Debug, Parser)]
#[command(name = "planzajec")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "PLANZAJEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    // --- Output flags ---
    /// Output format: json, ics or table
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    /// Leave classes with this subject out of ics and table output (can be repeated)
    #[arg(long, action = clap::ArgAction::Append)]
    pub hide_subject: Vec<String>,

    /// Maximum subject length in table output (truncated with ellipsis)
    #[arg(long)]
    pub max_subject_length: Option<usize>,

    // --- Upstream flags ---
    /// Credentials as `user:password` (supports `pass::` and `env::` references)
    #[arg(long, env = "PLANZAJEC_AUTH", hide_env_values = true)]
    pub auth: Option<String>,

    /// X-Forwarded-For value sent upstream
    #[arg(long)]
    pub forwarded_for: Option<String>,

    /// Serve upstream responses from recordings in this directory
    #[arg(long)]
    pub replay_dir: Option<PathBuf>,

    /// Maximum number of concurrent upstream requests
    #[arg(long)]
    pub max_concurrent_requests: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all groupings
    Groupings,

    /// List the groups, lecturers or rooms of a grouping
    Headers {
        /// Schedule type: G, N, S (or group, lecturer, room)
        #[arg(value_name = "TYPE")]
        schedule_type: ScheduleType,

        /// Grouping name, as listed by `planzajec groupings`
        grouping: String,
    },

    /// Fetch and merge the schedules of up to four entities
    Schedule {
        /// Schedule type: G, N, S (or group, lecturer, room)
        #[arg(value_name = "TYPE")]
        schedule_type: ScheduleType,

        /// Entity ids, as listed by `planzajec headers`
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,

        /// Period index, 0 being the first period the service lists
        #[arg(long, short, default_value = "0")]
        period: usize,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
