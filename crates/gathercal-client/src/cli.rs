//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// gathercal - recurring community events, expanded and aggregated
#[derive(Debug, Parser)]
#[command(name = "gathercal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "GATHERCAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the dates a recurrence rule produces
    Occurrences {
        /// Rule such as `WEEKLY:TUE`, `MONTHLY:2:WED` or `MONTHLY:LAST:FRI`
        rule: String,

        /// First date of the window (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last date of the window, inclusive; defaults to 90 days after --from
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Materialize instances of every recurring template once
    Expand {
        /// Date to expand from; defaults to today (UTC)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Print the aggregated calendar
    Calendar {
        /// First day of the upcoming view; defaults to today (UTC)
        #[arg(long, conflicts_with = "week")]
        today: Option<NaiveDate>,

        /// Show a single ISO week instead, e.g. 2024-W09
        #[arg(long)]
        week: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Run the daily expansion scheduler in the foreground
    Serve,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Dump,
    /// Check the configuration for invalid values
    Validate,
    /// Print the configuration file path
    Path,
}
