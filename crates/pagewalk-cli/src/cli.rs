//! Command-line interface definition.
//!
//! - `pagewalk run` - scrape one or more URLs
//! - `pagewalk check` - validate the configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pagewalk - scrape paginated, "load more" and infinite-scroll pages
#[derive(Parser, Debug)]
#[command(
    name = "pagewalk",
    version,
    about = "Scrape pages whose content is loaded by client-side scripts",
    long_about = "Pagewalk drives headless Chrome through dynamic pagination, \"load more\"\n\
                  buttons and infinite scroll, waits for each batch of content to settle,\n\
                  and prints every extracted record once as JSON Lines."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    ///
    /// Shows every action, signal sample and stop decision.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape the configured URLs
    ///
    /// Each URL gets its own tab and navigation session; sessions run
    /// concurrently in one browser. Records are written as JSON Lines.
    Run(RunArgs),

    /// Validate configuration
    ///
    /// Loads the configuration exactly as `run` would and reports problems
    /// without launching a browser.
    Check(CheckArgs),
}

/// Flags that override values from the configuration file and environment.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Deadline for each stabilization wait, in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Interval between two signal samples, in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Maximum number of navigation actions per page
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<u32>,

    /// Stop after N consecutive actions that load nothing (0 disables)
    #[arg(long, value_name = "N")]
    pub no_growth_threshold: Option<u32>,

    /// Show the browser window
    #[arg(long)]
    pub visible: bool,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// URLs to scrape (replaces `urls` from the configuration)
    pub urls: Vec<String>,

    /// Configuration file (default: ./pagewalk.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write records to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Configuration file (default: ./pagewalk.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}
