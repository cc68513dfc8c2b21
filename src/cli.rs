//! CLI arguments for procsnap.
//!
//! The CLI is thin glue around the two core operations: it parses parameters,
//! invokes a collection or a termination, and serializes the single result
//! record to stdout.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Maps onto a tracing level. tracing has no "off"; Error is the
    /// quietest available filter.
    pub fn as_level(self) -> Level {
        match self {
            LogLevel::Off | LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }

    /// Parses a config-file level string; unknown values yield None.
    pub fn from_config_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" => Some(LogLevel::Off),
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "procsnap",
    about = "Task-manager style process snapshot with grouping, classification, and safe termination",
    long_about = "Task-manager style process snapshot with grouping, classification, and safe termination.\n\n\
                  Collects one point-in-time reading of every process on the host (CPU, memory, \
                  threads, state, priority, category), collapses same-named processes into \
                  aggregated groups, and prints a single JSON record. Can also terminate a \
                  process by PID with a graceful-then-forced sequence guarded by a critical \
                  process denylist.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    /// Maximum number of group representatives to return (<= 0 for unlimited)
    #[arg(short = 'm', long)]
    pub max: Option<i64>,

    /// Expand the group containing this PID instead of grouping
    #[arg(short = 'e', long, conflicts_with = "kill")]
    pub expand: Option<i32>,

    /// Terminate the process with this PID instead of collecting
    #[arg(short = 'k', long)]
    pub kill: Option<i32>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Log level (overrides any config file setting)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,
}
