//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Log verbosity level.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show registration and dispatch details
    Debug,
    /// Show every recorded failure and suggestion pass
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Cmdtree - interactive command shell
///
/// Reads one command per line from stdin. Lines starting with `?` print
/// completions for the rest of the line instead of running it.
#[derive(Debug, Parser)]
#[command(name = "cmdtree", version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set log verbosity level (error, warn, info, debug, trace)
    #[arg(long = "log-level", short = 'L', value_enum)]
    pub log_level: Option<LogLevel>,

    /// Run as an administrator
    #[arg(long)]
    pub admin: bool,

    /// Name of the acting user
    #[arg(long, default_value = "guest")]
    pub user: String,
}

/// Picks the log level: command line, then `CMDTREE_LOG`, then config.
pub fn resolve_log_level(
    cli: Option<LogLevel>,
    env: Option<&str>,
    config: LogLevel,
) -> LogLevel {
    cli.or_else(|| env.and_then(LogLevel::from_str_loose))
        .unwrap_or(config)
}
