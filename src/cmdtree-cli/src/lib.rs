//! Cmdtree CLI - an interactive shell over a cmdtree command set.
//!
//! - `args` - command-line arguments and log levels
//! - `config` - TOML shell configuration
//! - `commands` - the built-in command set and the principal it runs as
//! - `shell` - per-line dispatch, completion and failure rendering

mod args;
mod commands;
mod config;
mod shell;

pub use args::{Cli, LogLevel, resolve_log_level};
pub use commands::{Output, ShellUser, build_tree};
pub use config::ShellConfig;
pub use shell::{COMPLETION_PREFIX, Shell, render_failure};
