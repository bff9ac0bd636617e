//! Cmdtree CLI entry point.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::Result;
use clap::Parser;
use cmdtree_cli::{Cli, Shell, ShellConfig, ShellUser, resolve_log_level};
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };

    let env_level = std::env::var("CMDTREE_LOG").ok();
    let log_level = resolve_log_level(cli.log_level, env_level.as_deref(), config.log_level);

    let filter_str = if std::env::var("RUST_LOG").is_ok() {
        format!(
            "error,cmdtree_core={},cmdtree_cli={},cmdtree={}",
            log_level.as_filter_str(),
            log_level.as_filter_str(),
            log_level.as_filter_str()
        )
    } else {
        log_level.as_filter_str().to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(&filter_str)
        .with_writer(io::stderr)
        .init();

    let shell = Shell::new(&config, ShellUser::new(cli.user, cli.admin))?;
    info!(
        "Shell ready for {} (admin: {})",
        shell.user().name,
        shell.user().admin
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let interactive = stdin.is_terminal();

    if interactive {
        write!(stdout, "{}", shell.prompt())?;
        stdout.flush()?;
    }
    for line in stdin.lock().lines() {
        let line = line?;
        for output in shell.process(&line) {
            writeln!(stdout, "{}", output)?;
        }
        if interactive {
            write!(stdout, "{}", shell.prompt())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
