//! Shell configuration loaded from TOML.

use std::path::Path;

use anyhow::{Context, Result};
use cmdtree_core::DispatcherSettings;
use serde::{Deserialize, Serialize};

use crate::args::LogLevel;

/// Settings for the interactive shell.
///
/// ```toml
/// log_level = "debug"
/// prompt = "$ "
///
/// [dispatcher]
/// permutation_threshold = 3
/// failure_policy = "last"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub log_level: LogLevel,
    /// Printed before reading each line.
    pub prompt: String,
    pub dispatcher: DispatcherSettings,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            prompt: "> ".to_string(),
            dispatcher: DispatcherSettings::default(),
        }
    }
}

impl ShellConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Invalid shell configuration")?;
        config
            .dispatcher
            .validate()
            .context("Invalid dispatcher settings")?;
        Ok(config)
    }

    /// Loads a configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Failed to load {}", path.display()))
    }
}
