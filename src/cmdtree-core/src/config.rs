//! Dispatcher settings.

use serde::{Deserialize, Serialize};

use crate::error::RegistrationError;

/// Default number of flags up to which every ordering is materialized.
pub const DEFAULT_PERMUTATION_THRESHOLD: usize = 4;

/// Largest accepted permutation threshold. Six flags already expand to
/// 1956 tree nodes.
pub const MAX_PERMUTATION_THRESHOLD: usize = 6;

/// Which recorded failure is reported when no command matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// The failure detected furthest into the input; ties keep the first.
    #[default]
    Furthest,
    /// The most recently recorded failure.
    Last,
}

/// Tunables for a [`crate::CommandTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Prefix of long flags and switches.
    pub long_flag_prefix: String,
    /// Prefix of shorthand flags and switches.
    pub short_flag_prefix: String,
    /// Flag count up to which every ordering gets its own path.
    pub permutation_threshold: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            long_flag_prefix: "--".to_string(),
            short_flag_prefix: "-".to_string(),
            permutation_threshold: DEFAULT_PERMUTATION_THRESHOLD,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl DispatcherSettings {
    #[must_use]
    pub fn with_permutation_threshold(mut self, threshold: usize) -> Self {
        self.permutation_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Checks that flag prefixes can be told apart and that the
    /// permutation threshold is at most [`MAX_PERMUTATION_THRESHOLD`].
    ///
    /// The long prefix is matched first, so the short prefix must not
    /// start with it.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.permutation_threshold > MAX_PERMUTATION_THRESHOLD {
            return Err(RegistrationError::InvalidSettings(format!(
                "permutation threshold {} exceeds the maximum of {}",
                self.permutation_threshold, MAX_PERMUTATION_THRESHOLD
            )));
        }
        if self.long_flag_prefix.is_empty() || self.short_flag_prefix.is_empty() {
            return Err(RegistrationError::InvalidSettings(
                "flag prefixes must not be empty".to_string(),
            ));
        }
        if self.short_flag_prefix.starts_with(&self.long_flag_prefix) {
            return Err(RegistrationError::InvalidSettings(format!(
                "short flag prefix '{}' is shadowed by long flag prefix '{}'",
                self.short_flag_prefix, self.long_flag_prefix
            )));
        }
        if self
            .long_flag_prefix
            .chars()
            .chain(self.short_flag_prefix.chars())
            .any(char::is_whitespace)
        {
            return Err(RegistrationError::InvalidSettings(
                "flag prefixes must not contain whitespace".to_string(),
            ));
        }
        Ok(())
    }
}
