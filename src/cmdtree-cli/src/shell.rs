//! Line processing for the interactive shell.

use anyhow::{Context, Result};
use cmdtree_core::{CommandTree, DispatcherSettings, FailureKind, InvalidValueKind, ParseFailure};
use tracing::debug;

use crate::commands::{Output, ShellUser, build_tree};
use crate::config::ShellConfig;

/// Marks a line as a completion request rather than a command.
pub const COMPLETION_PREFIX: char = '?';

/// Dispatches or completes one line at a time for a fixed user.
#[derive(Debug)]
pub struct Shell {
    tree: CommandTree<ShellUser>,
    user: ShellUser,
    output: Output,
    prompt: String,
}

impl Shell {
    pub fn new(config: &ShellConfig, user: ShellUser) -> Result<Self> {
        let output = Output::new();
        let tree = build_tree(config.dispatcher.clone(), &output)
            .context("Failed to register shell commands")?;
        Ok(Self {
            tree,
            user,
            output,
            prompt: config.prompt.clone(),
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn user(&self) -> &ShellUser {
        &self.user
    }

    /// Handles one input line and returns the lines to print.
    ///
    /// A line starting with `?` lists completions for the rest of the line.
    pub fn process(&self, line: &str) -> Vec<String> {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(partial) = line.strip_prefix(COMPLETION_PREFIX) {
            let suggestions = self.tree.complete(&self.user, partial);
            debug!("{} suggestion(s) for {:?}", suggestions.len(), partial);
            return suggestions;
        }
        if line.trim().is_empty() {
            return Vec::new();
        }

        match self.tree.dispatch(&self.user, line) {
            Ok(context) => {
                if let Some(command) = context.command() {
                    debug!("Executed {} ({})", command.name(), command.id());
                }
                self.output.drain()
            }
            Err(failure) => {
                debug!("Dispatch failed: {}", failure);
                self.output.drain();
                vec![render_failure(&failure, self.tree.settings())]
            }
        }
    }
}

/// Turns a failure into a message for the user, spelling flags with the
/// prefixes from `settings`.
pub fn render_failure(failure: &ParseFailure, settings: &DispatcherSettings) -> String {
    let message = match &failure.kind {
        FailureKind::EndOfInput => "Unexpected end of input".to_string(),
        FailureKind::UnclosedQuote => "Unclosed quote".to_string(),
        FailureKind::InvalidEscapeCharacter(c) => format!("Invalid escape sequence '\\{}'", c),
        FailureKind::ExpectedWhitespace => "Expected a space after the argument".to_string(),
        FailureKind::ExpectedLiteral { expected, found } if found.is_empty() => {
            format!("Expected one of: {}", expected.join(", "))
        }
        FailureKind::ExpectedLiteral { expected, found } => {
            format!("Unknown subcommand '{}'. Expected one of: {}", found, expected.join(", "))
        }
        FailureKind::MissingArgument(name) => format!("Missing argument <{}>", name),
        FailureKind::InvalidValue { input, kind } => {
            let reason = match kind {
                InvalidValueKind::Choice { allowed, .. } => {
                    format!("expected one of: {}", allowed.join(", "))
                }
                other => other.to_string(),
            };
            match &failure.node {
                Some(node) => format!("Invalid value '{}' for <{}>: {}", input, node, reason),
                None => format!("Invalid value '{}': {}", input, reason),
            }
        }
        FailureKind::UnknownParameter { name, shorthand } => {
            let prefix = if *shorthand {
                &settings.short_flag_prefix
            } else {
                &settings.long_flag_prefix
            };
            format!("Unknown flag '{}{}'", prefix, name)
        }
        FailureKind::NoPermission => "You do not have permission to do that".to_string(),
        FailureKind::UnknownCommand(name) if name.is_empty() => "No command given".to_string(),
        FailureKind::UnknownCommand(name) => format!("Unknown command '{}'", name),
        FailureKind::TrailingInput(word) => format!("Unexpected input '{}'", word),
    };
    format!("{} (column {})", message, failure.position + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shell(admin: bool) -> Shell {
        Shell::new(&ShellConfig::default(), ShellUser::new("alex", admin)).unwrap()
    }

    #[test]
    fn test_dispatch_line() {
        let shell = shell(false);
        assert_eq!(shell.process("give stone 3\n"), vec!["Gave stone x3 to alex"]);
        assert!(shell.process("   ").is_empty());
    }

    #[test]
    fn test_completion_line() {
        let shell = shell(false);
        assert_eq!(shell.process("?gam"), vec!["gamemode"]);
        assert_eq!(
            shell.process("?gamemode "),
            vec!["survival", "creative", "adventure", "spectator"]
        );
        assert!(shell.process("?").is_empty());
    }

    #[test]
    fn test_unknown_command_message() {
        let shell = shell(false);
        assert_eq!(
            shell.process("fly away"),
            vec!["Unknown command 'fly' (column 1)"]
        );
    }

    #[test]
    fn test_invalid_value_message() {
        let shell = shell(false);
        assert_eq!(
            shell.process("give stone lots"),
            vec!["Invalid value 'lots' for <amount>: not an integer (column 12)"]
        );
    }

    #[test]
    fn test_choice_message() {
        let shell = shell(false);
        assert_eq!(
            shell.process("gamemode hardcore"),
            vec![
                "Invalid value 'hardcore' for <mode>: expected one of: survival, creative, adventure, spectator (column 10)"
            ]
        );
    }

    #[test]
    fn test_permission_message() {
        let shell = shell(false);
        let lines = shell.process("admin ban griefer");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("You do not have permission"));
        assert_eq!(
            self::shell(true).process("admin ban griefer -d 3"),
            vec!["Banned griefer for 3 day(s)"]
        );
    }

    #[test]
    fn test_render_failures() {
        let settings = DispatcherSettings::default();
        let failure = ParseFailure::new(
            FailureKind::ExpectedLiteral {
                expected: vec!["add".into(), "list".into()],
                found: "kick".into(),
            },
            5,
        );
        assert_eq!(
            render_failure(&failure, &settings),
            "Unknown subcommand 'kick'. Expected one of: add, list (column 6)"
        );
        let failure = ParseFailure::new(
            FailureKind::UnknownParameter {
                name: "x".into(),
                shorthand: true,
            },
            9,
        );
        assert_eq!(render_failure(&failure, &settings), "Unknown flag '-x' (column 10)");
        let failure = ParseFailure::new(FailureKind::MissingArgument("name".into()), 9);
        assert_eq!(render_failure(&failure, &settings), "Missing argument <name> (column 10)");
    }

    #[test]
    fn test_custom_prefixes() {
        let mut config = ShellConfig::default();
        config.dispatcher.long_flag_prefix = "++".to_string();
        config.dispatcher.short_flag_prefix = "+".to_string();
        let shell = Shell::new(&config, ShellUser::new("alex", true)).unwrap();

        assert_eq!(
            shell.process("admin ban griefer +x"),
            vec!["Unknown flag '+x' (column 20)"]
        );
        assert_eq!(
            shell.process("admin ban griefer ++rage"),
            vec!["Unknown flag '++rage' (column 19)"]
        );
        assert!(
            shell
                .process("help")
                .iter()
                .any(|line| line.starts_with("admin ban <player> [++days <days> | +d <days>]"))
        );
    }
}
