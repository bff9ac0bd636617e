//! Matching input against the tree.
//!
//! The walk is a depth-first search with backtracking. At every node the
//! next word is offered to, in order:
//! 1. the literal child with exactly that name
//! 2. the flag child it names (`--name`, `-n`, or a bundle like `-abc`)
//! 3. each positional child, in priority order
//!
//! The first branch that reaches a bound node wins. Failed branches undo
//! their cursor movement and values and leave a [`ParseFailure`] behind;
//! the one reported is chosen by [`FailurePolicy`]. A permission denial
//! ends the whole attempt at once.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::command::ExecutableCommand;
use crate::config::FailurePolicy;
use crate::context::ExecutionContext;
use crate::error::{FailureKind, ParseFailure};
use crate::stream::StringStream;
use crate::tree::{CommandTree, NodeId, ROOT};
use crate::value::Value;

/// `Ok(Some)` when a command was bound, `Ok(None)` when this branch failed
/// and a failure was recorded, `Err` when the whole attempt must stop.
type Step<A> = Result<Option<Arc<ExecutableCommand<A>>>, ParseFailure>;

impl<A> CommandTree<A> {
    /// Resolves `input` into a context without running the action.
    pub fn parse<'p>(
        &self,
        principal: &'p A,
        input: &str,
    ) -> Result<ExecutionContext<'p, A>, ParseFailure> {
        let mut stream = StringStream::new(input);
        let mut context = ExecutionContext::new(principal, stream.clone());
        stream.skip_whitespace();

        let mut walker = Walker {
            tree: self,
            principal,
            failure: None,
        };
        let outcome = walker.visit(ROOT, &mut stream, &mut context, false);

        let command = match outcome {
            Ok(Some(command)) => command,
            Ok(None) => {
                let failure = walker.failure.unwrap_or_else(|| {
                    ParseFailure::new(
                        FailureKind::UnknownCommand(
                            StringStream::new(input).peek_unquoted_string().to_string(),
                        ),
                        0,
                    )
                });
                debug!("Failed to dispatch '{}': {}", input, failure);
                return Err(failure);
            }
            Err(failure) => {
                debug!("Dispatch of '{}' denied: {}", input, failure);
                return Err(failure);
            }
        };

        fill_defaults(&command, &mut context)?;
        trace!("Resolved '{}' to '{}'", input, self.usage(&command));
        context.set_command(command);
        context.set_input(stream);
        Ok(context)
    }

    /// Resolves `input` and runs the bound action and hooks.
    pub fn dispatch<'p>(
        &self,
        principal: &'p A,
        input: &str,
    ) -> Result<ExecutionContext<'p, A>, ParseFailure> {
        let context = self.parse(principal, input)?;
        if let Some(command) = context.command() {
            if let Some(action) = command.action() {
                action(&context);
                for hook in &self.hooks {
                    hook(command.as_ref(), &context);
                }
            }
        }
        Ok(context)
    }
}

/// Fills in omitted parameters: defaults are parsed through the type,
/// switches become `false`, other optionals take the type's zero value.
fn fill_defaults<A>(
    command: &ExecutableCommand<A>,
    context: &mut ExecutionContext<'_, A>,
) -> Result<(), ParseFailure> {
    for parameter in command.parameters() {
        if context.contains(parameter.name()) {
            continue;
        }
        let value = if let Some(default) = parameter.default_value() {
            let mut input = StringStream::new(default);
            Some(
                parameter
                    .parameter_type()
                    .parse(&mut input, context)
                    .map_err(|failure| failure.at_node(parameter.name()))?,
            )
        } else if parameter.is_switch() {
            Some(Value::Bool(false))
        } else {
            parameter.parameter_type().zero_value()
        };
        if let Some(value) = value {
            context.insert(parameter.name(), value);
        }
    }
    Ok(())
}

enum FlagToken<'w> {
    Long(&'w str),
    Short,
}

struct Walker<'t, 'p, A> {
    tree: &'t CommandTree<A>,
    principal: &'p A,
    failure: Option<ParseFailure>,
}

impl<'t, 'p, A> Walker<'t, 'p, A> {
    fn visit(
        &mut self,
        id: NodeId,
        input: &mut StringStream,
        context: &mut ExecutionContext<'p, A>,
        in_cluster: bool,
    ) -> Step<A> {
        if in_cluster {
            return self.visit_short(id, input, context);
        }

        let tree = self.tree;
        let node = &tree.nodes[id];
        if id != ROOT {
            if input.has_remaining() && !input.at_whitespace() {
                self.record(
                    ParseFailure::new(FailureKind::ExpectedWhitespace, input.position())
                        .at_node(node.name()),
                );
                return Ok(None);
            }
            input.skip_whitespace();
        }
        if input.has_finished() {
            return self.finish(id, input);
        }

        let start = input.position();
        let word = input.peek_unquoted_string().to_string();

        if let Some(&child) = node.literals.get(word.as_str()) {
            self.check_permission(child, start)?;
            input.read_unquoted_string();
            if let Some(command) = self.visit(child, input, context, false)? {
                return Ok(Some(command));
            }
            input.set_position(start);
        }

        if !node.flags.is_empty() {
            if let Some(command) = self.visit_flag_token(id, &word, input, context)? {
                return Ok(Some(command));
            }
            input.set_position(start);
        }

        for &child in &node.arguments {
            let Some(parameter) = tree.nodes[child].parameter() else {
                continue;
            };
            self.check_permission(child, start)?;
            let mark = context.len();
            match parameter.parameter_type().parse(input, context) {
                Ok(value) => {
                    context.insert(parameter.name(), value);
                    if let Some(command) = self.visit(child, input, context, false)? {
                        return Ok(Some(command));
                    }
                    context.truncate(mark);
                }
                Err(failure) => self.record(failure.at_node(parameter.name())),
            }
            input.set_position(start);
        }

        self.record_mismatch(id, &word, start);
        Ok(None)
    }

    /// Input ended at `id`.
    fn finish(&mut self, id: NodeId, input: &StringStream) -> Step<A> {
        let tree = self.tree;
        let node = &tree.nodes[id];
        if let Some(command) = &node.command {
            if !command.permission().is_executable_by(self.principal) {
                return Err(ParseFailure::new(FailureKind::NoPermission, input.position())
                    .at_node(command.name()));
            }
            return Ok(Some(Arc::clone(command)));
        }

        let missing_flag = node
            .flags
            .iter()
            .filter_map(|&flag| tree.nodes[flag].parameter())
            .find(|parameter| !parameter.is_optional())
            .or_else(|| {
                node.flags
                    .first()
                    .and_then(|&flag| tree.nodes[flag].parameter())
            });

        let kind = if id == ROOT {
            FailureKind::UnknownCommand(String::new())
        } else if let Some(&argument) = node.arguments.first() {
            FailureKind::MissingArgument(tree.nodes[argument].name().to_string())
        } else if let Some(flag) = missing_flag {
            FailureKind::MissingArgument(flag.name().to_string())
        } else if !node.literals.is_empty() {
            FailureKind::ExpectedLiteral {
                expected: node.literals.keys().cloned().collect(),
                found: String::new(),
            }
        } else {
            FailureKind::EndOfInput
        };
        self.record(ParseFailure::new(kind, input.position()).at_node(node.name()));
        Ok(None)
    }

    /// Tries the flag children of `id` against a `--name` or `-x` token.
    fn visit_flag_token(
        &mut self,
        id: NodeId,
        word: &str,
        input: &mut StringStream,
        context: &mut ExecutionContext<'p, A>,
    ) -> Step<A> {
        let start = input.position();
        match self.flag_token(word) {
            None => Ok(None),
            Some(FlagToken::Long(name)) => {
                let Some(child) = self.tree.find_flag(id, name) else {
                    self.record(ParseFailure::new(
                        FailureKind::UnknownParameter {
                            name: name.to_string(),
                            shorthand: false,
                        },
                        start,
                    ));
                    return Ok(None);
                };
                self.check_permission(child, start)?;
                input.read_unquoted_string();
                self.consume_flag(child, input, context, false)
            }
            Some(FlagToken::Short) => {
                input.move_forward(self.tree.settings.short_flag_prefix.chars().count());
                self.visit_short(id, input, context)
            }
        }
    }

    /// Consumes one shorthand character at the cursor.
    fn visit_short(
        &mut self,
        id: NodeId,
        input: &mut StringStream,
        context: &mut ExecutionContext<'p, A>,
    ) -> Step<A> {
        let start = input.position();
        let Some(c) = input.peek() else {
            return Ok(None);
        };
        let Some(child) = self.tree.find_shorthand(id, c) else {
            self.record(ParseFailure::new(
                FailureKind::UnknownParameter {
                    name: c.to_string(),
                    shorthand: true,
                },
                start,
            ));
            return Ok(None);
        };
        self.check_permission(child, start)?;
        input.move_forward(1);
        let in_cluster = input.has_remaining() && !input.at_whitespace();
        self.consume_flag(child, input, context, in_cluster)
    }

    /// Resolves a flag or switch whose name was just consumed.
    ///
    /// `attached` means the token continues right after the name: more
    /// switches of a bundle, or the value of a flag (`-l5`).
    fn consume_flag(
        &mut self,
        child: NodeId,
        input: &mut StringStream,
        context: &mut ExecutionContext<'p, A>,
        attached: bool,
    ) -> Step<A> {
        let Some(parameter) = self.tree.nodes[child].parameter() else {
            return Ok(None);
        };
        let mark = context.len();

        if parameter.is_switch() {
            context.insert(parameter.name(), Value::Bool(true));
            let outcome = self.visit(child, input, context, attached)?;
            if outcome.is_none() {
                context.truncate(mark);
            }
            return Ok(outcome);
        }

        if !attached {
            input.skip_whitespace();
        }
        if input.has_finished() {
            self.record(
                ParseFailure::new(
                    FailureKind::MissingArgument(parameter.name().to_string()),
                    input.position(),
                )
                .at_node(parameter.name()),
            );
            return Ok(None);
        }
        match parameter.parameter_type().parse(input, context) {
            Ok(value) => {
                context.insert(parameter.name(), value);
                let outcome = self.visit(child, input, context, false)?;
                if outcome.is_none() {
                    context.truncate(mark);
                }
                Ok(outcome)
            }
            Err(failure) => {
                self.record(failure.at_node(parameter.name()));
                Ok(None)
            }
        }
    }

    fn flag_token<'w>(&self, word: &'w str) -> Option<FlagToken<'w>> {
        let settings = &self.tree.settings;
        if let Some(name) = word.strip_prefix(settings.long_flag_prefix.as_str()) {
            return (!name.is_empty()).then_some(FlagToken::Long(name));
        }
        let rest = word.strip_prefix(settings.short_flag_prefix.as_str())?;
        (!rest.is_empty() && !is_number(rest)).then_some(FlagToken::Short)
    }

    fn check_permission(&self, id: NodeId, position: usize) -> Result<(), ParseFailure> {
        let node = &self.tree.nodes[id];
        if node.permission.is_executable_by(self.principal) {
            Ok(())
        } else {
            Err(ParseFailure::new(FailureKind::NoPermission, position).at_node(node.name()))
        }
    }

    /// No child accepted `word`.
    fn record_mismatch(&mut self, id: NodeId, word: &str, position: usize) {
        let node = &self.tree.nodes[id];
        if node.literals.contains_key(word) {
            // The literal matched; the failure is further down.
            return;
        }
        let kind = if id == ROOT {
            FailureKind::UnknownCommand(word.to_string())
        } else if !node.arguments.is_empty() {
            // Each argument already recorded why it failed.
            return;
        } else if !node.literals.is_empty() {
            FailureKind::ExpectedLiteral {
                expected: node.literals.keys().cloned().collect(),
                found: word.to_string(),
            }
        } else if !node.flags.is_empty() && self.flag_token(word).is_some() {
            return;
        } else {
            FailureKind::TrailingInput(word.to_string())
        };
        self.record(ParseFailure::new(kind, position).at_node(node.name()));
    }

    fn record(&mut self, failure: ParseFailure) {
        trace!("Recorded failure: {}", failure);
        let replace = match (&self.failure, self.tree.settings.failure_policy) {
            (None, _) | (_, FailurePolicy::Last) => true,
            (Some(best), FailurePolicy::Furthest) => failure.position > best.position,
        };
        if replace {
            self.failure = Some(failure);
        }
    }
}

/// `5`, `.5` and `1e3` after a `-` are negative numbers, not flags.
fn is_number(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_digit() || c == '.') && text.parse::<f64>().is_ok()
}
