//! Suggestions for partial input.
//!
//! Completion walks each candidate command the way dispatch would, but a
//! failure never propagates: wherever the input stops making sense, the
//! current node offers its candidates and the walk halts. Candidates are
//! kept when they start with the word being typed, ignoring case, and are
//! trimmed to the part after the last space already typed.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::command::ExecutableCommand;
use crate::context::ExecutionContext;
use crate::node::{CommandNode, ParameterNode};
use crate::stream::StringStream;
use crate::tree::CommandTree;
use crate::value::Value;

impl<A> CommandTree<A> {
    /// Suggestions for `input`, in command registration order, without
    /// duplicates.
    ///
    /// Secret commands and commands the principal may not run are skipped.
    pub fn complete(&self, principal: &A, input: &str) -> Vec<String> {
        if input.is_empty() {
            return Vec::new();
        }
        let first = StringStream::new(input)
            .peek_unquoted_string()
            .to_lowercase();

        let mut suggestions = IndexSet::new();
        for command in &self.commands {
            if command.is_secret()
                || !command.name().to_lowercase().starts_with(&first)
                || !command.permission().is_executable_by(principal)
            {
                continue;
            }
            let mut completer = Completer {
                command,
                principal,
                long_prefix: &self.settings.long_flag_prefix,
                short_prefix: &self.settings.short_flag_prefix,
                out: &mut suggestions,
            };
            completer.complete(input);
        }

        trace!("Completed '{}' with {} suggestions", input, suggestions.len());
        suggestions.into_iter().collect()
    }
}

struct Completer<'c, A> {
    command: &'c Arc<ExecutableCommand<A>>,
    principal: &'c A,
    long_prefix: &'c str,
    short_prefix: &'c str,
    out: &'c mut IndexSet<String>,
}

impl<'c, A> Completer<'c, A> {
    fn complete(&mut self, raw: &str) {
        let mut input = StringStream::new(raw);
        let mut context = ExecutionContext::new(self.principal, input.clone());

        for node in self.command.positionals() {
            match node {
                CommandNode::Literal { name } => {
                    let word = input.read_unquoted_string().to_string();
                    if input.has_finished() {
                        if starts_with_ignore_case(name, &word) {
                            self.out.insert(name.clone());
                        }
                        return;
                    }
                    if word != *name {
                        return;
                    }
                    input.skip_whitespace();
                }
                CommandNode::Parameter(parameter) => {
                    if !self.complete_value(parameter, &mut input, &mut context) {
                        return;
                    }
                }
            }
        }

        self.complete_flags(&mut input, &mut context);
    }

    /// Parses one value. Returns true when the walk may continue past it;
    /// otherwise the value's candidates have been offered.
    fn complete_value(
        &mut self,
        parameter: &ParameterNode<A>,
        input: &mut StringStream,
        context: &mut ExecutionContext<'c, A>,
    ) -> bool {
        if !parameter.permission().is_executable_by(self.principal) {
            return false;
        }
        let start = input.position();
        match parameter.parameter_type().parse(input, context) {
            Ok(value) => {
                if input.has_finished() {
                    let typed = input.consumed_since(start).to_string();
                    self.offer(parameter.suggestions(context), &typed);
                    return false;
                }
                if !input.at_whitespace() {
                    return false;
                }
                context.insert(parameter.name(), value);
                input.skip_whitespace();
                true
            }
            Err(_) => {
                input.set_position(start);
                let typed = input.rest().to_string();
                self.offer(parameter.suggestions(context), &typed);
                false
            }
        }
    }

    fn complete_flags(&mut self, input: &mut StringStream, context: &mut ExecutionContext<'c, A>) {
        let mut remaining: IndexMap<String, Arc<ParameterNode<A>>> = self
            .command
            .flags()
            .filter(|flag| flag.permission().is_executable_by(self.principal))
            .map(|flag| (flag.long_name().to_string(), Arc::clone(flag)))
            .collect();
        if remaining.is_empty() {
            return;
        }
        let mut last_was_short = false;

        loop {
            if input.has_finished() {
                for flag in remaining.values() {
                    let suggestion = match flag.shorthand() {
                        Some(c) if last_was_short => format!("{}{c}", self.short_prefix),
                        _ => format!("{}{}", self.long_prefix, flag.long_name()),
                    };
                    self.out.insert(suggestion);
                }
                return;
            }

            let word = input.peek_unquoted_string().to_string();
            if let Some(name) = word.strip_prefix(self.long_prefix) {
                input.read_unquoted_string();
                if input.has_finished() {
                    if !remaining.contains_key(name) {
                        for candidate in remaining.keys() {
                            if starts_with_ignore_case(candidate, name) {
                                self.out.insert(format!("{}{candidate}", self.long_prefix));
                            }
                        }
                    }
                    return;
                }
                let Some(flag) = remaining.shift_remove(name) else {
                    return;
                };
                last_was_short = false;
                if flag.is_switch() {
                    context.insert(flag.name(), Value::Bool(true));
                } else if !self.complete_flag_value(&flag, input, context, false) {
                    return;
                }
            } else if let Some(cluster) = word
                .strip_prefix(self.short_prefix)
                .filter(|rest| !rest.is_empty())
            {
                input.move_forward(self.short_prefix.chars().count());
                last_was_short = true;
                let mut only_switches = true;
                for c in cluster.chars() {
                    let Some(long_name) = remaining
                        .values()
                        .find(|flag| flag.shorthand() == Some(c))
                        .map(|flag| flag.long_name().to_string())
                    else {
                        return;
                    };
                    let Some(flag) = remaining.shift_remove(&long_name) else {
                        return;
                    };
                    input.move_forward(1);
                    if flag.is_switch() {
                        context.insert(flag.name(), Value::Bool(true));
                        continue;
                    }
                    only_switches = false;
                    let attached = input.has_remaining() && !input.at_whitespace();
                    if !self.complete_flag_value(&flag, input, context, attached) {
                        return;
                    }
                    break;
                }
                if input.has_finished() {
                    // A bundle of switches may still grow by one shorthand.
                    if only_switches {
                        for flag in remaining.values() {
                            let Some(next) = flag.shorthand() else {
                                continue;
                            };
                            let gap = if flag.is_switch() { "" } else { " " };
                            self.out
                                .insert(format!("{}{cluster}{next}{gap}", self.short_prefix));
                        }
                    }
                    return;
                }
            } else {
                return;
            }

            if input.has_remaining() && !input.at_whitespace() {
                return;
            }
            input.skip_whitespace();
        }
    }

    /// Completes or consumes the value of a flag whose name was just read.
    /// Returns true when the walk may continue past it.
    fn complete_flag_value(
        &mut self,
        flag: &ParameterNode<A>,
        input: &mut StringStream,
        context: &mut ExecutionContext<'c, A>,
        attached: bool,
    ) -> bool {
        if !attached {
            if !input.at_whitespace() {
                return false;
            }
            input.skip_whitespace();
        }
        if input.has_finished() {
            self.offer(flag.suggestions(context), "");
            return false;
        }
        self.complete_value(flag, input, context)
    }

    fn offer(&mut self, candidates: Vec<String>, typed: &str) {
        for candidate in candidates {
            if starts_with_ignore_case(&candidate, typed) {
                self.out.insert(remaining_content(&candidate, typed));
            }
        }
    }
}

fn starts_with_ignore_case(candidate: &str, typed: &str) -> bool {
    candidate.to_lowercase().starts_with(&typed.to_lowercase())
}

/// The part of `candidate` after the last space already typed.
fn remaining_content(candidate: &str, typed: &str) -> String {
    let typed_chars = typed.chars().count();
    let mut cut = 0;
    for (i, (offset, c)) in candidate.char_indices().enumerate() {
        if i >= typed_chars {
            break;
        }
        if c == ' ' {
            cut = offset + 1;
        }
    }
    candidate[cut..].to_string()
}
