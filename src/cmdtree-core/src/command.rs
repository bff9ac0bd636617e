//! Executable commands and the builder that declares them.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::error::RegistrationError;
use crate::node::{CommandNode, FlagKind, ParameterNode};
use crate::permission::CommandPermission;
use crate::value::ValueKind;

/// Callback run when a command is dispatched.
pub type CommandAction<A> = Arc<dyn Fn(&ExecutionContext<'_, A>) + Send + Sync>;

/// Identity shared by every alias registered from one builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One full invocation path: literals and parameters in order, with
/// flags and switches last.
pub struct ExecutableCommand<A> {
    id: CommandId,
    nodes: Vec<CommandNode<A>>,
    flag_count: usize,
    permission: CommandPermission<A>,
    action: Option<CommandAction<A>>,
    description: Option<String>,
    secret: bool,
}

impl<A> ExecutableCommand<A> {
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// The first literal of the path.
    pub fn name(&self) -> &str {
        self.nodes.first().map(CommandNode::name).unwrap_or_default()
    }

    pub fn nodes(&self) -> &[CommandNode<A>] {
        &self.nodes
    }

    /// Literals and positional parameters.
    pub fn positionals(&self) -> &[CommandNode<A>] {
        &self.nodes[..self.nodes.len() - self.flag_count]
    }

    /// Flags and switches in declaration order.
    pub fn flags(&self) -> impl Iterator<Item = &Arc<ParameterNode<A>>> {
        self.nodes[self.nodes.len() - self.flag_count..]
            .iter()
            .filter_map(CommandNode::as_parameter)
    }

    /// Every parameter node, positional or not.
    pub fn parameters(&self) -> impl Iterator<Item = &Arc<ParameterNode<A>>> {
        self.nodes.iter().filter_map(CommandNode::as_parameter)
    }

    pub fn flag_count(&self) -> usize {
        self.flag_count
    }

    pub fn permission(&self) -> &CommandPermission<A> {
        &self.permission
    }

    pub fn action(&self) -> Option<&CommandAction<A>> {
        self.action.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Secret commands dispatch normally but are never completed.
    pub fn is_secret(&self) -> bool {
        self.secret
    }

    /// Usage line, e.g. `give <item> [amount] [--silent | -s]`.
    pub fn usage(&self) -> String {
        self.usage_with("--", "-")
    }

    /// Usage line rendered with the given flag prefixes.
    pub fn usage_with(&self, long_prefix: &str, short_prefix: &str) -> String {
        self.nodes
            .iter()
            .map(|node| node.representation_with(long_prefix, short_prefix))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<A> fmt::Debug for ExecutableCommand<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutableCommand")
            .field("id", &self.id)
            .field("usage", &self.usage())
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

/// Declares a command.
///
/// ```
/// use cmdtree_core::{CommandBuilder, IntegerType, ParameterNode, WordType};
///
/// let builder = CommandBuilder::<()>::new("give")
///     .with_alias("g")
///     .argument(ParameterNode::new("item", WordType::new()))
///     .argument(ParameterNode::new("amount", IntegerType::new()).with_default("1"))
///     .argument(ParameterNode::switch("silent"));
/// ```
pub struct CommandBuilder<A> {
    names: Vec<String>,
    nodes: Vec<CommandNode<A>>,
    permission: CommandPermission<A>,
    action: Option<CommandAction<A>>,
    description: Option<String>,
    secret: bool,
}

impl<A> CommandBuilder<A> {
    /// Starts a command whose first literal is `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            names: vec![name.clone()],
            nodes: vec![CommandNode::Literal { name }],
            permission: CommandPermission::always(),
            action: None,
            description: None,
            secret: false,
        }
    }

    /// Starts a command from a space-separated path such as `"team add"`.
    pub fn path(path: &str) -> Self {
        let mut words = path.split_whitespace();
        let mut builder = Self::new(words.next().unwrap_or_default());
        for word in words {
            builder = builder.literal(word);
        }
        builder
    }

    /// Registers the same command under another first literal.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.names.push(alias.into());
        self
    }

    /// Appends a literal keyword.
    #[must_use]
    pub fn literal(mut self, name: impl Into<String>) -> Self {
        self.nodes.push(CommandNode::Literal { name: name.into() });
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn argument(mut self, parameter: ParameterNode<A>) -> Self {
        self.nodes.push(CommandNode::Parameter(Arc::new(parameter)));
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: CommandPermission<A>) -> Self {
        self.permission = permission;
        self
    }

    /// Shorthand for a predicate permission.
    #[must_use]
    pub fn with_requirement<F>(self, predicate: F) -> Self
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.with_permission(CommandPermission::new(predicate))
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    #[must_use]
    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&ExecutionContext<'_, A>) + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Validates the declaration and produces one command per name.
    pub fn build(self, id: CommandId) -> Result<Vec<ExecutableCommand<A>>, RegistrationError> {
        self.validate()?;

        let (mut nodes, flags): (Vec<_>, Vec<_>) = self.nodes.into_iter().partition(|node| {
            node.as_parameter()
                .is_none_or(|parameter| !parameter.is_flag_like())
        });
        let flag_count = flags.len();
        nodes.extend(flags);

        let commands = self
            .names
            .iter()
            .map(|name| {
                let mut nodes = nodes.clone();
                nodes[0] = CommandNode::Literal { name: name.clone() };
                ExecutableCommand {
                    id,
                    nodes,
                    flag_count,
                    permission: self.permission.clone(),
                    action: self.action.clone(),
                    description: self.description.clone(),
                    secret: self.secret,
                }
            })
            .collect();
        Ok(commands)
    }

    fn validate(&self) -> Result<(), RegistrationError> {
        if self.names.iter().any(|name| name.trim().is_empty())
            || !self.nodes.first().is_some_and(CommandNode::is_literal)
        {
            return Err(RegistrationError::EmptyCommand);
        }

        let literals: HashSet<&str> = self
            .nodes
            .iter()
            .filter(|node| node.is_literal())
            .map(CommandNode::name)
            .chain(self.names.iter().map(String::as_str))
            .collect();

        let mut names = HashSet::new();
        let mut long_names = HashSet::new();
        let mut shorthands = HashSet::new();
        for parameter in self.nodes.iter().filter_map(CommandNode::as_parameter) {
            if !names.insert(parameter.name()) {
                return Err(RegistrationError::DuplicateParameter {
                    name: parameter.name().to_string(),
                });
            }
            match parameter.flag_kind() {
                FlagKind::Positional => {
                    if literals.contains(parameter.name()) {
                        return Err(RegistrationError::ConflictingNode {
                            name: parameter.name().to_string(),
                        });
                    }
                }
                kind => {
                    if matches!(kind, FlagKind::Switch { .. })
                        && parameter.parameter_type().value_kind() != ValueKind::Bool
                    {
                        return Err(RegistrationError::InvalidSwitch {
                            name: parameter.name().to_string(),
                        });
                    }
                    if !long_names.insert(parameter.long_name()) {
                        return Err(RegistrationError::DuplicateParameter {
                            name: parameter.long_name().to_string(),
                        });
                    }
                    if let Some(c) = parameter.shorthand() {
                        if !shorthands.insert(c) {
                            return Err(RegistrationError::DuplicateParameter {
                                name: c.to_string(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
