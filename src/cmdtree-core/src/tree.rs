//! The merged command tree.
//!
//! Every registered command is inserted as a path of nodes starting at a
//! shared root. Paths that start the same way share nodes: literals are
//! merged by name, parameters by name, flags by long name. Merged nodes
//! accept a principal when any of the merged commands would.
//!
//! Nodes live in an arena and refer to each other by index. This lets the
//! chained flag layout point several parents at one child without
//! reference counting.
//!
//! A node that carries a command marks a place where input may end. The
//! command is bound wherever every remaining parameter is optional.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::command::{CommandBuilder, CommandId, ExecutableCommand};
use crate::config::DispatcherSettings;
use crate::context::ExecutionContext;
use crate::error::RegistrationError;
use crate::node::{CommandNode, ParameterNode, compare_parameters};
use crate::permission::CommandPermission;
use crate::permutation::{flag_orderings, partition_flags};

pub(crate) type NodeId = usize;

pub(crate) const ROOT: NodeId = 0;

/// Hook run after a command's action completes.
pub type ExecutionHook<A> =
    Arc<dyn Fn(&ExecutableCommand<A>, &ExecutionContext<'_, A>) + Send + Sync>;

pub(crate) enum TreeNodeKind<A> {
    Root,
    Literal(String),
    Parameter(Arc<ParameterNode<A>>),
}

pub(crate) struct TreeNode<A> {
    pub(crate) kind: TreeNodeKind<A>,
    pub(crate) permission: CommandPermission<A>,
    /// Literal children, looked up by the exact next word.
    pub(crate) literals: IndexMap<String, NodeId>,
    /// Flag and switch children.
    pub(crate) flags: Vec<NodeId>,
    /// Positional parameter children, in trial order.
    pub(crate) arguments: Vec<NodeId>,
    /// The command input may resolve to when it ends here.
    pub(crate) command: Option<Arc<ExecutableCommand<A>>>,
}

impl<A> TreeNode<A> {
    fn new(kind: TreeNodeKind<A>, permission: CommandPermission<A>) -> Self {
        Self {
            kind,
            permission,
            literals: IndexMap::new(),
            flags: Vec::new(),
            arguments: Vec::new(),
            command: None,
        }
    }

    pub(crate) fn parameter(&self) -> Option<&Arc<ParameterNode<A>>> {
        match &self.kind {
            TreeNodeKind::Parameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    pub(crate) fn name(&self) -> &str {
        match &self.kind {
            TreeNodeKind::Root => "",
            TreeNodeKind::Literal(name) => name,
            TreeNodeKind::Parameter(parameter) => parameter.name(),
        }
    }
}

/// Registered commands merged into one tree.
///
/// Build the tree once, then share it: dispatch and completion only read
/// it, and every call keeps its own cursor and context.
pub struct CommandTree<A> {
    pub(crate) nodes: Vec<TreeNode<A>>,
    pub(crate) commands: Vec<Arc<ExecutableCommand<A>>>,
    pub(crate) settings: DispatcherSettings,
    pub(crate) hooks: Vec<ExecutionHook<A>>,
    next_id: u64,
}

impl<A: 'static> Default for CommandTree<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> CommandTree<A> {
    /// Creates an empty tree with default settings.
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::new(TreeNodeKind::Root, CommandPermission::always())],
            commands: Vec::new(),
            settings: DispatcherSettings::default(),
            hooks: Vec::new(),
            next_id: 0,
        }
    }

    /// Creates an empty tree with custom settings.
    pub fn with_settings(settings: DispatcherSettings) -> Result<Self, RegistrationError> {
        settings.validate()?;
        let mut tree = Self::new();
        tree.settings = settings;
        Ok(tree)
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Registered commands in registration order, one entry per alias.
    pub fn commands(&self) -> &[Arc<ExecutableCommand<A>>] {
        &self.commands
    }

    /// Number of tree nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Adds a hook run after every successful dispatch.
    pub fn on_executed<F>(&mut self, hook: F)
    where
        F: Fn(&ExecutableCommand<A>, &ExecutionContext<'_, A>) + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
    }

    /// Builds and inserts a command under every one of its names.
    ///
    /// Aliases are inserted in order; if one of them fails, the earlier
    /// ones stay registered.
    pub fn register(&mut self, builder: CommandBuilder<A>) -> Result<CommandId, RegistrationError> {
        let id = CommandId(self.next_id);
        let commands = builder.build(id)?;
        self.next_id += 1;
        for command in commands {
            self.insert(command)?;
        }
        Ok(id)
    }

    /// Inserts one command path, merging it with existing paths.
    pub fn insert(&mut self, command: ExecutableCommand<A>) -> Result<(), RegistrationError> {
        if !command.nodes().first().is_some_and(CommandNode::is_literal) {
            return Err(RegistrationError::EmptyCommand);
        }

        let command = Arc::new(command);
        let before = self.nodes.len();
        let flags: Vec<_> = command.flags().cloned().collect();
        let layout = if flags.len() > self.settings.permutation_threshold {
            FlagLayout::Chain
        } else {
            FlagLayout::Permutations(flag_orderings(&flags))
        };

        let positionals = command.positionals();
        let mut current = ROOT;
        for (i, node) in positionals.iter().enumerate() {
            if i > 0 && only_optional(&positionals[i..]) {
                self.graft_flags(current, &command, &flags, &layout)?;
            }
            current = self.attach(current, node, &command)?;
        }
        self.graft_flags(current, &command, &flags, &layout)?;

        debug!(
            "Registered '{}' ({} flags, {}) adding {} nodes",
            self.usage(&command),
            flags.len(),
            layout,
            self.nodes.len() - before
        );
        self.commands.push(command);
        Ok(())
    }

    /// Appends the flag section of a command below `start`.
    fn graft_flags(
        &mut self,
        start: NodeId,
        command: &Arc<ExecutableCommand<A>>,
        flags: &[Arc<ParameterNode<A>>],
        layout: &FlagLayout<A>,
    ) -> Result<(), RegistrationError> {
        match layout {
            FlagLayout::Permutations(orderings) => {
                for ordering in orderings {
                    let mut node = start;
                    for (i, flag) in ordering.iter().enumerate() {
                        if ordering[i..].iter().all(|f| f.is_optional()) {
                            self.bind(node, command);
                        }
                        node = self.attach_parameter(node, flag)?;
                    }
                    self.bind(node, command);
                }
            }
            FlagLayout::Chain => {
                let (required, optional) = partition_flags(flags);
                let mut base = start;
                for flag in &required {
                    base = self.attach_parameter(base, flag)?;
                }
                self.bind(base, command);

                // Each optional flag hangs off the base and off every
                // optional flag declared before it.
                let mut chained: Vec<NodeId> = Vec::with_capacity(optional.len());
                for flag in &optional {
                    let node = self.attach_parameter(base, flag)?;
                    self.bind(node, command);
                    for &previous in &chained {
                        self.link_flag(previous, node);
                    }
                    chained.push(node);
                }
            }
        }
        Ok(())
    }

    fn attach(
        &mut self,
        parent: NodeId,
        node: &CommandNode<A>,
        command: &ExecutableCommand<A>,
    ) -> Result<NodeId, RegistrationError> {
        match node {
            CommandNode::Literal { name } => self.attach_literal(parent, name, command),
            CommandNode::Parameter(parameter) => self.attach_parameter(parent, parameter),
        }
    }

    fn attach_literal(
        &mut self,
        parent: NodeId,
        name: &str,
        command: &ExecutableCommand<A>,
    ) -> Result<NodeId, RegistrationError> {
        if let Some(&existing) = self.nodes[parent].literals.get(name) {
            let merged = self.nodes[existing].permission.or(command.permission());
            self.nodes[existing].permission = merged;
            return Ok(existing);
        }
        if self.find_argument(parent, name).is_some() {
            return Err(RegistrationError::ConflictingNode {
                name: name.to_string(),
            });
        }

        let id = self.push_node(TreeNode::new(
            TreeNodeKind::Literal(name.to_string()),
            command.permission().clone(),
        ));
        self.nodes[parent].literals.insert(name.to_string(), id);
        Ok(id)
    }

    fn attach_parameter(
        &mut self,
        parent: NodeId,
        parameter: &Arc<ParameterNode<A>>,
    ) -> Result<NodeId, RegistrationError> {
        let existing = if parameter.is_flag_like() {
            // A flag name must mean the same thing everywhere below `parent`.
            match self.find_flag(parent, parameter.long_name()) {
                Some(existing) if !self.same_shape(existing, parameter) => {
                    return Err(RegistrationError::ConflictingNode {
                        name: parameter.long_name().to_string(),
                    });
                }
                found => found,
            }
        } else {
            if self.nodes[parent].literals.contains_key(parameter.name()) {
                return Err(RegistrationError::ConflictingNode {
                    name: parameter.name().to_string(),
                });
            }
            // Same name with another type becomes a sibling tried in order.
            self.nodes[parent].arguments.iter().copied().find(|&id| {
                self.nodes[id].name() == parameter.name() && self.same_shape(id, parameter)
            })
        };

        if let Some(existing) = existing {
            let merged = self.nodes[existing].permission.or(parameter.permission());
            self.nodes[existing].permission = merged;
            return Ok(existing);
        }

        let id = self.push_node(TreeNode::new(
            TreeNodeKind::Parameter(Arc::clone(parameter)),
            parameter.permission().clone(),
        ));

        if parameter.is_flag_like() {
            self.nodes[parent].flags.push(id);
        } else {
            // Stable: equal parameters keep their insertion order.
            let position = self.nodes[parent]
                .arguments
                .iter()
                .position(|&sibling| {
                    self.nodes[sibling]
                        .parameter()
                        .is_some_and(|s| compare_parameters(s, parameter) == Ordering::Greater)
                })
                .unwrap_or(self.nodes[parent].arguments.len());
            self.nodes[parent].arguments.insert(position, id);
        }
        Ok(id)
    }

    /// Adds an existing flag node as a child of `parent`.
    fn link_flag(&mut self, parent: NodeId, child: NodeId) {
        let Some(long_name) = self.nodes[child]
            .parameter()
            .map(|p| p.long_name().to_string())
        else {
            return;
        };
        if self.find_flag(parent, &long_name).is_none() {
            self.nodes[parent].flags.push(child);
        }
    }

    /// Marks `node` as a place where input may end with `command`.
    ///
    /// An existing binding is replaced only by a command with an action.
    fn bind(&mut self, node: NodeId, command: &Arc<ExecutableCommand<A>>) {
        let replace = match &self.nodes[node].command {
            None => true,
            Some(existing) if Arc::ptr_eq(existing, command) => false,
            Some(existing) if command.action().is_none() => {
                debug!(
                    "Keeping '{}' bound over '{}' (no action)",
                    self.usage(existing),
                    self.usage(command)
                );
                false
            }
            Some(existing) => {
                debug!(
                    "Action of '{}' overwritten by '{}'",
                    self.usage(existing),
                    self.usage(command)
                );
                true
            }
        };
        if replace {
            self.nodes[node].command = Some(Arc::clone(command));
        }
    }

    /// Whether the parameter at `id` can stand in for `parameter`.
    fn same_shape(&self, id: NodeId, parameter: &ParameterNode<A>) -> bool {
        let Some(existing) = self.nodes[id].parameter() else {
            return false;
        };
        if existing.is_switch() != parameter.is_switch()
            || existing.is_flag_like() != parameter.is_flag_like()
        {
            return false;
        }
        let (a, b) = (existing.parameter_type(), parameter.parameter_type());
        Arc::ptr_eq(a, b)
            || (a.value_kind() == b.value_kind()
                && a.priority() == b.priority()
                && a.is_greedy() == b.is_greedy())
    }

    fn push_node(&mut self, node: TreeNode<A>) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

impl<A> CommandTree<A> {
    /// Usage line of `command` rendered with this tree's flag prefixes.
    pub fn usage(&self, command: &ExecutableCommand<A>) -> String {
        command.usage_with(
            &self.settings.long_flag_prefix,
            &self.settings.short_flag_prefix,
        )
    }

    pub(crate) fn find_argument(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent]
            .arguments
            .iter()
            .copied()
            .find(|&id| self.nodes[id].name() == name)
    }

    pub(crate) fn find_flag(&self, parent: NodeId, long_name: &str) -> Option<NodeId> {
        self.nodes[parent].flags.iter().copied().find(|&id| {
            self.nodes[id]
                .parameter()
                .is_some_and(|p| p.long_name() == long_name)
        })
    }

    pub(crate) fn find_shorthand(&self, parent: NodeId, c: char) -> Option<NodeId> {
        self.nodes[parent].flags.iter().copied().find(|&id| {
            self.nodes[id]
                .parameter()
                .is_some_and(|p| p.shorthand() == Some(c))
        })
    }
}

impl<A> fmt::Debug for CommandTree<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTree")
            .field("commands", &self.commands)
            .field("nodes", &self.nodes.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

enum FlagLayout<A> {
    /// Every ordering gets its own path.
    Permutations(Vec<Vec<Arc<ParameterNode<A>>>>),
    /// Required flags in order, then optional flags as a forward-linked chain.
    Chain,
}

impl<A> fmt::Display for FlagLayout<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagLayout::Permutations(orderings) => write!(f, "{} orderings", orderings.len()),
            FlagLayout::Chain => f.write_str("chained"),
        }
    }
}

fn only_optional<A>(nodes: &[CommandNode<A>]) -> bool {
    nodes.iter().all(|node| {
        node.as_parameter()
            .is_some_and(|parameter| parameter.is_optional())
    })
}
