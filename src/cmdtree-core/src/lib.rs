#![allow(
    clippy::missing_errors_doc,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::cast_precision_loss
)]
//! Cmdtree Core - matching, dispatch and completion of command lines.
//!
//! Commands are declared with [`CommandBuilder`] and merged into a
//! [`CommandTree`]. The tree then answers two questions about a line of
//! input:
//! - [`CommandTree::dispatch`]: which command does it invoke, with which
//!   typed values
//! - [`CommandTree::complete`]: what could be typed next
//!
//! ```text
//!                 root
//!                /    \
//!           "give"    "team"
//!             |        /   \
//!          <item>  "add"  "list"
//!             |      |
//!         [amount] <name>
//!             |
//!   --silent / -s (every ordering)
//! ```
//!
//! # Example
//!
//! ```
//! use cmdtree_core::{CommandBuilder, CommandTree, IntegerType, ParameterNode, WordType};
//!
//! let mut tree = CommandTree::<()>::new();
//! tree.register(
//!     CommandBuilder::new("give")
//!         .argument(ParameterNode::new("item", WordType::new()))
//!         .argument(ParameterNode::new("amount", IntegerType::new()).with_default("1"))
//!         .argument(ParameterNode::switch("silent")),
//! )
//! .unwrap();
//!
//! let context = tree.dispatch(&(), "give stone -s").unwrap();
//! assert_eq!(context.get_str("item"), Some("stone"));
//! assert_eq!(context.get_i64("amount"), Some(1));
//! assert_eq!(context.get_bool("silent"), Some(true));
//!
//! assert_eq!(tree.complete(&(), "gi"), vec!["give"]);
//! ```
//!
//! The core never prints and never installs a log subscriber; it only
//! emits `tracing` events. Failures are structured [`ParseFailure`] values
//! that the host turns into messages.

#[cfg(test)]
mod tests;

mod command;
mod completion;
mod config;
mod context;
mod dispatcher;
mod error;
mod node;
mod parameter;
mod permission;
mod permutation;
mod stream;
mod tree;
mod value;

// Re-export all public types
pub use command::{CommandAction, CommandBuilder, CommandId, ExecutableCommand};
pub use config::{
    DEFAULT_PERMUTATION_THRESHOLD, DispatcherSettings, FailurePolicy, MAX_PERMUTATION_THRESHOLD,
};
pub use context::ExecutionContext;
pub use error::{FailureKind, InvalidValueKind, ParseFailure, RegistrationError};
pub use node::{CommandNode, FlagKind, ParameterNode, compare_parameters};
pub use parameter::{
    BooleanType, ChoiceType, DecimalType, GreedyStringType, IntegerType, PRIORITY_BOOLEAN,
    PRIORITY_CHOICE, PRIORITY_DECIMAL, PRIORITY_GREEDY, PRIORITY_INTEGER, PRIORITY_WORD,
    ParameterType, StaticSuggestions, SuggestionProvider, WordType,
};
pub use permission::CommandPermission;
pub use permutation::{flag_orderings, permutations};
pub use stream::StringStream;
pub use tree::{CommandTree, ExecutionHook};
pub use value::{Value, ValueKind};

// ============================================================================
// Convenience Functions
// ============================================================================

/// Inserts a built command into `tree`.
pub fn insert<A: 'static>(
    tree: &mut CommandTree<A>,
    command: ExecutableCommand<A>,
) -> Result<(), RegistrationError> {
    tree.insert(command)
}

/// Resolves `input` against `tree` and runs the bound action.
pub fn dispatch<'p, A>(
    tree: &CommandTree<A>,
    principal: &'p A,
    input: &str,
) -> Result<ExecutionContext<'p, A>, ParseFailure> {
    tree.dispatch(principal, input)
}

/// Completion suggestions for `input`.
pub fn complete<A>(tree: &CommandTree<A>, principal: &A, input: &str) -> Vec<String> {
    tree.complete(principal, input)
}
