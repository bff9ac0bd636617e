//! Command nodes: literals and parameters.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::parameter::{BooleanType, ParameterType, StaticSuggestions, SuggestionProvider};
use crate::permission::CommandPermission;

/// How a parameter is written in input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagKind {
    /// A positional argument.
    Positional,
    /// `--name` or `-s` with no value; resolves to `true` when present.
    Switch {
        long_name: String,
        shorthand: Option<char>,
    },
    /// `--name <value>` or `-s <value>`.
    Flag {
        long_name: String,
        shorthand: Option<char>,
    },
}

impl FlagKind {
    pub fn long_name(&self) -> Option<&str> {
        match self {
            FlagKind::Positional => None,
            FlagKind::Switch { long_name, .. } | FlagKind::Flag { long_name, .. } => {
                Some(long_name)
            }
        }
    }

    pub fn shorthand(&self) -> Option<char> {
        match self {
            FlagKind::Positional => None,
            FlagKind::Switch { shorthand, .. } | FlagKind::Flag { shorthand, .. } => *shorthand,
        }
    }
}

/// One element of a command's path.
pub enum CommandNode<A> {
    /// A fixed keyword.
    Literal { name: String },
    /// A typed value.
    Parameter(Arc<ParameterNode<A>>),
}

impl<A> CommandNode<A> {
    pub fn name(&self) -> &str {
        match self {
            CommandNode::Literal { name } => name,
            CommandNode::Parameter(parameter) => &parameter.name,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, CommandNode::Literal { .. })
    }

    pub fn as_parameter(&self) -> Option<&Arc<ParameterNode<A>>> {
        match self {
            CommandNode::Literal { .. } => None,
            CommandNode::Parameter(parameter) => Some(parameter),
        }
    }

    /// How the node appears in usage text, with `--` and `-` flag prefixes.
    pub fn representation(&self) -> String {
        self.representation_with("--", "-")
    }

    /// How the node appears in usage text with the given flag prefixes.
    pub fn representation_with(&self, long_prefix: &str, short_prefix: &str) -> String {
        match self {
            CommandNode::Literal { name } => name.clone(),
            CommandNode::Parameter(parameter) => {
                parameter.representation_with(long_prefix, short_prefix)
            }
        }
    }
}

impl<A> Clone for CommandNode<A> {
    fn clone(&self) -> Self {
        match self {
            CommandNode::Literal { name } => CommandNode::Literal { name: name.clone() },
            CommandNode::Parameter(parameter) => CommandNode::Parameter(Arc::clone(parameter)),
        }
    }
}

impl<A> fmt::Debug for CommandNode<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandNode::Literal { name } => f.debug_struct("Literal").field("name", name).finish(),
            CommandNode::Parameter(parameter) => fmt::Debug::fmt(parameter, f),
        }
    }
}

/// A typed parameter of a command.
///
/// Built with [`ParameterNode::new`], [`ParameterNode::flag`] or
/// [`ParameterNode::switch`] and refined with the `with_*` methods.
pub struct ParameterNode<A> {
    pub(crate) name: String,
    pub(crate) kind: Arc<dyn ParameterType<A>>,
    pub(crate) optional: bool,
    pub(crate) default: Option<String>,
    pub(crate) flag: FlagKind,
    pub(crate) permission: CommandPermission<A>,
    pub(crate) description: Option<String>,
    pub(crate) suggestions: Option<Arc<dyn SuggestionProvider<A>>>,
}

impl<A> ParameterNode<A> {
    /// A required positional parameter.
    pub fn new(name: impl Into<String>, kind: impl ParameterType<A> + 'static) -> Self {
        Self {
            name: name.into(),
            kind: Arc::new(kind),
            optional: false,
            default: None,
            flag: FlagKind::Positional,
            permission: CommandPermission::always(),
            description: None,
            suggestions: None,
        }
    }

    /// A required `--name <value>` flag.
    pub fn flag(name: impl Into<String>, kind: impl ParameterType<A> + 'static) -> Self {
        Self::new(name, kind).as_flag()
    }

    /// A boolean `--name` switch.
    pub fn switch(name: impl Into<String>) -> Self {
        Self::new(name, BooleanType).as_switch()
    }

    /// Turns the parameter into a flag named after it.
    #[must_use]
    pub fn as_flag(mut self) -> Self {
        self.flag = FlagKind::Flag {
            long_name: self.name.clone(),
            shorthand: self.name.chars().next(),
        };
        self
    }

    /// Turns the parameter into a switch named after it.
    ///
    /// The type must yield booleans; this is checked at registration.
    #[must_use]
    pub fn as_switch(mut self) -> Self {
        self.flag = FlagKind::Switch {
            long_name: self.name.clone(),
            shorthand: self.name.chars().next(),
        };
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Default input used when the parameter is omitted. Implies optional.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self.optional = true;
        self
    }

    /// Overrides the long name of a flag or switch.
    #[must_use]
    pub fn with_long_name(mut self, name: impl Into<String>) -> Self {
        match &mut self.flag {
            FlagKind::Positional => {}
            FlagKind::Switch { long_name, .. } | FlagKind::Flag { long_name, .. } => {
                *long_name = name.into();
            }
        }
        self
    }

    /// Overrides the shorthand of a flag or switch.
    #[must_use]
    pub fn with_shorthand(mut self, c: char) -> Self {
        match &mut self.flag {
            FlagKind::Positional => {}
            FlagKind::Switch { shorthand, .. } | FlagKind::Flag { shorthand, .. } => {
                *shorthand = Some(c);
            }
        }
        self
    }

    /// Removes the shorthand of a flag or switch.
    #[must_use]
    pub fn without_shorthand(mut self) -> Self {
        match &mut self.flag {
            FlagKind::Positional => {}
            FlagKind::Switch { shorthand, .. } | FlagKind::Flag { shorthand, .. } => {
                *shorthand = None;
            }
        }
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: CommandPermission<A>) -> Self {
        self.permission = permission;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the type's default suggestions.
    #[must_use]
    pub fn with_suggestions(mut self, provider: impl SuggestionProvider<A> + 'static) -> Self {
        self.suggestions = Some(Arc::new(provider));
        self
    }

    /// Replaces the type's default suggestions with a fixed list.
    #[must_use]
    pub fn with_static_suggestions<I, S>(self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        StaticSuggestions: SuggestionProvider<A>,
    {
        self.with_suggestions(StaticSuggestions::new(suggestions))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_type(&self) -> &Arc<dyn ParameterType<A>> {
        &self.kind
    }

    pub fn flag_kind(&self) -> &FlagKind {
        &self.flag
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn permission(&self) -> &CommandPermission<A> {
        &self.permission
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_switch(&self) -> bool {
        matches!(self.flag, FlagKind::Switch { .. })
    }

    /// Returns true for both value flags and switches.
    pub fn is_flag_like(&self) -> bool {
        !matches!(self.flag, FlagKind::Positional)
    }

    /// Whether input may omit this parameter. Switches always may.
    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some() || self.is_switch()
    }

    /// Long name for flags and switches, the parameter name otherwise.
    pub fn long_name(&self) -> &str {
        self.flag.long_name().unwrap_or(&self.name)
    }

    pub fn shorthand(&self) -> Option<char> {
        self.flag.shorthand()
    }

    /// Completion candidates for this parameter.
    pub(crate) fn suggestions(&self, context: &ExecutionContext<'_, A>) -> Vec<String> {
        match &self.suggestions {
            Some(provider) => provider.suggestions(context),
            None => self.kind.default_suggestions(),
        }
    }

    /// How the parameter appears in usage text, with `--` and `-` flag
    /// prefixes.
    pub fn representation(&self) -> String {
        self.representation_with("--", "-")
    }

    pub fn representation_with(&self, long_prefix: &str, short_prefix: &str) -> String {
        let (long, short) = (long_prefix, short_prefix);
        match &self.flag {
            FlagKind::Positional if self.is_optional() => format!("[{}]", self.name),
            FlagKind::Positional => format!("<{}>", self.name),
            FlagKind::Switch {
                long_name,
                shorthand,
            } => match shorthand {
                Some(c) => format!("[{long}{long_name} | {short}{c}]"),
                None => format!("[{long}{long_name}]"),
            },
            FlagKind::Flag {
                long_name,
                shorthand,
            } => {
                let body = match shorthand {
                    Some(c) => format!("{long}{long_name} <{0}> | {short}{c} <{0}>", self.name),
                    None => format!("{long}{long_name} <{}>", self.name),
                };
                if self.is_optional() {
                    format!("[{body}]")
                } else {
                    format!("<{body}>")
                }
            }
        }
    }
}

impl<A> fmt::Debug for ParameterNode<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterNode")
            .field("name", &self.name)
            .field("priority", &self.kind.priority())
            .field("optional", &self.is_optional())
            .field("default", &self.default)
            .field("flag", &self.flag)
            .finish_non_exhaustive()
    }
}

/// Total order over parameters competing at one tree depth.
///
/// Required parameters come before optional ones; otherwise the type with
/// the lower priority comes first. Ties fall back to the reverse comparison
/// so an asymmetric `compare_priority` still yields a consistent answer.
pub fn compare_parameters<A>(a: &ParameterNode<A>, b: &ParameterNode<A>) -> Ordering {
    match (a.is_optional(), b.is_optional()) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }
    match a.kind.compare_priority(b.kind.as_ref()) {
        Ordering::Equal => b.kind.compare_priority(a.kind.as_ref()).reverse(),
        order => order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{ChoiceType, GreedyStringType, IntegerType, WordType};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_shorthand_is_first_char() {
        let node = ParameterNode::<()>::flag("limit", IntegerType::new());
        assert_eq!(node.shorthand(), Some('l'));
        assert_eq!(node.long_name(), "limit");
    }

    #[test]
    fn test_switch_is_optional() {
        let node = ParameterNode::<()>::switch("silent");
        assert!(node.is_optional());
        assert!(node.is_switch());
    }

    #[test]
    fn test_with_default_implies_optional() {
        let node = ParameterNode::<()>::new("count", IntegerType::new()).with_default("1");
        assert!(node.is_optional());
        assert_eq!(node.default_value(), Some("1"));
    }

    #[test]
    fn test_representation() {
        assert_eq!(
            ParameterNode::<()>::new("target", WordType::new()).representation(),
            "<target>"
        );
        assert_eq!(
            ParameterNode::<()>::new("count", IntegerType::new())
                .optional()
                .representation(),
            "[count]"
        );
        assert_eq!(
            ParameterNode::<()>::switch("silent").representation(),
            "[--silent | -s]"
        );
        assert_eq!(
            ParameterNode::<()>::flag("limit", IntegerType::new()).representation(),
            "<--limit <limit> | -l <limit>>"
        );
        assert_eq!(
            ParameterNode::<()>::flag("limit", IntegerType::new())
                .without_shorthand()
                .with_default("5")
                .representation(),
            "[--limit <limit>]"
        );
    }

    #[test]
    fn test_representation_with_custom_prefixes() {
        assert_eq!(
            ParameterNode::<()>::switch("silent").representation_with("++", "+"),
            "[++silent | +s]"
        );
        assert_eq!(
            ParameterNode::<()>::flag("limit", IntegerType::new()).representation_with("/", "/"),
            "</limit <limit> | /l <limit>>"
        );
    }

    #[test]
    fn test_required_sorts_before_optional() {
        let required = ParameterNode::<()>::new("a", GreedyStringType);
        let optional = ParameterNode::<()>::new("b", ChoiceType::new(["x"])).optional();
        assert_eq!(compare_parameters(&required, &optional), Ordering::Less);
        assert_eq!(compare_parameters(&optional, &required), Ordering::Greater);
    }

    #[test]
    fn test_priority_breaks_required_tie() {
        let choice = ParameterNode::<()>::new("mode", ChoiceType::new(["x"]));
        let word = ParameterNode::<()>::new("name", WordType::new());
        assert_eq!(compare_parameters(&choice, &word), Ordering::Less);
        assert_eq!(compare_parameters(&word, &word), Ordering::Equal);
    }
}
