//! Error types for registration and dispatch.
//!
//! Failures are structured values. They carry the offending node, the raw
//! text involved and the cursor position so a host can render its own
//! message; the `Display` output here is meant for logs.

use thiserror::Error;

/// A structured failure produced while matching input against the tree.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} (at position {position})")]
pub struct ParseFailure {
    /// What went wrong.
    pub kind: FailureKind,
    /// Name of the node being parsed when the failure happened, if any.
    pub node: Option<String>,
    /// Byte offset into the input where the failure was detected.
    pub position: usize,
}

impl ParseFailure {
    /// Creates a failure that is not yet attached to a node.
    pub fn new(kind: FailureKind, position: usize) -> Self {
        Self {
            kind,
            node: None,
            position,
        }
    }

    /// Attaches the failure to a node, keeping an existing attachment.
    #[must_use]
    pub fn at_node(mut self, name: impl Into<String>) -> Self {
        if self.node.is_none() {
            self.node = Some(name.into());
        }
        self
    }

    /// Shorthand for an [`FailureKind::InvalidValue`] failure.
    pub fn invalid_value(input: impl Into<String>, kind: InvalidValueKind, position: usize) -> Self {
        Self::new(
            FailureKind::InvalidValue {
                input: input.into(),
                kind,
            },
            position,
        )
    }
}

/// The kind of a [`ParseFailure`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureKind {
    /// Tried to read past the end of the input.
    #[error("unexpected end of input")]
    EndOfInput,

    /// A quoted segment was never closed.
    #[error("unclosed quote")]
    UnclosedQuote,

    /// A backslash was followed by something other than the quote or itself.
    #[error("invalid escape character '{0}'")]
    InvalidEscapeCharacter(char),

    /// An argument was followed by trailing data instead of whitespace.
    #[error("expected whitespace to end one argument")]
    ExpectedWhitespace,

    /// The next word matched none of the expected literals.
    #[error("expected one of {expected:?}, found '{found}'")]
    ExpectedLiteral {
        /// Literal names accepted at this point.
        expected: Vec<String>,
        /// The word that was read instead.
        found: String,
    },

    /// A required parameter had no input left to parse.
    #[error("missing argument '{0}'")]
    MissingArgument(String),

    /// A parameter type rejected the input.
    #[error("invalid value '{input}': {kind}")]
    InvalidValue {
        /// The raw text the parser consumed.
        input: String,
        /// The type-specific reason.
        kind: InvalidValueKind,
    },

    /// A flag token named no flag accepted at this point.
    #[error("unknown {} '{name}'", flag_label(.shorthand))]
    UnknownParameter {
        /// The flag name as typed, without its prefix.
        name: String,
        /// Whether it was written in short form.
        shorthand: bool,
    },

    /// The principal is not allowed to use the node.
    #[error("no permission")]
    NoPermission,

    /// The first word matched no registered command.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Input continued after a complete command.
    #[error("unexpected trailing input '{0}'")]
    TrailingInput(String),
}

fn flag_label(shorthand: &bool) -> &'static str {
    if *shorthand { "shorthand flag" } else { "flag" }
}

/// Type-specific reasons a value was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidValueKind {
    /// Not a decimal number.
    #[error("not a number")]
    Number,

    /// Not an integer.
    #[error("not an integer")]
    Integer,

    /// Neither `true` nor `false`.
    #[error("not a boolean")]
    Boolean,

    /// Not one of the allowed choices.
    #[error("expected one of {allowed:?}")]
    Choice {
        /// The accepted values.
        allowed: Vec<String>,
        /// Whether the comparison was case-sensitive.
        case_sensitive: bool,
    },

    /// A number outside its inclusive range.
    #[error("must be between {min} and {max}")]
    OutOfRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// A string whose length is outside its bounds.
    #[error("length {actual} is not between {min} and {max}")]
    WrongSize {
        /// Minimum length in characters.
        min: usize,
        /// Maximum length in characters.
        max: usize,
        /// Length that was found.
        actual: usize,
    },

    /// Any other rejection by a custom parameter type.
    #[error("{0}")]
    Other(String),
}

/// Errors raised while building commands or inserting them into the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A positional parameter shares its name with a literal on the same path.
    #[error("parameter '{name}' collides with a literal on the same path")]
    ConflictingNode {
        /// The colliding name.
        name: String,
    },

    /// A switch was declared over a non-boolean parameter type.
    #[error("switch '{name}' must use a boolean parameter type")]
    InvalidSwitch {
        /// The switch parameter name.
        name: String,
    },

    /// The command does not start with a literal.
    #[error("a command must start with a literal")]
    EmptyCommand,

    /// Two parameters (or two flags) of one command share a name.
    #[error("duplicate parameter '{name}'")]
    DuplicateParameter {
        /// The duplicated name.
        name: String,
    },

    /// The dispatcher settings are unusable.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}
