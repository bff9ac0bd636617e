//! Pluggable parameter types.
//!
//! A parameter type turns the next piece of input into a [`Value`]. When
//! several parameters could match at the same depth of the tree, their
//! types are ordered by [`ParameterType::priority`], lowest first, so
//! narrow parsers such as choices get a chance before free-form text.

mod builtin;

use std::cmp::Ordering;

pub use builtin::{
    BooleanType, ChoiceType, DecimalType, GreedyStringType, IntegerType, WordType,
};

use crate::context::ExecutionContext;
use crate::error::ParseFailure;
use crate::stream::StringStream;
use crate::value::{Value, ValueKind};

/// Priority of [`ChoiceType`].
pub const PRIORITY_CHOICE: i32 = 0;
/// Priority of [`BooleanType`].
pub const PRIORITY_BOOLEAN: i32 = 10;
/// Priority of [`IntegerType`].
pub const PRIORITY_INTEGER: i32 = 20;
/// Priority of [`DecimalType`].
pub const PRIORITY_DECIMAL: i32 = 30;
/// Priority of [`WordType`].
pub const PRIORITY_WORD: i32 = 50;
/// Priority of [`GreedyStringType`].
pub const PRIORITY_GREEDY: i32 = 100;

/// A typed parser for one parameter.
pub trait ParameterType<A>: Send + Sync {
    /// Consumes input and produces a value.
    ///
    /// On failure the caller restores the cursor, so implementations may
    /// leave it anywhere.
    fn parse(
        &self,
        input: &mut StringStream,
        context: &ExecutionContext<'_, A>,
    ) -> Result<Value, ParseFailure>;

    /// The kind of value [`ParameterType::parse`] yields.
    fn value_kind(&self) -> ValueKind;

    /// Lower values are tried first.
    fn priority(&self) -> i32 {
        0
    }

    /// Orders this type against another one at the same tree depth.
    fn compare_priority(&self, other: &dyn ParameterType<A>) -> Ordering {
        self.priority().cmp(&other.priority())
    }

    /// Suggestions offered by the completer when no provider is set.
    fn default_suggestions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Value used for an omitted optional parameter without a default.
    fn zero_value(&self) -> Option<Value> {
        None
    }

    /// Whether the type consumes the rest of the input.
    fn is_greedy(&self) -> bool {
        false
    }
}

/// Produces completion candidates for a parameter.
pub trait SuggestionProvider<A>: Send + Sync {
    fn suggestions(&self, context: &ExecutionContext<'_, A>) -> Vec<String>;
}

impl<A, F> SuggestionProvider<A> for F
where
    F: Fn(&ExecutionContext<'_, A>) -> Vec<String> + Send + Sync,
{
    fn suggestions(&self, context: &ExecutionContext<'_, A>) -> Vec<String> {
        self(context)
    }
}

/// A fixed list of suggestions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSuggestions(pub Vec<String>);

impl StaticSuggestions {
    pub fn new<I, S>(suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(suggestions.into_iter().map(Into::into).collect())
    }
}

impl<A> SuggestionProvider<A> for StaticSuggestions {
    fn suggestions(&self, _context: &ExecutionContext<'_, A>) -> Vec<String> {
        self.0.clone()
    }
}
