//! Built-in parameter types.

use crate::context::ExecutionContext;
use crate::error::{FailureKind, InvalidValueKind, ParseFailure};
use crate::stream::StringStream;
use crate::value::{Value, ValueKind};

use super::{
    PRIORITY_BOOLEAN, PRIORITY_CHOICE, PRIORITY_DECIMAL, PRIORITY_GREEDY, PRIORITY_INTEGER,
    PRIORITY_WORD, ParameterType,
};

// ============================================================================
// Choice
// ============================================================================

/// One word out of a fixed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceType {
    choices: Vec<String>,
    case_sensitive: bool,
}

impl ChoiceType {
    /// A case-insensitive choice over `choices`.
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
            case_sensitive: false,
        }
    }

    #[must_use]
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    fn find(&self, word: &str) -> Option<&String> {
        if self.case_sensitive {
            self.choices.iter().find(|choice| *choice == word)
        } else {
            self.choices
                .iter()
                .find(|choice| choice.eq_ignore_ascii_case(word))
        }
    }
}

impl<A> ParameterType<A> for ChoiceType {
    fn parse(
        &self,
        input: &mut StringStream,
        _context: &ExecutionContext<'_, A>,
    ) -> Result<Value, ParseFailure> {
        let start = input.position();
        let word = input.read_string()?;
        match self.find(&word) {
            Some(choice) => Ok(Value::Text(choice.clone())),
            None => Err(ParseFailure::invalid_value(
                word,
                InvalidValueKind::Choice {
                    allowed: self.choices.clone(),
                    case_sensitive: self.case_sensitive,
                },
                start,
            )),
        }
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn priority(&self) -> i32 {
        PRIORITY_CHOICE
    }

    fn default_suggestions(&self) -> Vec<String> {
        self.choices.clone()
    }
}

// ============================================================================
// Boolean
// ============================================================================

/// `true` or `false`. Switches use this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BooleanType;

impl<A> ParameterType<A> for BooleanType {
    fn parse(
        &self,
        input: &mut StringStream,
        _context: &ExecutionContext<'_, A>,
    ) -> Result<Value, ParseFailure> {
        input.read_boolean().map(Value::Bool)
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Bool
    }

    fn priority(&self) -> i32 {
        PRIORITY_BOOLEAN
    }

    fn default_suggestions(&self) -> Vec<String> {
        vec!["true".to_string(), "false".to_string()]
    }

    fn zero_value(&self) -> Option<Value> {
        Some(Value::Bool(false))
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// A whole number with an optional inclusive range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerType {
    min: Option<i64>,
    max: Option<i64>,
}

impl IntegerType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts values to `min..=max`.
    pub fn range(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    #[must_use]
    pub fn with_min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub fn with_max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }
}

impl<A> ParameterType<A> for IntegerType {
    fn parse(
        &self,
        input: &mut StringStream,
        _context: &ExecutionContext<'_, A>,
    ) -> Result<Value, ParseFailure> {
        let start = input.position();
        let value = input.read_integer()?;
        let min = self.min.unwrap_or(i64::MIN);
        let max = self.max.unwrap_or(i64::MAX);
        if value < min || value > max {
            return Err(ParseFailure::invalid_value(
                value.to_string(),
                InvalidValueKind::OutOfRange {
                    min: min as f64,
                    max: max as f64,
                },
                start,
            ));
        }
        Ok(Value::Integer(value))
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Integer
    }

    fn priority(&self) -> i32 {
        PRIORITY_INTEGER
    }

    fn zero_value(&self) -> Option<Value> {
        Some(Value::Integer(0))
    }
}

/// A decimal number with an optional inclusive range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecimalType {
    min: Option<f64>,
    max: Option<f64>,
}

impl DecimalType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts values to `min..=max`.
    pub fn range(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl<A> ParameterType<A> for DecimalType {
    fn parse(
        &self,
        input: &mut StringStream,
        _context: &ExecutionContext<'_, A>,
    ) -> Result<Value, ParseFailure> {
        let start = input.position();
        let value = input.read_number()?;
        let min = self.min.unwrap_or(f64::MIN);
        let max = self.max.unwrap_or(f64::MAX);
        if value < min || value > max {
            return Err(ParseFailure::invalid_value(
                value.to_string(),
                InvalidValueKind::OutOfRange { min, max },
                start,
            ));
        }
        Ok(Value::Decimal(value))
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Decimal
    }

    fn priority(&self) -> i32 {
        PRIORITY_DECIMAL
    }

    fn zero_value(&self) -> Option<Value> {
        Some(Value::Decimal(0.0))
    }
}

// ============================================================================
// Strings
// ============================================================================

/// A single quote-aware word with optional length bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordType {
    min_len: Option<usize>,
    max_len: Option<usize>,
}

impl WordType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the word to `min..=max` characters.
    pub fn sized(min: usize, max: usize) -> Self {
        Self {
            min_len: Some(min),
            max_len: Some(max),
        }
    }
}

impl<A> ParameterType<A> for WordType {
    fn parse(
        &self,
        input: &mut StringStream,
        _context: &ExecutionContext<'_, A>,
    ) -> Result<Value, ParseFailure> {
        let start = input.position();
        let word = input.read_string()?;
        let actual = word.chars().count();
        let min = self.min_len.unwrap_or(0);
        let max = self.max_len.unwrap_or(usize::MAX);
        if actual < min || actual > max {
            return Err(ParseFailure::invalid_value(
                word,
                InvalidValueKind::WrongSize { min, max, actual },
                start,
            ));
        }
        Ok(Value::Text(word))
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn priority(&self) -> i32 {
        PRIORITY_WORD
    }
}

/// Everything left on the line, verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GreedyStringType;

impl<A> ParameterType<A> for GreedyStringType {
    fn parse(
        &self,
        input: &mut StringStream,
        _context: &ExecutionContext<'_, A>,
    ) -> Result<Value, ParseFailure> {
        if input.has_finished() {
            return Err(ParseFailure::new(FailureKind::EndOfInput, input.position()));
        }
        Ok(Value::Text(input.read_remaining().to_string()))
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn priority(&self) -> i32 {
        PRIORITY_GREEDY
    }

    fn is_greedy(&self) -> bool {
        true
    }
}
