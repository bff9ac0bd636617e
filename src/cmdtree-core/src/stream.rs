//! Character stream over a single line of input.
//!
//! `StringStream` owns an immutable copy of the source text and a byte
//! cursor that only ever rests on a char boundary. Every read either moves
//! the cursor forward or fails with a structured [`ParseFailure`]; nothing
//! else is mutated, so backtracking is a matter of saving and restoring
//! [`StringStream::position`].
//!
//! Quoting follows shell-like rules:
//! - `"..."` and `'...'` group a segment containing whitespace
//! - inside a quoted segment `\` may only escape the active quote or itself
//! - a closing quote must be followed by whitespace or the end of input

use std::sync::Arc;

use crate::error::{FailureKind, InvalidValueKind, ParseFailure};

/// A cursor over immutable source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringStream {
    source: Arc<str>,
    position: usize,
}

impl StringStream {
    /// Creates a stream positioned at the start of `source`.
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
            position: 0,
        }
    }

    /// The full source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Current byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor to `position`.
    ///
    /// Offsets past the end are clamped to the end. Offsets inside a
    /// multi-byte character are moved back to the character's start.
    pub fn set_position(&mut self, position: usize) {
        let mut position = position.min(self.source.len());
        while !self.source.is_char_boundary(position) {
            position -= 1;
        }
        self.position = position;
    }

    /// Length of the source in bytes.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Whether the source is empty.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.source.len() - self.position
    }

    /// Whether any input is left.
    pub fn has_remaining(&self) -> bool {
        self.position < self.source.len()
    }

    /// Whether the cursor reached the end.
    pub fn has_finished(&self) -> bool {
        !self.has_remaining()
    }

    /// Text after the cursor.
    pub fn rest(&self) -> &str {
        &self.source[self.position..]
    }

    /// Text between `start` and the cursor.
    ///
    /// Used to recover what a parser consumed.
    pub fn consumed_since(&self, start: usize) -> &str {
        let start = start.min(self.position);
        &self.source[start..self.position]
    }

    /// The next character, without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The character `offset` characters ahead of the cursor.
    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    /// Whether the next character is whitespace.
    pub fn at_whitespace(&self) -> bool {
        self.peek().is_some_and(char::is_whitespace)
    }

    /// Consumes one character.
    pub fn read(&mut self) -> Result<char, ParseFailure> {
        match self.peek() {
            Some(c) => {
                self.position += c.len_utf8();
                Ok(c)
            }
            None => Err(ParseFailure::new(FailureKind::EndOfInput, self.position)),
        }
    }

    /// Moves forward by up to `count` characters.
    pub fn move_forward(&mut self, count: usize) {
        let advance: usize = self.rest().chars().take(count).map(char::len_utf8).sum();
        self.position += advance;
    }

    /// Skips any whitespace at the cursor.
    pub fn skip_whitespace(&mut self) {
        let skipped: usize = self
            .rest()
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(char::len_utf8)
            .sum();
        self.position += skipped;
    }

    /// The text up to the next whitespace, without consuming it.
    pub fn peek_unquoted_string(&self) -> &str {
        let rest = self.rest();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        &rest[..end]
    }

    /// Consumes and returns the text up to the next whitespace.
    ///
    /// No quote or escape processing happens here; literals and flag names
    /// are read this way.
    pub fn read_unquoted_string(&mut self) -> &str {
        let start = self.position;
        let len = self.peek_unquoted_string().len();
        self.position += len;
        &self.source[start..self.position]
    }

    /// Consumes everything left.
    pub fn read_remaining(&mut self) -> &str {
        let start = self.position;
        self.position = self.source.len();
        &self.source[start..]
    }

    /// Reads one word, honoring quotes and escapes.
    ///
    /// A word starting with `"` or `'` runs until the matching unescaped
    /// quote; the quotes are stripped. Otherwise the word runs until the
    /// next whitespace.
    pub fn read_string(&mut self) -> Result<String, ParseFailure> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.read_quoted(quote),
            Some(_) => Ok(self.read_unquoted_string().to_string()),
            None => Err(ParseFailure::new(FailureKind::EndOfInput, self.position)),
        }
    }

    fn read_quoted(&mut self, quote: char) -> Result<String, ParseFailure> {
        let opening = self.position;
        self.position += quote.len_utf8();

        let mut value = String::new();
        let mut escaped = false;
        loop {
            let at = self.position;
            let c = match self.read() {
                Ok(c) => c,
                Err(_) => {
                    return Err(ParseFailure::new(FailureKind::UnclosedQuote, opening));
                }
            };

            if escaped {
                if c == quote || c == '\\' {
                    value.push(c);
                    escaped = false;
                } else {
                    return Err(ParseFailure::new(
                        FailureKind::InvalidEscapeCharacter(c),
                        at - 1,
                    ));
                }
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                if self.has_remaining() && !self.at_whitespace() {
                    return Err(ParseFailure::new(
                        FailureKind::ExpectedWhitespace,
                        self.position,
                    ));
                }
                return Ok(value);
            } else {
                value.push(c);
            }
        }
    }

    /// Reads one word and parses it as a decimal number.
    pub fn read_number(&mut self) -> Result<f64, ParseFailure> {
        let start = self.position;
        let word = self.read_unquoted_string();
        if word.is_empty() {
            return Err(ParseFailure::new(FailureKind::EndOfInput, start));
        }
        word.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| ParseFailure::invalid_value(word, InvalidValueKind::Number, start))
    }

    /// Reads one word and parses it as an integer.
    pub fn read_integer(&mut self) -> Result<i64, ParseFailure> {
        let start = self.position;
        let word = self.read_unquoted_string();
        if word.is_empty() {
            return Err(ParseFailure::new(FailureKind::EndOfInput, start));
        }
        word.parse::<i64>()
            .map_err(|_| ParseFailure::invalid_value(word, InvalidValueKind::Integer, start))
    }

    /// Reads one word and parses it as `true` or `false` (any case).
    pub fn read_boolean(&mut self) -> Result<bool, ParseFailure> {
        let start = self.position;
        let word = self.read_unquoted_string();
        if word.is_empty() {
            return Err(ParseFailure::new(FailureKind::EndOfInput, start));
        }
        if word.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if word.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(ParseFailure::invalid_value(
                word,
                InvalidValueKind::Boolean,
                start,
            ))
        }
    }
}
