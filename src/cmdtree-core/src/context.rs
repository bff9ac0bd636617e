//! Per-call execution context.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::command::ExecutableCommand;
use crate::stream::StringStream;
use crate::value::Value;

/// Resolved values for one dispatch or completion attempt.
///
/// A context is created fresh for every call and borrows the acting
/// principal. It is never shared between calls.
pub struct ExecutionContext<'a, A> {
    principal: &'a A,
    input: StringStream,
    values: IndexMap<String, Value>,
    command: Option<Arc<ExecutableCommand<A>>>,
}

impl<'a, A> ExecutionContext<'a, A> {
    /// Creates an empty context for `principal` over `input`.
    pub fn new(principal: &'a A, input: StringStream) -> Self {
        Self {
            principal,
            input,
            values: IndexMap::new(),
            command: None,
        }
    }

    /// The acting principal.
    pub fn principal(&self) -> &'a A {
        self.principal
    }

    /// Snapshot of the input this context was resolved from.
    pub fn input(&self) -> &StringStream {
        &self.input
    }

    /// The command this context was bound to, once dispatch succeeded.
    pub fn command(&self) -> Option<&Arc<ExecutableCommand<A>>> {
        self.command.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of resolved values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over resolved values.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Stores a resolved value, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Drops values resolved after the first `len`, undoing a failed branch.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    pub(crate) fn set_input(&mut self, input: StringStream) {
        self.input = input;
    }

    pub(crate) fn set_command(&mut self, command: Arc<ExecutableCommand<A>>) {
        self.command = Some(command);
    }
}

impl<A> std::fmt::Debug for ExecutionContext<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("input", &self.input.source())
            .field("values", &self.values)
            .field("command", &self.command.as_ref().map(|c| c.usage()))
            .finish()
    }
}
