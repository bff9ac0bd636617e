//! Opaque permission predicates.

use std::fmt;
use std::sync::Arc;

type Predicate<A> = Arc<dyn Fn(&A) -> bool + Send + Sync>;

/// A test deciding whether a principal may use a node or command.
///
/// The default permission allows everyone. Predicates are shared, so
/// cloning is cheap.
pub struct CommandPermission<A> {
    predicate: Option<Predicate<A>>,
}

impl<A> CommandPermission<A> {
    /// A permission that allows every principal.
    pub fn always() -> Self {
        Self { predicate: None }
    }

    /// A permission backed by `predicate`.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// Returns true if this permission allows every principal.
    pub fn is_always(&self) -> bool {
        self.predicate.is_none()
    }

    pub fn is_executable_by(&self, principal: &A) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(principal),
            None => true,
        }
    }
}

impl<A: 'static> CommandPermission<A> {
    /// A permission satisfied when either side is.
    ///
    /// Merged tree nodes combine the permissions of every command passing
    /// through them this way.
    #[must_use]
    pub fn or(&self, other: &Self) -> Self {
        match (&self.predicate, &other.predicate) {
            (None, _) | (_, None) => Self::always(),
            (Some(left), Some(right)) => {
                let left = Arc::clone(left);
                let right = Arc::clone(right);
                Self {
                    predicate: Some(Arc::new(move |principal: &A| {
                        left(principal) || right(principal)
                    })),
                }
            }
        }
    }
}

impl<A> Clone for CommandPermission<A> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
        }
    }
}

impl<A> Default for CommandPermission<A> {
    fn default() -> Self {
        Self::always()
    }
}

impl<A> fmt::Debug for CommandPermission<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_always() {
            f.write_str("CommandPermission(always)")
        } else {
            f.write_str("CommandPermission(predicate)")
        }
    }
}
