//! Orderings of unordered flag sets.
//!
//! Flags and switches may appear in any order, but the tree only accepts
//! concrete paths. Small sets are expanded into every ordering: required
//! flags first, in every order, followed by the optional ones, in every
//! order. Larger sets are wired as a chain instead (see
//! [`crate::CommandTree`]), since `n!` paths stop being affordable.

use std::sync::Arc;

use crate::node::ParameterNode;

/// Every ordering of `items`, using recursive swaps.
///
/// The empty slice has exactly one ordering: the empty one.
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let mut working = items.to_vec();
    let mut out = Vec::new();
    permute(&mut working, 0, &mut out);
    out
}

fn permute<T: Clone>(items: &mut Vec<T>, start: usize, out: &mut Vec<Vec<T>>) {
    if start >= items.len() {
        out.push(items.clone());
        return;
    }
    for i in start..items.len() {
        items.swap(start, i);
        permute(items, start + 1, out);
        items.swap(start, i);
    }
}

/// Splits flags into required and optional ones, keeping declaration order.
pub fn partition_flags<A>(
    flags: &[Arc<ParameterNode<A>>],
) -> (Vec<Arc<ParameterNode<A>>>, Vec<Arc<ParameterNode<A>>>) {
    flags.iter().cloned().partition(|flag| !flag.is_optional())
}

/// Every accepted ordering of a command's flags.
///
/// Each ordering is a permutation of the required flags followed by a
/// permutation of the optional ones. Omitting optional flags is handled by
/// the tree, which lets input end at any point where only optional flags
/// remain.
pub fn flag_orderings<A>(flags: &[Arc<ParameterNode<A>>]) -> Vec<Vec<Arc<ParameterNode<A>>>> {
    let (required, optional) = partition_flags(flags);
    let required = permutations(&required);
    let optional = permutations(&optional);

    let mut out = Vec::with_capacity(required.len() * optional.len());
    for head in &required {
        for tail in &optional {
            let mut ordering = head.clone();
            ordering.extend(tail.iter().cloned());
            out.push(ordering);
        }
    }
    out
}
