//! This crate provides three comparison-ordered set data structures behind
//! one interface surface:
//!
//! * [`bst::Tree`] — a classic, unbalanced binary search tree. Cheap
//!   operations, no balancing guarantees, plus spine utilities
//!   (`to_list`, `to_reversed_list`) and an on-demand [`bst::Tree::rebalance`]
//!   that restores optimal height without tracking a size counter.
//! * [`rbt::Tree`] — a red-black tree whose insert and remove are each a
//!   *single top-down pass*: no parent pointers, no recursion, no second
//!   fix-up sweep. Guarantees `O(log n)` height at all times.
//! * [`splay::Tree`] — a self-adjusting splay tree. Every access (even
//!   `search`) restructures the tree, which is why all of its operations
//!   take `&mut self`. Amortized `O(log n)` with strong access locality.
//!
//! All three share the same semantics for the common operations:
//!
//! 1. Elements are unique under the tree's comparator: inserting an element
//!    that compares equal to a stored one *overwrites* it and hands the
//!    displaced payload back.
//! 2. Missing keys are never errors; lookups and removals answer with
//!    `Option`.
//! 3. Trees own their payloads. Removal moves the payload back out; bulk
//!    teardown can either drop payloads (`clear`) or return them one by one
//!    (`clear_with`).
//!
//! The comparator is injected at construction and fixed for the life of the
//! tree, so payload types need not implement [`Ord`] themselves:
//!
//! ```
//! use ordset::bst::Tree;
//!
//! // Order pairs by their first component only.
//! let mut tree = Tree::new(|a: &(u32, String), b: &(u32, String)| a.0.cmp(&b.0));
//!
//! tree.insert((2, "two".to_string()));
//! tree.insert((1, "one".to_string()));
//!
//! // Same key, new payload: the old payload is displaced.
//! let old = tree.insert((1, "uno".to_string()));
//! assert_eq!(old, Some((1, "one".to_string())));
//!
//! assert_eq!(tree.min(), Some(&(1, "uno".to_string())));
//! ```
//!
//! The set combinators (`union`, `intersection`, `diff`, `sym_diff`) build a
//! brand new tree from two operands with the same comparator, cloning the
//! payloads (left operand wins on a tie). For the plain and red-black trees
//! they walk both operands in sorted order with constant auxiliary space by
//! temporarily threading right links (a Morris walk); the links are restored
//! before the combinator returns, which is why those combinators can take
//! their operands by shared reference.

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

use std::cmp::Ordering;

pub mod bst;
pub mod rbt;
pub mod splay;

mod walk;

#[cfg(test)]
mod test;

/// A total order over payloads, fixed at tree creation.
///
/// The comparator is the sole authority on element identity: two payloads
/// are the same element if and only if `compare` returns
/// [`Ordering::Equal`]. Every closure or function of the right shape is a
/// comparator, so the common case reads naturally:
///
/// ```
/// use ordset::rbt::Tree;
///
/// let mut tree = Tree::new(i32::cmp);
/// tree.insert(7);
/// assert_eq!(tree.search(&7), Some(&7));
/// ```
pub trait Comparator<T> {
    /// Compares two payloads, returning their relative order.
    ///
    /// Must be a total order: antisymmetric, transitive, and total. The
    /// trees do not (and cannot) diagnose a comparator that violates this;
    /// the structural validators can detect the resulting corruption after
    /// the fact.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}
