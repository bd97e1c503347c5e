//! A self-adjusting splay tree.
//!
//! Every operation, lookups included, splays: it moves the accessed element
//! (or the last element touched while missing it) to the root with a
//! top-down pass that tears the search path into two spines and hangs them
//! back under the new root. Recently touched elements therefore sit near
//! the top, which makes skewed access patterns fast and gives every
//! operation amortized `O(log n)` cost.
//!
//! The flip side is that *reading mutates*: `search`, `min`, `max`, `prev`
//! and `next` all reshape the tree, so every method here takes `&mut self`.
//! Callers that want cheap shared reads should use one of the other
//! variants.
//!
//! The node layout is the plain one shared with [`crate::bst`]; only the
//! algorithms differ.
//!
//! # Examples
//!
//! ```
//! use ordset::splay::Tree;
//!
//! let mut tree = Tree::new(i32::cmp);
//! for x in [3, 1, 4, 1, 5, 9, 2, 6] {
//!     tree.insert(x);
//! }
//!
//! // Lookups need `&mut`: the accessed element is splayed to the root.
//! assert_eq!(tree.search(&4), Some(&4));
//! assert_eq!(tree.remove(&9), Some(9));
//! assert_eq!(tree.max(), Some(&6));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use crate::bst::{Link, Node};
use crate::Comparator;

/// A splay tree ordered by a caller-supplied comparator.
///
/// Same element semantics as the other variants; the only surface
/// difference is that every operation takes `&mut self`.
pub struct Tree<T, C> {
    root: Link<T>,
    comp: C,
}

impl<T, C: Comparator<T>> Tree<T, C> {
    /// Creates an empty tree ordered by `comp`.
    pub fn new(comp: C) -> Self {
        Self { root: None, comp }
    }

    /// Returns `true` if the tree holds no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Splays `key` to the root: the element equal to `key`, or the last
    /// element on its search path, becomes the new root.
    ///
    /// Top-down: the search path is peeled into a left spine (elements
    /// smaller than the key) and a right spine (elements bigger), with a
    /// zig-zig rotation whenever the descent takes the same turn twice.
    /// At the end the two spines are hung back under the final node.
    fn splay(&mut self, key: &T) {
        let Some(mut node) = self.root else { return };
        let mut l_head: Link<T> = None;
        let mut l_tail: Link<T> = None;
        let mut r_head: Link<T> = None;
        let mut r_tail: Link<T> = None;

        // SAFETY: all links reachable from the root are live nodes of this
        // tree, and `&mut self` makes this the only access.
        unsafe {
            loop {
                match self.comp.compare(key, &node.as_ref().item) {
                    Ordering::Less => {
                        let Some(mut left) = node.as_ref().left else { break };
                        if self.comp.compare(key, &left.as_ref().item) == Ordering::Less {
                            // Zig-zig: rotate right before linking.
                            node.as_mut().left = left.as_ref().right;
                            left.as_mut().right = Some(node);
                            node = left;
                        }
                        let Some(next) = node.as_ref().left else { break };
                        // Link the node into the right spine.
                        match r_tail {
                            None => r_head = Some(node),
                            Some(mut t) => t.as_mut().left = Some(node),
                        }
                        r_tail = Some(node);
                        node = next;
                    }
                    Ordering::Greater => {
                        let Some(mut right) = node.as_ref().right else { break };
                        if self.comp.compare(key, &right.as_ref().item) == Ordering::Greater {
                            // Zig-zig: rotate left before linking.
                            node.as_mut().right = right.as_ref().left;
                            right.as_mut().left = Some(node);
                            node = right;
                        }
                        let Some(next) = node.as_ref().right else { break };
                        // Link the node into the left spine.
                        match l_tail {
                            None => l_head = Some(node),
                            Some(mut t) => t.as_mut().right = Some(node),
                        }
                        l_tail = Some(node);
                        node = next;
                    }
                    Ordering::Equal => break,
                }
            }

            // Reassemble: the final node's subtrees finish the spines, the
            // spines become its new subtrees.
            match l_tail {
                None => l_head = node.as_ref().left,
                Some(mut t) => t.as_mut().right = node.as_ref().left,
            }
            match r_tail {
                None => r_head = node.as_ref().right,
                Some(mut t) => t.as_mut().left = node.as_ref().right,
            }
            node.as_mut().left = l_head;
            node.as_mut().right = r_head;
            self.root = Some(node);
        }
    }

    /// Splays the smallest element to the root: [`Tree::splay`] with every
    /// comparison hard-wired to "smaller", so only the right spine exists.
    fn splay_left(&mut self) {
        let Some(mut node) = self.root else { return };
        let mut r_head: Link<T> = None;
        let mut r_tail: Link<T> = None;

        // SAFETY: as in `splay`.
        unsafe {
            loop {
                let Some(mut left) = node.as_ref().left else { break };
                node.as_mut().left = left.as_ref().right;
                left.as_mut().right = Some(node);
                node = left;
                let Some(next) = node.as_ref().left else { break };
                match r_tail {
                    None => r_head = Some(node),
                    Some(mut t) => t.as_mut().left = Some(node),
                }
                r_tail = Some(node);
                node = next;
            }

            match r_tail {
                None => r_head = node.as_ref().right,
                Some(mut t) => t.as_mut().left = node.as_ref().right,
            }
            node.as_mut().right = r_head;
            self.root = Some(node);
        }
    }

    /// Splays the biggest element to the root. Mirror image of
    /// [`Tree::splay_left`].
    fn splay_right(&mut self) {
        let Some(mut node) = self.root else { return };
        let mut l_head: Link<T> = None;
        let mut l_tail: Link<T> = None;

        // SAFETY: as in `splay`.
        unsafe {
            loop {
                let Some(mut right) = node.as_ref().right else { break };
                node.as_mut().right = right.as_ref().left;
                right.as_mut().left = Some(node);
                node = right;
                let Some(next) = node.as_ref().right else { break };
                match l_tail {
                    None => l_head = Some(node),
                    Some(mut t) => t.as_mut().right = Some(node),
                }
                l_tail = Some(node);
                node = next;
            }

            match l_tail {
                None => l_head = node.as_ref().left,
                Some(mut t) => t.as_mut().right = node.as_ref().left,
            }
            node.as_mut().left = l_head;
            self.root = Some(node);
        }
    }

    /// Inserts `item`. If an equal element is already stored, it is
    /// splayed to the root, replaced, and handed back; otherwise a new root
    /// node is created with the old root below it.
    pub fn insert(&mut self, item: T) -> Option<T> {
        if self.root.is_none() {
            self.root = Some(Node::alloc(item));
            return None;
        }

        self.splay(&item);
        let mut old_root = self.root.expect("splaying keeps the tree non-empty");
        // SAFETY: `old_root` is live and `&mut self` is exclusive.
        unsafe {
            match self.comp.compare(&item, &old_root.as_ref().item) {
                Ordering::Equal => Some(mem::replace(&mut old_root.as_mut().item, item)),
                Ordering::Greater => {
                    // Everything at and left of the old root is smaller.
                    let mut node = Node::alloc(item);
                    node.as_mut().left = Some(old_root);
                    node.as_mut().right = old_root.as_ref().right;
                    old_root.as_mut().right = None;
                    self.root = Some(node);
                    None
                }
                Ordering::Less => {
                    let mut node = Node::alloc(item);
                    node.as_mut().right = Some(old_root);
                    node.as_mut().left = old_root.as_ref().left;
                    old_root.as_mut().left = None;
                    self.root = Some(node);
                    None
                }
            }
        }
    }

    /// Inserts `item` asserting it is no bigger than anything stored: one
    /// splay to the minimum and at most one comparison. Unchecked, like the
    /// other monotone fast paths.
    pub fn insert_min(&mut self, item: T) -> Option<T> {
        self.splay_left();
        let Some(mut old_root) = self.root else {
            self.root = Some(Node::alloc(item));
            return None;
        };
        // SAFETY: `old_root` is live and `&mut self` is exclusive.
        unsafe {
            if self.comp.compare(&item, &old_root.as_ref().item) == Ordering::Equal {
                return Some(mem::replace(&mut old_root.as_mut().item, item));
            }
            let mut node = Node::alloc(item);
            node.as_mut().right = Some(old_root);
            self.root = Some(node);
        }
        None
    }

    /// Inserts `item` asserting it is no smaller than anything stored.
    /// Mirror image of [`Tree::insert_min`].
    pub fn insert_max(&mut self, item: T) -> Option<T> {
        self.splay_right();
        let Some(mut old_root) = self.root else {
            self.root = Some(Node::alloc(item));
            return None;
        };
        // SAFETY: `old_root` is live and `&mut self` is exclusive.
        unsafe {
            if self.comp.compare(&item, &old_root.as_ref().item) == Ordering::Equal {
                return Some(mem::replace(&mut old_root.as_mut().item, item));
            }
            let mut node = Node::alloc(item);
            node.as_mut().left = Some(old_root);
            self.root = Some(node);
        }
        None
    }

    /// Finds the stored element comparing equal to `key`, splaying it (or
    /// its closest neighbor) to the root.
    pub fn search(&mut self, key: &T) -> Option<&T> {
        self.root?;
        self.splay(key);
        let root = self.root.expect("splaying keeps the tree non-empty");
        // SAFETY: the root is live for the life of `&mut self`.
        unsafe {
            if self.comp.compare(key, &root.as_ref().item) == Ordering::Equal {
                Some(&root.as_ref().item)
            } else {
                None
            }
        }
    }

    /// The smallest element, splayed to the root first.
    pub fn min(&mut self) -> Option<&T> {
        self.root?;
        self.splay_left();
        // SAFETY: the root is live for the life of `&mut self`.
        self.root
            .map(|root| unsafe { &root.as_ref().item })
    }

    /// The biggest element, splayed to the root first.
    pub fn max(&mut self) -> Option<&T> {
        self.root?;
        self.splay_right();
        // SAFETY: the root is live for the life of `&mut self`.
        self.root
            .map(|root| unsafe { &root.as_ref().item })
    }

    /// The biggest stored element strictly smaller than `key`, stored or
    /// not. Splays, then fixes up if the new root landed at or above the
    /// key: the left subtree is splayed to its own maximum and the old root
    /// rehung to its right.
    pub fn prev(&mut self, key: &T) -> Option<&T> {
        self.root?;
        self.splay(key);
        let mut old_root = self.root.expect("splaying keeps the tree non-empty");
        // SAFETY: all touched nodes are live and `&mut self` is exclusive.
        unsafe {
            if self.comp.compare(&old_root.as_ref().item, key) != Ordering::Less {
                // The predecessor is the maximum of the left subtree.
                let left = old_root.as_ref().left?;
                old_root.as_mut().left = None;
                self.root = Some(left);
                self.splay_right();
                let mut root = self.root.expect("the left subtree was non-empty");
                root.as_mut().right = Some(old_root);
            }
            self.root.map(|root| &root.as_ref().item)
        }
    }

    /// The smallest stored element strictly bigger than `key`. Mirror
    /// image of [`Tree::prev`].
    pub fn next(&mut self, key: &T) -> Option<&T> {
        self.root?;
        self.splay(key);
        let mut old_root = self.root.expect("splaying keeps the tree non-empty");
        // SAFETY: all touched nodes are live and `&mut self` is exclusive.
        unsafe {
            if self.comp.compare(&old_root.as_ref().item, key) != Ordering::Greater {
                let right = old_root.as_ref().right?;
                old_root.as_mut().right = None;
                self.root = Some(right);
                self.splay_left();
                let mut root = self.root.expect("the right subtree was non-empty");
                root.as_mut().left = Some(old_root);
            }
            self.root.map(|root| &root.as_ref().item)
        }
    }

    /// Removes the element comparing equal to `key` and returns its
    /// payload, or `None`. Splays the key to the root, detaches the root,
    /// splays the right subtree to its minimum and hangs the left subtree
    /// below it.
    pub fn remove(&mut self, key: &T) -> Option<T> {
        self.root?;
        self.splay(key);
        let old_root = self.root.expect("splaying keeps the tree non-empty");
        // SAFETY: all touched nodes are live and `&mut self` is exclusive.
        unsafe {
            if self.comp.compare(&old_root.as_ref().item, key) != Ordering::Equal {
                return None;
            }
            match old_root.as_ref().right {
                None => self.root = old_root.as_ref().left,
                Some(right) => {
                    self.root = Some(right);
                    self.splay_left();
                    let mut root = self.root.expect("the right subtree was non-empty");
                    root.as_mut().left = old_root.as_ref().left;
                }
            }
            Some(Node::into_item(old_root))
        }
    }

    /// Removes and returns the smallest element.
    pub fn remove_min(&mut self) -> Option<T> {
        self.root?;
        self.splay_left();
        let old_root = self.root.expect("splaying keeps the tree non-empty");
        // SAFETY: the minimum has no left child once splayed to the root.
        unsafe {
            self.root = old_root.as_ref().right;
            Some(Node::into_item(old_root))
        }
    }

    /// Removes and returns the biggest element.
    pub fn remove_max(&mut self) -> Option<T> {
        self.root?;
        self.splay_right();
        let old_root = self.root.expect("splaying keeps the tree non-empty");
        // SAFETY: the maximum has no right child once splayed to the root.
        unsafe {
            self.root = old_root.as_ref().left;
            Some(Node::into_item(old_root))
        }
    }

    /// Removes every element, dropping the payloads.
    pub fn clear(&mut self) {
        self.clear_with(drop);
    }

    /// Removes every element, handing each payload to `f` in ascending
    /// order. Linear time, constant space, no recursion.
    pub fn clear_with(&mut self, mut f: impl FnMut(T)) {
        let mut root = self.root.take();
        while let Some(mut node) = root {
            // SAFETY: the subtree is detached and only reachable through
            // `root`.
            unsafe {
                let n = node.as_mut();
                match n.left {
                    Some(mut left) => {
                        n.left = left.as_ref().right;
                        left.as_mut().right = Some(node);
                        root = Some(left);
                    }
                    None => {
                        root = n.right;
                        f(Node::into_item(node));
                    }
                }
            }
        }
    }

    /// Returns a new tree with the same elements, visiting them with
    /// `min`/`next` (which reshapes `self`, hence `&mut`) and emitting
    /// through [`Tree::insert_max`], which is O(1) here because the new
    /// maximum is always one splay step away.
    pub fn copy(&mut self) -> Self
    where
        T: Clone,
        C: Clone,
    {
        let mut out = Tree::new(self.comp.clone());
        let mut cur = self.min().cloned();
        while let Some(item) = cur {
            cur = self.next(&item).cloned();
            let displaced = out.insert_max(item);
            debug_assert!(displaced.is_none());
        }
        out
    }

    /// The shared min/next merge loop behind the set combinators. Emits
    /// through [`Tree::insert_max`], like [`Tree::copy`].
    fn merged(&mut self, other: &mut Self, lower: bool, upper: bool, both: bool) -> Self
    where
        T: Clone,
        C: Clone,
    {
        let mut out = Tree::new(self.comp.clone());
        let mut a = self.min().cloned();
        let mut b = other.min().cloned();

        loop {
            let (x, y) = match (a, b) {
                (Some(x), Some(y)) => (x, y),
                (rest_a, rest_b) => {
                    a = rest_a;
                    b = rest_b;
                    break;
                }
            };
            match self.comp.compare(&x, &y) {
                Ordering::Less => {
                    a = self.next(&x).cloned();
                    if lower {
                        out.insert_max(x);
                    }
                    b = Some(y);
                }
                Ordering::Greater => {
                    b = other.next(&y).cloned();
                    if upper {
                        out.insert_max(y);
                    }
                    a = Some(x);
                }
                Ordering::Equal => {
                    a = self.next(&x).cloned();
                    b = other.next(&y).cloned();
                    if both {
                        out.insert_max(x);
                    }
                }
            }
        }

        if lower {
            while let Some(x) = a {
                a = self.next(&x).cloned();
                out.insert_max(x);
            }
        }
        if upper {
            while let Some(y) = b {
                b = other.next(&y).cloned();
                out.insert_max(y);
            }
        }
        out
    }

    /// Builds a new tree holding every element of `self` or `other`,
    /// cloning from `self` when an element is in both. Both operands are
    /// `&mut` because walking a splay tree reshapes it; their *contents*
    /// are untouched. Both must use the same order; the result gets a
    /// clone of `self`'s comparator.
    pub fn union(&mut self, other: &mut Self) -> Self
    where
        T: Clone,
        C: Clone,
    {
        self.merged(other, true, true, true)
    }

    /// Builds a new tree holding the elements present in both operands,
    /// cloned from `self`.
    pub fn intersection(&mut self, other: &mut Self) -> Self
    where
        T: Clone,
        C: Clone,
    {
        self.merged(other, false, false, true)
    }

    /// Builds a new tree holding the elements of `self` not in `other`.
    pub fn diff(&mut self, other: &mut Self) -> Self
    where
        T: Clone,
        C: Clone,
    {
        self.merged(other, true, false, false)
    }

    /// Builds a new tree holding the elements in exactly one operand.
    pub fn sym_diff(&mut self, other: &mut Self) -> Self
    where
        T: Clone,
        C: Clone,
    {
        self.merged(other, true, true, false)
    }

    /// Checks the ordering invariant. Unlike the other operations this is
    /// a plain read: it does not splay. Meant for tests and debugging.
    pub fn is_valid(&self) -> bool {
        fn check<T, C: Comparator<T>>(
            comp: &C,
            node: &Node<T>,
            min: Option<&T>,
            max: Option<&T>,
        ) -> bool {
            if let Some(min) = min {
                if comp.compare(min, &node.item) != Ordering::Less {
                    return false;
                }
            }
            if let Some(max) = max {
                if comp.compare(&node.item, max) != Ordering::Less {
                    return false;
                }
            }
            // SAFETY: child nodes are live as long as their parent.
            if let Some(left) = node.left {
                if !check(comp, unsafe { left.as_ref() }, min, Some(&node.item)) {
                    return false;
                }
            }
            if let Some(right) = node.right {
                if !check(comp, unsafe { right.as_ref() }, Some(&node.item), max) {
                    return false;
                }
            }
            true
        }

        match self.root {
            None => true,
            // SAFETY: the root is live for the life of `&self`.
            Some(root) => check(&self.comp, unsafe { root.as_ref() }, None, None),
        }
    }
}

impl<T, C> Drop for Tree<T, C> {
    fn drop(&mut self) {
        // Rotation-based iterative teardown, shared shape with the other
        // variants.
        let mut root = self.root.take();
        while let Some(mut node) = root {
            // SAFETY: the subtree is only reachable through `root`.
            unsafe {
                let n = node.as_mut();
                match n.left {
                    Some(mut left) => {
                        n.left = left.as_ref().right;
                        left.as_mut().right = Some(node);
                        root = Some(left);
                    }
                    None => {
                        root = n.right;
                        drop(Node::into_item(node));
                    }
                }
            }
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for Tree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn entries<T: fmt::Debug>(link: Link<T>, set: &mut fmt::DebugSet<'_, '_>) {
            if let Some(node) = link {
                // SAFETY: nodes are live while the tree is borrowed.
                let node = unsafe { node.as_ref() };
                entries(node.left, set);
                set.entry(&node.item);
                entries(node.right, set);
            }
        }

        let mut set = f.debug_set();
        entries(self.root, &mut set);
        set.finish()
    }
}
