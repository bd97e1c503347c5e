//! A classic, unbalanced binary search tree.
//!
//! Nothing here rebalances behind your back: inserting sorted input builds
//! a spine, exactly as the textbook picture warns. In exchange every
//! operation is a short iterative descent, and the module offers the spine
//! as a feature: [`Tree::to_list`] and [`Tree::to_reversed_list`] linearize
//! the tree in place, and [`Tree::rebalance`] rebuilds optimal height in
//! linear time without ever counting nodes.
//!
//! # Examples
//!
//! ```
//! use ordset::bst::Tree;
//!
//! let mut tree = Tree::new(i32::cmp);
//!
//! // Nothing in here yet.
//! assert_eq!(tree.search(&1), None);
//!
//! tree.insert(1);
//! assert_eq!(tree.search(&1), Some(&1));
//!
//! // Removing an element returns its payload.
//! assert_eq!(tree.remove(&1), Some(1));
//! assert_eq!(tree.search(&1), None);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ptr::NonNull;

use crate::walk::{self, InorderWalk, MergePlan, WalkNode};
use crate::Comparator;

pub(crate) type Link<T> = Option<NonNull<Node<T>>>;

/// The plain tree node, shared with the splay tree: a payload and two child
/// links. No parent pointer, no balance bookkeeping.
pub(crate) struct Node<T> {
    pub(crate) item: T,
    pub(crate) left: Link<T>,
    pub(crate) right: Link<T>,
}

impl<T> Node<T> {
    pub(crate) fn alloc(item: T) -> NonNull<Node<T>> {
        NonNull::from(Box::leak(Box::new(Node {
            item,
            left: None,
            right: None,
        })))
    }

    /// Frees the node and moves its payload out.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`Node::alloc`], must not be freed twice, and no
    /// reference into the node may outlive this call. The node's children
    /// are not freed; unlink them first.
    pub(crate) unsafe fn into_item(ptr: NonNull<Node<T>>) -> T {
        Box::from_raw(ptr.as_ptr()).item
    }
}

impl<T> WalkNode for Node<T> {
    type Item = T;

    fn left(&self) -> Option<NonNull<Self>> {
        self.left
    }

    fn right(&self) -> Option<NonNull<Self>> {
        self.right
    }

    fn set_right(&mut self, link: Option<NonNull<Self>>) {
        self.right = link;
    }

    fn item(&self) -> &T {
        &self.item
    }
}

/// Appends `item` as the new rightmost node of a right-spine under
/// construction. `tail` tracks the spine's last node.
pub(crate) fn push_max<T>(root: &mut Link<T>, tail: &mut Link<T>, item: T) {
    let node = Node::alloc(item);
    match tail {
        None => *root = Some(node),
        // SAFETY: the tail is the live end of the spine being built and
        // nothing else references it.
        Some(t) => unsafe { t.as_mut().right = Some(node) },
    }
    *tail = Some(node);
}

/// An unbalanced binary search tree ordered by a caller-supplied
/// comparator.
///
/// Payloads are owned by the tree and unique under the comparator;
/// inserting an equal payload overwrites and returns the displaced one.
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

    /// Inserts `item`. If an equal element is already stored, it is
    /// replaced and handed back; otherwise a fresh node is spliced in at
    /// the bottom of the descent and `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordset::bst::Tree;
    ///
    /// let mut tree = Tree::new(|a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0));
    /// assert_eq!(tree.insert((1, 'a')), None);
    /// assert_eq!(tree.insert((1, 'b')), Some((1, 'a')));
    /// ```
    pub fn insert(&mut self, item: T) -> Option<T> {
        let mut node = match self.root {
            Some(node) => node,
            None => {
                self.root = Some(Node::alloc(item));
                return None;
            }
        };
        loop {
            // SAFETY: `node` is a live node of this tree and `&mut self`
            // guarantees nothing else touches it.
            let n = unsafe { node.as_mut() };
            match self.comp.compare(&item, &n.item) {
                Ordering::Less => match n.left {
                    Some(left) => node = left,
                    None => {
                        n.left = Some(Node::alloc(item));
                        return None;
                    }
                },
                Ordering::Greater => match n.right {
                    Some(right) => node = right,
                    None => {
                        n.right = Some(Node::alloc(item));
                        return None;
                    }
                },
                Ordering::Equal => return Some(mem::replace(&mut n.item, item)),
            }
        }
    }

    /// Inserts `item` asserting it is no bigger than anything stored.
    ///
    /// Walks the left spine and makes a single comparison against its
    /// bottom node, to tell "new minimum" apart from "equal to the current
    /// minimum" (which overwrites). Feeding it an item bigger than an
    /// existing element breaks the ordering invariant; this is not checked.
    pub fn insert_min(&mut self, item: T) -> Option<T> {
        let mut node = match self.root {
            Some(node) => node,
            None => {
                self.root = Some(Node::alloc(item));
                return None;
            }
        };
        // SAFETY: same exclusivity argument as `insert`.
        unsafe {
            while let Some(left) = node.as_ref().left {
                node = left;
            }
            let n = node.as_mut();
            if self.comp.compare(&item, &n.item) == Ordering::Equal {
                Some(mem::replace(&mut n.item, item))
            } else {
                n.left = Some(Node::alloc(item));
                None
            }
        }
    }

    /// Inserts `item` asserting it is no smaller than anything stored.
    /// Mirror image of [`Tree::insert_min`], and just as unchecked.
    pub fn insert_max(&mut self, item: T) -> Option<T> {
        let mut node = match self.root {
            Some(node) => node,
            None => {
                self.root = Some(Node::alloc(item));
                return None;
            }
        };
        // SAFETY: same exclusivity argument as `insert`.
        unsafe {
            while let Some(right) = node.as_ref().right {
                node = right;
            }
            let n = node.as_mut();
            if self.comp.compare(&item, &n.item) == Ordering::Equal {
                Some(mem::replace(&mut n.item, item))
            } else {
                n.right = Some(Node::alloc(item));
                None
            }
        }
    }

    /// Finds the stored element comparing equal to `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordset::bst::Tree;
    ///
    /// let mut tree = Tree::new(i32::cmp);
    /// tree.insert(2);
    ///
    /// assert_eq!(tree.search(&2), Some(&2));
    /// assert_eq!(tree.search(&42), None);
    /// ```
    pub fn search(&self, key: &T) -> Option<&T> {
        let mut node = self.root;
        while let Some(ptr) = node {
            // SAFETY: tree nodes stay live for the life of `&self`.
            let n = unsafe { ptr.as_ref() };
            match self.comp.compare(key, &n.item) {
                Ordering::Less => node = n.left,
                Ordering::Greater => node = n.right,
                Ordering::Equal => return Some(&n.item),
            }
        }
        None
    }

    /// The smallest element, or `None` if the tree is empty.
    pub fn min(&self) -> Option<&T> {
        let mut node = self.root?;
        // SAFETY: tree nodes stay live for the life of `&self`.
        unsafe {
            while let Some(left) = node.as_ref().left {
                node = left;
            }
            Some(&node.as_ref().item)
        }
    }

    /// The biggest element, or `None` if the tree is empty.
    pub fn max(&self) -> Option<&T> {
        let mut node = self.root?;
        // SAFETY: tree nodes stay live for the life of `&self`.
        unsafe {
            while let Some(right) = node.as_ref().right {
                node = right;
            }
            Some(&node.as_ref().item)
        }
    }

    /// The biggest stored element strictly smaller than `key`, whether or
    /// not `key` itself is stored. `None` if no element is smaller.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordset::bst::Tree;
    ///
    /// let mut tree = Tree::new(i32::cmp);
    /// for x in [10, 20, 30] {
    ///     tree.insert(x);
    /// }
    ///
    /// assert_eq!(tree.prev(&20), Some(&10));
    /// assert_eq!(tree.prev(&25), Some(&20));
    /// assert_eq!(tree.prev(&10), None);
    /// ```
    pub fn prev(&self, key: &T) -> Option<&T> {
        let mut pred: Link<T> = None;
        let mut node = self.root;
        while let Some(ptr) = node {
            // SAFETY: tree nodes stay live for the life of `&self`.
            let n = unsafe { ptr.as_ref() };
            match self.comp.compare(key, &n.item) {
                Ordering::Less => node = n.left,
                Ordering::Greater => {
                    // Last turn to the right: `n` is the best bound so far.
                    pred = Some(ptr);
                    node = n.right;
                }
                Ordering::Equal => {
                    // Found the key itself: its predecessor is the
                    // rightmost node of its left subtree, if it has one.
                    if let Some(mut p) = n.left {
                        // SAFETY: as above.
                        unsafe {
                            while let Some(right) = p.as_ref().right {
                                p = right;
                            }
                        }
                        pred = Some(p);
                    }
                    break;
                }
            }
        }
        // SAFETY: as above.
        pred.map(|p| unsafe { &p.as_ref().item })
    }

    /// The smallest stored element strictly bigger than `key`. Mirror image
    /// of [`Tree::prev`].
    pub fn next(&self, key: &T) -> Option<&T> {
        let mut succ: Link<T> = None;
        let mut node = self.root;
        while let Some(ptr) = node {
            // SAFETY: tree nodes stay live for the life of `&self`.
            let n = unsafe { ptr.as_ref() };
            match self.comp.compare(key, &n.item) {
                Ordering::Less => {
                    succ = Some(ptr);
                    node = n.left;
                }
                Ordering::Greater => node = n.right,
                Ordering::Equal => {
                    if let Some(mut s) = n.right {
                        // SAFETY: as above.
                        unsafe {
                            while let Some(left) = s.as_ref().left {
                                s = left;
                            }
                        }
                        succ = Some(s);
                    }
                    break;
                }
            }
        }
        // SAFETY: as above.
        succ.map(|s| unsafe { &s.as_ref().item })
    }

    /// Removes the element comparing equal to `key` and returns its
    /// payload, or `None` if no such element is stored.
    ///
    /// An interior node with two children swaps payloads with its in-order
    /// successor and the successor's node (which has at most one child) is
    /// the one excised.
    pub fn remove(&mut self, key: &T) -> Option<T> {
        let mut parent: Link<T> = None;
        let mut node = self.root;
        while let Some(ptr) = node {
            // SAFETY: `&mut self` gives exclusive access to every node.
            let (n_left, n_right, ord) = unsafe {
                let n = ptr.as_ref();
                (n.left, n.right, self.comp.compare(key, &n.item))
            };
            match ord {
                Ordering::Less => {
                    parent = Some(ptr);
                    node = n_left;
                }
                Ordering::Greater => {
                    parent = Some(ptr);
                    node = n_right;
                }
                Ordering::Equal => {
                    let target = ptr;
                    let mut doomed = ptr;
                    let mut doomed_parent = parent;
                    if n_left.is_some() && n_right.is_some() {
                        // Two children: walk to the in-order successor,
                        // which is guaranteed to have no left child.
                        doomed_parent = Some(ptr);
                        doomed = n_right.expect("checked above");
                        // SAFETY: as above.
                        unsafe {
                            while let Some(left) = doomed.as_ref().left {
                                doomed_parent = Some(doomed);
                                doomed = left;
                            }
                        }
                    }
                    // SAFETY: as above; `doomed` has at most one child.
                    unsafe {
                        let child = match doomed.as_ref().left {
                            Some(left) => Some(left),
                            None => doomed.as_ref().right,
                        };
                        match doomed_parent {
                            None => self.root = child,
                            Some(mut p) => {
                                let p = p.as_mut();
                                if p.left == Some(doomed) {
                                    p.left = child;
                                } else {
                                    p.right = child;
                                }
                            }
                        }
                        // SAFETY: `doomed` is unlinked and nothing
                        // references it any more.
                        let unlinked = Node::into_item(doomed);
                        return Some(if doomed == target {
                            unlinked
                        } else {
                            // The target keeps its node; only the payloads
                            // swap, so no links above it change.
                            let mut target = target;
                            mem::replace(&mut target.as_mut().item, unlinked)
                        });
                    }
                }
            }
        }
        None
    }

    /// Removes and returns the smallest element. Cheaper than looking the
    /// minimum up and removing it by key.
    pub fn remove_min(&mut self) -> Option<T> {
        let mut parent: Link<T> = None;
        let mut node = self.root?;
        // SAFETY: `&mut self` gives exclusive access to every node.
        unsafe {
            while let Some(left) = node.as_ref().left {
                parent = Some(node);
                node = left;
            }
            let right = node.as_ref().right;
            match parent {
                None => self.root = right,
                Some(mut p) => p.as_mut().left = right,
            }
            Some(Node::into_item(node))
        }
    }

    /// Removes and returns the biggest element.
    pub fn remove_max(&mut self) -> Option<T> {
        let mut parent: Link<T> = None;
        let mut node = self.root?;
        // SAFETY: `&mut self` gives exclusive access to every node.
        unsafe {
            while let Some(right) = node.as_ref().right {
                parent = Some(node);
                node = right;
            }
            let left = node.as_ref().left;
            match parent {
                None => self.root = left,
                Some(mut p) => p.as_mut().right = left,
            }
            Some(Node::into_item(node))
        }
    }

    /// Removes every element, dropping the payloads.
    pub fn clear(&mut self) {
        self.clear_with(drop);
    }

    /// Removes every element, handing each payload to `f` in ascending
    /// order. Linear time, constant space: the left subtree of the current
    /// root is unraveled by right rotations until the root itself can be
    /// freed.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordset::bst::Tree;
    ///
    /// let mut tree = Tree::new(i32::cmp);
    /// for x in [2, 1, 3] {
    ///     tree.insert(x);
    /// }
    ///
    /// let mut drained = Vec::new();
    /// tree.clear_with(|x| drained.push(x));
    ///
    /// assert!(tree.is_empty());
    /// assert_eq!(drained, [1, 2, 3]);
    /// ```
    pub fn clear_with(&mut self, mut f: impl FnMut(T)) {
        let mut root = self.root.take();
        while let Some(mut node) = root {
            // SAFETY: the whole subtree is detached from the handle and
            // only reachable through `root`.
            unsafe {
                let n = node.as_mut();
                match n.left {
                    Some(mut left) => {
                        // Rotate the root and its left child right.
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

    /// Returns a new tree with the same elements. The copy is a degenerate
    /// right-spine: building it that way costs O(n) with no per-node
    /// search, and a spine is the ideal input for further bulk operations.
    /// Call [`Tree::rebalance`] on the copy if it is going to serve point
    /// lookups.
    pub fn copy(&self) -> Self
    where
        T: Clone,
        C: Clone,
    {
        let mut out = Tree::new(self.comp.clone());
        let mut tail: Link<T> = None;
        // SAFETY: we hold `&self` for the whole walk, nothing else touches
        // the links meanwhile, and the walk restores them before dropping.
        unsafe {
            let mut items = InorderWalk::new(self.root);
            while let Some(ptr) = items.peek() {
                push_max(&mut out.root, &mut tail, ptr.as_ref().item.clone());
                items.advance();
            }
        }
        out
    }

    fn merged(&self, other: &Self, plan: MergePlan) -> Self
    where
        T: Clone,
        C: Clone,
    {
        let mut out = Tree::new(self.comp.clone());
        let mut tail: Link<T> = None;
        // SAFETY: both roots belong to distinct live trees held by `&self`
        // and `&other` for the duration; the merge restores all links.
        unsafe {
            walk::merge(self.root, other.root, &self.comp, plan, |item| {
                push_max(&mut out.root, &mut tail, item.clone());
            });
        }
        out
    }

    /// Builds a new tree holding every element of `self` or `other`,
    /// cloning from `self` when an element is in both. Like [`Tree::copy`],
    /// the result is a right-spine.
    ///
    /// Both operands must use the same order; the result tree gets a clone
    /// of `self`'s comparator.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordset::bst::Tree;
    ///
    /// let mut a = Tree::new(i32::cmp);
    /// let mut b = Tree::new(i32::cmp);
    /// a.insert(1);
    /// a.insert(2);
    /// b.insert(2);
    /// b.insert(3);
    ///
    /// let mut c = a.union(&b);
    /// let mut seen = Vec::new();
    /// c.clear_with(|x| seen.push(x));
    /// assert_eq!(seen, [1, 2, 3]);
    /// ```
    pub fn union(&self, other: &Self) -> Self
    where
        T: Clone,
        C: Clone,
    {
        if std::ptr::eq(self, other) {
            return self.copy();
        }
        self.merged(other, walk::UNION)
    }

    /// Builds a new tree holding the elements present in both operands,
    /// cloned from `self`.
    pub fn intersection(&self, other: &Self) -> Self
    where
        T: Clone,
        C: Clone,
    {
        if std::ptr::eq(self, other) {
            return self.copy();
        }
        self.merged(other, walk::INTERSECTION)
    }

    /// Builds a new tree holding the elements of `self` not in `other`.
    pub fn diff(&self, other: &Self) -> Self
    where
        T: Clone,
        C: Clone,
    {
        if std::ptr::eq(self, other) {
            return Tree::new(self.comp.clone());
        }
        self.merged(other, walk::DIFF)
    }

    /// Builds a new tree holding the elements in exactly one operand.
    pub fn sym_diff(&self, other: &Self) -> Self
    where
        T: Clone,
        C: Clone,
    {
        if std::ptr::eq(self, other) {
            return Tree::new(self.comp.clone());
        }
        self.merged(other, walk::SYM_DIFF)
    }

    /// Linearizes the tree in place into a right-spine: the root becomes
    /// the smallest element and no node has a left child. Uses right
    /// rotations only, O(n).
    pub fn to_list(&mut self) {
        let Some(mut node) = self.root else { return };
        // SAFETY: `&mut self` gives exclusive access to every node.
        unsafe {
            // Unravel the left side of the root.
            while let Some(mut left) = node.as_ref().left {
                node.as_mut().left = left.as_ref().right;
                left.as_mut().right = Some(node);
                node = left;
            }
            self.root = Some(node);

            // Unravel the rest: rotate away any left child met while
            // sliding down the spine.
            let mut parent: Link<T> = None;
            let mut cur = Some(node);
            while let Some(mut n) = cur {
                match n.as_ref().left {
                    Some(mut left) => {
                        n.as_mut().left = left.as_ref().right;
                        left.as_mut().right = Some(n);
                        let mut p = parent.expect("the first pass left the root without a left child");
                        p.as_mut().right = Some(left);
                        cur = Some(left);
                    }
                    None => {
                        parent = Some(n);
                        cur = n.as_ref().right;
                    }
                }
            }
        }
    }

    /// Linearizes the tree in place into a left-spine: the root becomes the
    /// biggest element and no node has a right child. Mirror image of
    /// [`Tree::to_list`].
    pub fn to_reversed_list(&mut self) {
        let Some(mut node) = self.root else { return };
        // SAFETY: `&mut self` gives exclusive access to every node.
        unsafe {
            while let Some(mut right) = node.as_ref().right {
                node.as_mut().right = right.as_ref().left;
                right.as_mut().left = Some(node);
                node = right;
            }
            self.root = Some(node);

            let mut parent: Link<T> = None;
            let mut cur = Some(node);
            while let Some(mut n) = cur {
                match n.as_ref().right {
                    Some(mut right) => {
                        n.as_mut().right = right.as_ref().left;
                        right.as_mut().left = Some(n);
                        let mut p = parent.expect("the first pass left the root without a right child");
                        p.as_mut().left = Some(right);
                        cur = Some(right);
                    }
                    None => {
                        parent = Some(n);
                        cur = n.as_ref().left;
                    }
                }
            }
        }
    }

    /// Rebuilds the tree to its optimal height, `ceil(log2(n))`, in linear
    /// time and constant space.
    ///
    /// This is a Day-Stout-Warren compression that never needs the element
    /// count: the tree is linearized into a right-spine, the spine is
    /// halved by left-rotating every other node until the passes bottom
    /// out, and a final rotation of the spine head below its left subtree's
    /// maximum pulls the root to the middle.
    ///
    /// Worth calling once a tree has gone quiet, or every time it doubles
    /// in size.
    pub fn rebalance(&mut self) {
        if self.root.is_none() {
            return;
        }
        self.to_list();
        // SAFETY: `&mut self` gives exclusive access to every node; the
        // tree is non-empty for the rest of this function.
        unsafe {
            // Compress: left-rotate every other node of the right spine,
            // halving its length, until a pass finds nothing to rotate.
            loop {
                let mut parent: Link<T> = None;
                let mut node = self.root.expect("checked non-empty above");
                let Some(mut child) = node.as_ref().right else { break };
                loop {
                    // Rotate `node` and `child` left.
                    match parent {
                        None => self.root = Some(child),
                        Some(mut p) => p.as_mut().right = Some(child),
                    }
                    node.as_mut().right = child.as_ref().left;
                    child.as_mut().left = Some(node);

                    // Skip the node just rotated up.
                    parent = Some(child);
                    match child.as_ref().right {
                        Some(next) => {
                            node = next;
                            match node.as_ref().right {
                                Some(c) => child = c,
                                None => break,
                            }
                        }
                        None => break,
                    }
                }
            }

            // The root is now the maximum and has no right child. Hanging
            // it below the rightmost node of its left subtree moves the new
            // root next to the median and shortens every path by one.
            let mut node = self.root.expect("checked non-empty above");
            if let Some(left) = node.as_ref().left {
                self.root = Some(left);
                let mut child = left;
                while let Some(right) = child.as_ref().right {
                    child = right;
                }
                child.as_mut().right = Some(node);
                node.as_mut().left = None;
            }
        }
    }

    /// Checks the ordering invariant: every payload in a left subtree
    /// compares strictly below its node, every payload in a right subtree
    /// strictly above. Meant for tests and debugging; the mutating
    /// operations keep this true by construction.
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
        // Same rotation-based teardown as `clear_with`, inlined because
        // `Drop` has no comparator bound to lean on: no recursion, so a
        // degenerate spine cannot blow the stack.
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


#[cfg(test)]
mod quicktests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::test::quick::Op;

    /// Applies a random op sequence to a tree and a model set, checking the
    /// answers and the ordering invariant as it goes.
    fn do_ops(ops: &[Op<i32>], tree: &mut Tree<i32, fn(&i32, &i32) -> Ordering>) -> BTreeSet<i32> {
        let mut model = BTreeSet::new();
        for op in ops {
            match op {
                Op::Insert(x) => {
                    let displaced = tree.insert(*x);
                    assert_eq!(displaced.is_some(), !model.insert(*x));
                }
                Op::Remove(x) => {
                    assert_eq!(tree.remove(x), model.take(x));
                }
                Op::Min => {
                    assert_eq!(tree.min(), model.first());
                }
                Op::Max => {
                    assert_eq!(tree.max(), model.last());
                }
            }
            assert!(tree.is_valid());
        }
        model
    }

    quickcheck::quickcheck! {
        fn fuzz_against_model(ops: Vec<Op<i32>>) -> bool {
            let mut tree = Tree::new(Ord::cmp as fn(&i32, &i32) -> Ordering);
            let model = do_ops(&ops, &mut tree);
            model.iter().all(|x| tree.search(x) == Some(x))
        }
    }

    quickcheck::quickcheck! {
        fn rebalance_preserves_content(xs: Vec<i32>) -> bool {
            let mut tree = Tree::new(Ord::cmp as fn(&i32, &i32) -> Ordering);
            for x in &xs {
                tree.insert(*x);
            }
            tree.rebalance();

            let model: BTreeSet<i32> = xs.iter().copied().collect();
            tree.is_valid() && model.iter().all(|x| tree.search(x) == Some(x))
        }
    }

    quickcheck::quickcheck! {
        fn traversal_is_sorted_and_complete(xs: Vec<i32>) -> bool {
            let mut tree = Tree::new(Ord::cmp as fn(&i32, &i32) -> Ordering);
            for x in &xs {
                tree.insert(*x);
            }

            let mut drained = Vec::new();
            tree.clear_with(|x| drained.push(x));
            let model: Vec<i32> = xs.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
            drained == model
        }
    }
}
