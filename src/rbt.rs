//! A red-black tree with single-pass, top-down insert and remove.
//!
//! The textbook red-black algorithms fix the tree on the way *up*, which
//! needs parent pointers, recursion, or an explicit stack. This one does
//! neither: both `insert` and `remove` are one descent. Insert carries a
//! four-deep window of ancestors ({anchor, grandparent, parent, node}) plus
//! the comparison history and resolves every violation locally as it walks.
//! Remove maintains the invariant "the current node is black, its sibling
//! (if any) is black, its parent (if any) is red" and transforms the tree so
//! the node that finally gets excised is a red bottom node, which needs no
//! fix-up at all.
//!
//! Invariants (checked by [`Tree::is_valid`]):
//!
//! * symmetric order under the comparator,
//! * a red node never has a red child,
//! * every root-to-leaf path crosses the same number of black nodes,
//! * the root is black.
//!
//! # Examples
//!
//! ```
//! use ordset::rbt::Tree;
//!
//! let mut tree = Tree::new(i32::cmp);
//! for x in 0..100 {
//!     tree.insert(x); // sorted input is fine: height stays logarithmic
//! }
//! assert!(tree.is_valid());
//! assert_eq!(tree.min(), Some(&0));
//! assert_eq!(tree.remove(&42), Some(42));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ptr::NonNull;

use crate::walk::{self, InorderWalk, MergePlan, WalkNode};
use crate::Comparator;

type Link<T> = Option<NonNull<Node<T>>>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

struct Node<T> {
    item: T,
    left: Link<T>,
    right: Link<T>,
    color: Color,
}

impl<T> Node<T> {
    fn alloc(item: T, color: Color) -> NonNull<Node<T>> {
        NonNull::from(Box::leak(Box::new(Node {
            item,
            left: None,
            right: None,
            color,
        })))
    }

    /// Frees the node and moves its payload out.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`Node::alloc`], must not be freed twice, and no
    /// reference into the node may outlive this call. Children are not
    /// freed.
    unsafe fn into_item(ptr: NonNull<Node<T>>) -> T {
        Box::from_raw(ptr.as_ptr()).item
    }
}

/// A null link counts as black. The helpers read through raw links; every
/// link in this module points at a live node of the tree being operated on.
fn is_red<T>(link: Link<T>) -> bool {
    match link {
        // SAFETY: see above; tree links are live while an operation runs.
        Some(node) => unsafe { node.as_ref() }.color == Color::Red,
        None => false,
    }
}

fn is_black<T>(link: Link<T>) -> bool {
    !is_red(link)
}

fn set_color<T>(mut node: NonNull<Node<T>>, color: Color) {
    // SAFETY: see `is_red`.
    unsafe { node.as_mut().color = color }
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

/// A red-black tree ordered by a caller-supplied comparator.
///
/// Same element semantics as the other variants: payloads are unique under
/// the comparator and an equal insert overwrites, returning the displaced
/// payload.
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

    /// Reattaches `child` where the descent detached a subtree: below
    /// `anchor` on the side recorded by `dir`, or at the root when the
    /// detachment happened there.
    fn link_under(&mut self, anchor: Link<T>, dir: Ordering, child: NonNull<Node<T>>) {
        match anchor {
            None => self.root = Some(child),
            // SAFETY: `anchor` is a live node of this tree.
            Some(mut a) => unsafe {
                if dir == Ordering::Less {
                    a.as_mut().left = Some(child);
                } else {
                    a.as_mut().right = Some(child);
                }
            },
        }
    }

    fn force_root_black(&mut self) {
        if let Some(root) = self.root {
            set_color(root, Color::Black);
        }
    }

    /// Inserts `item` in a single top-down pass. If an equal element is
    /// already stored it is replaced and handed back, otherwise `None`.
    ///
    /// On the way down, any node with two red children is color-flipped;
    /// the red-red violation a flip (or the new red leaf) can create with
    /// the node above is repaired immediately with a single or double
    /// rotation inside the ancestor window. The root is repainted black on
    /// the way out.
    pub fn insert(&mut self, item: T) -> Option<T> {
        let mut anchor: Link<T> = None;
        let mut granpa: Link<T> = None;
        let mut parent: Link<T> = None;
        let mut node = self.root;
        let mut pending = Some(item);
        let mut displaced = None;
        // Directions taken into granpa, parent and node respectively.
        let mut comp_g = Ordering::Equal;
        let mut comp_p = Ordering::Equal;
        let mut comp_n = Ordering::Equal;

        loop {
            let mut comp = Ordering::Equal;
            match node {
                // Reached the insertion point: attach a new red leaf.
                None => {
                    let leaf = Node::alloc(
                        pending.take().expect("consumed only at the bottom"),
                        Color::Red,
                    );
                    match parent {
                        None => self.root = Some(leaf),
                        // SAFETY: `parent` is a live node of this tree.
                        Some(mut p) => unsafe {
                            if comp_n == Ordering::Less {
                                p.as_mut().left = Some(leaf);
                            } else {
                                p.as_mut().right = Some(leaf);
                            }
                        },
                    }
                    node = Some(leaf);
                }
                // SAFETY: `cur` is a live node; `&mut self` is exclusive.
                Some(mut cur) => unsafe {
                    let key = pending.as_ref().expect("consumed only at the bottom");
                    comp = self.comp.compare(key, &cur.as_ref().item);
                    if comp == Ordering::Equal {
                        let taken = pending.take().expect("checked just above");
                        displaced = Some(mem::replace(&mut cur.as_mut().item, taken));
                    }
                    // Two red children: color flip.
                    if is_red(cur.as_ref().left) && is_red(cur.as_ref().right) {
                        cur.as_mut().color = Color::Red;
                        set_color(cur.as_ref().left.expect("red child"), Color::Black);
                        set_color(cur.as_ref().right.expect("red child"), Color::Black);
                    }
                },
            }

            // Repair a red-red violation between node and parent.
            if is_red(node) && is_red(parent) {
                let mut g = granpa.expect("a red parent is never the root");
                let mut p = parent.expect("checked red above");
                let mut n = node.expect("checked red above");
                // SAFETY: all four window nodes are live nodes of this
                // tree and pairwise distinct.
                unsafe {
                    if comp_p == Ordering::Greater && comp_n == Ordering::Greater {
                        // Straight right-right window: rotate granpa left.
                        g.as_mut().right = p.as_ref().left;
                        g.as_mut().color = Color::Red;
                        p.as_mut().left = Some(g);
                        p.as_mut().color = Color::Black;
                        self.link_under(anchor, comp_g, p);
                        granpa = anchor;
                        comp_p = comp_g;
                    } else if comp_p == Ordering::Less && comp_n == Ordering::Less {
                        // Straight left-left window: rotate granpa right.
                        g.as_mut().left = p.as_ref().right;
                        g.as_mut().color = Color::Red;
                        p.as_mut().right = Some(g);
                        p.as_mut().color = Color::Black;
                        self.link_under(anchor, comp_g, p);
                        granpa = anchor;
                        comp_p = comp_g;
                    } else if comp_n == Ordering::Less {
                        // Zig-zag, right then left: double rotation lifting
                        // `n` above both `p` and `g`.
                        g.as_mut().right = n.as_ref().left;
                        g.as_mut().color = Color::Red;
                        p.as_mut().left = n.as_ref().right;
                        n.as_mut().left = Some(g);
                        n.as_mut().right = Some(p);
                        n.as_mut().color = Color::Black;
                        // The descent resumes below `n`, on whichever of
                        // the two demoted nodes the key falls toward.
                        node = Some(if comp == Ordering::Greater { p } else { g });
                        if comp == Ordering::Greater {
                            comp_n = comp_n.reverse();
                        } else if comp == Ordering::Less {
                            comp_n = comp_p.reverse();
                        }
                        self.link_under(anchor, comp_g, n);
                        parent = Some(n);
                        granpa = anchor;
                        comp_p = comp_g;
                        comp = comp.reverse();
                    } else {
                        // Zig-zag, left then right: the mirror image.
                        g.as_mut().left = n.as_ref().right;
                        g.as_mut().color = Color::Red;
                        p.as_mut().right = n.as_ref().left;
                        n.as_mut().right = Some(g);
                        n.as_mut().left = Some(p);
                        n.as_mut().color = Color::Black;
                        node = Some(if comp == Ordering::Less { p } else { g });
                        if comp == Ordering::Less {
                            comp_n = comp_n.reverse();
                        } else if comp == Ordering::Greater {
                            comp_n = comp_p.reverse();
                        }
                        self.link_under(anchor, comp_g, n);
                        parent = Some(n);
                        granpa = anchor;
                        comp_p = comp_g;
                        comp = comp.reverse();
                    }
                }
            }

            // Done once the payload has come to rest.
            if comp == Ordering::Equal {
                break;
            }

            // Advance one step and remember where we came from.
            let cur = node.expect("a strict comparison implies a live node");
            anchor = granpa;
            granpa = parent;
            parent = node;
            // SAFETY: `cur` is a live node of this tree.
            node = unsafe {
                if comp == Ordering::Less {
                    cur.as_ref().left
                } else {
                    cur.as_ref().right
                }
            };
            comp_g = comp_p;
            comp_p = comp_n;
            comp_n = comp;
        }

        // The descent may have painted the root red.
        self.force_root_black();
        displaced
    }

    /// Inserts `item` asserting it is no bigger than anything stored:
    /// one-directional descent, one comparison (against the bottom of the
    /// left spine, to detect an equal element and overwrite it). Unchecked,
    /// like the other monotone fast paths.
    pub fn insert_min(&mut self, item: T) -> Option<T> {
        let mut anchor: Link<T> = None;
        let mut granpa: Link<T> = None;
        let mut parent: Link<T> = None;
        let mut node = self.root;
        let mut pending = Some(item);
        let mut displaced = None;
        let mut inserted = false;

        loop {
            match node {
                None => {
                    // The spine bottom may already hold an equal element.
                    let overwrote = match parent {
                        // SAFETY: `parent` is a live node of this tree.
                        Some(mut p) => unsafe {
                            let key = pending.as_ref().expect("consumed only at the bottom");
                            if self.comp.compare(key, &p.as_ref().item) == Ordering::Equal {
                                let taken = pending.take().expect("checked just above");
                                displaced = Some(mem::replace(&mut p.as_mut().item, taken));
                                true
                            } else {
                                false
                            }
                        },
                        None => false,
                    };
                    if overwrote {
                        break;
                    }
                    let leaf = Node::alloc(
                        pending.take().expect("consumed only at the bottom"),
                        Color::Red,
                    );
                    match parent {
                        None => self.root = Some(leaf),
                        // SAFETY: as above.
                        Some(mut p) => unsafe { p.as_mut().left = Some(leaf) },
                    }
                    node = Some(leaf);
                    inserted = true;
                }
                // SAFETY: `cur` is a live node of this tree.
                Some(mut cur) => unsafe {
                    if is_red(cur.as_ref().left) && is_red(cur.as_ref().right) {
                        cur.as_mut().color = Color::Red;
                        set_color(cur.as_ref().left.expect("red child"), Color::Black);
                        set_color(cur.as_ref().right.expect("red child"), Color::Black);
                    }
                },
            }

            // Only one violation shape is possible on a pure-left descent:
            // repair it with a single right rotation.
            if is_red(node) && is_red(parent) {
                let mut g = granpa.expect("a red parent is never the root");
                let mut p = parent.expect("checked red above");
                // SAFETY: window nodes are live and distinct.
                unsafe {
                    g.as_mut().left = p.as_ref().right;
                    g.as_mut().color = Color::Red;
                    p.as_mut().right = Some(g);
                    p.as_mut().color = Color::Black;
                    match anchor {
                        None => self.root = Some(p),
                        Some(mut a) => a.as_mut().left = Some(p),
                    }
                }
                granpa = anchor;
            }

            if inserted {
                break;
            }
            anchor = granpa;
            granpa = parent;
            parent = node;
            // SAFETY: the loop above only reaches here with a live node.
            node = unsafe { node.expect("still descending").as_ref().left };
        }

        self.force_root_black();
        displaced
    }

    /// Inserts `item` asserting it is no smaller than anything stored.
    /// Mirror image of [`Tree::insert_min`].
    pub fn insert_max(&mut self, item: T) -> Option<T> {
        let mut anchor: Link<T> = None;
        let mut granpa: Link<T> = None;
        let mut parent: Link<T> = None;
        let mut node = self.root;
        let mut pending = Some(item);
        let mut displaced = None;
        let mut inserted = false;

        loop {
            match node {
                None => {
                    let overwrote = match parent {
                        // SAFETY: `parent` is a live node of this tree.
                        Some(mut p) => unsafe {
                            let key = pending.as_ref().expect("consumed only at the bottom");
                            if self.comp.compare(key, &p.as_ref().item) == Ordering::Equal {
                                let taken = pending.take().expect("checked just above");
                                displaced = Some(mem::replace(&mut p.as_mut().item, taken));
                                true
                            } else {
                                false
                            }
                        },
                        None => false,
                    };
                    if overwrote {
                        break;
                    }
                    let leaf = Node::alloc(
                        pending.take().expect("consumed only at the bottom"),
                        Color::Red,
                    );
                    match parent {
                        None => self.root = Some(leaf),
                        // SAFETY: as above.
                        Some(mut p) => unsafe { p.as_mut().right = Some(leaf) },
                    }
                    node = Some(leaf);
                    inserted = true;
                }
                // SAFETY: `cur` is a live node of this tree.
                Some(mut cur) => unsafe {
                    if is_red(cur.as_ref().left) && is_red(cur.as_ref().right) {
                        cur.as_mut().color = Color::Red;
                        set_color(cur.as_ref().left.expect("red child"), Color::Black);
                        set_color(cur.as_ref().right.expect("red child"), Color::Black);
                    }
                },
            }

            if is_red(node) && is_red(parent) {
                let mut g = granpa.expect("a red parent is never the root");
                let mut p = parent.expect("checked red above");
                // SAFETY: window nodes are live and distinct.
                unsafe {
                    g.as_mut().right = p.as_ref().left;
                    g.as_mut().color = Color::Red;
                    p.as_mut().left = Some(g);
                    p.as_mut().color = Color::Black;
                    match anchor {
                        None => self.root = Some(p),
                        Some(mut a) => a.as_mut().right = Some(p),
                    }
                }
                granpa = anchor;
            }

            if inserted {
                break;
            }
            anchor = granpa;
            granpa = parent;
            parent = node;
            // SAFETY: the loop above only reaches here with a live node.
            node = unsafe { node.expect("still descending").as_ref().right };
        }

        self.force_root_black();
        displaced
    }

    /// Finds the stored element comparing equal to `key`.
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

    /// The biggest stored element strictly smaller than `key`, stored or
    /// not. `None` if nothing is smaller.
    pub fn prev(&self, key: &T) -> Option<&T> {
        let mut pred: Link<T> = None;
        let mut node = self.root;
        while let Some(ptr) = node {
            // SAFETY: tree nodes stay live for the life of `&self`.
            let n = unsafe { ptr.as_ref() };
            match self.comp.compare(key, &n.item) {
                Ordering::Less => node = n.left,
                Ordering::Greater => {
                    pred = Some(ptr);
                    node = n.right;
                }
                Ordering::Equal => {
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

    /// Removes the element comparing equal to `key` in a single top-down
    /// pass and returns its payload, or `None`.
    ///
    /// The descent keeps the invariant "node black, sibling black, parent
    /// red" by recoloring or rotating at each step, so the bottom node
    /// reached at the end is red and can be unlinked freely. When the key
    /// sits in an interior node, that node is remembered and the descent
    /// carries on to its in-order successor; the payloads trade places at
    /// the end. A missing key still performs the whole restructuring
    /// descent; it just erases nothing.
    pub fn remove(&mut self, key: &T) -> Option<T> {
        let mut granpa: Link<T> = None;
        let mut parent: Link<T> = None;
        let mut sister: Link<T> = None;
        let mut node = self.root;
        let mut target: Link<T> = None;
        // comp: direction about to be taken from `node`;
        // comp_n: direction previously taken from `parent` into `node`.
        let mut comp = Ordering::Equal;
        let mut comp_n = Ordering::Equal;

        self.root?;

        while let Some(mut cur) = node {
            // Case 1: the current node has two black children. Paint it
            // red, borrowing blackness from the parent or redness from the
            // sibling's side as needed.
            // SAFETY: the window nodes below are live nodes of this tree,
            // pairwise distinct; `&mut self` is exclusive.
            unsafe {
                if is_black(cur.as_ref().left) && is_black(cur.as_ref().right) {
                    if let Some(mut par) = parent {
                        match sister {
                            None => {
                                cur.as_mut().color = Color::Red;
                                par.as_mut().color = Color::Black;
                            }
                            Some(mut sis)
                                if is_black(sis.as_ref().left)
                                    && is_black(sis.as_ref().right) =>
                            {
                                cur.as_mut().color = Color::Red;
                                sis.as_mut().color = Color::Red;
                                par.as_mut().color = Color::Black;
                            }
                            Some(mut sis) => {
                                if is_red(sis.as_ref().left) {
                                    if comp == Ordering::Less {
                                        // Sibling on the right, its red
                                        // child inside: double rotation.
                                        let mut top = sis.as_ref().left.expect("checked red");
                                        self.link_under(granpa, comp_n, top);
                                        granpa = Some(top);
                                        par.as_mut().right = top.as_ref().left;
                                        top.as_mut().left = Some(par);
                                        sis.as_mut().left = top.as_ref().right;
                                        top.as_mut().right = Some(sis);
                                        sister = par.as_ref().right;
                                        cur.as_mut().color = Color::Red;
                                        par.as_mut().color = Color::Black;
                                    } else {
                                        // Sibling on the left, its red
                                        // child outside: single rotation.
                                        self.link_under(granpa, comp_n, sis);
                                        granpa = Some(sis);
                                        par.as_mut().left = sis.as_ref().right;
                                        sis.as_mut().right = Some(par);
                                        sister = par.as_ref().left;
                                        cur.as_mut().color = Color::Red;
                                        sis.as_mut().color = Color::Red;
                                        par.as_mut().color = Color::Black;
                                        set_color(
                                            sis.as_ref().left.expect("checked red"),
                                            Color::Black,
                                        );
                                    }
                                } else if comp == Ordering::Greater {
                                    // Sibling on the left, its red child
                                    // inside: double rotation.
                                    let mut top = sis.as_ref().right.expect("one child is red");
                                    self.link_under(granpa, comp_n, top);
                                    granpa = Some(top);
                                    par.as_mut().left = top.as_ref().right;
                                    top.as_mut().right = Some(par);
                                    sis.as_mut().right = top.as_ref().left;
                                    top.as_mut().left = Some(sis);
                                    sister = par.as_ref().left;
                                    cur.as_mut().color = Color::Red;
                                    par.as_mut().color = Color::Black;
                                } else {
                                    // Sibling on the right, its red child
                                    // outside: single rotation.
                                    self.link_under(granpa, comp_n, sis);
                                    granpa = Some(sis);
                                    par.as_mut().right = sis.as_ref().left;
                                    sis.as_mut().left = Some(par);
                                    sister = par.as_ref().right;
                                    cur.as_mut().color = Color::Red;
                                    sis.as_mut().color = Color::Red;
                                    par.as_mut().color = Color::Black;
                                    set_color(
                                        sis.as_ref().right.expect("one child is red"),
                                        Color::Black,
                                    );
                                }
                            }
                        }
                    } else {
                        // At the root there is nothing to borrow from.
                        cur.as_mut().color = Color::Red;
                    }
                }
            }

            // Compare, unless the target was already found: from then on
            // the descent chases its in-order successor (right once, then
            // left to the bottom).
            comp_n = comp;
            comp = if target.is_some() {
                Ordering::Less
            } else {
                // SAFETY: `cur` is live.
                self.comp.compare(key, unsafe { &cur.as_ref().item })
            };
            if comp == Ordering::Equal {
                target = Some(cur);
                comp = Ordering::Greater;
            }

            // Case 2: the current node has a red child.
            // SAFETY: as in case 1.
            unsafe {
                if is_red(cur.as_ref().left) || is_red(cur.as_ref().right) {
                    if (comp == Ordering::Less && is_red(cur.as_ref().left))
                        || (comp == Ordering::Greater && is_red(cur.as_ref().right))
                    {
                        // Heading into the red child anyway: take the step
                        // for free and compare again.
                        granpa = parent;
                        parent = Some(cur);
                        if comp == Ordering::Less {
                            sister = cur.as_ref().right;
                            cur = cur.as_ref().left.expect("checked red");
                        } else {
                            sister = cur.as_ref().left;
                            cur = cur.as_ref().right.expect("checked red");
                        }
                        comp_n = comp;
                        comp = if target.is_some() {
                            Ordering::Less
                        } else {
                            self.comp.compare(key, &cur.as_ref().item)
                        };
                        if comp == Ordering::Equal {
                            target = Some(cur);
                            comp = Ordering::Greater;
                        }
                    } else if comp == Ordering::Less {
                        // Heading left but the red child is on the right:
                        // rotate it above us so the invariant holds below.
                        let mut red = cur.as_ref().right.expect("the red child");
                        match parent {
                            None => self.root = Some(red),
                            Some(mut p) => {
                                if comp_n == Ordering::Less {
                                    p.as_mut().left = Some(red);
                                } else {
                                    p.as_mut().right = Some(red);
                                }
                            }
                        }
                        granpa = parent;
                        parent = Some(red);
                        sister = red.as_ref().right;
                        cur.as_mut().right = red.as_ref().left;
                        red.as_mut().left = Some(cur);
                        cur.as_mut().color = Color::Red;
                        red.as_mut().color = Color::Black;
                        comp_n = Ordering::Less;
                    } else {
                        // Mirror image, heading right.
                        let mut red = cur.as_ref().left.expect("the red child");
                        match parent {
                            None => self.root = Some(red),
                            Some(mut p) => {
                                if comp_n == Ordering::Less {
                                    p.as_mut().left = Some(red);
                                } else {
                                    p.as_mut().right = Some(red);
                                }
                            }
                        }
                        granpa = parent;
                        parent = Some(red);
                        sister = red.as_ref().left;
                        cur.as_mut().left = red.as_ref().right;
                        red.as_mut().right = Some(cur);
                        cur.as_mut().color = Color::Red;
                        red.as_mut().color = Color::Black;
                        comp_n = Ordering::Greater;
                    }
                }

                // Move down one level.
                granpa = parent;
                parent = Some(cur);
                if comp == Ordering::Less {
                    node = cur.as_ref().left;
                    sister = cur.as_ref().right;
                } else {
                    node = cur.as_ref().right;
                    sister = cur.as_ref().left;
                }
            }
        }

        let Some(target) = target else {
            // The key was never here, but the descent restructured anyway.
            self.force_root_black();
            return None;
        };
        // The bottom node the descent ended on is red: unlink it, move its
        // payload into the remembered node, return the displaced payload.
        let doomed = parent.expect("a found key leaves the descent on a bottom node");
        // SAFETY: `doomed` is the last live node visited; after relinking
        // nothing references it.
        let displaced = unsafe {
            let replacement = doomed.as_ref().right;
            match granpa {
                None => self.root = replacement,
                Some(mut g) => {
                    if g.as_ref().left == Some(doomed) {
                        g.as_mut().left = replacement;
                    } else {
                        g.as_mut().right = replacement;
                    }
                }
            }
            let bottom = Node::into_item(doomed);
            if doomed == target {
                bottom
            } else {
                let mut target = target;
                mem::replace(&mut target.as_mut().item, bottom)
            }
        };
        self.force_root_black();
        Some(displaced)
    }

    /// Removes and returns the smallest element in one top-down pass: the
    /// pure-left specialization of [`Tree::remove`], with no comparisons.
    pub fn remove_min(&mut self) -> Option<T> {
        let mut granpa: Link<T> = None;
        let mut parent: Link<T> = None;
        let mut sister: Link<T> = None;
        let mut node = self.root;

        self.root?;

        while let Some(mut cur) = node {
            // SAFETY: window nodes are live and distinct; `&mut self` is
            // exclusive.
            unsafe {
                // Case 1: two black children.
                if is_black(cur.as_ref().left) && is_black(cur.as_ref().right) {
                    if let Some(mut par) = parent {
                        match sister {
                            None => {
                                cur.as_mut().color = Color::Red;
                                par.as_mut().color = Color::Black;
                            }
                            Some(mut sis)
                                if is_black(sis.as_ref().left)
                                    && is_black(sis.as_ref().right) =>
                            {
                                cur.as_mut().color = Color::Red;
                                sis.as_mut().color = Color::Red;
                                par.as_mut().color = Color::Black;
                            }
                            Some(mut sis) => {
                                // The sibling is always on the right here.
                                if is_red(sis.as_ref().left) {
                                    // Inner red child: double rotation.
                                    let mut top = sis.as_ref().left.expect("checked red");
                                    match granpa {
                                        None => self.root = Some(top),
                                        Some(mut g) => g.as_mut().left = Some(top),
                                    }
                                    granpa = Some(top);
                                    par.as_mut().right = top.as_ref().left;
                                    top.as_mut().left = Some(par);
                                    sis.as_mut().left = top.as_ref().right;
                                    top.as_mut().right = Some(sis);
                                    sister = par.as_ref().right;
                                    cur.as_mut().color = Color::Red;
                                    par.as_mut().color = Color::Black;
                                } else {
                                    // Outer red child: single rotation.
                                    match granpa {
                                        None => self.root = Some(sis),
                                        Some(mut g) => g.as_mut().left = Some(sis),
                                    }
                                    granpa = Some(sis);
                                    par.as_mut().right = sis.as_ref().left;
                                    sis.as_mut().left = Some(par);
                                    sister = par.as_ref().right;
                                    cur.as_mut().color = Color::Red;
                                    sis.as_mut().color = Color::Red;
                                    par.as_mut().color = Color::Black;
                                    set_color(
                                        sis.as_ref().right.expect("one child is red"),
                                        Color::Black,
                                    );
                                }
                            }
                        }
                    } else {
                        cur.as_mut().color = Color::Red;
                    }
                }

                // Case 2: a red child.
                if is_red(cur.as_ref().left) || is_red(cur.as_ref().right) {
                    if is_red(cur.as_ref().left) {
                        // The red child is where we are going: free step.
                        granpa = parent;
                        parent = Some(cur);
                        sister = cur.as_ref().right;
                        cur = cur.as_ref().left.expect("checked red");
                    } else {
                        // Rotate the red right child above us.
                        let mut red = cur.as_ref().right.expect("the red child");
                        match parent {
                            None => self.root = Some(red),
                            Some(mut p) => p.as_mut().left = Some(red),
                        }
                        granpa = parent;
                        parent = Some(red);
                        sister = red.as_ref().right;
                        cur.as_mut().right = red.as_ref().left;
                        red.as_mut().left = Some(cur);
                        cur.as_mut().color = Color::Red;
                        red.as_mut().color = Color::Black;
                    }
                }

                granpa = parent;
                parent = Some(cur);
                node = cur.as_ref().left;
                sister = cur.as_ref().right;
            }
        }

        // The leftmost node is red by now: unlink and free it.
        let doomed = parent.expect("non-empty tree has a leftmost node");
        // SAFETY: after relinking nothing references `doomed`.
        let item = unsafe {
            match granpa {
                None => self.root = doomed.as_ref().right,
                Some(mut g) => g.as_mut().left = doomed.as_ref().right,
            }
            Node::into_item(doomed)
        };
        self.force_root_black();
        Some(item)
    }

    /// Removes and returns the biggest element. Mirror image of
    /// [`Tree::remove_min`].
    pub fn remove_max(&mut self) -> Option<T> {
        let mut granpa: Link<T> = None;
        let mut parent: Link<T> = None;
        let mut sister: Link<T> = None;
        let mut node = self.root;

        self.root?;

        while let Some(mut cur) = node {
            // SAFETY: window nodes are live and distinct; `&mut self` is
            // exclusive.
            unsafe {
                if is_black(cur.as_ref().left) && is_black(cur.as_ref().right) {
                    if let Some(mut par) = parent {
                        match sister {
                            None => {
                                cur.as_mut().color = Color::Red;
                                par.as_mut().color = Color::Black;
                            }
                            Some(mut sis)
                                if is_black(sis.as_ref().left)
                                    && is_black(sis.as_ref().right) =>
                            {
                                cur.as_mut().color = Color::Red;
                                sis.as_mut().color = Color::Red;
                                par.as_mut().color = Color::Black;
                            }
                            Some(mut sis) => {
                                // The sibling is always on the left here.
                                if is_red(sis.as_ref().left) {
                                    // Outer red child: single rotation.
                                    match granpa {
                                        None => self.root = Some(sis),
                                        Some(mut g) => g.as_mut().right = Some(sis),
                                    }
                                    granpa = Some(sis);
                                    par.as_mut().left = sis.as_ref().right;
                                    sis.as_mut().right = Some(par);
                                    sister = par.as_ref().left;
                                    cur.as_mut().color = Color::Red;
                                    sis.as_mut().color = Color::Red;
                                    par.as_mut().color = Color::Black;
                                    set_color(
                                        sis.as_ref().left.expect("checked red"),
                                        Color::Black,
                                    );
                                } else {
                                    // Inner red child: double rotation.
                                    let mut top = sis.as_ref().right.expect("one child is red");
                                    match granpa {
                                        None => self.root = Some(top),
                                        Some(mut g) => g.as_mut().right = Some(top),
                                    }
                                    granpa = Some(top);
                                    par.as_mut().left = top.as_ref().right;
                                    top.as_mut().right = Some(par);
                                    sis.as_mut().right = top.as_ref().left;
                                    top.as_mut().left = Some(sis);
                                    sister = par.as_ref().left;
                                    cur.as_mut().color = Color::Red;
                                    par.as_mut().color = Color::Black;
                                }
                            }
                        }
                    } else {
                        cur.as_mut().color = Color::Red;
                    }
                }

                if is_red(cur.as_ref().left) || is_red(cur.as_ref().right) {
                    if is_red(cur.as_ref().right) {
                        granpa = parent;
                        parent = Some(cur);
                        sister = cur.as_ref().left;
                        cur = cur.as_ref().right.expect("checked red");
                    } else {
                        let mut red = cur.as_ref().left.expect("the red child");
                        match parent {
                            None => self.root = Some(red),
                            Some(mut p) => p.as_mut().right = Some(red),
                        }
                        granpa = parent;
                        parent = Some(red);
                        sister = red.as_ref().left;
                        cur.as_mut().left = red.as_ref().right;
                        red.as_mut().right = Some(cur);
                        cur.as_mut().color = Color::Red;
                        red.as_mut().color = Color::Black;
                    }
                }

                granpa = parent;
                parent = Some(cur);
                node = cur.as_ref().right;
                sister = cur.as_ref().left;
            }
        }

        let doomed = parent.expect("non-empty tree has a rightmost node");
        // SAFETY: after relinking nothing references `doomed`.
        let item = unsafe {
            match granpa {
                None => self.root = doomed.as_ref().left,
                Some(mut g) => g.as_mut().right = doomed.as_ref().left,
            }
            Node::into_item(doomed)
        };
        self.force_root_black();
        Some(item)
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

    /// Returns a new tree with the same elements. Unlike the plain tree's
    /// copy, the result is a properly balanced red-black tree: each element
    /// is fed to [`Tree::insert_max`], so the copy costs O(n log n).
    pub fn copy(&self) -> Self
    where
        T: Clone,
        C: Clone,
    {
        let mut out = Tree::new(self.comp.clone());
        // SAFETY: `&self` is held for the whole walk and the walk restores
        // every link before it drops.
        unsafe {
            let mut items = InorderWalk::new(self.root);
            while let Some(ptr) = items.peek() {
                let displaced = out.insert_max(ptr.as_ref().item.clone());
                debug_assert!(displaced.is_none());
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
        // SAFETY: both roots belong to distinct live trees held by `&self`
        // and `&other`; the merge restores every link before returning.
        unsafe {
            walk::merge(self.root, other.root, &self.comp, plan, |item| {
                let displaced = out.insert_max(item.clone());
                debug_assert!(displaced.is_none());
            });
        }
        out
    }

    /// Builds a new balanced tree holding every element of `self` or
    /// `other`, cloning from `self` when an element is in both. Both
    /// operands must use the same order; the result gets a clone of
    /// `self`'s comparator.
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

    /// Builds a new balanced tree holding the elements present in both
    /// operands, cloned from `self`.
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

    /// Builds a new balanced tree holding the elements of `self` not in
    /// `other`.
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

    /// Builds a new balanced tree holding the elements in exactly one
    /// operand.
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

    /// Checks every red-black invariant: symmetric order, no red node with
    /// a red child, equal black count on every root-to-leaf path, black
    /// root. Meant for tests and debugging.
    pub fn is_valid(&self) -> bool {
        /// Returns the subtree's black height, or `None` on any violation.
        fn check<T, C: Comparator<T>>(
            comp: &C,
            node: &Node<T>,
            min: Option<&T>,
            max: Option<&T>,
        ) -> Option<u32> {
            if let Some(min) = min {
                if comp.compare(min, &node.item) != Ordering::Less {
                    return None;
                }
            }
            if let Some(max) = max {
                if comp.compare(&node.item, max) != Ordering::Less {
                    return None;
                }
            }
            if node.color == Color::Red && (is_red(node.left) || is_red(node.right)) {
                return None;
            }
            let left_height = match node.left {
                None => 0,
                // SAFETY: child nodes are live as long as their parent.
                Some(left) => check(comp, unsafe { left.as_ref() }, min, Some(&node.item))?,
            };
            let right_height = match node.right {
                None => 0,
                // SAFETY: as above.
                Some(right) => check(comp, unsafe { right.as_ref() }, Some(&node.item), max)?,
            };
            if left_height != right_height {
                return None;
            }
            Some(left_height + u32::from(node.color == Color::Black))
        }

        match self.root {
            None => true,
            Some(root) => {
                // SAFETY: the root is live for the life of `&self`.
                let root = unsafe { root.as_ref() };
                root.color == Color::Black && check(&self.comp, root, None, None).is_some()
            }
        }
    }
}

impl<T, C> Drop for Tree<T, C> {
    fn drop(&mut self) {
        // Rotation-based iterative teardown, as in `clear_with`.
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
mod tests {
    use super::*;

    fn new_tree() -> Tree<i32, fn(&i32, &i32) -> Ordering> {
        Tree::new(Ord::cmp)
    }

    fn drained(tree: &mut Tree<i32, fn(&i32, &i32) -> Ordering>) -> Vec<i32> {
        let mut out = Vec::new();
        tree.clear_with(|x| out.push(x));
        out
    }

    fn height(link: Link<i32>) -> usize {
        match link {
            None => 0,
            Some(node) => {
                let node = unsafe { node.as_ref() };
                1 + height(node.left).max(height(node.right))
            }
        }
    }

    #[test]
    fn ascending_inserts_stay_valid_and_shallow() {
        let mut tree = new_tree();
        for x in 0..512 {
            tree.insert(x);
            assert!(tree.is_valid(), "invalid after inserting {x}");
        }
        // 512 nodes: a red-black tree is at most twice the optimal height.
        assert!(height(tree.root) <= 2 * 10);
        assert_eq!(drained(&mut tree), (0..512).collect::<Vec<_>>());
    }

    #[test]
    fn descending_inserts_stay_valid() {
        let mut tree = new_tree();
        for x in (0..512).rev() {
            tree.insert(x);
            assert!(tree.is_valid(), "invalid after inserting {x}");
        }
        assert_eq!(drained(&mut tree), (0..512).collect::<Vec<_>>());
    }

    #[test]
    fn insert_overwrites_equal_payload() {
        let mut tree = Tree::new(|a: &(i32, i32), b: &(i32, i32)| a.0.cmp(&b.0));
        assert_eq!(tree.insert((3, 30)), None);
        assert_eq!(tree.insert((1, 10)), None);
        assert_eq!(tree.insert((3, 33)), Some((3, 30)));
        assert_eq!(tree.search(&(3, 0)), Some(&(3, 33)));
    }

    #[test]
    fn insert_min_and_max_fast_paths() {
        let mut tree = new_tree();
        for x in [5, 3, 8] {
            tree.insert(x);
        }
        assert_eq!(tree.insert_min(1), None);
        assert!(tree.is_valid());
        assert_eq!(tree.insert_min(1), Some(1));
        assert_eq!(tree.insert_max(9), None);
        assert!(tree.is_valid());
        assert_eq!(tree.insert_max(9), Some(9));

        // Long monotone runs exercise the one-directional rebalancing.
        let mut tree = new_tree();
        for x in (0..256).rev() {
            assert_eq!(tree.insert_min(x), None);
            assert!(tree.is_valid(), "invalid after insert_min({x})");
        }
        for x in 256..512 {
            assert_eq!(tree.insert_max(x), None);
            assert!(tree.is_valid(), "invalid after insert_max({x})");
        }
        assert_eq!(drained(&mut tree), (0..512).collect::<Vec<_>>());
    }

    #[test]
    fn remove_keeps_the_tree_valid() {
        let mut tree = new_tree();
        for x in 0..128 {
            tree.insert((x * 37) % 128);
        }
        for x in 0..128 {
            assert_eq!(tree.remove(&x), Some(x));
            assert!(tree.is_valid(), "invalid after removing {x}");
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn remove_missing_key_restructures_but_erases_nothing() {
        let mut tree = new_tree();
        for x in [10, 20, 30, 40, 50] {
            tree.insert(x);
        }
        assert_eq!(tree.remove(&25), None);
        assert!(tree.is_valid());
        assert_eq!(drained(&mut tree), [10, 20, 30, 40, 50]);
    }

    #[test]
    fn remove_from_empty_tree() {
        let mut tree = new_tree();
        assert_eq!(tree.remove(&1), None);
        assert_eq!(tree.remove_min(), None);
        assert_eq!(tree.remove_max(), None);
    }

    #[test]
    fn remove_min_and_max_agree_with_lookups() {
        let mut tree = new_tree();
        for x in [5, 3, 8, 1, 9, 7, 2] {
            tree.insert(x);
        }

        let mut ascending = Vec::new();
        while let Some(min) = tree.min().copied() {
            assert_eq!(tree.remove_min(), Some(min));
            assert!(tree.is_valid());
            ascending.push(min);
        }
        assert_eq!(ascending, [1, 2, 3, 5, 7, 8, 9]);

        for x in [5, 3, 8, 1, 9, 7, 2] {
            tree.insert(x);
        }
        let mut descending = Vec::new();
        while let Some(max) = tree.max().copied() {
            assert_eq!(tree.remove_max(), Some(max));
            assert!(tree.is_valid());
            descending.push(max);
        }
        assert_eq!(descending, [9, 8, 7, 5, 3, 2, 1]);
    }

    #[test]
    fn prev_next_walk_the_whole_tree() {
        let mut tree = new_tree();
        for x in [50, 20, 80, 10, 30, 70, 90] {
            tree.insert(x);
        }

        let mut seen = vec![*tree.min().unwrap()];
        while let Some(&x) = tree.next(seen.last().unwrap()) {
            seen.push(x);
        }
        assert_eq!(seen, [10, 20, 30, 50, 70, 80, 90]);

        assert_eq!(tree.prev(&65), Some(&50));
        assert_eq!(tree.next(&65), Some(&70));
        assert_eq!(tree.prev(&10), None);
        assert_eq!(tree.next(&90), None);
    }

    #[test]
    fn copy_is_valid_and_independent() {
        let mut tree = new_tree();
        for x in [4, 2, 6, 1, 3, 5, 7] {
            tree.insert(x);
        }

        let mut copied = tree.copy();
        assert!(copied.is_valid());
        copied.insert(100);
        assert_eq!(tree.search(&100), None);
        assert_eq!(drained(&mut copied), [1, 2, 3, 4, 5, 6, 7, 100]);
        assert_eq!(drained(&mut tree), [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn set_combinators_are_valid_trees() {
        let mut a = new_tree();
        let mut b = new_tree();
        for x in 0..64 {
            a.insert(x);
        }
        for x in 32..96 {
            b.insert(x);
        }

        let u = a.union(&b);
        assert!(u.is_valid());
        let i = a.intersection(&b);
        assert!(i.is_valid());
        let d = a.diff(&b);
        assert!(d.is_valid());
        let s = a.sym_diff(&b);
        assert!(s.is_valid());

        let mut u = u;
        let mut i = i;
        let mut d = d;
        let mut s = s;
        assert_eq!(drained(&mut u), (0..96).collect::<Vec<_>>());
        assert_eq!(drained(&mut i), (32..64).collect::<Vec<_>>());
        assert_eq!(drained(&mut d), (0..32).collect::<Vec<_>>());
        let expect: Vec<i32> = (0..32).chain(64..96).collect();
        assert_eq!(drained(&mut s), expect);

        // Operand links were restored after the threaded walks.
        assert!(a.is_valid());
        assert!(b.is_valid());
    }

    #[test]
    fn set_combinators_on_the_same_handle_and_empty() {
        let mut a = new_tree();
        for x in [1, 2, 3] {
            a.insert(x);
        }
        let empty = new_tree();

        assert_eq!(drained(&mut a.union(&a)), [1, 2, 3]);
        assert!(a.sym_diff(&a).is_empty());
        assert!(a.diff(&a).is_empty());

        let s = empty.sym_diff(&a);
        assert!(s.is_valid());
        let mut s = s;
        assert_eq!(drained(&mut s), [1, 2, 3]);
    }
}
