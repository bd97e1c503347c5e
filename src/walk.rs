//! Threaded in-order traversal and the ordered-merge engine built on it.
//!
//! Copying a tree and combining two trees both need every element in
//! ascending order, and they need it without a recursion stack or an
//! explicit one (the plain tree can be a spine a million nodes deep). The
//! walk here is Morris-style: while descending, the predecessor of the
//! current node temporarily lends its (null) right link as a way back up,
//! and the link is cleared again once the subtree has been visited. Between
//! steps the tree's topology is exactly what it was on entry; the threading
//! is only ever observable mid-step.
//!
//! A walk that stops early would leave threaded links behind, so
//! [`InorderWalk`] finishes the sweep in its `Drop` impl. The merge engine
//! relies on that: `intersection` stops as soon as one operand runs dry and
//! simply lets the other walk drain itself.

use std::cmp::Ordering;
use std::ptr::NonNull;

use crate::Comparator;

/// Link accessors the walk needs from a tree node.
///
/// Implementations must return the node's real child links and `set_right`
/// must store exactly the given link; the walk restores every link it
/// touches before it finishes.
pub(crate) trait WalkNode: Sized {
    type Item;

    fn left(&self) -> Option<NonNull<Self>>;
    fn right(&self) -> Option<NonNull<Self>>;
    fn set_right(&mut self, link: Option<NonNull<Self>>);
    fn item(&self) -> &Self::Item;
}

/// An in-order cursor over a binary search tree, O(1) auxiliary space.
///
/// `peek` returns the current node, `advance` moves to its in-order
/// successor. Dropping the walk drains it, which unthreads any right links
/// still borrowed for the climb back up.
pub(crate) struct InorderWalk<N: WalkNode> {
    node: Option<NonNull<N>>,
}

impl<N: WalkNode> InorderWalk<N> {
    /// Starts a walk at the smallest node under `root`, threading the path
    /// down so the walk can climb back without parent pointers.
    ///
    /// # Safety
    ///
    /// `root` must be the root of a tree whose nodes are all live, and the
    /// tree's links must not be read or written by anyone else until this
    /// walk is dropped. Payloads may be read through [`Self::peek`].
    pub(crate) unsafe fn new(root: Option<NonNull<N>>) -> Self {
        let mut node = root;
        if let Some(mut n) = root {
            // SAFETY: the caller guarantees exclusive access to every link
            // reachable from `root` until the walk is dropped.
            unsafe {
                // Descend to the minimum. Each step threads the predecessor
                // of `n` (the rightmost node of its left subtree) back to
                // `n`. The scan below never meets an older thread: those
                // all live outside the subtree being scanned.
                while let Some(left) = n.as_ref().left() {
                    let mut pred = left;
                    while let Some(next) = pred.as_ref().right() {
                        pred = next;
                    }
                    pred.as_mut().set_right(Some(n));
                    n = left;
                }
            }
            node = Some(n);
        }
        Self { node }
    }

    /// The current node, or `None` once the walk is exhausted.
    pub(crate) fn peek(&self) -> Option<NonNull<N>> {
        self.node
    }

    /// Moves to the in-order successor of the current node.
    pub(crate) fn advance(&mut self) {
        let Some(cur) = self.node else { return };
        // SAFETY: the exclusivity contract of `new` still holds; all the
        // links touched here belong to the tree the walk was started on.
        unsafe {
            // The right link of a visited node is either a real child or a
            // thread planted on the way down; both point at the successor
            // side.
            let mut next = cur.as_ref().right();
            if let Some(mut node) = next {
                loop {
                    let Some(left) = node.as_ref().left() else { break };
                    // Find the predecessor of `node`, stopping early if its
                    // right link already threads back to `node`.
                    let mut pred = left;
                    loop {
                        match pred.as_ref().right() {
                            Some(r) if r != node => pred = r,
                            _ => break,
                        }
                    }
                    if pred.as_ref().right().is_none() {
                        // First visit: thread and keep descending.
                        pred.as_mut().set_right(Some(node));
                        node = left;
                    } else {
                        // Second visit: the left subtree is done. Unthread
                        // and yield `node` itself.
                        pred.as_mut().set_right(None);
                        break;
                    }
                }
                next = Some(node);
            }
            self.node = next;
        }
    }
}

impl<N: WalkNode> Drop for InorderWalk<N> {
    fn drop(&mut self) {
        // Finish the sweep so every threaded right link is restored even if
        // the consumer stopped early.
        while self.node.is_some() {
            self.advance();
        }
    }
}

/// Which rows of the ordered-merge table produce output.
///
/// `lower`/`upper` also decide the tail policy: once one side is exhausted,
/// the other is flushed only if its row emits.
#[derive(Clone, Copy)]
pub(crate) struct MergePlan {
    /// Emit elements present only in the first operand.
    pub(crate) lower: bool,
    /// Emit elements present only in the second operand.
    pub(crate) upper: bool,
    /// Emit elements present in both (taken from the first operand).
    pub(crate) both: bool,
}

pub(crate) const UNION: MergePlan = MergePlan { lower: true, upper: true, both: true };
pub(crate) const INTERSECTION: MergePlan = MergePlan { lower: false, upper: false, both: true };
pub(crate) const DIFF: MergePlan = MergePlan { lower: true, upper: false, both: false };
pub(crate) const SYM_DIFF: MergePlan = MergePlan { lower: true, upper: true, both: false };

/// Walks two trees in ascending order and emits the merge selected by
/// `plan`. Elements arrive at `emit` in strictly ascending order.
///
/// Both walks are fully drained before this returns, restoring every
/// temporarily threaded link in both operands.
///
/// # Safety
///
/// Same contract as [`InorderWalk::new`], for both roots. The two roots
/// must belong to different trees.
pub(crate) unsafe fn merge<N, C>(
    a: Option<NonNull<N>>,
    b: Option<NonNull<N>>,
    comp: &C,
    plan: MergePlan,
    mut emit: impl FnMut(&N::Item),
) where
    N: WalkNode,
    C: Comparator<N::Item>,
{
    let mut wa = InorderWalk::new(a);
    let mut wb = InorderWalk::new(b);
    loop {
        match (wa.peek(), wb.peek()) {
            (Some(x), Some(y)) => {
                // SAFETY: both nodes are live and the walks only mutate
                // links, never payloads; the borrows end before `advance`.
                match comp.compare(x.as_ref().item(), y.as_ref().item()) {
                    Ordering::Less => {
                        if plan.lower {
                            emit(x.as_ref().item());
                        }
                        wa.advance();
                    }
                    Ordering::Greater => {
                        if plan.upper {
                            emit(y.as_ref().item());
                        }
                        wb.advance();
                    }
                    Ordering::Equal => {
                        if plan.both {
                            emit(x.as_ref().item());
                        }
                        wa.advance();
                        wb.advance();
                    }
                }
            }
            (Some(x), None) => {
                if !plan.lower {
                    break;
                }
                emit(x.as_ref().item());
                wa.advance();
            }
            (None, Some(y)) => {
                if !plan.upper {
                    break;
                }
                emit(y.as_ref().item());
                wb.advance();
            }
            (None, None) => break,
        }
    }
    // An early break leaves one walk mid-tree; dropping `wa`/`wb` drains
    // them, which restores the threaded links.
}
