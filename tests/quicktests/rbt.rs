use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Bound;

use ordset::rbt::Tree;
use quickcheck_macros::quickcheck;

use crate::Op;

type IntTree = Tree<i32, fn(&i32, &i32) -> Ordering>;

fn new_tree() -> IntTree {
    Tree::new(Ord::cmp)
}

/// Applies a set of operations to a tree and a model set, checking every
/// answer and re-validating all the red-black invariants after each step.
fn do_ops(ops: &[Op<i32>], tree: &mut IntTree, model: &mut BTreeSet<i32>) {
    for op in ops {
        match op {
            Op::Insert(x) => {
                let displaced = tree.insert(*x);
                assert_eq!(displaced.is_some(), !model.insert(*x));
            }
            Op::Remove(x) => {
                assert_eq!(tree.remove(x), model.take(x));
            }
            Op::Probe(x) => {
                assert_eq!(tree.search(x), model.get(x));
                assert_eq!(tree.prev(x), model.range(..*x).next_back());
                assert_eq!(
                    tree.next(x),
                    model.range((Bound::Excluded(*x), Bound::Unbounded)).next()
                );
            }
        }
        assert!(tree.is_valid());
    }
}

#[quickcheck]
fn fuzz_multiple_operations(ops: Vec<Op<i32>>) -> bool {
    let mut tree = new_tree();
    let mut model = BTreeSet::new();

    do_ops(&ops, &mut tree, &mut model);
    model.iter().all(|x| tree.search(x) == Some(x))
}

#[quickcheck]
fn remove_min_tracks_min(xs: Vec<i32>) -> bool {
    let mut tree = new_tree();
    let mut model: BTreeSet<i32> = BTreeSet::new();
    for x in &xs {
        tree.insert(*x);
        model.insert(*x);
    }

    while let Some(expect) = model.pop_first() {
        // remove_min returns exactly what min promised, and the new min is
        // the old min's successor.
        assert_eq!(tree.min(), Some(&expect));
        assert_eq!(tree.remove_min(), Some(expect));
        assert_eq!(tree.min(), model.first());
        if !tree.is_valid() {
            return false;
        }
    }
    tree.is_empty()
}

#[quickcheck]
fn set_combinators_match_the_model(xs: Vec<i32>, ys: Vec<i32>) -> bool {
    let mut a = new_tree();
    let mut b = new_tree();
    for x in &xs {
        a.insert(*x);
    }
    for y in &ys {
        b.insert(*y);
    }
    let ma: BTreeSet<i32> = xs.iter().copied().collect();
    let mb: BTreeSet<i32> = ys.iter().copied().collect();

    let drain = |mut tree: IntTree| {
        assert!(tree.is_valid());
        let mut out = Vec::new();
        tree.clear_with(|x| out.push(x));
        out
    };

    let union: Vec<i32> = ma.union(&mb).copied().collect();
    let intersection: Vec<i32> = ma.intersection(&mb).copied().collect();
    let diff: Vec<i32> = ma.difference(&mb).copied().collect();
    let sym_diff: Vec<i32> = ma.symmetric_difference(&mb).copied().collect();

    drain(a.union(&b)) == union
        && drain(a.intersection(&b)) == intersection
        && drain(a.diff(&b)) == diff
        && drain(a.sym_diff(&b)) == sym_diff
        && a.is_valid()
        && b.is_valid()
}
