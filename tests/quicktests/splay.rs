use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Bound;

use ordset::splay::Tree;
use quickcheck_macros::quickcheck;

use crate::Op;

type IntTree = Tree<i32, fn(&i32, &i32) -> Ordering>;

fn new_tree() -> IntTree {
    Tree::new(Ord::cmp)
}

/// Applies a set of operations to a tree and a model set. Every probe
/// reshapes the splay tree, which is exactly the point: the answers must
/// stay right no matter how the shape churns.
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
                assert_eq!(tree.search(x).copied(), model.get(x).copied());
                assert_eq!(tree.prev(x).copied(), model.range(..*x).next_back().copied());
                assert_eq!(
                    tree.next(x).copied(),
                    model
                        .range((Bound::Excluded(*x), Bound::Unbounded))
                        .next()
                        .copied()
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
fn repeated_searches_keep_every_key(xs: Vec<i32>) -> bool {
    let mut tree = new_tree();
    for x in &xs {
        tree.insert(*x);
    }

    // Searching twice must answer the same both times even though the
    // first search moved the key to the root.
    xs.iter().all(|x| {
        tree.search(x) == Some(x) && tree.search(x) == Some(x) && tree.is_valid()
    })
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

    drain(a.union(&mut b)) == union
        && drain(a.intersection(&mut b)) == intersection
        && drain(a.diff(&mut b)) == diff
        && drain(a.sym_diff(&mut b)) == sym_diff
        && a.is_valid()
        && b.is_valid()
}
