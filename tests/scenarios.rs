//! End-to-end scenarios with integer keys, run identically against all
//! three variants: bulk monotone and interleaved insertions, a seeded
//! random workload with validation after every step, and the set-algebra
//! laws over even/odd and low/high partitions of a common universe.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn cmp(a: &i32, b: &i32) -> Ordering {
    a.cmp(b)
}

macro_rules! scenarios {
    ($variant:ident $(, $by_mut:tt)?) => {
        mod $variant {
            use super::*;
            use ordset::$variant::Tree;
            use ordset::Comparator;

            /// Repeated `next` from `min`: the whole content in ascending
            /// comparator order.
            fn ascending<C: Comparator<i32>>(tree: &mut Tree<i32, C>) -> Vec<i32> {
                let mut out = Vec::new();
                let mut cur = tree.min().copied();
                while let Some(x) = cur {
                    out.push(x);
                    cur = tree.next(&x).copied();
                }
                out
            }

            /// Repeated `prev` from `max`: the whole content descending.
            fn descending<C: Comparator<i32>>(tree: &mut Tree<i32, C>) -> Vec<i32> {
                let mut out = Vec::new();
                let mut cur = tree.max().copied();
                while let Some(x) = cur {
                    out.push(x);
                    cur = tree.prev(&x).copied();
                }
                out
            }

            /// Tears the tree down, returning its elements in order.
            fn items<C: Comparator<i32>>(mut tree: Tree<i32, C>) -> Vec<i32> {
                assert!(tree.is_valid());
                let mut out = Vec::new();
                tree.clear_with(|x| out.push(x));
                assert!(tree.is_empty());
                out
            }

            fn collect<I: IntoIterator<Item = i32>>(keys: I) -> Tree<i32, fn(&i32, &i32) -> Ordering> {
                let mut tree = Tree::new(cmp as fn(&i32, &i32) -> Ordering);
                for x in keys {
                    tree.insert(x);
                }
                assert!(tree.is_valid());
                tree
            }

            #[test]
            fn sequential_ascending_inserts() {
                let mut tree = Tree::new(cmp);
                for x in 0..1000 {
                    tree.insert(x);
                    assert!(tree.is_valid());
                }
                assert_eq!(tree.min(), Some(&0));
                assert_eq!(tree.max(), Some(&999));
                assert_eq!(ascending(&mut tree), (0..1000).collect::<Vec<_>>());
                assert_eq!(descending(&mut tree), (0..1000).rev().collect::<Vec<_>>());

                tree.clear();
                assert!(tree.is_empty());
            }

            #[test]
            fn sequential_descending_inserts() {
                let mut tree = Tree::new(cmp);
                for x in (1..=1000).rev() {
                    tree.insert(x);
                    assert!(tree.is_valid());
                }
                assert_eq!(tree.min(), Some(&1));
                assert_eq!(tree.max(), Some(&1000));
                assert_eq!(ascending(&mut tree), (1..=1000).collect::<Vec<_>>());

                tree.clear();
                assert!(tree.is_empty());
            }

            #[test]
            fn interleaved_positive_negative_inserts() {
                let mut tree = Tree::new(cmp);
                for i in 1..=1000 {
                    tree.insert(i);
                    tree.insert(-i);
                }
                assert!(tree.is_valid());
                assert_eq!(tree.min(), Some(&-1000));
                assert_eq!(tree.max(), Some(&1000));

                let expect: Vec<i32> = (-1000..=-1).chain(1..=1000).collect();
                assert_eq!(ascending(&mut tree), expect);
            }

            #[test]
            fn random_bulk_inserts_and_removes() {
                let mut rng = StdRng::seed_from_u64(0x0005_EED5);
                let mut tree = Tree::new(cmp);
                let mut model = std::collections::BTreeSet::new();

                for _ in 0..10_000 {
                    let x: i32 = rng.gen_range(0..1000);
                    let displaced = tree.insert(x);
                    assert_eq!(displaced.is_some(), !model.insert(x));
                    assert!(tree.is_valid());
                }
                for _ in 0..5_000 {
                    let x: i32 = rng.gen_range(0..1000);
                    assert_eq!(tree.remove(&x), model.take(&x));
                    assert!(tree.is_valid());
                }

                let content = ascending(&mut tree);
                assert!(content.windows(2).all(|w| w[0] < w[1]));
                assert_eq!(content, model.iter().copied().collect::<Vec<_>>());
            }

            #[test]
            fn set_algebra_laws() {
                let all_keys: Vec<i32> = (0..1000).collect();
                let even_keys: Vec<i32> = (0..1000).filter(|x| x % 2 == 0).collect();
                let odd_keys: Vec<i32> = (0..1000).filter(|x| x % 2 == 1).collect();
                let low_keys: Vec<i32> = (0..=500).collect();
                let high_keys: Vec<i32> = (501..1000).collect();

                let mut all = collect(all_keys.iter().copied());
                let mut even = collect(even_keys.iter().copied());
                let mut odd = collect(odd_keys.iter().copied());
                let mut low = collect(low_keys.iter().copied());
                let mut high = collect(high_keys.iter().copied());
                let $($by_mut)? empty = collect(None);

                // Partitions rebuild the universe, by union and by
                // symmetric difference alike.
                assert_eq!(items(low.union(& $($by_mut)? high)), all_keys);
                assert_eq!(items(low.sym_diff(& $($by_mut)? high)), all_keys);
                assert_eq!(items(even.union(& $($by_mut)? odd)), all_keys);

                // Intersections.
                let odd_high: Vec<i32> = (501..1000).filter(|x| x % 2 == 1).collect();
                assert_eq!(items(odd.intersection(& $($by_mut)? high)), odd_high);
                assert!(odd.intersection(& $($by_mut)? even).is_empty());

                // Differences.
                assert_eq!(items(all.diff(& $($by_mut)? odd)), even_keys);
                assert_eq!(items(all.sym_diff(& $($by_mut)? odd)), even_keys);
                assert_eq!(
                    items(odd.diff(& $($by_mut)? high)),
                    items(odd.intersection(& $($by_mut)? low))
                );

                // sym_diff(a, b) == union(diff(a, b), diff(b, a)).
                let $($by_mut)? left = odd.diff(& $($by_mut)? high);
                let $($by_mut)? right = high.diff(& $($by_mut)? odd);
                assert_eq!(
                    items(odd.sym_diff(& $($by_mut)? high)),
                    items(left.union(& $($by_mut)? right))
                );

                // sym_diff(a, b) == diff(union(a, b), intersection(a, b)).
                let $($by_mut)? u = odd.union(& $($by_mut)? high);
                let $($by_mut)? i = odd.intersection(& $($by_mut)? high);
                assert_eq!(
                    items(odd.sym_diff(& $($by_mut)? high)),
                    items(u.diff(& $($by_mut)? i))
                );

                // The empty tree follows the algebra, and every combinator
                // output is structurally valid (`items` asserts it).
                assert_eq!(items(all.union(& $($by_mut)? empty)), all_keys);
                assert!(empty.intersection(& $($by_mut)? all).is_empty());
                assert_eq!(items(all.diff(& $($by_mut)? empty)), all_keys);
                assert!(empty.diff(& $($by_mut)? all).is_empty());
                assert_eq!(items(empty.sym_diff(& $($by_mut)? all)), all_keys);

                // Operands came through every combinator intact.
                assert_eq!(ascending(&mut all), all_keys);
                assert_eq!(ascending(&mut even), even_keys);
                assert_eq!(ascending(&mut odd), odd_keys);
                assert_eq!(ascending(&mut low), low_keys);
                assert_eq!(ascending(&mut high), high_keys);
                assert!(empty.is_empty());
            }

            #[test]
            fn copies_are_equal_and_independent() {
                let mut tree = collect(0..100);
                let mut copied = tree.copy();
                assert!(copied.is_valid());

                copied.insert(1000);
                assert_eq!(ascending(&mut tree), (0..100).collect::<Vec<_>>());

                let expect: Vec<i32> = (0..100).chain([1000]).collect();
                assert_eq!(items(copied), expect);
            }
        }
    };
}

scenarios!(bst);
scenarios!(rbt);
scenarios!(splay, mut);

/// Re-running a bulk workload against a fresh copy must behave identically:
/// the splay tree's shape depends on its access history, its answers never
/// do.
#[test]
fn splay_rerun_of_bulk_removes_on_a_fresh_copy() {
    let mut rng = StdRng::seed_from_u64(0x0005_EED5);
    let mut tree = ordset::splay::Tree::new(cmp);
    let mut model = std::collections::BTreeSet::new();

    for _ in 0..10_000 {
        let x: i32 = rng.gen_range(0..1000);
        tree.insert(x);
        model.insert(x);
    }

    let removes: Vec<i32> = (0..5_000).map(|_| rng.gen_range(0..1000)).collect();

    let mut replay = tree.copy();
    let mut first = Vec::new();
    let mut second = Vec::new();
    for x in &removes {
        first.push(tree.remove(x));
        assert!(tree.is_valid());
    }
    for x in &removes {
        second.push(replay.remove(x));
        assert!(replay.is_valid());
    }
    assert_eq!(first, second);

    for x in &removes {
        model.remove(x);
    }
    let mut content = Vec::new();
    tree.clear_with(|x| content.push(x));
    assert_eq!(content, model.into_iter().collect::<Vec<_>>());
}
