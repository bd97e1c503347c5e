use quickcheck::{Arbitrary, Gen};

/// An enum for the various kinds of "things" to do to an ordered set in a
/// quicktest.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Op<T> {
    /// Insert the payload, overwriting an equal one.
    Insert(T),
    /// Remove the payload's key.
    Remove(T),
    /// Probe the smallest element.
    Min,
    /// Probe the biggest element.
    Max,
}

impl<T> Arbitrary for Op<T>
where
    T: Arbitrary,
{
    /// Tells quickcheck how to randomly choose an operation. Inserts are
    /// twice as likely so the trees actually grow.
    fn arbitrary(g: &mut Gen) -> Self {
        match g.choose(&[0, 1, 2, 3, 4]).unwrap() {
            0 | 1 => Op::Insert(T::arbitrary(g)),
            2 => Op::Remove(T::arbitrary(g)),
            3 => Op::Min,
            4 => Op::Max,
            _ => unreachable!(),
        }
    }
}
