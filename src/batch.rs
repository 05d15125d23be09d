/// Lazily groups a sequential source into fixed-size batches.
///
/// Each batch holds up to `size` items in source order; the final batch may
/// be short. Peak memory is O(size) regardless of source length, which is
/// what lets the pipeline stream arbitrarily large raw stores. The adapter
/// is not restartable; it consumes the underlying iterator.
pub struct Batches<I> {
    inner: I,
    size: usize,
}

impl<I: Iterator> Batches<I> {
    /// `size` must be at least 1; the pipeline rejects 0 before reaching here.
    pub fn new(inner: I, size: usize) -> Self {
        debug_assert!(size > 0, "batch size must be at least 1");
        Self { inner, size }
    }
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<_> = self.inner.by_ref().take(self.size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

/// Convenience constructor mirroring the call site in the pipeline.
pub fn batches<I: IntoIterator>(source: I, size: usize) -> Batches<I::IntoIter> {
    Batches::new(source.into_iter(), size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_no_batches() {
        let mut it = batches(std::iter::empty::<u32>(), 5);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn exact_multiple_splits_evenly() {
        let groups: Vec<_> = batches(0..6, 3).collect();
        assert_eq!(groups, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn final_batch_may_be_short() {
        let groups: Vec<_> = batches(0..7, 3).collect();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2], vec![6]);
    }

    #[test]
    fn batch_size_one() {
        let groups: Vec<_> = batches(0..3, 1).collect();
        assert_eq!(groups, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn batch_larger_than_source() {
        let groups: Vec<_> = batches(0..3, 100).collect();
        assert_eq!(groups, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn concatenation_reproduces_source() {
        // Coverage: no omissions, duplications, or reordering for a spread
        // of source lengths and batch sizes.
        for len in 0..20u32 {
            for size in 1..8usize {
                let flat: Vec<u32> = batches(0..len, size).flatten().collect();
                let expected: Vec<u32> = (0..len).collect();
                assert_eq!(flat, expected, "len={len} size={size}");
            }
        }
    }

    #[test]
    fn exhausted_iterator_stays_exhausted() {
        let mut it = batches(0..2, 2);
        assert!(it.next().is_some());
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }
}
