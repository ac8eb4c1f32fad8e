// SPDX-License-Identifier: Apache-2.0
//! Contiguous chunking of flat vectors across a fixed worker count.

/// Computes the `(start, len)` pair each worker takes from a vector of
/// `total_len` elements split evenly across `num_workers` workers.
///
/// Worker `i` takes `total_len / num_workers` elements, plus one more if
/// `i` is below the remainder `total_len % num_workers`, so the first few
/// workers absorb the leftover rather than the last ones. With a single
/// worker the whole vector is one chunk starting at zero.
///
/// # Panics
///
/// Panics if `num_workers` is zero.
#[must_use]
pub fn determine_chunks(num_workers: usize, total_len: usize) -> Vec<(usize, usize)> {
    assert!(num_workers > 0, "need at least one worker");

    let take = total_len / num_workers;
    let rest = total_len % num_workers;

    let mut chunks = Vec::with_capacity(num_workers);
    let mut start = 0;
    for i in 0..num_workers {
        let len = if i < rest { take + 1 } else { take };
        chunks.push((start, len));
        start += len;
    }
    chunks
}

/// Splits `global` into `num_workers` contiguous, non-overlapping pieces
/// per [`determine_chunks`].
#[must_use]
pub fn split_over_workers<T: Clone>(global: &[T], num_workers: usize) -> Vec<Vec<T>> {
    determine_chunks(num_workers, global.len())
        .into_iter()
        .map(|(start, len)| global[start..start + len].to_vec())
        .collect()
}

/// Concatenates per-worker chunks back into a single vector, in worker
/// order. The inverse of [`split_over_workers`] when chunks are unmodified
/// in length.
#[must_use]
pub fn join_over_workers<T>(local_chunks: Vec<Vec<T>>) -> Vec<T> {
    local_chunks.into_iter().flatten().collect()
}

/// Sums one `f64` contribution per worker into a single total.
#[must_use]
pub fn sum_over_workers(values: &[f64]) -> f64 {
    values.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split_gives_equal_chunks() {
        let chunks = determine_chunks(4, 16);
        assert_eq!(chunks, vec![(0, 4), (4, 4), (8, 4), (12, 4)]);
    }

    #[test]
    fn remainder_goes_to_first_workers() {
        let chunks = determine_chunks(3, 10);
        assert_eq!(chunks, vec![(0, 4), (4, 3), (7, 3)]);
    }

    #[test]
    fn single_worker_takes_everything() {
        assert_eq!(determine_chunks(1, 7), vec![(0, 7)]);
    }

    #[test]
    fn split_then_join_is_identity() {
        let global: Vec<i32> = (0..23).collect();
        let chunks = split_over_workers(&global, 5);
        assert_eq!(join_over_workers(chunks), global);
    }

    #[test]
    fn split_handles_more_workers_than_elements() {
        let global = vec![1, 2, 3];
        let chunks = split_over_workers(&global, 8);
        assert_eq!(chunks.len(), 8);
        assert_eq!(join_over_workers(chunks), global);
    }

    #[test]
    fn sum_over_workers_adds_contributions() {
        assert!((sum_over_workers(&[1.5, 2.5, 3.0]) - 7.0).abs() < 1e-12);
    }

    proptest::proptest! {
        #[test]
        fn split_join_roundtrip(
            xs in proptest::collection::vec(-1000..1000i32, 0..200),
            workers in 1usize..17,
        ) {
            let chunks = split_over_workers(&xs, workers);
            proptest::prop_assert_eq!(chunks.len(), workers);
            proptest::prop_assert_eq!(join_over_workers(chunks), xs);
        }
    }
}
