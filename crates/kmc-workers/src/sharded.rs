// SPDX-License-Identifier: Apache-2.0
//! Work-stealing parallel executor over flat task-index ranges.
//!
//! Generalizes virtual-shard partitioning to plain index ranges: instead of
//! routing by a content hash, task `i` is routed to shard `i & (NUM_SHARDS -
//! 1)`, and workers race to claim shards from a shared atomic counter. Each
//! worker accumulates its own `(index, result)` pairs with no shared mutable
//! state, and the canonical output order is restored by a final sort, not by
//! execution order.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of virtual shards tasks are partitioned into before execution.
pub const NUM_SHARDS: usize = 256;

const _: () = assert!(NUM_SHARDS.is_power_of_two(), "NUM_SHARDS must be a power of two");

const SHARD_MASK: usize = NUM_SHARDS - 1;

fn partition_into_shards(len: usize) -> Vec<Vec<usize>> {
    let mut shards: Vec<Vec<usize>> = (0..NUM_SHARDS).map(|_| Vec::new()).collect();
    for index in 0..len {
        shards[index & SHARD_MASK].push(index);
    }
    shards
}

/// Runs `task` over every element of `items` using up to `workers` threads
/// and returns the results in the same order as `items`.
///
/// `workers == 1` always takes a valid path, equivalent to a serial map; a
/// multi-worker run produces identical output because result order is
/// restored by index rather than by which worker finished first.
///
/// # Panics
///
/// Panics if `workers` is zero, or if a worker thread itself panics.
#[must_use]
pub fn execute_sharded<T, R, F>(items: &[T], workers: usize, task: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> R + Sync,
{
    assert!(workers > 0, "need at least one worker");

    if items.is_empty() {
        return Vec::new();
    }

    let capped_workers = workers.min(NUM_SHARDS).min(items.len());
    let shards = partition_into_shards(items.len());
    let next_shard = AtomicUsize::new(0);

    let partials: Vec<Vec<(usize, R)>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..capped_workers)
            .map(|_| {
                let shards = &shards;
                let next_shard = &next_shard;
                let task = &task;
                scope.spawn(move || {
                    let mut out = Vec::new();
                    loop {
                        let shard_id = next_shard.fetch_add(1, Ordering::Relaxed);
                        if shard_id >= NUM_SHARDS {
                            break;
                        }
                        for &index in &shards[shard_id] {
                            out.push((index, task(index, &items[index])));
                        }
                    }
                    out
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(out) => out,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut indexed: Vec<(usize, R)> = partials.into_iter().flatten().collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn empty_input_yields_empty_output() {
        let items: Vec<i32> = Vec::new();
        assert!(execute_sharded(&items, 4, |_, x| *x).is_empty());
    }

    #[test]
    fn single_worker_matches_serial_map() {
        let items: Vec<i32> = (0..50).collect();
        let serial: Vec<i32> = items.iter().map(|x| x * 2).collect();
        let parallel = execute_sharded(&items, 1, |_, x| x * 2);
        assert_eq!(parallel, serial);
    }

    #[test]
    fn multi_worker_preserves_index_order() {
        let items: Vec<i32> = (0..500).collect();
        let serial: Vec<i32> = items.iter().map(|x| x * 2).collect();
        let parallel = execute_sharded(&items, 8, |_, x| x * 2);
        assert_eq!(parallel, serial);
    }

    #[test]
    fn worker_count_above_item_count_is_valid() {
        let items = vec![1, 2, 3];
        let result = execute_sharded(&items, 64, |_, x| x + 1);
        assert_eq!(result, vec![2, 3, 4]);
    }

    #[test]
    fn every_item_is_visited_exactly_once() {
        let items: Vec<()> = (0..300).map(|_| ()).collect();
        let visits = AtomicU64::new(0);
        let result = execute_sharded(&items, 6, |_, ()| {
            visits.fetch_add(1, Ordering::Relaxed);
            1u32
        });
        assert_eq!(visits.load(Ordering::Relaxed), 300);
        assert_eq!(result.iter().sum::<u32>(), 300);
    }

    #[test]
    fn shard_partitioning_covers_every_index_once() {
        let shards = partition_into_shards(1000);
        let mut seen: Vec<usize> = shards.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..1000).collect::<Vec<_>>());
    }
}
