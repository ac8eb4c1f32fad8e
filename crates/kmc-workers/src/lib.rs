// SPDX-License-Identifier: Apache-2.0
//! Data-parallel primitives for distributing lattice KMC work across workers.
//!
//! Two layers:
//!
//! - [`chunks`]: contiguous split / join / reduce over a flat vector, the
//!   in-process stand-in for a scatter/gather step across ranks.
//! - [`sharded`]: a `std::thread::scope` work-stealing executor for
//!   independent per-item tasks.

mod chunks;
mod sharded;

pub use chunks::{determine_chunks, join_over_workers, split_over_workers, sum_over_workers};
pub use sharded::{execute_sharded, NUM_SHARDS};
