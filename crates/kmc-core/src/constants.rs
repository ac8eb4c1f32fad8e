// SPDX-License-Identifier: Apache-2.0
//! Numerical tolerances shared across the matching and process-construction
//! code paths. Kept as two distinct constants because they bound different
//! things: one a sort/comparison tolerance on distances, the other an
//! endpoint-search tolerance on move vectors.

/// Tolerance used when comparing match-list entry distances and when sorting
/// match lists (`MatchListEntry::cmp`).
pub const MATCH_EPSILON: f64 = 1e-5;

/// Tolerance used when resolving id-move endpoints in `Process::new`: two
/// coordinates are considered the same point if their distance is below
/// this bound.
pub const MOVE_EPSILON: f64 = 1e-6;
