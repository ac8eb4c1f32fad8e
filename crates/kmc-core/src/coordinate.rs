// SPDX-License-Identifier: Apache-2.0
//! Re-export of the shared coordinate type. Kept as its own module, rather
//! than inlined in `lib.rs`, so lattice-specific coordinate helpers have an
//! obvious home if they're ever needed.

pub use kmc_geom::Coordinate;
