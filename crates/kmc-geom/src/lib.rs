// SPDX-License-Identifier: Apache-2.0
//! Coordinate primitives shared by the lattice KMC engine.

mod coordinate;

pub use coordinate::Coordinate;
