// SPDX-License-Identifier: Apache-2.0
//! A deterministic lattice kinetic Monte Carlo engine: a configuration of
//! multiset-occupied sites, a set of rewrite rules ("processes") matched
//! against each site's local neighborhood, and a Gillespie-style
//! rate-weighted event loop advancing a simulated clock.
//!
//! [`LatticeModel`] is the entry point: build a [`Configuration`] over a
//! [`LatticeMap`], a set of [`Process`]es wrapped in [`Interactions`], a
//! [`RandomSource`], and a [`RateCallback`], then call
//! [`LatticeModel::init_match_lists`] followed by repeated
//! [`LatticeModel::single_step`] calls.

mod blocker;
mod configuration;
mod constants;
mod coordinate;
mod error;
mod fingerprint;
mod interactions;
mod lattice_map;
mod lattice_model;
mod match_list_entry;
mod matcher;
mod msd;
mod process;
mod rate_callback;
mod rate_table;
mod rng;
mod simulation_timer;
mod type_bucket;

pub use blocker::Blocker;
pub use configuration::Configuration;
pub use constants::{MATCH_EPSILON, MOVE_EPSILON};
pub use coordinate::Coordinate;
pub use error::KmcError;
pub use fingerprint::fingerprint;
pub use interactions::Interactions;
pub use lattice_map::LatticeMap;
pub use lattice_model::{LatticeModel, StepOutcome};
pub use match_list_entry::{whatever_match, MatchListEntry, Role};
pub use matcher::Matcher;
pub use msd::OnTheFlyMSD;
pub use process::Process;
pub use rate_callback::{ConstantRateCallback, RateCallback, RateContext};
pub use rate_table::RateTable;
pub use rng::{new_random_source, DeviceRng, MinstdRng, MtRng, RandomSource, SubtractWithCarryRng};
pub use simulation_timer::SimulationTimer;
pub use type_bucket::TypeBucket;
