// SPDX-License-Identifier: Apache-2.0
//! On-the-fly mean-squared-displacement accumulator: per tracked atom id,
//! a bounded history of recent positions; globally, a Δt-binned per-axis
//! histogram of `Σ Δr²` and `Σ (Δr²)²` with block-averaged error estimates.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use kmc_geom::Coordinate;

use crate::blocker::Blocker;
use crate::configuration::Configuration;

/// Per-identity displacement histogram with block-average error, per
/// fixed-width `Δt` bin, tracked componentwise in Cartesian `(x, y, z)`.
#[derive(Debug, Clone)]
pub struct OnTheFlyMSD {
    history_steps: usize,
    n_bins: usize,
    bin_width: f64,
    abc_to_xyz: [Coordinate; 3],
    /// Type index an atom must currently occupy for its moves to be sampled.
    tracked_type: usize,
    histories: FxHashMap<usize, VecDeque<(Coordinate, f64)>>,
    sum_dr2: Vec<[f64; 3]>,
    sum_dr4: Vec<f64>,
    counts: Vec<u64>,
    depth_bin_counts: Vec<Vec<u64>>,
    blockers: Vec<Blocker>,
}

impl OnTheFlyMSD {
    /// `abc_to_xyz` gives the three rows of the fractional-to-Cartesian
    /// transform: `xyz[axis] = abc.dot(&abc_to_xyz[axis])`. `tracked_type`
    /// is the type index [`OnTheFlyMSD::register_step`] samples: an atom id
    /// only contributes a sample while the site it currently occupies holds
    /// at least one count of that type.
    #[must_use]
    pub fn new(
        history_steps: usize,
        n_bins: usize,
        t_max: f64,
        abc_to_xyz: [Coordinate; 3],
        block_size: usize,
        tracked_type: usize,
    ) -> Self {
        assert!(history_steps > 0, "history depth must be positive");
        assert!(n_bins > 0, "must have at least one bin");
        Self {
            history_steps,
            n_bins,
            bin_width: t_max / n_bins as f64,
            abc_to_xyz,
            tracked_type,
            histories: FxHashMap::default(),
            sum_dr2: vec![[0.0; 3]; n_bins],
            sum_dr4: vec![0.0; n_bins],
            counts: vec![0; n_bins],
            depth_bin_counts: vec![vec![0; n_bins]; history_steps],
            blockers: (0..n_bins).map(|_| Blocker::new(block_size)).collect(),
        }
    }

    fn to_xyz(&self, abc: Coordinate) -> Coordinate {
        Coordinate::new(
            abc.dot(&self.abc_to_xyz[0]),
            abc.dot(&self.abc_to_xyz[1]),
            abc.dot(&self.abc_to_xyz[2]),
        )
    }

    /// Samples every atom id moved by the most recent [`Configuration::apply`]
    /// call, provided the site it now occupies still holds the tracked type
    /// (occupancy deltas are applied before the id swap, so this reads the
    /// post-hop element).
    pub fn register_step(&mut self, time: f64, configuration: &Configuration) {
        for &atom_id in configuration.moved_atom_ids() {
            let site = configuration.site_of_atom(atom_id);
            if configuration.occupancy(site).counts().get(self.tracked_type).copied().unwrap_or(0) > 0 {
                let position = configuration.atom_coordinate(atom_id);
                self.register(atom_id, position, time);
            }
        }
    }

    /// Records a new sample for `atom_id` at fractional coordinate
    /// `position_abc` and simulated time `time`. Pairs it against every
    /// still-retained older sample for the same identity, accumulating
    /// per-axis `Δr²` (and total `Δr⁴`) into whichever bin its `Δt` falls in.
    pub fn register(&mut self, atom_id: usize, position_abc: Coordinate, time: f64) {
        let xyz = self.to_xyz(position_abc);
        let snapshot: Vec<(Coordinate, f64)> = {
            let history = self.histories.entry(atom_id).or_default();
            history.push_front((xyz, time));
            if history.len() > self.history_steps {
                history.pop_back();
            }
            history.iter().copied().collect()
        };

        let horizon = self.n_bins as f64 * self.bin_width;
        for (depth, &(old_pos, old_time)) in snapshot.iter().enumerate().skip(1) {
            let dt = time - old_time;
            if !(0.0..horizon).contains(&dt) {
                continue;
            }
            let bin = ((dt / self.bin_width) as usize).min(self.n_bins - 1);
            let delta = xyz - old_pos;
            let components = [delta[0] * delta[0], delta[1] * delta[1], delta[2] * delta[2]];
            let dr2 = components[0] + components[1] + components[2];
            for c in 0..3 {
                self.sum_dr2[bin][c] += components[c];
            }
            self.sum_dr4[bin] += dr2 * dr2;
            self.counts[bin] += 1;
            self.depth_bin_counts[depth - 1][bin] += 1;
            self.blockers[bin].add(components);
        }
    }

    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    #[must_use]
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    #[must_use]
    pub fn sample_count(&self, bin: usize) -> u64 {
        self.counts[bin]
    }

    /// Per-axis mean squared displacement for `bin`: `histogram /
    /// max(count, 1)`.
    #[must_use]
    pub fn mean_squared_displacement(&self, bin: usize) -> [f64; 3] {
        let n = self.counts[bin].max(1) as f64;
        [self.sum_dr2[bin][0] / n, self.sum_dr2[bin][1] / n, self.sum_dr2[bin][2] / n]
    }

    #[must_use]
    pub fn mean_fourth_power_displacement(&self, bin: usize) -> f64 {
        if self.counts[bin] == 0 {
            0.0
        } else {
            self.sum_dr4[bin] / self.counts[bin] as f64
        }
    }

    /// Per-axis `(rho, std, error)` for `bin`: `rho` is `histogram /
    /// max(count, 1)`, `std`/`error` are the block-averaged standard
    /// deviation and its own standard error against `rho`; see
    /// [`Blocker::values`] for the `n <= 1` sentinel.
    #[must_use]
    pub fn block_averaged_msd(&self, bin: usize) -> ([f64; 3], [f64; 3], [f64; 3]) {
        let rho = self.mean_squared_displacement(bin);
        let (std, error) = self.blockers[bin].values(rho);
        (rho, std, error)
    }

    #[must_use]
    pub fn depth_bin_count(&self, depth: usize, bin: usize) -> u64 {
        self.depth_bin_counts[depth][bin]
    }
}
