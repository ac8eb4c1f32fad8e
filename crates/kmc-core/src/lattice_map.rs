// SPDX-License-Identifier: Apache-2.0
//! Cell/index bijection, neighbor enumeration and periodic wrap over a
//! lattice of `basis_count` sites per cell, repeated `(Ra, Rb, Rc)` times
//! along three axes with independent periodicity per axis.

use kmc_geom::Coordinate;

/// Global index ↔ `(cell, basis)` bijection, neighbor enumeration and
/// coordinate wrap for one lattice.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatticeMap {
    basis_count: usize,
    repetitions: [usize; 3],
    periodic: [bool; 3],
}

impl LatticeMap {
    /// Builds a lattice map. `repetitions` is `(Ra, Rb, Rc)`; `periodic` is
    /// periodicity along the same three axes.
    #[must_use]
    pub fn new(basis_count: usize, repetitions: [usize; 3], periodic: [bool; 3]) -> Self {
        Self {
            basis_count,
            repetitions,
            periodic,
        }
    }

    #[must_use]
    pub fn basis_count(&self) -> usize {
        self.basis_count
    }

    #[must_use]
    pub fn repetitions(&self) -> [usize; 3] {
        self.repetitions
    }

    #[must_use]
    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    #[must_use]
    pub fn total_sites(&self) -> usize {
        self.basis_count * self.repetitions[0] * self.repetitions[1] * self.repetitions[2]
    }

    /// The basis slot `s` that `index` occupies within its cell.
    #[must_use]
    pub fn basis_site_from_index(&self, index: usize) -> usize {
        index % self.basis_count
    }

    /// Decomposes `index` into its `(i, j, k)` cell coordinate, inverting
    /// `idx = ((i*Rb + j)*Rc + k)*b + s`.
    #[must_use]
    pub fn index_to_cell(&self, index: usize) -> (usize, usize, usize) {
        let cell_linear = index / self.basis_count;
        let plane = self.repetitions[1] * self.repetitions[2];
        let i = cell_linear / plane;
        let rem = cell_linear % plane;
        let j = rem / self.repetitions[2];
        let k = rem % self.repetitions[2];
        (i, j, k)
    }

    /// The `basis_count` global indices occupying cell `(i, j, k)`, in
    /// basis order.
    #[must_use]
    pub fn cell_to_indices(&self, i: usize, j: usize, k: usize) -> Vec<usize> {
        let cell_linear = (i * self.repetitions[1] + j) * self.repetitions[2] + k;
        let base = cell_linear * self.basis_count;
        (0..self.basis_count).map(|s| base + s).collect()
    }

    fn wrap_axis(&self, axis: usize, value: i64) -> Option<usize> {
        let r = self.repetitions[axis] as i64;
        if self.periodic[axis] {
            let wrapped = if value < 0 {
                value + r
            } else if value >= r {
                value - r
            } else {
                value
            };
            (0..r).contains(&wrapped).then_some(wrapped as usize)
        } else {
            (0..r).contains(&value).then_some(value as usize)
        }
    }

    /// All global indices in the `(2*shells+1)^3` block of cells centered
    /// on the cell containing `index`, in cell-row order. Non-periodic axes
    /// clip cells that fall outside the lattice rather than wrapping them.
    #[must_use]
    pub fn neighbor_indices(&self, index: usize, shells: i64) -> Vec<usize> {
        let (ci, cj, ck) = self.index_to_cell(index);
        let mut out = Vec::new();
        for i in (ci as i64 - shells)..=(ci as i64 + shells) {
            let Some(ii) = self.wrap_axis(0, i) else { continue };
            for j in (cj as i64 - shells)..=(cj as i64 + shells) {
                let Some(jj) = self.wrap_axis(1, j) else { continue };
                for k in (ck as i64 - shells)..=(ck as i64 + shells) {
                    let Some(kk) = self.wrap_axis(2, k) else { continue };
                    out.extend(self.cell_to_indices(ii, jj, kk));
                }
            }
        }
        out
    }

    /// Unique, sorted union of `neighbor_indices(i, shells)` over every `i`
    /// in `indices`.
    #[must_use]
    pub fn superset_neighbor_indices(&self, indices: &[usize], shells: i64) -> Vec<usize> {
        let mut superset: Vec<usize> = indices
            .iter()
            .flat_map(|&index| self.neighbor_indices(index, shells))
            .collect();
        superset.sort_unstable();
        superset.dedup();
        superset
    }

    /// Single-period wrap: folds each periodic axis back into `[-R/2, R/2)`
    /// by adding or subtracting one period. A coordinate already more than
    /// one period out of box stays out of box; this does not fold modulo.
    pub fn wrap(&self, c: &mut Coordinate) {
        for axis in 0..3 {
            if !self.periodic[axis] {
                continue;
            }
            let r = self.repetitions[axis] as f64;
            let half = r / 2.0;
            if c[axis] >= half {
                c[axis] -= r;
            } else if c[axis] < -half {
                c[axis] += r;
            }
        }
    }

    /// Given `index`, a relative cell offset `(di, dj, dk)` and a target
    /// basis slot, returns the absolute index of that basis site in the
    /// shifted (and, on periodic axes, single-period-wrapped) cell.
    #[must_use]
    pub fn index_from_move_info(&self, index: usize, di: i64, dj: i64, dk: i64, target_basis: usize) -> usize {
        let (ci, cj, ck) = self.index_to_cell(index);
        let shifted = [ci as i64 + di, cj as i64 + dj, ck as i64 + dk];
        let mut cell = [0usize; 3];
        for axis in 0..3 {
            let r = self.repetitions[axis] as i64;
            let mut v = shifted[axis];
            if self.periodic[axis] {
                if v < 0 {
                    v += r;
                } else if v >= r {
                    v -= r;
                }
            }
            cell[axis] = v as usize;
        }
        self.cell_to_indices(cell[0], cell[1], cell[2])[target_basis]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_to_cell_and_back_is_a_bijection() {
        let map = LatticeMap::new(2, [3, 4, 5], [true, true, true]);
        for i in 0..3 {
            for j in 0..4 {
                for k in 0..5 {
                    let indices = map.cell_to_indices(i, j, k);
                    for &index in &indices {
                        assert_eq!(map.index_to_cell(index), (i, j, k));
                    }
                }
            }
        }
    }

    #[test]
    fn basis_site_from_index_cycles_within_cell() {
        let map = LatticeMap::new(3, [2, 2, 2], [true, true, true]);
        assert_eq!(map.basis_site_from_index(0), 0);
        assert_eq!(map.basis_site_from_index(1), 1);
        assert_eq!(map.basis_site_from_index(3), 0);
    }

    // Matches the literal scenario: basis 1, repetitions (3,3,3), periodic
    // along z only, center at index 0.
    #[test]
    fn neighbor_indices_matches_literal_scenario() {
        let map = LatticeMap::new(1, [3, 3, 3], [false, true, false]);
        let neighbours = map.neighbor_indices(0, 1);
        assert_eq!(neighbours, vec![6, 7, 0, 1, 3, 4, 15, 16, 9, 10, 12, 13]);
    }

    #[test]
    fn neighbor_indices_count_matches_basis_times_occupied_cells() {
        let map = LatticeMap::new(2, [4, 4, 4], [true, true, true]);
        let neighbours = map.neighbor_indices(0, 1);
        assert_eq!(neighbours.len(), 2 * 27);
    }

    #[test]
    fn superset_neighbor_indices_is_sorted_and_unique() {
        let map = LatticeMap::new(1, [4, 4, 4], [true, true, true]);
        let superset = map.superset_neighbor_indices(&[0, 1], 1);
        let mut sorted = superset.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(superset, sorted);
    }

    #[test]
    fn wrap_folds_by_exactly_one_period() {
        let map = LatticeMap::new(1, [4, 4, 4], [true, true, true]);
        let mut c = Coordinate::new(3.0, 0.0, 0.0);
        map.wrap(&mut c);
        assert!((c.x() - -1.0).abs() < 1e-12);
    }

    #[test]
    fn wrap_long_out_of_box_stays_out_of_box() {
        // A coordinate more than one period out of the box is only folded
        // once, so it remains out of box. This is deliberate, not a bug.
        let map = LatticeMap::new(1, [4, 4, 4], [true, true, true]);
        let mut c = Coordinate::new(100.0, 0.0, 0.0);
        map.wrap(&mut c);
        assert!((c.x() - 96.0).abs() < 1e-12);
        assert!(c.x().abs() > 2.0);
    }

    #[test]
    fn wrap_skips_non_periodic_axes() {
        let map = LatticeMap::new(1, [4, 4, 4], [false, true, true]);
        let mut c = Coordinate::new(10.0, 3.0, 0.0);
        map.wrap(&mut c);
        assert!((c.x() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn index_from_move_info_shifts_and_wraps_one_cell() {
        let map = LatticeMap::new(1, [3, 1, 1], [true, true, true]);
        // Site 2 shifted by +1 in a wraps back to cell 0.
        let moved = map.index_from_move_info(2, 1, 0, 0, 0);
        assert_eq!(moved, 0);
    }
}
