// SPDX-License-Identifier: Apache-2.0
//! Live occupancy state: one [`TypeBucket`] per site, plus the coordinate
//! geometry needed to build a site's match list on demand.

use kmc_geom::Coordinate;

use crate::constants::MATCH_EPSILON;
use crate::error::KmcError;
use crate::lattice_map::LatticeMap;
use crate::match_list_entry::MatchListEntry;
use crate::process::Process;
use crate::type_bucket::TypeBucket;

/// Occupancy snapshot of every site in a [`LatticeMap`], plus each site's
/// fixed coordinate (from which match lists are computed on demand) and the
/// atom-identity bookkeeping `apply` maintains across hops.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Configuration {
    lattice: LatticeMap,
    coordinates: Vec<Coordinate>,
    buckets: Vec<TypeBucket>,
    n_types: usize,
    /// `atom_id_at_site[site]` is the identity currently labeling `site`.
    /// Initialized to the identity permutation: atom `i` starts at site `i`.
    atom_id_at_site: Vec<usize>,
    /// Inverse of `atom_id_at_site`: `site_of_atom[id]` is the site `id`
    /// currently occupies.
    site_of_atom: Vec<usize>,
    /// Per-atom-id tracked coordinate, advanced by a process's move vector
    /// on each hop rather than re-derived from the (static) site coordinate.
    atom_coordinates: Vec<Coordinate>,
    /// The ids that moved during the most recent `apply`, and the move
    /// vector each one advanced by, same length and index-paired.
    moved_atom_ids: Vec<usize>,
    recent_move_vectors: Vec<Coordinate>,
    /// `(process_id, site)` of the most recent `apply`.
    last_event: Option<(usize, usize)>,
}

impl Configuration {
    /// Builds a configuration with every site unoccupied (an all-zero
    /// bucket) and atom identities at the identity permutation. `coordinates`
    /// must have one entry per site of `lattice`, in global-index order.
    pub fn new(lattice: LatticeMap, coordinates: Vec<Coordinate>, n_types: usize) -> Result<Self, KmcError> {
        if coordinates.len() != lattice.total_sites() {
            return Err(KmcError::InvalidConfiguration {
                reason: format!(
                    "{} coordinates given for a lattice of {} sites",
                    coordinates.len(),
                    lattice.total_sites()
                ),
            });
        }
        let n_sites = lattice.total_sites();
        let buckets = vec![TypeBucket::new(n_types); n_sites];
        let identity: Vec<usize> = (0..n_sites).collect();
        Ok(Self {
            lattice,
            atom_coordinates: coordinates.clone(),
            coordinates,
            buckets,
            n_types,
            atom_id_at_site: identity.clone(),
            site_of_atom: identity,
            moved_atom_ids: Vec::new(),
            recent_move_vectors: Vec::new(),
            last_event: None,
        })
    }

    #[must_use]
    pub fn lattice(&self) -> &LatticeMap {
        &self.lattice
    }

    #[must_use]
    pub fn n_sites(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn n_types(&self) -> usize {
        self.n_types
    }

    #[must_use]
    pub fn coordinate(&self, site: usize) -> Coordinate {
        self.coordinates[site]
    }

    #[must_use]
    pub fn occupancy(&self, site: usize) -> &TypeBucket {
        &self.buckets[site]
    }

    /// Overwrites a site's occupancy outright.
    pub fn set_occupancy(&mut self, site: usize, bucket: TypeBucket) {
        self.buckets[site] = bucket;
    }

    /// The atom id currently labeling `site`.
    #[must_use]
    pub fn atom_id_at(&self, site: usize) -> usize {
        self.atom_id_at_site[site]
    }

    /// The site atom id `atom_id` currently occupies.
    #[must_use]
    pub fn site_of_atom(&self, atom_id: usize) -> usize {
        self.site_of_atom[atom_id]
    }

    /// `atom_id`'s tracked coordinate: its starting site coordinate, advanced
    /// by one move vector per hop it has taken part in.
    #[must_use]
    pub fn atom_coordinate(&self, atom_id: usize) -> Coordinate {
        self.atom_coordinates[atom_id]
    }

    /// The ids that moved during the most recent `apply`, sized to that
    /// step's `n_moved`.
    #[must_use]
    pub fn moved_atom_ids(&self) -> &[usize] {
        &self.moved_atom_ids
    }

    /// The move vector each corresponding entry of `moved_atom_ids` advanced
    /// by during the most recent `apply`.
    #[must_use]
    pub fn recent_move_vectors(&self) -> &[Coordinate] {
        &self.recent_move_vectors
    }

    /// `(process_id, site)` of the most recent `apply`, if any has run yet.
    #[must_use]
    pub fn last_event(&self) -> Option<(usize, usize)> {
        self.last_event
    }

    /// Reserves the moved-id scratch buffers to `capacity` so later `apply`
    /// calls never reallocate. Called once, at `init_match_lists` time, with
    /// the longest match list among the registered processes.
    pub fn reserve_move_scratch(&mut self, capacity: usize) {
        self.moved_atom_ids.reserve(capacity);
        self.recent_move_vectors.reserve(capacity);
    }

    /// Applies an update delta to a site's bucket. Returns
    /// [`KmcError::NegativeBucket`] if any slot would go negative; a
    /// correctly specified process never triggers this.
    pub fn apply_delta(&mut self, site: usize, delta: &TypeBucket) -> Result<(), KmcError> {
        self.buckets[site]
            .apply_delta(delta)
            .map_err(|type_id| KmcError::NegativeBucket { site, type_id })
    }

    /// Applies `process`, matched at `site` against the already-built
    /// `config_list` (the site's live match list, position-aligned with
    /// `process.match_list()`): walks the prototype and config lists in
    /// lockstep adding each nonzero, non-wildcard update delta to the named
    /// site's bucket; then, for each of the process's id-move pairs, swaps
    /// the two sites' atom-id labels and advances the displaced atom's
    /// tracked coordinate by the pair's move vector. Returns the absolute
    /// site indices whose bucket actually changed.
    ///
    /// Leaves `moved_atom_ids`/`recent_move_vectors` holding exactly this
    /// step's moved ids and vectors; the site's own cached match list (if a
    /// caller keeps one) is stale until re-matched.
    pub fn apply(
        &mut self,
        process: &Process,
        site: usize,
        config_list: &[MatchListEntry],
    ) -> Result<Vec<usize>, KmcError> {
        self.last_event = Some((process.id(), site));

        let mut affected = Vec::with_capacity(process.match_list().len());
        for (slot, prototype) in process.match_list().iter().enumerate() {
            let delta = prototype.update_types();
            if delta.counts().iter().any(|&d| d != 0) {
                let slot_site = config_list[slot]
                    .site_index()
                    .ok_or(KmcError::InternalInvariant("a config-side match list entry always carries a site index"))?;
                self.apply_delta(slot_site, delta)?;
                affected.push(slot_site);
            }
        }

        self.moved_atom_ids.clear();
        self.recent_move_vectors.clear();
        for &(from, to) in process.id_moves() {
            let Some(move_vector) = process.match_list()[from].move_vector() else {
                continue;
            };
            let site_from = config_list[from]
                .site_index()
                .ok_or(KmcError::InternalInvariant("a config-side match list entry always carries a site index"))?;
            let site_to = config_list[to]
                .site_index()
                .ok_or(KmcError::InternalInvariant("a config-side match list entry always carries a site index"))?;

            let atom_from = self.atom_id_at_site[site_from];
            let atom_to = self.atom_id_at_site[site_to];
            self.atom_id_at_site[site_to] = atom_from;
            self.atom_id_at_site[site_from] = atom_to;
            self.site_of_atom[atom_from] = site_to;
            self.site_of_atom[atom_to] = site_from;

            self.atom_coordinates[atom_to] += move_vector;
            self.atom_coordinates[atom_from] += move_vector;
            self.moved_atom_ids.push(atom_to);
            self.moved_atom_ids.push(atom_from);
            self.recent_move_vectors.push(move_vector);
            self.recent_move_vectors.push(move_vector);
        }

        Ok(affected)
    }

    /// Builds the live match list around `site`: every neighboring site
    /// within `cutoff` (inclusive, up to [`MATCH_EPSILON`]), as a
    /// [`Role::Config`](crate::match_list_entry::Role::Config) entry sorted
    /// the same way a process's prototype list is sorted, so the two can be
    /// compared position by position.
    #[must_use]
    pub fn match_list_around(&self, site: usize, cutoff: f64) -> Vec<MatchListEntry> {
        let shells = cutoff.ceil() as i64;
        let origin = self.coordinates[site];
        let mut entries: Vec<MatchListEntry> = self
            .lattice
            .neighbor_indices(site, shells.max(0))
            .into_iter()
            .filter_map(|neighbor| {
                let mut relative = self.coordinates[neighbor] - origin;
                self.lattice.wrap(&mut relative);
                let distance = relative.distance_to_origin();
                (distance <= cutoff + MATCH_EPSILON)
                    .then(|| MatchListEntry::config(relative, neighbor, self.buckets[neighbor].clone()))
            })
            .collect();
        entries.sort();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(basis: usize, reps: [usize; 3]) -> Configuration {
        let lattice = LatticeMap::new(basis, reps, [true, true, true]);
        let coordinates: Vec<Coordinate> = (0..lattice.total_sites())
            .map(|index| {
                let (i, j, k) = lattice.index_to_cell(index);
                Coordinate::new(i as f64, j as f64, k as f64)
            })
            .collect();
        Configuration::new(lattice, coordinates, 2).unwrap()
    }

    #[test]
    fn new_rejects_mismatched_coordinate_count() {
        let lattice = LatticeMap::new(1, [2, 2, 2], [true, true, true]);
        let err = Configuration::new(lattice, vec![Coordinate::origin()], 2).unwrap_err();
        assert!(matches!(err, KmcError::InvalidConfiguration { .. }));
    }

    #[test]
    fn fresh_configuration_is_unoccupied_everywhere() {
        let config = grid(1, [3, 3, 3]);
        for site in 0..config.n_sites() {
            assert_eq!(config.occupancy(site).counts(), &[0, 0]);
        }
    }

    #[test]
    fn apply_delta_updates_the_right_site_only() {
        let mut config = grid(1, [3, 3, 3]);
        config.apply_delta(5, &TypeBucket::from_counts(vec![0, 1])).unwrap();
        assert_eq!(config.occupancy(5).counts(), &[0, 1]);
        assert_eq!(config.occupancy(4).counts(), &[0, 0]);
    }

    #[test]
    fn apply_delta_rejects_negative_result() {
        let mut config = grid(1, [3, 3, 3]);
        let err = config.apply_delta(0, &TypeBucket::from_counts(vec![0, -1])).unwrap_err();
        assert!(matches!(err, KmcError::NegativeBucket { site: 0, type_id: 1 }));
    }

    #[test]
    fn fresh_configuration_starts_atom_ids_at_the_identity_permutation() {
        let config = grid(1, [3, 3, 3]);
        for site in 0..config.n_sites() {
            assert_eq!(config.atom_id_at(site), site);
            assert_eq!(config.site_of_atom(site), site);
        }
    }

    fn vacancy_hop_process() -> Process {
        Process::new(
            0,
            vec![Coordinate::origin(), Coordinate::new(-1.0, 0.0, 0.0), Coordinate::new(1.0, 0.0, 0.0)],
            vec![
                TypeBucket::from_counts(vec![0, 0]),
                TypeBucket::from_counts(vec![0, 1]),
                TypeBucket::from_counts(vec![0, 1]),
            ],
            vec![
                TypeBucket::from_counts(vec![0, 1]),
                TypeBucket::from_counts(vec![0, 0]),
                TypeBucket::from_counts(vec![0, 1]),
            ],
            vec![None, Some(Coordinate::new(1.0, 0.0, 0.0)), None],
            vec![0],
            1.0,
            false,
        )
        .unwrap()
    }

    /// Literal scenario: 6x1x1 periodic chain with elements V,A,V,A,V,A,
    /// firing the vacancy-hop prototype at site 2.
    #[test]
    fn apply_reproduces_the_literal_vacancy_hop_scenario() {
        let lattice = LatticeMap::new(1, [6, 1, 1], [true, true, true]);
        let coordinates: Vec<Coordinate> = (0..lattice.total_sites())
            .map(|index| {
                let (i, j, k) = lattice.index_to_cell(index);
                Coordinate::new(i as f64, j as f64, k as f64)
            })
            .collect();
        let mut config = Configuration::new(lattice, coordinates, 2).unwrap();
        for (site, is_a) in [false, true, false, true, false, true].into_iter().enumerate() {
            if is_a {
                config.set_occupancy(site, TypeBucket::from_counts(vec![0, 1]));
            }
        }

        let process = vacancy_hop_process();
        let config_list = config.match_list_around(2, process.cutoff());
        let affected = config.apply(&process, 2, &config_list).unwrap();

        assert_eq!(affected, vec![2, 1]);
        assert_eq!(config.moved_atom_ids(), &[2, 1]);
        assert_eq!(
            (0..6).map(|s| config.atom_id_at(s)).collect::<Vec<_>>(),
            vec![0, 2, 1, 3, 4, 5]
        );
        assert_eq!(config.occupancy(1).counts(), &[0, 0]);
        assert_eq!(config.occupancy(2).counts(), &[0, 1]);
        assert_eq!(config.last_event(), Some((0, 2)));
    }

    #[test]
    fn match_list_around_excludes_sites_beyond_cutoff() {
        let config = grid(1, [5, 5, 5]);
        let entries = config.match_list_around(0, 1.0);
        assert!(entries.iter().all(|e| e.distance() <= 1.0 + MATCH_EPSILON));
        // Self, and the six axis neighbours at distance 1.
        assert_eq!(entries.len(), 7);
    }

    #[test]
    fn match_list_around_is_sorted_by_distance() {
        let config = grid(1, [5, 5, 5]);
        let entries = config.match_list_around(0, 2.0);
        let distances: Vec<f64> = entries.iter().map(MatchListEntry::distance).collect();
        let mut sorted = distances.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(distances, sorted);
    }
}
