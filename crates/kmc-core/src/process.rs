// SPDX-License-Identifier: Apache-2.0
//! A process: a prototype neighborhood rewrite rule, plus the live registry
//! of sites it currently applies to and their accumulated rates.

use kmc_geom::Coordinate;

use crate::constants::MOVE_EPSILON;
use crate::error::KmcError;
use crate::match_list_entry::MatchListEntry;
use crate::type_bucket::TypeBucket;

/// One rewrite rule: a sorted prototype match list (built from the union of
/// the `before`/`after` neighborhood snapshots) plus the basis slots it may
/// anchor on, and the live list of sites currently matching it.
#[derive(Debug, Clone)]
pub struct Process {
    id: usize,
    match_list: Vec<MatchListEntry>,
    /// `(from, to)` pairs of match-list slot indices whose atom identities
    /// swap when this process fires, resolved once at construction time.
    id_moves: Vec<(usize, usize)>,
    basis_sites: Vec<usize>,
    cutoff: f64,
    base_rate: f64,
    cache_rate: bool,
    sites: Vec<usize>,
    rates: Vec<f64>,
    prefix_sums: Vec<f64>,
}

impl Process {
    /// Builds a process from parallel `positions`/`before`/`after` lists
    /// (one entry per neighborhood slot the rule touches) plus an optional
    /// move vector per slot. `basis_sites` restricts which basis slots may
    /// anchor a match.
    ///
    /// A move vector is attached to the slot an atom starts from (occupied
    /// in `before`, vacated in `after`); a vector here is carried on its
    /// [`MatchListEntry`] directly, so sorting the match list by distance
    /// can never separate a slot from its move vector. After sorting, the
    /// id-move endpoint for each move-carrying slot is resolved: the
    /// post-sort index of the slot at `entry.position + entry.move_vector`
    /// (within [`MOVE_EPSILON`]), if any, becomes that pair's destination.
    pub fn new(
        id: usize,
        positions: Vec<Coordinate>,
        before: Vec<TypeBucket>,
        after: Vec<TypeBucket>,
        move_vectors: Vec<Option<Coordinate>>,
        basis_sites: Vec<usize>,
        base_rate: f64,
        cache_rate: bool,
    ) -> Result<Self, KmcError> {
        if positions.len() != before.len() || positions.len() != after.len() || positions.len() != move_vectors.len() {
            return Err(KmcError::InvalidConfiguration {
                reason: "process position, occupancy and move-vector lists must have equal length".to_string(),
            });
        }

        let mut match_list: Vec<MatchListEntry> = positions
            .into_iter()
            .zip(before.iter())
            .zip(after.iter())
            .zip(move_vectors)
            .map(|(((position, b), a), mv)| {
                let update = a - b;
                let mut entry = MatchListEntry::process(position, b.clone(), update);
                if let Some(vector) = mv {
                    entry.set_move_vector(vector);
                }
                entry
            })
            .collect();
        match_list.sort();

        let id_moves = resolve_id_moves(&match_list);
        let cutoff = match_list.iter().map(MatchListEntry::distance).fold(0.0_f64, f64::max);

        Ok(Self {
            id,
            match_list,
            id_moves,
            basis_sites,
            cutoff,
            base_rate,
            cache_rate,
            sites: Vec::new(),
            rates: Vec::new(),
            prefix_sums: Vec::new(),
        })
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn match_list(&self) -> &[MatchListEntry] {
        &self.match_list
    }

    /// `(from, to)` match-list slot index pairs whose atom identities swap
    /// when this process is applied; see [`Configuration::apply`](crate::configuration::Configuration::apply).
    #[must_use]
    pub fn id_moves(&self) -> &[(usize, usize)] {
        &self.id_moves
    }

    #[must_use]
    pub fn basis_sites(&self) -> &[usize] {
        &self.basis_sites
    }

    /// The furthest distance any of this process's slots reaches from its
    /// anchor; the radius a caller must search a configuration's
    /// neighborhood to within before attempting a match.
    #[must_use]
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    #[must_use]
    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    /// Whether a rate computed for this process by an external callback
    /// should be memoized in the shared [`crate::RateTable`].
    #[must_use]
    pub fn cache_rate(&self) -> bool {
        self.cache_rate
    }

    /// The per-site rate this process would use for `multiplicity` absent
    /// a custom rate: `base_rate * multiplicity`.
    #[must_use]
    pub fn rate_for_multiplicity(&self, multiplicity: u64) -> f64 {
        self.base_rate * multiplicity as f64
    }

    #[must_use]
    pub fn sites(&self) -> &[usize] {
        &self.sites
    }

    /// Total accumulated rate over every currently registered site.
    #[must_use]
    pub fn total_rate(&self) -> f64 {
        self.prefix_sums.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Registers `site` as a new anchor for this process at the given
    /// (already multiplicity-weighted) rate.
    pub fn add_site(&mut self, site: usize, rate: f64) {
        self.sites.push(site);
        self.rates.push(rate);
        self.recompute_prefix_sums();
    }

    /// Removes `site` from this process's registry, if present. A no-op if
    /// the site isn't registered.
    pub fn remove_site(&mut self, site: usize) {
        if let Some(position) = self.sites.iter().position(|&s| s == site) {
            self.sites.swap_remove(position);
            self.rates.swap_remove(position);
            self.recompute_prefix_sums();
        }
    }

    /// Updates the accumulated rate for an already-registered site.
    pub fn update_rate(&mut self, site: usize, rate: f64) {
        if let Some(position) = self.sites.iter().position(|&s| s == site) {
            self.rates[position] = rate;
            self.recompute_prefix_sums();
        }
    }

    fn recompute_prefix_sums(&mut self) {
        let mut running = 0.0;
        self.prefix_sums.clear();
        self.prefix_sums.reserve(self.rates.len());
        for &rate in &self.rates {
            running += rate;
            self.prefix_sums.push(running);
        }
    }

    /// Picks the registered site whose cumulative-rate interval contains
    /// `target` (a value in `[0, total_rate())`), via binary search over the
    /// prefix-sum table.
    ///
    /// # Panics
    /// Panics if this process has no registered sites.
    #[must_use]
    pub fn pick_site(&self, target: f64) -> usize {
        assert!(!self.sites.is_empty(), "pick_site called on an empty process");
        let position = self.prefix_sums.partition_point(|&cumulative| cumulative <= target);
        let position = position.min(self.sites.len() - 1);
        self.sites[position]
    }
}

/// For each match-list entry carrying a move vector, finds the post-sort
/// index of the entry whose position matches `entry.position + move_vector`
/// and records the `(from, to)` pair. An entry with no such counterpart
/// (common for pure-MSD move vectors with no paired slot in the prototype)
/// contributes no pair.
fn resolve_id_moves(match_list: &[MatchListEntry]) -> Vec<(usize, usize)> {
    let mut moves = Vec::new();
    for (from, entry) in match_list.iter().enumerate() {
        let Some(vector) = entry.move_vector() else {
            continue;
        };
        let target = entry.relative_coordinate() + vector;
        let to = match_list
            .iter()
            .position(|candidate| candidate.relative_coordinate().distance(&target) < MOVE_EPSILON);
        if let Some(to) = to {
            if to != from {
                moves.push((from, to));
            }
        }
    }
    moves
}
