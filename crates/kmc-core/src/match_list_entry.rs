// SPDX-License-Identifier: Apache-2.0
//! A single match-list entry: one neighborhood slot, either a process's
//! prototype expectation or a configuration's live snapshot.

use std::cmp::Ordering;

use kmc_geom::Coordinate;

use crate::constants::MATCH_EPSILON;
use crate::type_bucket::TypeBucket;

/// Which side of the match a `MatchListEntry` represents. Drives how
/// `update_types` and `match_types` are interpreted: a process entry's
/// `match_types` is a prototype (with an optional wildcard), a config
/// entry's is a live occupancy snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A prototype slot belonging to a process's match list.
    Process,
    /// A live slot belonging to a configuration's cached match list.
    Config,
}

/// One slot of a match list: a relative position plus the occupancy (and,
/// for process entries, the update delta) expected or observed there.
#[derive(Debug, Clone)]
pub struct MatchListEntry {
    role: Role,
    relative_coordinate: Coordinate,
    distance: f64,
    /// The absolute site index this entry is bound to. `None` for process
    /// prototype entries, which describe a relative slot rather than a
    /// concrete site.
    site_index: Option<usize>,
    match_types: TypeBucket,
    /// Update delta for a process entry (`after - before`); unused and left
    /// zeroed for a config entry.
    update_types: TypeBucket,
    move_vector: Option<Coordinate>,
}

impl MatchListEntry {
    /// Creates a config-side entry: a live site snapshot at `relative_coordinate`
    /// relative to the match list's origin, bound to `site_index`.
    #[must_use]
    pub fn config(relative_coordinate: Coordinate, site_index: usize, occupancy: TypeBucket) -> Self {
        let n_types = occupancy.len();
        Self {
            role: Role::Config,
            distance: relative_coordinate.distance_to_origin(),
            relative_coordinate,
            site_index: Some(site_index),
            match_types: occupancy,
            update_types: TypeBucket::new(n_types),
            move_vector: None,
        }
    }

    /// Creates a process-side prototype entry.
    #[must_use]
    pub fn process(relative_coordinate: Coordinate, match_types: TypeBucket, update_types: TypeBucket) -> Self {
        Self {
            role: Role::Process,
            distance: relative_coordinate.distance_to_origin(),
            relative_coordinate,
            site_index: None,
            match_types,
            update_types,
            move_vector: None,
        }
    }

    /// Attaches a move vector to this (process-side) entry.
    pub fn set_move_vector(&mut self, move_vector: Coordinate) {
        self.move_vector = Some(move_vector);
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn relative_coordinate(&self) -> Coordinate {
        self.relative_coordinate
    }

    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    #[must_use]
    pub fn site_index(&self) -> Option<usize> {
        self.site_index
    }

    #[must_use]
    pub fn match_types(&self) -> &TypeBucket {
        &self.match_types
    }

    #[must_use]
    pub fn update_types(&self) -> &TypeBucket {
        &self.update_types
    }

    #[must_use]
    pub fn move_vector(&self) -> Option<Coordinate> {
        self.move_vector
    }

    /// Dominance test: `self` (assumed to be the process/prototype side)
    /// matches `observed` (assumed to be the config/live side) if `self`'s
    /// type bucket is dominated by `observed`'s.
    #[must_use]
    pub fn matches(&self, observed: &Self) -> bool {
        self.match_types.dominated_by(&observed.match_types)
    }
}

impl PartialEq for MatchListEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MatchListEntry {}

impl PartialOrd for MatchListEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sorts by distance (within `MATCH_EPSILON`), falling back to the
/// coordinate's lexicographic order for entries at (near-)equal distance.
impl Ord for MatchListEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        if (self.distance - other.distance).abs() < MATCH_EPSILON {
            self.relative_coordinate.cmp(&other.relative_coordinate)
        } else {
            self.distance.total_cmp(&other.distance)
        }
    }
}

/// Dominance test applied in prototype order: the config list must be at
/// least as long as the prototype, and every prototype slot must be
/// dominated by the config slot at the same position.
#[must_use]
pub fn whatever_match(prototype: &[MatchListEntry], observed: &[MatchListEntry]) -> bool {
    if observed.len() < prototype.len() {
        return false;
    }
    prototype
        .iter()
        .zip(observed.iter())
        .all(|(p, o)| p.matches(o))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(counts: &[i64]) -> TypeBucket {
        TypeBucket::from_counts(counts.to_vec())
    }

    #[test]
    fn entries_sort_by_distance_then_coordinate() {
        let near = MatchListEntry::config(Coordinate::new(1.0, 0.0, 0.0), 0, bucket(&[0, 1]));
        let far = MatchListEntry::config(Coordinate::new(2.0, 0.0, 0.0), 1, bucket(&[0, 1]));
        let mut entries = vec![far.clone(), near.clone()];
        entries.sort();
        assert_eq!(entries[0].relative_coordinate(), near.relative_coordinate());
        assert_eq!(entries[1].relative_coordinate(), far.relative_coordinate());
    }

    #[test]
    fn near_equal_distances_break_ties_on_coordinate() {
        let a = MatchListEntry::config(Coordinate::new(1.0, 0.0, 0.0), 0, bucket(&[0, 1]));
        let b = MatchListEntry::config(Coordinate::new(0.0, 1.0, 0.0), 1, bucket(&[0, 1]));
        assert_eq!(a.cmp(&b), Ordering::Less);
    }

    #[test]
    fn sort_is_idempotent() {
        let mut entries = vec![
            MatchListEntry::config(Coordinate::new(3.0, 0.0, 0.0), 2, bucket(&[0, 1])),
            MatchListEntry::config(Coordinate::new(1.0, 0.0, 0.0), 0, bucket(&[0, 1])),
            MatchListEntry::config(Coordinate::new(2.0, 0.0, 0.0), 1, bucket(&[0, 1])),
        ];
        entries.sort();
        let once: Vec<Coordinate> = entries.iter().map(MatchListEntry::relative_coordinate).collect();
        entries.sort();
        let twice: Vec<Coordinate> = entries.iter().map(MatchListEntry::relative_coordinate).collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn whatever_match_fails_when_config_list_is_shorter() {
        let prototype = vec![
            MatchListEntry::process(Coordinate::origin(), bucket(&[0, 1]), bucket(&[0, 0])),
            MatchListEntry::process(Coordinate::new(1.0, 0.0, 0.0), bucket(&[0, 1]), bucket(&[0, 0])),
        ];
        let observed = vec![MatchListEntry::config(Coordinate::origin(), 0, bucket(&[0, 1]))];
        assert!(!whatever_match(&prototype, &observed));
    }

    #[test]
    fn whatever_match_succeeds_when_every_slot_dominates() {
        let prototype = vec![MatchListEntry::process(Coordinate::origin(), bucket(&[0, 1]), bucket(&[0, 0]))];
        let observed = vec![MatchListEntry::config(Coordinate::origin(), 0, bucket(&[0, 1]))];
        assert!(whatever_match(&prototype, &observed));
    }

    #[test]
    fn whatever_match_short_circuits_on_first_mismatch() {
        let prototype = vec![
            MatchListEntry::process(Coordinate::origin(), bucket(&[0, 1]), bucket(&[0, 0])),
            MatchListEntry::process(Coordinate::new(1.0, 0.0, 0.0), bucket(&[0, 5]), bucket(&[0, 0])),
        ];
        let observed = vec![
            MatchListEntry::config(Coordinate::origin(), 0, bucket(&[0, 1])),
            MatchListEntry::config(Coordinate::new(1.0, 0.0, 0.0), 1, bucket(&[0, 1])),
        ];
        assert!(!whatever_match(&prototype, &observed));
    }

    #[test]
    fn wildcard_prototype_matches_any_occupancy() {
        let prototype = vec![MatchListEntry::process(Coordinate::origin(), bucket(&[1, 0]), bucket(&[0, 0]))];
        let observed = vec![MatchListEntry::config(Coordinate::origin(), 0, bucket(&[0, 7]))];
        assert!(whatever_match(&prototype, &observed));
    }
}
