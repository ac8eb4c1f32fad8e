// SPDX-License-Identifier: Apache-2.0
//! Content-addressed key for a process match at a site: a hash of the
//! process identity and the local geometry/occupancy it matched against,
//! used to memoize external rate-callback results in [`crate::RateTable`].

use crate::match_list_entry::MatchListEntry;

/// Computes a 64-bit fingerprint of `(process_number, per-entry match
/// geometry)` by blake3-hashing a byte serialization of the inputs and
/// XOR-folding the 256-bit digest down to 64 bits.
///
/// Coordinates are rounded to `1e-5` before hashing so that matches which
/// differ only by floating-point noise below the match tolerance hash
/// identically. Collisions in the fold are accepted as a tunable
/// approximation: two distinct matches can in principle share a
/// fingerprint and reuse each other's cached rate.
#[must_use]
pub fn fingerprint(process_number: usize, entries: &[MatchListEntry]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&process_number.to_le_bytes());
    hasher.update(&entries.len().to_le_bytes());
    for entry in entries {
        for component in entry.relative_coordinate().data() {
            let rounded = (component / 1e-5).round() as i64;
            hasher.update(&rounded.to_le_bytes());
        }
        for &count in entry.match_types().counts() {
            hasher.update(&count.to_le_bytes());
        }
        for &count in entry.update_types().counts() {
            hasher.update(&count.to_le_bytes());
        }
    }
    let digest = hasher.finalize();
    let bytes = digest.as_bytes();
    let mut folded = 0u64;
    for chunk in bytes.chunks(8) {
        let mut word = [0u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        folded ^= u64::from_le_bytes(word);
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_bucket::TypeBucket;
    use kmc_geom::Coordinate;

    fn entry(x: f64) -> MatchListEntry {
        MatchListEntry::process(
            Coordinate::new(x, 0.0, 0.0),
            TypeBucket::from_counts(vec![0, 1]),
            TypeBucket::from_counts(vec![0, 0]),
        )
    }

    #[test]
    fn identical_inputs_fingerprint_identically() {
        let a = fingerprint(3, &[entry(1.0), entry(2.0)]);
        let b = fingerprint(3, &[entry(1.0), entry(2.0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn different_process_numbers_fingerprint_differently() {
        let a = fingerprint(3, &[entry(1.0)]);
        let b = fingerprint(4, &[entry(1.0)]);
        assert_ne!(a, b);
    }

    #[test]
    fn different_geometry_fingerprints_differently() {
        let a = fingerprint(0, &[entry(1.0)]);
        let b = fingerprint(0, &[entry(1.5)]);
        assert_ne!(a, b);
    }

    #[test]
    fn sub_tolerance_noise_fingerprints_identically() {
        let a = fingerprint(0, &[entry(1.0)]);
        let b = fingerprint(0, &[entry(1.0 + 1e-9)]);
        assert_eq!(a, b);
    }
}
