// SPDX-License-Identifier: Apache-2.0
//! Read-through memo of external rate-callback results, keyed by
//! [`crate::fingerprint`].

use rustc_hash::FxHashMap;

/// Hash → rate memo for expensive rate callbacks. Grows monotonically
/// over a run; never evicts.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: FxHashMap<u64, f64>,
}

impl RateTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Looks up a previously cached rate for `key`.
    #[must_use]
    pub fn get(&self, key: u64) -> Option<f64> {
        self.rates.get(&key).copied()
    }

    /// Stores `rate` under `key`, overwriting any previous value. Callers
    /// only insert when a process declares `cache_rate`; the callback is
    /// required to be a pure function of its inputs for this to be sound.
    pub fn insert(&mut self, key: u64, rate: f64) {
        self.rates.insert(key, rate);
    }
}
