// SPDX-License-Identifier: Apache-2.0
//! Error kinds raised by the lattice KMC engine.

use thiserror::Error;

/// Errors the engine can raise. Each variant corresponds to one of the
/// failure kinds the core distinguishes; see the field docs for which
/// operations can raise which variant.
#[derive(Debug, Error)]
pub enum KmcError {
    /// Coordinates or type tables were inconsistent at construction time.
    /// Fatal: callers must abort before running any step.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Human-readable description of the inconsistency.
        reason: String,
    },

    /// `RandomSource::set_type` was called with a name that isn't one of the
    /// recognized backends. No state changes as a result of this error.
    #[error("unknown RNG type: {name}")]
    UnknownRngType {
        /// The unrecognized backend name.
        name: String,
    },

    /// The external rate callback returned an error. The current step must
    /// be aborted without mutating `Configuration`.
    #[error("rate callback failed: {reason}")]
    RateCallbackFailed {
        /// The callback's own error description.
        reason: String,
    },

    /// A process prototype's match list is longer than any configuration
    /// match list around the sites its basis filter admits. Never fatal;
    /// callers should treat it as "no match" rather than propagate it.
    #[error("process match list overruns the configuration match list at site {site}")]
    MatchListOverrun {
        /// The site index where the overrun was observed.
        site: usize,
    },

    /// Applying a process's update deltas drove a bucket count negative,
    /// indicating a mis-specified process. Only raised in debug builds;
    /// release builds trust the data model's invariant instead.
    #[error("bucket at site {site}, type {type_id} went negative")]
    NegativeBucket {
        /// The site whose bucket went negative.
        site: usize,
        /// The type index whose count went negative.
        type_id: usize,
    },

    /// The OS entropy source for the `device` RNG backend returned no
    /// usable entropy.
    #[error("device RNG source has no available entropy")]
    NoEntropyAvailable,

    /// A time increment came out non-finite (`u = 0` in the Poisson draw).
    /// `SimulationTimer::propagate_time` redraws internally and never
    /// returns this to a caller; it exists so debug assertions and tests
    /// can express the condition by name rather than by checking for NaN.
    #[error("non-finite time step (R = {total_rate}, u = {draw})")]
    NonFiniteTimeStep {
        /// The total rate used for the draw.
        total_rate: f64,
        /// The uniform sample that produced a non-finite step.
        draw: f64,
    },

    /// An internal bookkeeping invariant was violated: a lookup that should
    /// always succeed by construction (e.g. a process id handed back by the
    /// same interactions table that owns it) came back empty. Indicates a
    /// bug in the engine itself rather than bad caller input.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(&'static str),
}
