// SPDX-License-Identifier: Apache-2.0
//! The external, user-supplied rate function. Kept as a thin seam: the
//! engine only ever calls it with the local geometry of one match and
//! expects back a finite, non-negative rate.

use kmc_geom::Coordinate;

use crate::error::KmcError;
use crate::type_bucket::TypeBucket;

/// The local geometry and occupancy of one process match, passed to a
/// [`RateCallback`]. Every field is relative to the matched site: `center`
/// is that site's absolute coordinate, everything else is expressed in the
/// match list's own relative-coordinate frame.
#[derive(Debug, Clone, Copy)]
pub struct RateContext<'a> {
    pub process_number: usize,
    pub rate_constant: f64,
    pub center: Coordinate,
    pub relative_positions: &'a [Coordinate],
    pub types_before: &'a [TypeBucket],
    pub types_after: &'a [TypeBucket],
}

/// A pluggable rate function. Must be a pure function of its
/// [`RateContext`] for [`crate::RateTable`] caching to be sound: the same
/// context must always produce the same rate.
pub trait RateCallback: Send + Sync {
    /// Computes a finite, non-negative rate for one matched process/site
    /// pair. An `Err` aborts the current matcher step without mutating any
    /// configuration state.
    fn rate(&self, ctx: RateContext<'_>) -> Result<f64, KmcError>;
}

/// A callback that always returns the process's own rate constant,
/// ignoring the surrounding geometry. Useful as a default when no process
/// declares custom rates, and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantRateCallback;

impl RateCallback for ConstantRateCallback {
    fn rate(&self, ctx: RateContext<'_>) -> Result<f64, KmcError> {
        Ok(ctx.rate_constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_callback_echoes_the_rate_constant() {
        let callback = ConstantRateCallback;
        let ctx = RateContext {
            process_number: 0,
            rate_constant: 7.5,
            center: Coordinate::origin(),
            relative_positions: &[],
            types_before: &[],
            types_after: &[],
        };
        assert_eq!(callback.rate(ctx).unwrap(), 7.5);
    }

    struct FailingCallback;

    impl RateCallback for FailingCallback {
        fn rate(&self, _ctx: RateContext<'_>) -> Result<f64, KmcError> {
            Err(KmcError::RateCallbackFailed {
                reason: "boom".to_string(),
            })
        }
    }

    #[test]
    fn a_failing_callback_propagates_its_error() {
        let callback = FailingCallback;
        let ctx = RateContext {
            process_number: 0,
            rate_constant: 1.0,
            center: Coordinate::origin(),
            relative_positions: &[],
            types_before: &[],
            types_after: &[],
        };
        assert!(matches!(callback.rate(ctx), Err(KmcError::RateCallbackFailed { .. })));
    }
}
