// SPDX-License-Identifier: Apache-2.0
//! Block-averaging error estimator: accumulates per-component samples into
//! fixed-size blocks and reports the block-averaged standard deviation and
//! its own standard error against an externally supplied mean.

/// Accumulates a stream of per-axis `(Δx², Δy², Δz²)` samples into blocks of
/// `block_size`, summing each block componentwise and recording the
/// completed sums. Used per MSD histogram bin to turn a correlated sample
/// stream into a usable error estimate.
#[derive(Debug, Clone)]
pub struct Blocker {
    block_size: usize,
    running_sum: [f64; 3],
    running_count: usize,
    block_sums: Vec<[f64; 3]>,
}

impl Blocker {
    #[must_use]
    pub fn new(block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");
        Self {
            block_size,
            running_sum: [0.0; 3],
            running_count: 0,
            block_sums: Vec::new(),
        }
    }

    /// Adds one per-component sample. Once `block_size` samples have
    /// accumulated, the block sum is recorded and the running accumulator
    /// resets.
    pub fn add(&mut self, value: [f64; 3]) {
        for c in 0..3 {
            self.running_sum[c] += value[c];
        }
        self.running_count += 1;
        if self.running_count == self.block_size {
            self.block_sums.push(self.running_sum);
            self.running_sum = [0.0; 3];
            self.running_count = 0;
        }
    }

    #[must_use]
    pub fn completed_blocks(&self) -> usize {
        self.block_sums.len()
    }

    /// Block-averaged standard deviation and its own standard error, per
    /// component, against the externally computed mean `rho` (the bin's
    /// `histogram / max(count, 1)`).
    ///
    /// With `n` completed blocks: `σ²[c] = mean_blocks((block[c]/block_size -
    /// rho[c])²)`, `std[c] = sqrt(σ²[c]/(n-1))`, `error[c] =
    /// std[c]/sqrt(2n-2)`. Returns `([-1.0; 3], [-1.0; 3])` when `n <= 1`:
    /// the sentinel the original engine uses for "not enough blocks yet"
    /// rather than a division by zero.
    #[must_use]
    pub fn values(&self, rho: [f64; 3]) -> ([f64; 3], [f64; 3]) {
        let n = self.block_sums.len();
        if n <= 1 {
            return ([-1.0; 3], [-1.0; 3]);
        }

        let mut variance = [0.0; 3];
        for block in &self.block_sums {
            for c in 0..3 {
                let d = block[c] / self.block_size as f64 - rho[c];
                variance[c] += d * d;
            }
        }

        let mut std = [0.0; 3];
        let mut error = [0.0; 3];
        for c in 0..3 {
            variance[c] /= n as f64;
            std[c] = (variance[c] / (n - 1) as f64).sqrt();
            error[c] = std[c] / (2.0 * (n - 1) as f64).sqrt();
        }
        (std, error)
    }
}
