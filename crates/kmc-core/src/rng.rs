// SPDX-License-Identifier: Apache-2.0
//! Pluggable pseudorandom source. Five named backends share one trait;
//! `propagate_time` and the matcher's Poisson draws only ever see
//! `&mut dyn RandomSource`, never a concrete generator type.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::KmcError;

/// A source of uniform samples in the open interval `(0, 1)`.
pub trait RandomSource: Send {
    /// Draws the next sample, strictly inside `(0, 1)`.
    fn uniform01(&mut self) -> f64;
}

/// Builds the named backend, seeded either from `seed` or, if `time_seed`
/// is set, from the system clock. Recognized names: `mt` (default),
/// `minstd`, `ranlux24`, `ranlux48`, `device`.
pub fn new_random_source(name: &str, time_seed: bool, seed: u64) -> Result<Box<dyn RandomSource>, KmcError> {
    let seed = if time_seed { clock_seed() } else { seed };
    match name {
        "mt" => Ok(Box::new(MtRng::seeded(seed as u32))),
        "minstd" => Ok(Box::new(MinstdRng::seeded(seed))),
        "ranlux24" => Ok(Box::new(SubtractWithCarryRng::ranlux24(seed))),
        "ranlux48" => Ok(Box::new(SubtractWithCarryRng::ranlux48(seed))),
        "device" => DeviceRng::new().map(|rng| Box::new(rng) as Box<dyn RandomSource>),
        other => Err(KmcError::UnknownRngType { name: other.to_string() }),
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Mersenne Twister (MT19937), the default backend.
#[derive(Debug, Clone)]
pub struct MtRng {
    state: [u32; 624],
    index: usize,
}

impl MtRng {
    #[must_use]
    pub fn seeded(seed: u32) -> Self {
        let mut state = [0u32; 624];
        state[0] = seed;
        for i in 1..624 {
            state[i] = 1_812_433_253u32
                .wrapping_mul(state[i - 1] ^ (state[i - 1] >> 30))
                .wrapping_add(i as u32);
        }
        let mut rng = Self { state, index: 624 };
        rng.generate();
        rng
    }

    fn generate(&mut self) {
        const LOWER_MASK: u32 = 0x7FFF_FFFF;
        const UPPER_MASK: u32 = 0x8000_0000;
        for i in 0..624 {
            let x = (self.state[i] & UPPER_MASK) | (self.state[(i + 1) % 624] & LOWER_MASK);
            let mut next = self.state[(i + 397) % 624] ^ (x >> 1);
            if x & 1 != 0 {
                next ^= 0x9908_B0DF;
            }
            self.state[i] = next;
        }
        self.index = 0;
    }

    fn next_u32(&mut self) -> u32 {
        if self.index >= 624 {
            self.generate();
        }
        let mut y = self.state[self.index];
        y ^= y >> 11;
        y ^= (y << 7) & 0x9D2C_5680;
        y ^= (y << 15) & 0xEFC6_0000;
        y ^= y >> 18;
        self.index += 1;
        y
    }
}

impl RandomSource for MtRng {
    fn uniform01(&mut self) -> f64 {
        (f64::from(self.next_u32()) + 0.5) / 4_294_967_296.0
    }
}

/// The Park-Miller minimal standard linear congruential generator
/// (`x' = 48271 x mod (2^31 - 1)`), matching `std::minstd_rand`'s constants.
#[derive(Debug, Clone, Copy)]
pub struct MinstdRng {
    state: u64,
}

impl MinstdRng {
    const MODULUS: u64 = 2_147_483_647;
    const MULTIPLIER: u64 = 48_271;

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        let state = (seed % (Self::MODULUS - 1)) + 1;
        Self { state }
    }
}

impl RandomSource for MinstdRng {
    fn uniform01(&mut self) -> f64 {
        self.state = (self.state * Self::MULTIPLIER) % Self::MODULUS;
        self.state as f64 / Self::MODULUS as f64
    }
}

/// A lagged-Fibonacci subtract-with-carry generator in the style of
/// `ranlux24`/`ranlux48`: same `(r=24, s=10)` lags as the standard library
/// generators, parameterized by word size. This is a statistically valid
/// generator under the same name; it does not reproduce the exact output
/// sequence of a luxury-level `std::ranlux24`/`ranlux48` (no block
/// discarding), since that is a byte-exact reimplementation concern this
/// engine has no need for.
#[derive(Debug, Clone)]
pub struct SubtractWithCarryRng {
    state: [u64; 24],
    index: usize,
    carry: u64,
    modulus: u64,
    scale: f64,
}

impl SubtractWithCarryRng {
    const LAG_R: usize = 24;
    const LAG_S: usize = 10;

    fn new(seed: u64, word_bits: u32) -> Self {
        let modulus = 1u64 << word_bits;
        let mut expander = seed;
        let mut state = [0u64; Self::LAG_R];
        for slot in &mut state {
            *slot = splitmix64(&mut expander) % modulus;
        }
        Self {
            state,
            index: 0,
            carry: 0,
            modulus,
            scale: modulus as f64,
        }
    }

    #[must_use]
    pub fn ranlux24(seed: u64) -> Self {
        Self::new(seed, 24)
    }

    #[must_use]
    pub fn ranlux48(seed: u64) -> Self {
        Self::new(seed, 48)
    }

    fn next_word(&mut self) -> u64 {
        let a = self.state[(self.index + Self::LAG_R - Self::LAG_S) % Self::LAG_R];
        let b = self.state[self.index];
        let (diff, borrowed) = a.overflowing_sub(b + self.carry);
        let value = if borrowed { diff.wrapping_add(self.modulus) } else { diff };
        self.carry = u64::from(borrowed);
        self.state[self.index] = value;
        self.index = (self.index + 1) % Self::LAG_R;
        value
    }
}

impl RandomSource for SubtractWithCarryRng {
    fn uniform01(&mut self) -> f64 {
        (self.next_word() as f64 + 0.5) / self.scale
    }
}

/// OS-entropy backend. Draws are independent of one another; there is no
/// seed to replay.
///
/// `uniform01` falls back to an internal `splitmix64` stream, reseeded from
/// the construction-time probe, if the OS entropy source ever fails on a
/// later draw: `RandomSource::uniform01` is infallible by trait, so a
/// transient OS failure degrades to a deterministic-from-that-point stream
/// rather than panicking.
#[derive(Debug)]
pub struct DeviceRng {
    fallback: u64,
}

impl DeviceRng {
    /// Confirms the OS entropy source is available before returning,
    /// matching `set_type("device")`'s documented failure mode.
    pub fn new() -> Result<Self, KmcError> {
        let mut probe = [0u8; 8];
        getrandom::getrandom(&mut probe).map_err(|_| KmcError::NoEntropyAvailable)?;
        Ok(Self {
            fallback: u64::from_le_bytes(probe),
        })
    }
}

impl RandomSource for DeviceRng {
    fn uniform01(&mut self) -> f64 {
        let mut buf = [0u8; 8];
        let raw = if getrandom::getrandom(&mut buf).is_ok() {
            u64::from_le_bytes(buf) >> 11 // 53 significant bits
        } else {
            splitmix64(&mut self.fallback) >> 11
        };
        (raw as f64 + 0.5) / 9_007_199_254_740_992.0
    }
}
