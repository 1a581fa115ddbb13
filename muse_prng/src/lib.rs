// Deterministic, portable random source for song generation.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// Every random decision in `muse_music` (chord walks, note lengths, pitch
// choice, ghost notes, hi-hat on/off, melody repeat count) draws from a
// `MuseRng`, so a song is fully reproducible from its seed.
//
// The draw helpers mirror the shapes the composer needs: inclusive integer
// ranges for velocities and ghost-note rolls, a unit-interval `f64` for the
// weighted sampler, Bernoulli draws for coin flips, and uniform slice choice
// for transition-graph walks.
//
// Concurrency: a `MuseRng` is plain owned state with no interior mutability.
// Generations that run in parallel must each own a stream; `fork()` derives
// a new, independent stream from an existing one without sharing state.
//
// **Critical constraint: determinism.** Output depends only on the seed and
// the sequence of calls. The core generator uses integer arithmetic only.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG, the composer's sole source of randomness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuseRng {
    s: [u64; 4],
}

impl MuseRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two generators created with the same seed produce identical songs.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Derive an independent stream, advancing `self` by one draw.
    ///
    /// Use this to hand each concurrent generation its own generator while
    /// keeping the whole run reproducible from the parent seed.
    pub fn fork(&mut self) -> Self {
        MuseRng::new(self.next_u64())
    }

    /// Raw 64-bit output; every other draw is built on this.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `f64` in [0, 1) from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)`, rejection-sampled so every value is
    /// equally likely. `low` must be below `high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform index in `[low, high)`, e.g. a key from the 12 pitch classes.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Generate a uniform random `u32` in `[low, high]`, both ends inclusive.
    ///
    /// Panics if `low > high`.
    pub fn range_u32_inclusive(&mut self, low: u32, high: u32) -> u32 {
        assert!(low <= high, "range_u32_inclusive: low must be <= high");
        self.range_u64(low as u64, high as u64 + 1) as u32
    }

    /// Generate a uniform random `u8` in `[low, high]`, both ends inclusive.
    ///
    /// Velocities are drawn this way.
    pub fn range_u8_inclusive(&mut self, low: u8, high: u8) -> u8 {
        self.range_u32_inclusive(low as u32, high as u32) as u8
    }

    /// Coin with bias `p`: the hi-hat on/off and chord-vs-passing-tone flips.
    /// Never true at `p <= 0`, always true at `p >= 1`.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element uniformly. Returns `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range_usize(0, items.len());
        items.get(idx)
    }
}

/// SplitMix64, used only for seeding xoshiro256++ from a single `u64`.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
