//! Deterministic random number generation.
//!
//! RULE: No generator may call a platform RNG.
//! All randomness flows through StageRng instances derived
//! from the single master seed in PipelineConfig.
//!
//! Each generating stage gets its own stream, seeded from
//! (master_seed XOR stage_index). Adding a stage never changes
//! the streams of existing stages.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single pipeline stage.
pub struct StageRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StageRng {
    /// Create a stage RNG from the master seed and a stable stage index.
    pub fn new(master_seed: u64, stage_index: u64) -> Self {
        let derived_seed = master_seed ^ (stage_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::Rng;
        assert!(n > 0, "n must be > 0");
        self.inner.gen_range(0..n)
    }

    /// Roll an i64 in [lo, hi]. Returns `lo` when the range is inverted.
    pub fn next_i64_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        use rand::Rng;
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Fair coin.
    pub fn coin(&mut self) -> bool {
        self.chance(0.5)
    }

    /// Uniform timestamp in [start, end], whole seconds.
    /// Collapses to `start` if `end` precedes it.
    pub fn datetime_between(&mut self, start: NaiveDateTime, end: NaiveDateTime) -> NaiveDateTime {
        let span = (end - start).num_seconds();
        start + Duration::seconds(self.next_i64_inclusive(0, span))
    }

    /// Uniform date in [start, end].
    pub fn date_between(&mut self, start: NaiveDate, end: NaiveDate) -> NaiveDate {
        let span = (end - start).num_days();
        start + Duration::days(self.next_i64_inclusive(0, span))
    }
}

/// All stage RNGs for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stage(&self, slot: StageSlot) -> StageRng {
        StageRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stage slot assignments.
/// NEVER reorder or remove entries, only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StageSlot {
    Customer = 0,
    Profile = 1,
    Transaction = 2,
}

impl StageSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Customer    => "customer",
            Self::Profile     => "profile",
            Self::Transaction => "transaction",
        }
    }
}
