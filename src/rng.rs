//! Seeded random number generation
//!
//! All randomness in the simulation flows through one `GameRng` owned by the
//! `Map`, so a fixed seed reproduces the same map layout, spawn placement and
//! AI goal sequence.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Deterministic uniform-random source backed by PCG32.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: Pcg32,
}

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Roll an integer in `[lo, hi]`, inclusive on both ends.
    pub fn roll_int_in_range(&mut self, lo: i32, hi: i32) -> i32 {
        if lo >= hi {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }

    /// Roll a float in `[lo, hi)`.
    pub fn roll_float_in_range(&mut self, lo: f32, hi: f32) -> f32 {
        if lo >= hi {
            return lo;
        }
        self.rng.random_range(lo..hi)
    }
}
