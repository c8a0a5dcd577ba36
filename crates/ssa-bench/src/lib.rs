// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Shared fixtures for the generator and linear-algebra benchmarks.

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ssa_synth::SsaConfig;

pub const BENCH_SEED: u64 = 0x55a_b3c4;

/// Workload sizes measured by the `generate` benchmark: `(epochs, ds, dn, samples)`.
pub const GENERATE_WORKLOADS: [(usize, usize, usize, usize); 3] =
    [(10, 2, 2, 500), (20, 5, 5, 1_000), (8, 10, 20, 2_000)];

/// Config with randomized bases, a moderate correlation band and a mean budget.
pub fn bench_config(epochs: usize, ds: usize, dn: usize, samples: usize) -> SsaConfig {
    SsaConfig {
        samples_per_epoch: vec![samples],
        correlation_min: 0.1,
        correlation_max: 0.6,
        mean_nonstationarity: 0.5,
        seed: BENCH_SEED,
        ..SsaConfig::new(epochs, ds, dn)
    }
}

pub fn bench_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(BENCH_SEED)
}

/// Deterministic symmetric positive definite `d x d` matrix.
pub fn spd_fixture(d: usize) -> DMatrix<f64> {
    let mut state = BENCH_SEED;
    let raw = DMatrix::from_fn(d, d, |_, _| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 11) as f64) / ((1_u64 << 53) as f64) - 0.5
    });
    &raw * raw.transpose() + DMatrix::identity(d, d) * d as f64
}
