// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use nalgebra::DMatrix;
use rand::Rng;

/// Half-width of the uniform distribution used for the skew-symmetric generator.
pub const GENERATOR_HALF_WIDTH: f64 = 50.0;

/// Draws a random `k x k` orthogonal matrix.
///
/// A matrix with i.i.d. entries in `[-50, 50]` is antisymmetrized into a
/// skew-symmetric generator `S = (M - Mᵀ) / 2` and exponentiated; `exp(S)` is
/// orthogonal because `exp(S)ᵀ exp(S) = exp(-S) exp(S) = I`. Dimensions 0 and 1
/// return the identity without consuming randomness.
pub fn random_rotation<R: Rng + ?Sized>(k: usize, rng: &mut R) -> DMatrix<f64> {
    if k <= 1 {
        return DMatrix::identity(k, k);
    }

    let raw = DMatrix::from_fn(k, k, |_, _| {
        rng.random_range(-GENERATOR_HALF_WIDTH..=GENERATOR_HALF_WIDTH)
    });
    let generator = (&raw - raw.transpose()) * 0.5;
    generator.exp()
}
