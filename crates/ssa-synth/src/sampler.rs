// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use ssa_core::{SsaError, psd_factor};

/// Draws `count` independent columns from `N(mean, covariance)`.
///
/// Returns a `d x count` matrix. The covariance is factored through its
/// eigendecomposition, so singular PSD input is sampled rather than rejected.
pub fn sample_epoch<R: Rng + ?Sized>(
    mean: &DVector<f64>,
    covariance: &DMatrix<f64>,
    count: usize,
    rng: &mut R,
) -> Result<DMatrix<f64>, SsaError> {
    let d = mean.len();
    if covariance.shape() != (d, d) {
        return Err(SsaError::invalid_input(format!(
            "covariance must be {d}x{d} to match the mean; got {}x{}",
            covariance.nrows(),
            covariance.ncols()
        )));
    }

    let factor = psd_factor(covariance)?;
    let standard = DMatrix::<f64>::from_fn(d, count, |_, _| StandardNormal.sample(rng));
    let mut samples = factor * standard;
    for mut column in samples.column_iter_mut() {
        column += mean;
    }
    Ok(samples)
}
