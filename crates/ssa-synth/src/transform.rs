// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use nalgebra::{DMatrix, DVector};
use ssa_core::symmetrize;

/// Mean and covariance of one epoch in observed space.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservedMoments {
    pub covariance: DMatrix<f64>,
    pub mean: DVector<f64>,
}

/// Maps source moments through the mixing matrix: `(A Σ Aᵀ, A μ)`.
///
/// The covariance is re-symmetrized to cancel rounding asymmetry.
pub fn transform_moments(
    mixing: &DMatrix<f64>,
    source_covariance: &DMatrix<f64>,
    source_mean: &DVector<f64>,
) -> ObservedMoments {
    let covariance = symmetrize(&(mixing * source_covariance * mixing.transpose()));
    let mean = mixing * source_mean;
    ObservedMoments { covariance, mean }
}

/// Applies [`transform_moments`] to every epoch in order.
pub fn transform_all(
    mixing: &DMatrix<f64>,
    source_covariances: &[DMatrix<f64>],
    source_means: &[DVector<f64>],
) -> Vec<ObservedMoments> {
    source_covariances
        .iter()
        .zip(source_means)
        .map(|(covariance, mean)| transform_moments(mixing, covariance, mean))
        .collect()
}
