// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::SsaError;
use nalgebra::DMatrix;
use tracing::debug;

/// Eigenvalue tolerance for PSD checks, relative to the covariance scale
/// `max(1, max_i |Σ_ii|)`.
pub const PSD_RELATIVE_TOLERANCE: f64 = 1e-10;

const JITTER_LADDER_STEPS: i32 = 12;
const JITTER_LADDER_GROWTH: f64 = 4.0;

/// Covariance after the minimal diagonal regularization needed for PSD-ness.
#[derive(Clone, Debug, PartialEq)]
pub struct StabilizedCovariance {
    pub matrix: DMatrix<f64>,
    /// Diagonal jitter that was added; `0.0` when the input was already PSD.
    pub jitter: f64,
    /// Smallest eigenvalue of `matrix` (`+inf` for the empty matrix).
    pub min_eigenvalue: f64,
}

/// Returns `(M + Mᵀ) / 2`.
pub fn symmetrize(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    (matrix + matrix.transpose()) * 0.5
}

/// Returns true when `matrix` is square and `|m_ij - m_ji| <= tol * (1 + max|m|)`.
pub fn is_symmetric(matrix: &DMatrix<f64>, tol: f64) -> bool {
    if !matrix.is_square() {
        return false;
    }
    let n = matrix.nrows();
    if n == 0 {
        return true;
    }
    let bound = tol * (1.0 + matrix.amax());
    for i in 0..n {
        for j in (i + 1)..n {
            if (matrix[(i, j)] - matrix[(j, i)]).abs() > bound {
                return false;
            }
        }
    }
    true
}

/// Smallest eigenvalue of the symmetric part of `matrix`; `+inf` when empty.
pub fn min_eigenvalue(matrix: &DMatrix<f64>) -> f64 {
    if matrix.nrows() == 0 {
        return f64::INFINITY;
    }
    symmetrize(matrix).symmetric_eigen().eigenvalues.min()
}

fn covariance_scale(matrix: &DMatrix<f64>) -> f64 {
    if matrix.nrows() == 0 {
        1.0
    } else {
        matrix.diagonal().amax().max(1.0)
    }
}

fn check_square_finite(matrix: &DMatrix<f64>, label: &str) -> Result<(), SsaError> {
    if !matrix.is_square() {
        return Err(SsaError::invalid_input(format!(
            "{label} must be square; got {}x{}",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    if matrix.iter().any(|value| !value.is_finite()) {
        return Err(SsaError::numerical_degeneracy(format!(
            "{label} contains non-finite entries"
        )));
    }
    Ok(())
}

/// Symmetrizes `covariance` and, if its smallest eigenvalue is below
/// `-PSD_RELATIVE_TOLERANCE * scale`, adds the smallest diagonal jitter from a
/// geometric ladder that restores PSD-ness.
///
/// Fails with `NumericalDegeneracy` on non-finite entries or when the ladder
/// is exhausted.
pub fn stabilize_covariance(covariance: &DMatrix<f64>) -> Result<StabilizedCovariance, SsaError> {
    check_square_finite(covariance, "covariance")?;
    let symmetric = symmetrize(covariance);
    let lambda_min = min_eigenvalue(&symmetric);
    let tol = PSD_RELATIVE_TOLERANCE * covariance_scale(&symmetric);
    if lambda_min >= -tol {
        return Ok(StabilizedCovariance {
            matrix: symmetric,
            jitter: 0.0,
            min_eigenvalue: lambda_min,
        });
    }

    let n = symmetric.nrows();
    let deficit = -lambda_min;
    for step in 0..JITTER_LADDER_STEPS {
        let jitter = deficit + tol * JITTER_LADDER_GROWTH.powi(step);
        let candidate = &symmetric + DMatrix::<f64>::identity(n, n) * jitter;
        let candidate_min = min_eigenvalue(&candidate);
        if candidate_min >= -tol {
            debug!(jitter, step, lambda_min, "covariance regularized");
            return Ok(StabilizedCovariance {
                matrix: candidate,
                jitter,
                min_eigenvalue: candidate_min,
            });
        }
    }

    Err(SsaError::numerical_degeneracy(format!(
        "covariance is not PSD (min eigenvalue {lambda_min:e}) and diagonal jitter up to {:e} did not restore it",
        deficit + tol * JITTER_LADDER_GROWTH.powi(JITTER_LADDER_STEPS - 1)
    )))
}

/// Returns `F` with `F Fᵀ = covariance`, built from the symmetric
/// eigendecomposition so that singular PSD input is accepted.
///
/// Eigenvalues in `[-tol, 0)` are clamped to zero; anything more negative is a
/// `NumericalDegeneracy`.
pub fn psd_factor(covariance: &DMatrix<f64>) -> Result<DMatrix<f64>, SsaError> {
    check_square_finite(covariance, "covariance")?;
    let n = covariance.nrows();
    if n == 0 {
        return Ok(DMatrix::zeros(0, 0));
    }

    let symmetric = symmetrize(covariance);
    let tol = PSD_RELATIVE_TOLERANCE * covariance_scale(&symmetric);
    let eigen = symmetric.symmetric_eigen();
    let lambda_min = eigen.eigenvalues.min();
    if lambda_min < -tol {
        return Err(SsaError::numerical_degeneracy(format!(
            "cannot factor covariance with min eigenvalue {lambda_min:e} (tolerance {tol:e})"
        )));
    }

    let mut factor = eigen.eigenvectors;
    for j in 0..n {
        let scale = eigen.eigenvalues[j].max(0.0).sqrt();
        for i in 0..n {
            factor[(i, j)] *= scale;
        }
    }
    Ok(factor)
}

/// Log-determinant of a symmetric positive definite matrix via Cholesky.
///
/// The empty matrix has log-determinant `0.0`.
pub fn log_det_spd(matrix: &DMatrix<f64>) -> Result<f64, SsaError> {
    check_square_finite(matrix, "matrix")?;
    if matrix.nrows() == 0 {
        return Ok(0.0);
    }
    let cholesky = symmetrize(matrix).cholesky().ok_or_else(|| {
        SsaError::numerical_degeneracy("log-determinant requires a positive definite matrix")
    })?;
    let log_diag = cholesky
        .l()
        .diagonal()
        .iter()
        .map(|value| value.ln())
        .sum::<f64>();
    Ok(2.0 * log_diag)
}
