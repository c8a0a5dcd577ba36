// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use nalgebra::{DMatrix, DVector};
use ssa_core::SsaError;

const RANK_TOLERANCE: f64 = 1e-12;

/// Recovery error of empirical epoch moments against their targets.
#[derive(Clone, Debug, PartialEq)]
pub struct MomentErrors {
    /// Euclidean distance between empirical and target mean.
    pub mean_error: f64,
    /// Frobenius distance between empirical and target covariance, divided by
    /// the target's Frobenius norm.
    pub covariance_error: f64,
}

/// Canonical correlations between the first `split` variables and the rest,
/// in descending order.
///
/// Returns an empty vector when either side is empty. Both diagonal blocks
/// must be positive definite.
pub fn canonical_correlations(
    covariance: &DMatrix<f64>,
    split: usize,
) -> Result<Vec<f64>, SsaError> {
    if !covariance.is_square() {
        return Err(SsaError::invalid_input(format!(
            "covariance must be square; got {}x{}",
            covariance.nrows(),
            covariance.ncols()
        )));
    }
    let d = covariance.nrows();
    if split > d {
        return Err(SsaError::invalid_input(format!(
            "split must be <= dimension; got split={split}, dimension={d}"
        )));
    }
    let p = split;
    let q = d - split;
    if p == 0 || q == 0 {
        return Ok(Vec::new());
    }

    let lx = lower_cholesky(covariance.view((0, 0), (p, p)).into_owned(), "leading block")?;
    let ly = lower_cholesky(covariance.view((p, p), (q, q)).into_owned(), "trailing block")?;
    let cross = covariance.view((0, p), (p, q)).into_owned();

    let left = lx
        .solve_lower_triangular(&cross)
        .ok_or_else(|| SsaError::numerical_degeneracy("leading block is singular"))?;
    let right = ly
        .solve_lower_triangular(&left.transpose())
        .ok_or_else(|| SsaError::numerical_degeneracy("trailing block is singular"))?;

    let mut values = right
        .transpose()
        .svd(false, false)
        .singular_values
        .iter()
        .map(|value| value.min(1.0))
        .collect::<Vec<_>>();
    values.sort_by(|a, b| b.total_cmp(a));
    Ok(values)
}

/// Largest canonical correlation, or `0.0` when either side is empty.
pub fn leading_canonical_correlation(
    covariance: &DMatrix<f64>,
    split: usize,
) -> Result<f64, SsaError> {
    Ok(canonical_correlations(covariance, split)?
        .first()
        .copied()
        .unwrap_or(0.0))
}

/// Principal angles (radians, ascending) between the column spans of `a` and `b`.
///
/// Both bases must share a row count and have full column rank.
pub fn principal_angles(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<Vec<f64>, SsaError> {
    if a.nrows() != b.nrows() {
        return Err(SsaError::invalid_input(format!(
            "bases must share a row count; got {} and {}",
            a.nrows(),
            b.nrows()
        )));
    }
    if a.ncols() == 0 || b.ncols() == 0 {
        return Ok(Vec::new());
    }
    let qa = orthonormal_basis(a, "first basis")?;
    let qb = orthonormal_basis(b, "second basis")?;

    let mut angles = (qa.transpose() * qb)
        .svd(false, false)
        .singular_values
        .iter()
        .map(|cosine| cosine.clamp(0.0, 1.0).acos())
        .collect::<Vec<_>>();
    angles.sort_by(|x, y| x.total_cmp(y));
    Ok(angles)
}

/// Projection distance `sqrt(Σ sin² θ)` over the principal angles of two spans.
pub fn subspace_distance(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<f64, SsaError> {
    Ok(principal_angles(a, b)?
        .iter()
        .map(|angle| angle.sin().powi(2))
        .sum::<f64>()
        .sqrt())
}

/// Column mean of a `d x m` sample matrix.
pub fn empirical_mean(samples: &DMatrix<f64>) -> DVector<f64> {
    samples.column_mean()
}

/// Unbiased covariance (`/ (m - 1)`) of a `d x m` sample matrix.
pub fn empirical_covariance(samples: &DMatrix<f64>) -> Result<DMatrix<f64>, SsaError> {
    let m = samples.ncols();
    if m < 2 {
        return Err(SsaError::invalid_input(format!(
            "empirical covariance needs at least 2 samples; got {m}"
        )));
    }
    let mean = empirical_mean(samples);
    let mut centered = samples.clone();
    for mut column in centered.column_iter_mut() {
        column -= &mean;
    }
    Ok(&centered * centered.transpose() / (m - 1) as f64)
}

/// Compares the empirical moments of `samples` against `mean` and `covariance`.
pub fn moment_errors(
    samples: &DMatrix<f64>,
    mean: &DVector<f64>,
    covariance: &DMatrix<f64>,
) -> Result<MomentErrors, SsaError> {
    let d = samples.nrows();
    if mean.len() != d || covariance.shape() != (d, d) {
        return Err(SsaError::invalid_input(format!(
            "target moments must match sample dimension {d}; got mean length {} and covariance {}x{}",
            mean.len(),
            covariance.nrows(),
            covariance.ncols()
        )));
    }
    let mean_hat = empirical_mean(samples);
    let covariance_hat = empirical_covariance(samples)?;
    let scale = covariance.norm().max(f64::MIN_POSITIVE);
    Ok(MomentErrors {
        mean_error: (mean_hat - mean).norm(),
        covariance_error: (covariance_hat - covariance).norm() / scale,
    })
}

fn lower_cholesky(block: DMatrix<f64>, label: &str) -> Result<DMatrix<f64>, SsaError> {
    block
        .cholesky()
        .map(|cholesky| cholesky.l())
        .ok_or_else(|| SsaError::numerical_degeneracy(format!("{label} is not positive definite")))
}

fn orthonormal_basis(basis: &DMatrix<f64>, label: &str) -> Result<DMatrix<f64>, SsaError> {
    if basis.ncols() > basis.nrows() {
        return Err(SsaError::invalid_input(format!(
            "{label} has more columns ({}) than rows ({})",
            basis.ncols(),
            basis.nrows()
        )));
    }
    let qr = basis.clone().qr();
    let r = qr.r();
    let scale = basis.amax().max(f64::MIN_POSITIVE);
    if r.diagonal().iter().any(|value| value.abs() <= RANK_TOLERANCE * scale) {
        return Err(SsaError::invalid_input(format!(
            "{label} does not have full column rank"
        )));
    }
    Ok(qr.q())
}

/// Evaluation utilities crate name helper.
pub fn crate_name() -> &'static str {
    let _ = ssa_core::crate_name();
    "ssa-eval"
}
