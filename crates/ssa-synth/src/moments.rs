// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::ValidatedConfig;
use crate::profile::NonstationarityProfile;
use crate::rotation::random_rotation;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use ssa_core::{SsaError, kahan_sum, symmetrize};

/// Half-width of the uniform distribution for raw non-stationary mean components.
pub const RAW_MEAN_HALF_WIDTH: f64 = 0.5;

/// Per-epoch orthogonal bases of the stationary and non-stationary source subspaces.
#[derive(Clone, Debug, PartialEq)]
pub struct EpochBases {
    pub stationary: DMatrix<f64>,
    pub nonstationary: DMatrix<f64>,
}

impl EpochBases {
    pub fn identity(stationary_dim: usize, nonstationary_dim: usize) -> Self {
        Self {
            stationary: DMatrix::identity(stationary_dim, stationary_dim),
            nonstationary: DMatrix::identity(nonstationary_dim, nonstationary_dim),
        }
    }

    /// Draws the stationary rotation first, then the non-stationary one.
    pub fn random<R: Rng + ?Sized>(
        stationary_dim: usize,
        nonstationary_dim: usize,
        rng: &mut R,
    ) -> Self {
        let stationary = random_rotation(stationary_dim, rng);
        let nonstationary = random_rotation(nonstationary_dim, rng);
        Self {
            stationary,
            nonstationary,
        }
    }
}

/// How the cross-epoch mean budget was computed and split.
#[derive(Clone, Debug, PartialEq)]
pub struct MeanBudget {
    /// `Σ_epochs |log det(non-stationary block)|`.
    pub log_det_sum: f64,
    /// `mean_nonstationarity * log_det_sum`; equals `Σ_epochs ‖mean_i‖²`.
    pub total: f64,
    /// Squared mean norm allotted to each epoch.
    pub shares: Vec<f64>,
}

/// Cross-covariance magnitudes that realise canonical correlation `correlation`
/// for the first `count` non-stationary directions.
///
/// With unit stationary variance and conditional non-stationary variance `e`,
/// a cross term `c` yields correlation `c / sqrt(c² + e)`, hence
/// `c = sqrt(e / (corr⁻² - 1))`. A zero target gives exactly zero.
pub fn cross_block_scales(ratios: &DVector<f64>, correlation: f64, count: usize) -> Vec<f64> {
    if correlation <= 0.0 {
        return vec![0.0; count];
    }
    let denominator = correlation.powi(-2) - 1.0;
    ratios
        .iter()
        .take(count)
        .map(|&ratio| (ratio / denominator).sqrt())
        .collect()
}

/// Assembles one epoch's `(ds+dn) x (ds+dn)` source covariance:
///
/// ```text
/// [ I     C                 ]
/// [ Cᵀ    CᵀC + Bn·diag(E)·Bnᵀ ]
/// ```
///
/// where `C = Bs · Craw · Bnᵀ` and `Craw` is `ds x dn` with the cross scales on
/// its leading diagonal.
pub fn build_source_covariance(
    stationary_dim: usize,
    nonstationary_dim: usize,
    ratios: &DVector<f64>,
    correlation: f64,
    bases: &EpochBases,
) -> DMatrix<f64> {
    let ds = stationary_dim;
    let dn = nonstationary_dim;
    let shared = ds.min(dn);

    let mut cross_raw = DMatrix::zeros(ds, dn);
    for (j, scale) in cross_block_scales(ratios, correlation, shared)
        .into_iter()
        .enumerate()
    {
        cross_raw[(j, j)] = scale;
    }
    let cross = &bases.stationary * cross_raw * bases.nonstationary.transpose();

    let conditional = &bases.nonstationary
        * DMatrix::from_diagonal(ratios)
        * bases.nonstationary.transpose();
    let nonstationary_block = symmetrize(&(cross.transpose() * &cross + conditional));

    let mut covariance = DMatrix::zeros(ds + dn, ds + dn);
    covariance
        .view_mut((0, 0), (ds, ds))
        .copy_from(&DMatrix::identity(ds, ds));
    covariance.view_mut((0, ds), (ds, dn)).copy_from(&cross);
    covariance
        .view_mut((ds, 0), (dn, ds))
        .copy_from(&cross.transpose());
    covariance
        .view_mut((ds, ds), (dn, dn))
        .copy_from(&nonstationary_block);
    covariance
}

/// Bottom-right `dn x dn` block of a source covariance.
pub fn nonstationary_block(covariance: &DMatrix<f64>, stationary_dim: usize) -> DMatrix<f64> {
    let dn = covariance.nrows().saturating_sub(stationary_dim);
    covariance
        .view((stationary_dim, stationary_dim), (dn, dn))
        .into_owned()
}

/// `log det` of the non-stationary block built by [`build_source_covariance`].
///
/// The block is `Bn (Crawᵀ Craw + diag(E)) Bnᵀ` with `Crawᵀ Craw` diagonal, so
/// its log-determinant is `Σ_j ln(e_j + c_j²)` whatever the basis, for any
/// spread of ratios.
pub fn nonstationary_log_det(
    ratios: &DVector<f64>,
    correlation: f64,
    stationary_dim: usize,
) -> f64 {
    let shared = stationary_dim.min(ratios.len());
    let scales = cross_block_scales(ratios, correlation, shared);
    let terms = ratios
        .iter()
        .enumerate()
        .map(|(j, &ratio)| {
            let cross = scales.get(j).copied().unwrap_or(0.0);
            (ratio + cross * cross).ln()
        })
        .collect::<Vec<_>>();
    kahan_sum(&terms)
}

/// Builds every epoch's source covariance, drawing fresh bases per epoch when
/// `randomize_basis` is set.
pub fn build_source_covariances<R: Rng + ?Sized>(
    cfg: &ValidatedConfig,
    profile: &NonstationarityProfile,
    rng: &mut R,
) -> Vec<DMatrix<f64>> {
    let ds = cfg.stationary_dim;
    let dn = cfg.nonstationary_dim;
    let fixed_bases = EpochBases::identity(ds, dn);

    (0..cfg.epoch_count)
        .map(|epoch| {
            let ratios = profile.epoch_variance_ratios(epoch);
            let correlation = profile.correlations()[epoch];
            if cfg.randomize_basis {
                let bases = EpochBases::random(ds, dn, rng);
                build_source_covariance(ds, dn, &ratios, correlation, &bases)
            } else {
                build_source_covariance(ds, dn, &ratios, correlation, &fixed_bases)
            }
        })
        .collect()
}

/// Builds the source means and the budget they satisfy.
///
/// Raw non-stationary components are uniform in `[-0.5, 0.5]` and epoch
/// weights uniform in `[0, 1)`; both are always drawn so the random stream
/// does not depend on `mean_nonstationarity`. Each raw vector is rescaled so
/// that `‖mean_i‖² = total * w_i / Σ w`. The stationary part is always zero.
pub fn build_source_means<R: Rng + ?Sized>(
    cfg: &ValidatedConfig,
    profile: &NonstationarityProfile,
    rng: &mut R,
) -> Result<(Vec<DVector<f64>>, MeanBudget), SsaError> {
    let ds = cfg.stationary_dim;
    let dn = cfg.nonstationary_dim;
    let epochs = cfg.epoch_count;
    if profile.epoch_count() != epochs || profile.variance_ratios().nrows() != dn {
        return Err(SsaError::invalid_input(format!(
            "profile must cover {epochs} epochs x {dn} non-stationary dims; got {} x {}",
            profile.epoch_count(),
            profile.variance_ratios().nrows()
        )));
    }

    let raw = (0..epochs)
        .map(|_| {
            DVector::from_fn(dn, |_, _| {
                rng.random_range(-RAW_MEAN_HALF_WIDTH..=RAW_MEAN_HALF_WIDTH)
            })
        })
        .collect::<Vec<_>>();
    let weights = (0..epochs).map(|_| rng.random::<f64>()).collect::<Vec<_>>();

    let log_dets = (0..epochs)
        .map(|epoch| {
            nonstationary_log_det(
                &profile.epoch_variance_ratios(epoch),
                profile.correlations()[epoch],
                ds,
            )
            .abs()
        })
        .collect::<Vec<_>>();
    let log_det_sum = kahan_sum(&log_dets);
    let total = cfg.mean_nonstationarity * log_det_sum;

    let weight_sum = kahan_sum(&weights);
    let shares = if weight_sum > 0.0 {
        weights
            .iter()
            .map(|weight| total * weight / weight_sum)
            .collect::<Vec<_>>()
    } else {
        vec![total / epochs as f64; epochs]
    };

    let means = raw
        .into_iter()
        .zip(&shares)
        .map(|(raw_mean, &share)| {
            let mut mean = DVector::zeros(ds + dn);
            if dn > 0 && share > 0.0 {
                let norm = raw_mean.norm();
                let direction = if norm > 0.0 {
                    raw_mean / norm
                } else {
                    DVector::from_element(dn, (dn as f64).sqrt().recip())
                };
                mean.rows_mut(ds, dn).copy_from(&(direction * share.sqrt()));
            }
            mean
        })
        .collect();

    Ok((
        means,
        MeanBudget {
            log_det_sum,
            total,
            shares,
        },
    ))
}
