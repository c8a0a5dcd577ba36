// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::ValidatedConfig;
use nalgebra::{DMatrix, DVector};
use rand::Rng;

/// Sampled non-stationarity targets.
///
/// `variance_ratios` is `dn x epoch_count`: entry `(j, i)` is the variance of
/// non-stationary direction `j` in epoch `i`, relative to the conditional
/// baseline of `1`. `correlations[i]` is the target leading canonical
/// correlation between the two source subspaces in epoch `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct NonstationarityProfile {
    variance_ratios: DMatrix<f64>,
    correlations: Vec<f64>,
}

impl NonstationarityProfile {
    pub fn variance_ratios(&self) -> &DMatrix<f64> {
        &self.variance_ratios
    }

    pub fn correlations(&self) -> &[f64] {
        self.correlations.as_slice()
    }

    /// Variance ratios of every non-stationary direction in `epoch`.
    pub fn epoch_variance_ratios(&self, epoch: usize) -> DVector<f64> {
        self.variance_ratios.column(epoch).into_owned()
    }

    pub fn epoch_count(&self) -> usize {
        self.correlations.len()
    }
}

/// Draws the variance ratios and correlation targets for every epoch.
///
/// Each log-ratio is uniform in `[ln v_min, ln v_max]` and keeps its sign with
/// probability `prob_variance_larger`, so ratios land in `[v_min, v_max]` or
/// in `[1/v_max, 1/v_min]`. Correlation targets are uniform in
/// `[corr_min, corr_max]`, one per epoch.
pub fn sample_profile<R: Rng + ?Sized>(
    cfg: &ValidatedConfig,
    rng: &mut R,
) -> NonstationarityProfile {
    let dn = cfg.nonstationary_dim;
    let log_min = cfg.variance_ratio_min.ln();
    let log_max = cfg.variance_ratio_max.ln();

    let mut variance_ratios = DMatrix::zeros(dn, cfg.epoch_count);
    for epoch in 0..cfg.epoch_count {
        for dim in 0..dn {
            let magnitude = rng.random_range(log_min..=log_max);
            let keep_sign = rng.random::<f64>() < cfg.prob_variance_larger;
            let log_ratio = if keep_sign { magnitude } else { -magnitude };
            variance_ratios[(dim, epoch)] = log_ratio.exp();
        }
    }

    let correlations = (0..cfg.epoch_count)
        .map(|_| rng.random_range(cfg.correlation_min..=cfg.correlation_max))
        .collect();

    NonstationarityProfile {
        variance_ratios,
        correlations,
    }
}
