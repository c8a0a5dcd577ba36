// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use ssa_core::SsaError;

pub const DEFAULT_SAMPLES_PER_EPOCH: usize = 500;
pub const DEFAULT_VARIANCE_RATIO_MIN: f64 = 1.2;
pub const DEFAULT_VARIANCE_RATIO_MAX: f64 = 1.4;
pub const DEFAULT_CORRELATION_MIN: f64 = 0.0;
pub const DEFAULT_CORRELATION_MAX: f64 = 0.5;
pub const DEFAULT_PROB_VARIANCE_LARGER: f64 = 0.5;

fn default_samples_per_epoch() -> Vec<usize> {
    vec![DEFAULT_SAMPLES_PER_EPOCH]
}

fn default_variance_ratio_min() -> f64 {
    DEFAULT_VARIANCE_RATIO_MIN
}

fn default_variance_ratio_max() -> f64 {
    DEFAULT_VARIANCE_RATIO_MAX
}

fn default_correlation_min() -> f64 {
    DEFAULT_CORRELATION_MIN
}

fn default_correlation_max() -> f64 {
    DEFAULT_CORRELATION_MAX
}

fn default_prob_variance_larger() -> f64 {
    DEFAULT_PROB_VARIANCE_LARGER
}

fn default_true() -> bool {
    true
}

/// Generator configuration.
///
/// `epoch_count`, `stationary_dim` and `nonstationary_dim` are required when
/// deserializing; every other field falls back to its documented default.
/// Unknown keys are rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SsaConfig {
    pub epoch_count: usize,
    pub stationary_dim: usize,
    pub nonstationary_dim: usize,
    /// One count for every epoch, or a single count broadcast to all epochs.
    #[serde(default = "default_samples_per_epoch")]
    pub samples_per_epoch: Vec<usize>,
    #[serde(default = "default_variance_ratio_min")]
    pub variance_ratio_min: f64,
    #[serde(default = "default_variance_ratio_max")]
    pub variance_ratio_max: f64,
    #[serde(default = "default_correlation_min")]
    pub correlation_min: f64,
    #[serde(default = "default_correlation_max")]
    pub correlation_max: f64,
    #[serde(default = "default_prob_variance_larger")]
    pub prob_variance_larger: f64,
    #[serde(default = "default_true")]
    pub randomize_basis: bool,
    #[serde(default)]
    pub orthogonal_mixing: bool,
    #[serde(default)]
    pub mean_nonstationarity: f64,
    #[serde(default)]
    pub seed: u64,
}

impl SsaConfig {
    /// Creates a configuration with every optional field at its default.
    pub fn new(epoch_count: usize, stationary_dim: usize, nonstationary_dim: usize) -> Self {
        Self {
            epoch_count,
            stationary_dim,
            nonstationary_dim,
            samples_per_epoch: default_samples_per_epoch(),
            variance_ratio_min: DEFAULT_VARIANCE_RATIO_MIN,
            variance_ratio_max: DEFAULT_VARIANCE_RATIO_MAX,
            correlation_min: DEFAULT_CORRELATION_MIN,
            correlation_max: DEFAULT_CORRELATION_MAX,
            prob_variance_larger: DEFAULT_PROB_VARIANCE_LARGER,
            randomize_basis: true,
            orthogonal_mixing: false,
            mean_nonstationarity: 0.0,
            seed: 0,
        }
    }

    /// Checks every range and length constraint and returns the resolved
    /// configuration. Nothing is drawn or mutated before the first failure.
    pub fn validate(&self) -> Result<ValidatedConfig, SsaError> {
        if self.epoch_count == 0 {
            return Err(SsaError::invalid_configuration(
                "epoch_count",
                "must be >= 1; got 0",
            ));
        }

        let dimension = self
            .stationary_dim
            .checked_add(self.nonstationary_dim)
            .ok_or_else(|| {
                SsaError::invalid_configuration(
                    "nonstationary_dim",
                    format!(
                        "stationary_dim + nonstationary_dim overflows usize; got {} + {}",
                        self.stationary_dim, self.nonstationary_dim
                    ),
                )
            })?;
        if dimension == 0 {
            return Err(SsaError::invalid_configuration(
                "nonstationary_dim",
                "stationary_dim + nonstationary_dim must be >= 1; got 0",
            ));
        }

        let samples_per_epoch = self.resolve_samples_per_epoch(dimension)?;

        validate_finite(self.variance_ratio_min, "variance_ratio_min")?;
        validate_finite(self.variance_ratio_max, "variance_ratio_max")?;
        if self.variance_ratio_min <= 1.0 {
            return Err(SsaError::invalid_configuration(
                "variance_ratio_min",
                format!("must be > 1.0; got {}", self.variance_ratio_min),
            ));
        }
        if self.variance_ratio_max <= self.variance_ratio_min {
            return Err(SsaError::invalid_configuration(
                "variance_ratio_max",
                format!(
                    "must be > variance_ratio_min; got variance_ratio_min={}, variance_ratio_max={}",
                    self.variance_ratio_min, self.variance_ratio_max
                ),
            ));
        }

        validate_finite(self.correlation_min, "correlation_min")?;
        validate_finite(self.correlation_max, "correlation_max")?;
        if self.correlation_min < 0.0 {
            return Err(SsaError::invalid_configuration(
                "correlation_min",
                format!("must be >= 0.0; got {}", self.correlation_min),
            ));
        }
        if self.correlation_max <= self.correlation_min {
            return Err(SsaError::invalid_configuration(
                "correlation_max",
                format!(
                    "must be > correlation_min; got correlation_min={}, correlation_max={}",
                    self.correlation_min, self.correlation_max
                ),
            ));
        }
        if self.correlation_max >= 1.0 {
            return Err(SsaError::invalid_configuration(
                "correlation_max",
                format!("must be < 1.0; got {}", self.correlation_max),
            ));
        }

        validate_finite(self.prob_variance_larger, "prob_variance_larger")?;
        if !(0.0..=1.0).contains(&self.prob_variance_larger) {
            return Err(SsaError::invalid_configuration(
                "prob_variance_larger",
                format!("must be in [0.0, 1.0]; got {}", self.prob_variance_larger),
            ));
        }

        validate_finite(self.mean_nonstationarity, "mean_nonstationarity")?;
        if self.mean_nonstationarity < 0.0 {
            return Err(SsaError::invalid_configuration(
                "mean_nonstationarity",
                format!("must be >= 0.0; got {}", self.mean_nonstationarity),
            ));
        }

        Ok(ValidatedConfig {
            epoch_count: self.epoch_count,
            stationary_dim: self.stationary_dim,
            nonstationary_dim: self.nonstationary_dim,
            samples_per_epoch,
            variance_ratio_min: self.variance_ratio_min,
            variance_ratio_max: self.variance_ratio_max,
            correlation_min: self.correlation_min,
            correlation_max: self.correlation_max,
            prob_variance_larger: self.prob_variance_larger,
            randomize_basis: self.randomize_basis,
            orthogonal_mixing: self.orthogonal_mixing,
            mean_nonstationarity: self.mean_nonstationarity,
            seed: self.seed,
        })
    }

    fn resolve_samples_per_epoch(&self, dimension: usize) -> Result<Vec<usize>, SsaError> {
        let counts = self.samples_per_epoch.as_slice();
        if counts.len() != 1 && counts.len() != self.epoch_count {
            return Err(SsaError::invalid_configuration(
                "samples_per_epoch",
                format!(
                    "length must be 1 or epoch_count={}; got {}",
                    self.epoch_count,
                    counts.len()
                ),
            ));
        }
        for (index, &count) in counts.iter().enumerate() {
            if count == 0 {
                return Err(SsaError::invalid_configuration(
                    "samples_per_epoch",
                    format!("samples_per_epoch[{index}] must be >= 1; got 0"),
                ));
            }
            if dimension.checked_mul(count).is_none() {
                return Err(SsaError::invalid_configuration(
                    "samples_per_epoch",
                    format!(
                        "dimension*samples_per_epoch[{index}] overflows usize; got dimension={dimension}, count={count}"
                    ),
                ));
            }
        }

        if counts.len() == 1 {
            Ok(vec![counts[0]; self.epoch_count])
        } else {
            Ok(counts.to_vec())
        }
    }
}

/// Configuration that passed [`SsaConfig::validate`].
///
/// `samples_per_epoch` always holds exactly `epoch_count` entries.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedConfig {
    pub epoch_count: usize,
    pub stationary_dim: usize,
    pub nonstationary_dim: usize,
    pub samples_per_epoch: Vec<usize>,
    pub variance_ratio_min: f64,
    pub variance_ratio_max: f64,
    pub correlation_min: f64,
    pub correlation_max: f64,
    pub prob_variance_larger: f64,
    pub randomize_basis: bool,
    pub orthogonal_mixing: bool,
    pub mean_nonstationarity: f64,
    pub seed: u64,
}

impl ValidatedConfig {
    /// Observed dimension `d = ds + dn`.
    pub fn dimension(&self) -> usize {
        self.stationary_dim + self.nonstationary_dim
    }

    pub fn total_samples(&self) -> usize {
        self.samples_per_epoch
            .iter()
            .fold(0usize, |acc, &count| acc.saturating_add(count))
    }
}

fn validate_finite(value: f64, field: &'static str) -> Result<(), SsaError> {
    if !value.is_finite() {
        return Err(SsaError::invalid_configuration(
            field,
            format!("must be finite; got {value}"),
        ));
    }
    Ok(())
}
