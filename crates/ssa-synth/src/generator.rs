// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::{SsaConfig, ValidatedConfig};
use crate::mixing::build_mixing_matrix;
use crate::moments::{MeanBudget, build_source_covariances, build_source_means};
use crate::profile::{NonstationarityProfile, sample_profile};
use crate::sampler::sample_epoch;
use crate::transform::{ObservedMoments, transform_all};
use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ssa_core::{GenerationContext, SsaError, stabilize_covariance};
use tracing::{debug, info, warn};

/// Summary of one model construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationDiagnostics {
    /// Seed used when the generator created its own random source.
    pub seed: Option<u64>,
    pub epoch_count: usize,
    pub dimension: usize,
    pub total_samples: usize,
    pub mean_budget: f64,
    /// Epochs whose observed covariance needed diagonal regularization.
    pub regularized_epochs: Vec<usize>,
    pub max_jitter: f64,
    pub warnings: Vec<String>,
}

/// Output of the generative model construction, before any sampling.
///
/// Everything here is fixed once built; [`SsaModel::sample`] can be called any
/// number of times to draw fresh epoch data from the same moments.
#[derive(Clone, Debug, PartialEq)]
pub struct SsaModel {
    config: ValidatedConfig,
    profile: NonstationarityProfile,
    source_covariances: Vec<DMatrix<f64>>,
    source_means: Vec<DVector<f64>>,
    mean_budget: MeanBudget,
    mixing: DMatrix<f64>,
    observed: Vec<ObservedMoments>,
    diagnostics: GenerationDiagnostics,
}

impl SsaModel {
    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn profile(&self) -> &NonstationarityProfile {
        &self.profile
    }

    pub fn source_covariances(&self) -> &[DMatrix<f64>] {
        self.source_covariances.as_slice()
    }

    pub fn source_means(&self) -> &[DVector<f64>] {
        self.source_means.as_slice()
    }

    pub fn mean_budget(&self) -> &MeanBudget {
        &self.mean_budget
    }

    /// The `d x d` mixing matrix shared by every epoch.
    pub fn mixing(&self) -> &DMatrix<f64> {
        &self.mixing
    }

    /// Columns of the mixing matrix that carry the stationary sources.
    pub fn stationary_mixing(&self) -> DMatrix<f64> {
        self.mixing.columns(0, self.config.stationary_dim).into_owned()
    }

    /// Columns of the mixing matrix that carry the non-stationary sources.
    pub fn nonstationary_mixing(&self) -> DMatrix<f64> {
        self.mixing
            .columns(self.config.stationary_dim, self.config.nonstationary_dim)
            .into_owned()
    }

    pub fn observed(&self) -> &[ObservedMoments] {
        self.observed.as_slice()
    }

    pub fn covariances(&self) -> Vec<DMatrix<f64>> {
        self.observed
            .iter()
            .map(|moments| moments.covariance.clone())
            .collect()
    }

    pub fn means(&self) -> Vec<DVector<f64>> {
        self.observed
            .iter()
            .map(|moments| moments.mean.clone())
            .collect()
    }

    pub fn diagnostics(&self) -> &GenerationDiagnostics {
        &self.diagnostics
    }

    /// Draws `samples_per_epoch[i]` observations for every epoch `i`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<DMatrix<f64>>, SsaError> {
        self.observed
            .iter()
            .zip(&self.config.samples_per_epoch)
            .enumerate()
            .map(|(epoch, (moments, &count))| {
                sample_epoch(&moments.mean, &moments.covariance, count, rng).map_err(|err| {
                    match err {
                        SsaError::NumericalDegeneracy(msg) => SsaError::numerical_degeneracy(
                            format!("epoch {epoch}: {msg}"),
                        ),
                        other => other,
                    }
                })
            })
            .collect()
    }
}

/// A built model together with one draw of epoch samples.
#[derive(Clone, Debug, PartialEq)]
pub struct SsaDataset {
    pub model: SsaModel,
    /// One `d x samples_per_epoch[i]` matrix per epoch.
    pub samples: Vec<DMatrix<f64>>,
}

impl SsaDataset {
    pub fn mixing(&self) -> &DMatrix<f64> {
        self.model.mixing()
    }

    pub fn diagnostics(&self) -> &GenerationDiagnostics {
        self.model.diagnostics()
    }

    /// Splits into `(samples, mixing, covariances, means)`.
    pub fn into_parts(
        self,
    ) -> (
        Vec<DMatrix<f64>>,
        DMatrix<f64>,
        Vec<DMatrix<f64>>,
        Vec<DVector<f64>>,
    ) {
        let covariances = self.model.covariances();
        let means = self.model.means();
        (self.samples, self.model.mixing, covariances, means)
    }
}

/// Validated entry point for building models and datasets.
#[derive(Clone, Debug)]
pub struct SsaGenerator {
    config: ValidatedConfig,
}

impl SsaGenerator {
    pub fn new(config: &SsaConfig) -> Result<Self, SsaError> {
        Ok(Self {
            config: config.validate()?,
        })
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// Builds the model and samples it from a source seeded with `config.seed`.
    pub fn generate(&self, ctx: &GenerationContext<'_>) -> Result<SsaDataset, SsaError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut dataset = self.generate_with_rng(&mut rng, ctx)?;
        dataset.model.diagnostics.seed = Some(self.config.seed);
        Ok(dataset)
    }

    /// Like [`SsaGenerator::generate`] but draws from the caller's source.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ctx: &GenerationContext<'_>,
    ) -> Result<SsaDataset, SsaError> {
        let model = self.build_model(rng, ctx)?;
        let samples = model.sample(rng)?;
        ctx.report_progress(1.0);
        info!(
            epochs = model.config.epoch_count,
            dimension = model.config.dimension(),
            total_samples = model.diagnostics.total_samples,
            "ssa dataset generated"
        );
        Ok(SsaDataset { model, samples })
    }

    /// Runs every stage except sampling.
    ///
    /// Draw order: profile, per-epoch bases, raw means and weights, mixing.
    pub fn build_model<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ctx: &GenerationContext<'_>,
    ) -> Result<SsaModel, SsaError> {
        let cfg = &self.config;

        let profile = sample_profile(cfg, rng);
        debug!(
            epochs = cfg.epoch_count,
            nonstationary_dim = cfg.nonstationary_dim,
            "sampled non-stationarity profile"
        );
        ctx.report_progress(0.15);

        let source_covariances = build_source_covariances(cfg, &profile, rng);
        debug!(
            randomize_basis = cfg.randomize_basis,
            "built source covariances"
        );
        ctx.report_progress(0.45);

        let (source_means, mean_budget) = build_source_means(cfg, &profile, rng)?;
        debug!(
            log_det_sum = mean_budget.log_det_sum,
            total = mean_budget.total,
            "scaled source means"
        );
        ctx.record_scalar("log_det_sum", mean_budget.log_det_sum);
        ctx.record_scalar("mean_budget", mean_budget.total);
        ctx.report_progress(0.6);

        let mixing = build_mixing_matrix(cfg.dimension(), cfg.orthogonal_mixing, rng);
        debug!(
            orthogonal = cfg.orthogonal_mixing,
            dimension = cfg.dimension(),
            "built mixing matrix"
        );
        ctx.report_progress(0.7);

        let mut diagnostics = GenerationDiagnostics {
            seed: None,
            epoch_count: cfg.epoch_count,
            dimension: cfg.dimension(),
            total_samples: cfg.total_samples(),
            mean_budget: mean_budget.total,
            ..GenerationDiagnostics::default()
        };

        let mut observed = transform_all(&mixing, &source_covariances, &source_means);
        regularize_observed(&mut observed, &mut diagnostics, ctx)?;
        ctx.report_progress(0.8);

        Ok(SsaModel {
            config: cfg.clone(),
            profile,
            source_covariances,
            source_means,
            mean_budget,
            mixing,
            observed,
            diagnostics,
        })
    }
}

/// Replaces every observed covariance by its PSD-stabilized form and records
/// the epochs that needed diagonal jitter.
fn regularize_observed(
    observed: &mut [ObservedMoments],
    diagnostics: &mut GenerationDiagnostics,
    ctx: &GenerationContext<'_>,
) -> Result<(), SsaError> {
    for (epoch, moments) in observed.iter_mut().enumerate() {
        let stabilized = stabilize_covariance(&moments.covariance)
            .map_err(|err| SsaError::numerical_degeneracy(format!("epoch {epoch}: {err}")))?;
        if stabilized.jitter > 0.0 {
            warn!(
                epoch,
                jitter = stabilized.jitter,
                "observed covariance regularized to restore PSD"
            );
            diagnostics.regularized_epochs.push(epoch);
            diagnostics.max_jitter = diagnostics.max_jitter.max(stabilized.jitter);
            diagnostics.warnings.push(format!(
                "epoch {epoch}: added diagonal jitter {:e} to observed covariance",
                stabilized.jitter
            ));
        }
        moments.covariance = stabilized.matrix;
    }
    ctx.record_scalar("max_jitter", diagnostics.max_jitter);
    Ok(())
}

/// Validates `config` and generates a dataset from its seed, without sinks.
pub fn generate(config: &SsaConfig) -> Result<SsaDataset, SsaError> {
    SsaGenerator::new(config)?.generate(&GenerationContext::new())
}
