// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Multi-epoch toy data for Stationary Subspace Analysis.
//!
//! Each epoch is a Gaussian sample `x = A s` where the first `ds` sources are
//! stationary (standard normal in every epoch) and the remaining `dn` sources
//! change variance, mean and their coupling to the stationary block from one
//! epoch to the next. The mixing matrix `A` is drawn once and shared.

pub mod config;
pub mod generator;
pub mod mixing;
pub mod moments;
pub mod profile;
pub mod rotation;
pub mod sampler;
pub mod transform;

pub use config::{SsaConfig, ValidatedConfig};
pub use generator::{GenerationDiagnostics, SsaDataset, SsaGenerator, SsaModel, generate};
pub use mixing::build_mixing_matrix;
pub use moments::{
    EpochBases, MeanBudget, build_source_covariance, build_source_covariances,
    build_source_means, cross_block_scales, nonstationary_block, nonstationary_log_det,
};
pub use profile::{NonstationarityProfile, sample_profile};
pub use rotation::random_rotation;
pub use sampler::sample_epoch;
pub use transform::{ObservedMoments, transform_all, transform_moments};

/// Generator crate name helper.
pub fn crate_name() -> &'static str {
    let _ = ssa_core::crate_name();
    "ssa-synth"
}
