// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod error;
pub mod linalg;
pub mod numerics;
pub mod observability;

pub use error::SsaError;
pub use linalg::{
    PSD_RELATIVE_TOLERANCE, StabilizedCovariance, is_symmetric, log_det_spd, min_eigenvalue,
    psd_factor, stabilize_covariance, symmetrize,
};
pub use numerics::{kahan_sum, relative_close};
pub use observability::{
    GenerationContext, NoopProgressSink, NoopTelemetrySink, ProgressSink, TelemetrySink,
};

/// Core shared types for the ssa toy-data workspace.
pub fn crate_name() -> &'static str {
    "ssa-core"
}
