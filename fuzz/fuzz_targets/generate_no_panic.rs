// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use ssa_core::{GenerationContext, is_symmetric};
use ssa_synth::SsaGenerator;

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let config = common::small_config(&mut cursor);

    let Ok(generator) = SsaGenerator::new(&config) else {
        return;
    };
    let Ok(dataset) = generator.generate(&GenerationContext::default()) else {
        return;
    };

    let d = config.stationary_dim + config.nonstationary_dim;
    assert_eq!(dataset.samples.len(), config.epoch_count);
    for (epoch, samples) in dataset.samples.iter().enumerate() {
        assert_eq!(samples.nrows(), d);
        assert_eq!(samples.ncols(), generator.config().samples_per_epoch[epoch]);
    }
    for cov in dataset.model.covariances() {
        assert!(is_symmetric(&cov, 1e-12));
    }
});
