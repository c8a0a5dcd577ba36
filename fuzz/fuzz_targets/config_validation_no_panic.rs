// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use ssa_synth::SsaConfig;

fuzz_target!(|data: &[u8]| {
    let Some((&mode, rest)) = data.split_first() else {
        return;
    };

    if mode % 2 == 0 {
        if let Ok(text) = std::str::from_utf8(rest) {
            if let Ok(config) = serde_json::from_str::<SsaConfig>(text) {
                let _ = config.validate();
            }
        }
        return;
    }

    let mut cursor = common::ByteCursor::new(rest);
    let base = common::small_config(&mut cursor);
    let epoch_count = usize::from(cursor.next_u8()).saturating_mul(usize::from(mode));
    let stationary_dim = if cursor.next_u8() == 0xff {
        usize::MAX
    } else {
        base.stationary_dim
    };
    let config = SsaConfig {
        epoch_count,
        stationary_dim,
        variance_ratio_min: f64::from_bits(cursor.next_u64()),
        correlation_max: f64::from_bits(cursor.next_u64()),
        mean_nonstationarity: f64::from_bits(cursor.next_u64()),
        ..base
    };

    if let Ok(validated) = config.validate() {
        assert!(validated.dimension() >= 1);
        assert_eq!(validated.samples_per_epoch.len(), validated.epoch_count);
        assert!(validated.correlation_max < 1.0);
        assert!(validated.variance_ratio_min > 1.0);
    }
});
