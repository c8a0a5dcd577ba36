// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

use libfuzzer_sys::fuzz_target;
use nalgebra::DMatrix;
use ssa_core::{log_det_spd, psd_factor, stabilize_covariance};

const MAX_DIM: usize = 8;

fuzz_target!(|data: &[u8]| {
    let Some((&dim_seed, payload)) = data.split_first() else {
        return;
    };
    let d = usize::from(dim_seed) % (MAX_DIM + 1);

    let mut values = payload
        .chunks_exact(8)
        .take(d * d)
        .map(|chunk| {
            let mut raw = [0_u8; 8];
            raw.copy_from_slice(chunk);
            let value = f64::from_le_bytes(raw);
            if value.is_finite() {
                value.clamp(-1.0e6, 1.0e6)
            } else {
                0.0
            }
        })
        .collect::<Vec<_>>();
    values.resize(d * d, 0.0);

    let matrix = DMatrix::from_row_slice(d, d, &values);
    let _ = log_det_spd(&matrix);
    let _ = psd_factor(&matrix);
    if let Ok(stabilized) = stabilize_covariance(&matrix) {
        assert!(stabilized.jitter >= 0.0);
        assert_eq!(stabilized.matrix.shape(), (d, d));
    }
});
