// SPDX-License-Identifier: MIT OR Apache-2.0

use ssa_synth::SsaConfig;

pub struct ByteCursor<'a> {
    data: &'a [u8],
    idx: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, idx: 0 }
    }

    pub fn next_u8(&mut self) -> u8 {
        let value = self.data.get(self.idx).copied().unwrap_or(0);
        self.idx = self.idx.saturating_add(1);
        value
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut bytes = [0_u8; 8];
        for byte in &mut bytes {
            *byte = self.next_u8();
        }
        u64::from_le_bytes(bytes)
    }
}

/// Maps a byte onto `[lo, hi]` in 255 even steps.
pub fn unit_scaled(seed: u8, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * f64::from(seed) / 255.0
}

pub fn bounded(seed: u8, min: usize, max_inclusive: usize) -> usize {
    if max_inclusive <= min {
        min
    } else {
        min + (usize::from(seed) % (max_inclusive - min + 1))
    }
}

/// Small configuration whose fields stay near the valid region but may leave it.
pub fn small_config(cursor: &mut ByteCursor<'_>) -> SsaConfig {
    let epoch_count = bounded(cursor.next_u8(), 0, 6);
    let stationary_dim = bounded(cursor.next_u8(), 0, 4);
    let nonstationary_dim = bounded(cursor.next_u8(), 0, 4);
    let sample_mode = cursor.next_u8();
    let samples_per_epoch = match sample_mode % 3 {
        0 => vec![bounded(cursor.next_u8(), 0, 24)],
        1 => (0..epoch_count)
            .map(|_| bounded(cursor.next_u8(), 0, 24))
            .collect(),
        _ => vec![bounded(cursor.next_u8(), 1, 24); usize::from(sample_mode % 5)],
    };

    SsaConfig {
        samples_per_epoch,
        variance_ratio_min: unit_scaled(cursor.next_u8(), 0.5, 3.0),
        variance_ratio_max: unit_scaled(cursor.next_u8(), 0.5, 4.0),
        correlation_min: unit_scaled(cursor.next_u8(), -0.2, 1.0),
        correlation_max: unit_scaled(cursor.next_u8(), -0.2, 1.1),
        prob_variance_larger: unit_scaled(cursor.next_u8(), -0.1, 1.1),
        randomize_basis: cursor.next_u8() & 1 == 0,
        orthogonal_mixing: cursor.next_u8() & 1 == 0,
        mean_nonstationarity: unit_scaled(cursor.next_u8(), -0.5, 4.0),
        seed: cursor.next_u64(),
        ..SsaConfig::new(epoch_count, stationary_dim, nonstationary_dim)
    }
}
