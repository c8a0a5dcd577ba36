// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Computes a compensated sum using Neumaier's variant of Kahan summation.
///
/// Empty input returns `0.0`. Used for the cross-epoch reductions (log-det
/// totals, weight normalizers) where many similar-magnitude terms are added.
pub fn kahan_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut c = 0.0;
    for &value in values {
        let t = sum + value;
        if sum.abs() >= value.abs() {
            c += (sum - t) + value;
        } else {
            c += (value - t) + sum;
        }
        sum = t;
    }
    sum + c
}

/// Returns true when `actual` is within `abs_tol` of `expected`, or within
/// `rel_tol` scaled by `1 + |expected|`.
pub fn relative_close(actual: f64, expected: f64, abs_tol: f64, rel_tol: f64) -> bool {
    let diff = (actual - expected).abs();
    diff <= abs_tol || diff <= rel_tol * (1.0 + expected.abs())
}
