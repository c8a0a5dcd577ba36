// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::rotation::random_rotation;
use nalgebra::DMatrix;
use rand::Rng;

/// Half-width of the uniform distribution for non-orthogonal mixing entries.
pub const MIXING_ENTRY_HALF_WIDTH: f64 = 0.5;

/// Builds the `d x d` mixing matrix shared by every epoch.
///
/// Orthogonal mixing reuses [`random_rotation`]. Otherwise entries are uniform
/// in `[-0.5, 0.5]` and each column is scaled to unit Euclidean norm; a column
/// that comes out exactly zero is redrawn.
pub fn build_mixing_matrix<R: Rng + ?Sized>(
    dimension: usize,
    orthogonal: bool,
    rng: &mut R,
) -> DMatrix<f64> {
    if orthogonal {
        return random_rotation(dimension, rng);
    }

    let mut mixing = DMatrix::zeros(dimension, dimension);
    for col in 0..dimension {
        loop {
            for row in 0..dimension {
                mixing[(row, col)] =
                    rng.random_range(-MIXING_ENTRY_HALF_WIDTH..=MIXING_ENTRY_HALF_WIDTH);
            }
            let norm = mixing.column(col).norm();
            if norm > 0.0 {
                for row in 0..dimension {
                    mixing[(row, col)] /= norm;
                }
                break;
            }
        }
    }
    mixing
}

#[cfg(test)]
mod tests {
    use super::build_mixing_matrix;
    use nalgebra::DMatrix;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn normalized_mixing_has_unit_norm_columns() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for d in 1..=7 {
            let mixing = build_mixing_matrix(d, false, &mut rng);
            assert_eq!(mixing.shape(), (d, d));
            for col in mixing.column_iter() {
                assert!((col.norm() - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn normalized_mixing_is_not_orthogonal_in_general() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mixing = build_mixing_matrix(5, false, &mut rng);
        let gram = mixing.transpose() * &mixing;
        let off_diagonal = (gram - DMatrix::<f64>::identity(5, 5)).amax();
        assert!(off_diagonal > 1e-3);
    }

    #[test]
    fn orthogonal_mixing_satisfies_a_at_equals_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let mixing = build_mixing_matrix(6, true, &mut rng);
        let defect = (&mixing * mixing.transpose() - DMatrix::<f64>::identity(6, 6)).amax();
        assert!(defect < 1e-9, "defect={defect}");
    }

    #[test]
    fn single_dimension_orthogonal_mixing_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        assert_eq!(build_mixing_matrix(1, true, &mut rng), DMatrix::identity(1, 1));
        let normalized = build_mixing_matrix(1, false, &mut rng);
        assert!((normalized[(0, 0)].abs() - 1.0).abs() < 1e-15);
    }
}
