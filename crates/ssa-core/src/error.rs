// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Structured error type for the ssa toy-data APIs.
///
/// # Error Philosophy
/// - Configuration problems are reported before any random draw happens and
///   name the offending field.
/// - Numerical problems that survive local regularization surface as
///   `NumericalDegeneracy`; recoverable ones never do.
/// - Expected failures are represented as `SsaError` (not panics).
#[derive(thiserror::Error, Debug)]
pub enum SsaError {
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SsaError {
    /// Creates a `SsaError::InvalidConfiguration` for `field`.
    pub fn invalid_configuration(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }

    /// Creates a `SsaError::NumericalDegeneracy`.
    pub fn numerical_degeneracy(msg: impl Into<String>) -> Self {
        Self::NumericalDegeneracy(msg.into())
    }

    /// Creates a `SsaError::InvalidInput`.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Name of the configuration field that failed validation, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfiguration { field, .. } => Some(*field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SsaError;

    #[test]
    fn helper_constructors_create_expected_variants() {
        match SsaError::invalid_configuration("epoch_count", "must be >= 1; got 0") {
            SsaError::InvalidConfiguration { field, reason } => {
                assert_eq!(field, "epoch_count");
                assert_eq!(reason, "must be >= 1; got 0");
            }
            _ => panic!("expected InvalidConfiguration"),
        }

        match SsaError::numerical_degeneracy("covariance of epoch 3 is not PSD") {
            SsaError::NumericalDegeneracy(msg) => {
                assert_eq!(msg, "covariance of epoch 3 is not PSD")
            }
            _ => panic!("expected NumericalDegeneracy"),
        }

        match SsaError::invalid_input("basis rows 3 != 4") {
            SsaError::InvalidInput(msg) => assert_eq!(msg, "basis rows 3 != 4"),
            _ => panic!("expected InvalidInput"),
        }
    }

    #[test]
    fn display_messages_have_required_prefixes() {
        let err = SsaError::invalid_configuration("correlation_max", "must be < 1.0; got 1");
        assert_eq!(
            err.to_string(),
            "invalid configuration: correlation_max: must be < 1.0; got 1"
        );
        assert!(
            SsaError::numerical_degeneracy("jitter ladder exhausted")
                .to_string()
                .starts_with("numerical degeneracy:")
        );
        assert!(
            SsaError::invalid_input("empty sample matrix")
                .to_string()
                .starts_with("invalid input:")
        );
    }

    #[test]
    fn field_is_only_reported_for_configuration_errors() {
        assert_eq!(
            SsaError::invalid_configuration("samples_per_epoch", "empty").field(),
            Some("samples_per_epoch")
        );
        assert_eq!(SsaError::numerical_degeneracy("x").field(), None);
    }

    #[test]
    fn ssa_error_is_usable_as_std_error_trait_object() {
        let err: Box<dyn std::error::Error> = Box::new(SsaError::numerical_degeneracy("nan"));
        assert_eq!(err.to_string(), "numerical degeneracy: nan");
    }
}
