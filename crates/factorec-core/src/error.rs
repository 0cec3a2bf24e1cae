//! Error types for matrix factorization.
//!
//! This module defines the error type shared by the core data structures,
//! the training engines and the evaluation harness.

use thiserror::Error;

/// Coarse classification of an [`MfError`].
///
/// Every failure is either a caller mistake (bad configuration, shape
/// mismatch, not enough data) or a numerical breakdown during computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied an argument or data that violates a precondition.
    InvalidArgument,
    /// A computation produced a singular system or non-finite values.
    Numerical,
}

/// Errors that can occur while building, training or evaluating a model.
#[derive(Debug, Clone, Error)]
pub enum MfError {
    /// A parameter has an invalid value.
    ///
    /// Raised for bad configuration values, malformed checkpoint sequences,
    /// out-of-range indices and similar precondition violations.
    #[error("Invalid argument `{parameter}`: {reason}")]
    InvalidArgument {
        /// Name of the offending parameter
        parameter: String,
        /// Description of why the value is invalid
        reason: String,
    },

    /// Dimension mismatch between matrices.
    ///
    /// This error occurs when two matrices that must share a shape do not,
    /// e.g. predictions and the reference matrix of an MSE computation.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// A user has fewer observed ratings than the holdout size.
    #[error(
        "User {user} has {observed} observed ratings, at least {required} are required for the holdout"
    )]
    InsufficientObservations {
        /// Index of the user row
        user: usize,
        /// Number of nonzero entries in the row
        observed: usize,
        /// Number of entries the split wanted to hold out
        required: usize,
    },

    /// Numerical breakdown detected.
    ///
    /// This error occurs when a normal-equation system is not positive
    /// definite, when training diverges to non-finite values, or when the
    /// input matrix is degenerate.
    #[error("Numerical error: {reason}")]
    NumericalError {
        /// Description of the numerical issue
        reason: String,
    },
}

impl MfError {
    /// Create an InvalidArgument error for a named parameter.
    pub fn invalid_argument<S1, S2>(parameter: S1, reason: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::InvalidArgument {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an InsufficientObservations error.
    pub fn insufficient_observations(user: usize, observed: usize, required: usize) -> Self {
        Self::InsufficientObservations {
            user,
            observed,
            required,
        }
    }

    /// Create a NumericalError with a custom reason.
    pub fn numerical_error<S: Into<String>>(reason: S) -> Self {
        Self::NumericalError {
            reason: reason.into(),
        }
    }

    /// Returns the coarse class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. }
            | Self::DimensionMismatch { .. }
            | Self::InsufficientObservations { .. } => ErrorKind::InvalidArgument,
            Self::NumericalError { .. } => ErrorKind::Numerical,
        }
    }

    /// Returns `true` for caller-side precondition violations.
    pub fn is_invalid_argument(&self) -> bool {
        self.kind() == ErrorKind::InvalidArgument
    }

    /// Returns `true` for numerical breakdowns.
    pub fn is_numerical(&self) -> bool {
        self.kind() == ErrorKind::Numerical
    }
}

/// Result type alias for factorization operations.
pub type Result<T> = std::result::Result<T, MfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = MfError::invalid_argument("n_factors", "must be positive, got 0");
        assert!(matches!(err, MfError::InvalidArgument { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid argument `n_factors`: must be positive, got 0"
        );

        let err = MfError::dimension_mismatch("(3, 4)", "(4, 3)");
        assert!(matches!(err, MfError::DimensionMismatch { .. }));
        assert_eq!(err.to_string(), "Dimension mismatch: expected (3, 4), got (4, 3)");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            MfError::invalid_argument("checkpoints", "empty").kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            MfError::dimension_mismatch("a", "b").kind(),
            ErrorKind::InvalidArgument
        );
        assert!(MfError::insufficient_observations(3, 2, 10).is_invalid_argument());
        assert!(MfError::numerical_error("singular gram matrix").is_numerical());
    }

    #[test]
    fn test_insufficient_observations_context() {
        let err = MfError::insufficient_observations(7, 4, 10);
        if let MfError::InsufficientObservations {
            user,
            observed,
            required,
        } = err
        {
            assert_eq!(user, 7);
            assert_eq!(observed, 4);
            assert_eq!(required, 10);
        } else {
            panic!("Expected InsufficientObservations variant");
        }
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            MfError::invalid_argument("learning_rate", "negative"),
            MfError::dimension_mismatch("square", "rectangular"),
            MfError::insufficient_observations(0, 1, 2),
            MfError::numerical_error("non-finite factors"),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
