//! Error types for QSE.

use thiserror::Error;

/// Unified error type for QSE operations.
///
/// Two kinds cover the whole engine surface: `InvalidArgument` for
/// anything rejected at a public boundary (bad qubit index, non-unitary
/// matrix, malformed noise configuration), and `Runtime` for internal
/// inconsistencies that are unreachable on well-formed input.
#[derive(Error, Debug)]
pub enum QseError {
    /// Caller-supplied value rejected at the boundary
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal inconsistency (unknown opcode, degenerate normalization)
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type alias for QSE operations.
pub type Result<T> = std::result::Result<T, QseError>;

impl QseError {
    /// Creates an invalid-argument error with the given message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a runtime error with the given message.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Returns true if this is an invalid-argument error.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QseError::invalid_argument("qubit 5 exceeds total 3");
        assert!(err.to_string().contains("qubit 5"));
        assert!(err.is_invalid_argument());

        let err = QseError::runtime("normalization constant below epsilon");
        assert!(err.to_string().contains("normalization"));
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_result_type() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(QseError::runtime("test error"))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
