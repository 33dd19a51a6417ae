//! Unified error types for the Strata crates.
//!
//! [`StrataError`] gives I/O, parsing, validation and layout failures one
//! representation at API boundaries; domain code converts into it where
//! errors cross crate seams.

use thiserror::Error;

/// Unified error type for all Strata operations.
#[derive(Error, Debug)]
pub enum StrataError {
    /// I/O errors (file access etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing errors in benchmark or solution files
    #[error("Parse error: {0}")]
    Parse(String),

    /// Input-data validation errors (conflicting references, infeasible area)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Layout-invariant violations (overlapping placement); a bug, not a
    /// data error
    #[error("Layout error: {0}")]
    Layout(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using StrataError.
pub type StrataResult<T> = Result<T, StrataError>;

impl From<anyhow::Error> for StrataError {
    fn from(err: anyhow::Error) -> Self {
        StrataError::Other(err.to_string())
    }
}

impl From<String> for StrataError {
    fn from(s: String) -> Self {
        StrataError::Other(s)
    }
}

impl From<&str> for StrataError {
    fn from(s: &str) -> Self {
        StrataError::Other(s.to_string())
    }
}

// JSON (de)serialization errors surface as parse errors
impl From<serde_json::Error> for StrataError {
    fn from(err: serde_json::Error) -> Self {
        StrataError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StrataError::Config("negative weight".into());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("negative weight"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StrataError = io_err.into();
        assert!(matches!(err, StrataError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> StrataResult<()> {
            Err(StrataError::Validation("test".into()))
        }

        fn outer() -> StrataResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
