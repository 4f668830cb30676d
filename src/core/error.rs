//! Typed errors for the reliability accounting engine
//!
//! Every engine computation is scoped to a single criterion's evaluation.
//! Errors therefore never abort a whole report; the report assembler
//! collects them per criterion instead.

use thiserror::Error;

/// Error raised by the accounting and statistics functions
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    /// Malformed or out-of-range input. The caller's responsibility;
    /// retrying with the same input will fail again.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Degenerate statistical computation. Typically reported to the
    /// user as "insufficient data" rather than retried.
    #[error("numerical error: {reason}")]
    Numerical { reason: String },
}

impl AnalysisError {
    /// Shorthand for an `InvalidInput` error
    pub fn invalid(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Shorthand for a `Numerical` error
    pub fn numerical(reason: impl Into<String>) -> Self {
        AnalysisError::Numerical {
            reason: reason.into(),
        }
    }
}
