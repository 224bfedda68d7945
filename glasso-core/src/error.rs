//! Error types for the graphical lasso solvers.

use thiserror::Error;

/// Errors reported before an ADMM run starts.
///
/// Non-convergence is not an error: it is reported through
/// [`SolveStatus::MaxIterReached`](crate::SolveStatus::MaxIterReached).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlassoError {
    /// Problem data is empty or has inconsistent shapes
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Matrix is not square
    #[error("Matrix for instance {instance} is not square ({rows}x{cols})")]
    NotSquare {
        instance: usize,
        rows: usize,
        cols: usize,
    },

    /// Matrix is not symmetric within tolerance
    #[error("Matrix for instance {instance} is not symmetric (max |A - A^T| = {max_asym:.3e})")]
    NotSymmetric { instance: usize, max_asym: f64 },

    /// A weight or solver parameter that must be strictly positive is not
    #[error("Parameter {name} must be positive and finite, got {value}")]
    NonPositiveParameter { name: &'static str, value: f64 },

    /// Group index map is malformed
    #[error("Invalid group index: {0}")]
    InvalidGroupIndex(String),

    /// Penalty mode not defined for this problem class
    #[error("Unsupported penalty: {0}")]
    UnsupportedPenalty(String),

    /// Warm start does not match the problem
    #[error("Invalid warm start: {0}")]
    InvalidWarmStart(String),
}

/// Result type for graphical lasso operations.
pub type GlassoResult<T> = Result<T, GlassoError>;

pub(crate) fn check_positive(name: &'static str, value: f64) -> GlassoResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GlassoError::NonPositiveParameter { name, value })
    }
}
