//! Error types for grid-kernels.

use thiserror::Error;

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by grid and matrix constructors and by engine setup.
///
/// Non-convergence is not an error: it is reported through
/// [`Termination::Capped`](crate::Termination::Capped).
#[derive(Error, Debug)]
pub enum Error {
    /// Grid or matrix dimensions are inconsistent with the supplied data.
    #[error("Invalid dimension: {rows}x{cols} ({reason})")]
    InvalidDimension {
        rows: usize,
        cols: usize,
        reason: &'static str,
    },

    /// Operand shapes do not agree for the requested operation.
    #[error("Shape mismatch in '{op}': expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// The grid has more cells than there are distinct nonzero labels.
    #[error("Grid of {cells} cells exceeds the label space ({max} cells)")]
    GridTooLarge { cells: usize, max: usize },

    /// A schedule name that is not one of `sequential`, `rows`, `columns`, `tiles`.
    #[error("Unknown schedule '{0}' (expected sequential, rows, columns, or tiles)")]
    UnknownSchedule(String),

    /// The worker pool could not be created.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
