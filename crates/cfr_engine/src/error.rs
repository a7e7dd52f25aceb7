//! Error types for the cfr_engine crate.

use cfr_poly::PolyError;
use thiserror::Error;

/// Errors raised by matrix walks, fields, continued fractions and recurrences.
///
/// Structural violations are returned immediately. Search-style failures
/// (a decomposition candidate that does not fit, a deflation that makes no
/// progress) are not errors; they surface as `None` or empty results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecurrenceError {
    /// Walk/inverse on a non-square matrix, or mismatched operand shapes
    #[error("expected a square matrix, got {rows}x{cols}")]
    Shape { rows: usize, cols: usize },

    /// Trajectory, start and axis key sets disagree
    #[error("key mismatch: expected {expected:?}, found {found:?}")]
    KeyMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Conservation fails for an axis pair
    #[error("matrices of axes {x} and {y} are not conserving")]
    Conservation { x: String, y: String },

    /// An f, f̄ pair that does not generate a field
    #[error("f = {f}, fbar = {fbar} fail the {condition} condition")]
    FfbarCondition {
        condition: &'static str,
        f: String,
        fbar: String,
    },

    /// Matrix is not of the form [[0, b], [1, a]]
    #[error("not a polynomial continued fraction matrix: {0}")]
    PcfShape(String),

    #[error("degenerate recurrence: {0}")]
    DegenerateRecurrence(String),

    /// An axis uses the recurrence variable's name
    #[error("symbol {0} is reserved for the recurrence variable")]
    ReservedSymbol(String),

    /// A field walk along a trajectory with no steps
    #[error("trajectory {0} has no steps")]
    ZeroTrajectory(String),

    /// A field limit whose iterations do not cover one trajectory step
    #[error("{iterations} iterations is less than one step of trajectory size {size}")]
    ShortWalk { iterations: usize, size: usize },

    #[error("requested iterations must be distinct")]
    DuplicateIterations,

    /// Limits need depth >= 1 (the previous step is depth - 1)
    #[error("limit depth must be at least 1")]
    InvalidDepth,

    /// A numeric walk evaluated a zero denominator
    #[error("matrix is singular at {position}")]
    Singular { position: String },

    /// Inverse of a matrix whose determinant is the zero polynomial
    #[error("matrix is not invertible")]
    NotInvertible,

    /// Numeric extraction from a matrix that still has free symbols
    #[error("expected a numeric matrix, found free symbols {0:?}")]
    NonNumeric(Vec<String>),

    #[error(transparent)]
    Poly(#[from] PolyError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RecurrenceError>;
