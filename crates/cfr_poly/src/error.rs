//! Error types for the cfr_poly crate.

use thiserror::Error;

/// Errors that can occur in polynomial and rational-function operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolyError {
    /// Division by the zero polynomial
    #[error("division by zero")]
    DivisionByZero,

    /// A rational function with non-constant denominator was used as a polynomial
    #[error("expression is not a polynomial: {0}")]
    NotPolynomial(String),

    /// Operation needs a polynomial in at most one variable
    #[error("expected a univariate polynomial, found variables {vars:?}")]
    NotUnivariate { vars: Vec<String> },

    /// Negative exponent applied to a polynomial
    #[error("negative exponent {0} is not allowed here")]
    NegativeExponent(i64),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unconsumed input: {0}")]
    UnconsumedInput(String),
}
