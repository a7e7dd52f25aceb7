//! Exact polynomial algebra over Q for matrix recurrences: sparse
//! multivariate polynomials, rational functions, gcd, square-free and
//! coprime factorization, rational roots and small system solving.

#![allow(clippy::needless_range_loop)] // Elimination loops index several rows

pub mod display;
pub mod error;
pub mod factor;
pub mod gcd;
pub mod parser;
pub mod poly;
pub mod rational;
pub mod roots;
pub mod solve;

pub use error::PolyError;
pub use factor::{coprime_basis, multiplicity, GcdDomain};
pub use gcd::{gcd, gcd_all, lcm, lcm_all};
pub use parser::{parse_poly, parse_rational_function};
pub use poly::{gcd_bigrational, Monomial, Poly, Term};
pub use rational::RationalFunction;
pub use roots::{divisors, factor_integer};
pub use solve::{satisfies, solve, Solution};
