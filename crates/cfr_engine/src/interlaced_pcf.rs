//! Continued fractions whose partial numerators and denominators cycle
//! through short lists of polynomials.
//!
//! With `a = [a_1, …, a_k]` and `b = [b_1, …, b_l]` both lists are repeated
//! up to the period `p = lcm(k, l)`, and one period of the fraction is the
//! single matrix `M(n) = ∏ [[0, b_i(n)], [1, a_i(n)]]`. That matrix is not a
//! continued fraction matrix itself but reduces to one.

use cfr_poly::RationalFunction;
use num_integer::Integer;
use std::fmt;

use crate::error::{RecurrenceError, Result};
use crate::matrix::Matrix;
use crate::pcf::Pcf;

#[derive(Debug, Clone, PartialEq)]
pub struct InterlacedPcf {
    a0: RationalFunction,
    a_list: Vec<RationalFunction>,
    b_list: Vec<RationalFunction>,
    period: usize,
}

impl InterlacedPcf {
    pub fn new(a0: impl Into<RationalFunction>, a: Vec<RationalFunction>, b: Vec<RationalFunction>) -> Result<Self> {
        if a.is_empty() || b.is_empty() {
            return Err(RecurrenceError::DegenerateRecurrence(
                "interlaced fraction needs at least one a and one b".to_string(),
            ));
        }
        let period = a.len().lcm(&b.len());
        let repeat = |list: &[RationalFunction]| -> Vec<RationalFunction> {
            list.iter().cycle().take(period).cloned().collect()
        };
        Ok(Self {
            a0: a0.into(),
            a_list: repeat(&a),
            b_list: repeat(&b),
            period,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Partial denominators over one period
    pub fn a_list(&self) -> &[RationalFunction] {
        &self.a_list
    }

    /// Partial numerators over one period
    pub fn b_list(&self) -> &[RationalFunction] {
        &self.b_list
    }

    /// One period of the fraction as a single matrix
    pub fn m(&self) -> Result<Matrix> {
        self.a_list
            .iter()
            .zip(&self.b_list)
            .try_fold(Matrix::eye(2), |acc, (a, b)| acc.checked_mul(&Pcf::new(a.clone(), b.clone()).m()))
    }

    /// `[[1, a0], [0, 1]]`
    pub fn a_matrix(&self) -> Matrix {
        let mut m = Matrix::eye(2);
        m.set(0, 1, self.a0.clone());
        m
    }

    /// The fully deflated continued fraction equivalent to one period
    pub fn pcf(&self) -> Result<Pcf> {
        Ok(self.m()?.as_pcf(true)?.pcf)
    }
}

impl fmt::Display for InterlacedPcf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |list: &[RationalFunction]| list.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        write!(f, "InterlacedPCF({}, [{}], [{}])", self.a0, join(&self.a_list), join(&self.b_list))
    }
}
