//! Coboundary transforms and companion forms.
//!
//! Two matrices are coboundary equivalent when `M'(n) = U(n) · M(n) · U(n+1)^-1`;
//! their walks then differ only by the boundary factors `U(start)` and
//! `U(end)`. Every matrix with a cyclic vector is equivalent to a companion
//! matrix (ones on the subdiagonal, everything else in the last column),
//! which is what continued fractions and linear recurrences are built from.

use cfr_poly::{Poly, RationalFunction};
use num_rational::BigRational;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{RecurrenceError, Result};
use crate::matrix::Matrix;
use crate::pcf::Pcf;
use crate::N_SYMBOL;

impl Matrix {
    /// `U · M · U(symbol + 1)^-1`
    pub fn coboundary(&self, u: &Matrix, symbol: &str) -> Result<Matrix> {
        self.require_square()?;
        let shifted_inverse = u.shift(symbol, 1).inverse()?;
        u.checked_mul(self)?.checked_mul(&shifted_inverse)
    }

    /// True for ones on the subdiagonal and zeros elsewhere outside the last column
    pub fn is_companion(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.rows();
        (0..n).all(|i| {
            (0..n.saturating_sub(1)).all(|j| {
                let cell = self.get(i, j);
                if i == j + 1 {
                    cell.is_one()
                } else {
                    cell.is_zero()
                }
            })
        })
    }

    /// Krylov basis `V` with columns `e_k, M(n)·e_k, M(n)·M(n+1)·e_k, …`
    /// for the first basis vector `e_k` that makes it invertible.
    fn cyclic_basis(&self, symbol: &str) -> Result<Matrix> {
        self.require_square()?;
        let n = self.rows();
        for k in 0..n {
            let mut columns = Vec::with_capacity(n);
            let mut column = Matrix::e(n, k, true);
            columns.push(column.clone());
            for _ in 1..n {
                column = self.checked_mul(&column.shift(symbol, 1))?;
                columns.push(column.clone());
            }
            let grid: Vec<Vec<RationalFunction>> = (0..n)
                .map(|r| columns.iter().map(|c| c.get(r, 0).clone()).collect())
                .collect();
            let basis = Matrix::from_rows(grid)?;
            if !basis.det()?.is_zero() {
                tracing::debug!(target: "cfr::walk", cyclic_vector = k, "companion basis");
                return Ok(basis);
            }
        }
        Err(RecurrenceError::NotInvertible)
    }

    /// The matrix `U` whose coboundary turns `self` into companion form
    pub fn companion_coboundary_matrix(&self, symbol: &str) -> Result<Matrix> {
        self.cyclic_basis(symbol)?.inverse()
    }

    /// Equivalent companion matrix in `symbol`
    pub fn as_companion(&self, symbol: &str) -> Result<Matrix> {
        let basis = self.cyclic_basis(symbol)?;
        basis
            .inverse()?
            .checked_mul(self)?
            .checked_mul(&basis.shift(symbol, 1))
    }

    /// Diagonal `E(n)` with `E[i][i] = c(n-1)·c(n-2)···c(n-(N-1-i))`.
    ///
    /// `c(n) · E(n) · C · E(n+1)^-1` multiplies the `k`-th recurrence
    /// coefficient of a companion matrix `C` by `c(n)·c(n-1)···c(n-k+1)`.
    pub fn inflation_coboundary_matrix(n: usize, c: &RationalFunction, symbol: &str) -> Matrix {
        let mut e = Matrix::eye(n);
        for i in 0..n {
            let value: RationalFunction = (1..n - i).map(|j| c.shift(symbol, -(j as i64))).product();
            e.set(i, i, value);
        }
        e
    }

    /// Inflation by `c`; for a continued fraction matrix this is
    /// `(a, b) -> (c·a, c(n-1)·c·b)`
    pub fn inflate(&self, c: &RationalFunction, symbol: &str) -> Result<Matrix> {
        self.require_square()?;
        let e = Matrix::inflation_coboundary_matrix(self.rows(), c, symbol);
        Ok(self.coboundary(&e, symbol)?.scale(c))
    }

    pub fn deflate(&self, c: &RationalFunction, symbol: &str) -> Result<Matrix> {
        self.inflate(&c.inv()?, symbol)
    }

    /// Companion form with polynomial entries: the companion matrix
    /// inflated by the lcm of its last column's denominators
    pub fn normalize_companion(&self, symbol: &str) -> Result<Matrix> {
        let companion = if self.is_companion() {
            self.clone()
        } else {
            self.as_companion(symbol)?
        };
        let last = companion.cols().saturating_sub(1);
        let column = companion.col(last);
        let lcm = cfr_poly::lcm_all(column.iter().map(RationalFunction::denominator));
        if lcm.is_constant() {
            return Ok(companion);
        }
        companion.inflate(&RationalFunction::from_poly(lcm), symbol)
    }

    /// Rational points in `symbol` where the matrix has a pole or is not
    /// invertible, ascending
    pub fn singular_points(&self, symbol: &str) -> Result<Vec<BigRational>> {
        let det = self.det()?;
        let foreign: Vec<String> = self
            .free_symbols()
            .into_iter()
            .filter(|s| s != symbol)
            .collect();
        if !foreign.is_empty() {
            return Err(RecurrenceError::Poly(cfr_poly::PolyError::NotUnivariate { vars: foreign }));
        }
        let mut points = BTreeSet::new();
        let critical: Vec<Poly> = vec![det.numerator().clone(), self.denominator_lcm()];
        for p in critical.iter().filter(|p| !p.is_zero()) {
            points.extend(p.rational_roots()?);
        }
        Ok(points.into_iter().collect())
    }

    /// Continued fraction equivalent to this 2×2 matrix.
    ///
    /// The result is always polynomial; with `deflate_all` common factors
    /// are stripped as well.
    pub fn as_pcf(&self, deflate_all: bool) -> Result<PcfFromMatrix> {
        if self.rows() != 2 || self.cols() != 2 {
            return Err(RecurrenceError::Shape {
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        let u = self.companion_coboundary_matrix(N_SYMBOL)?;
        let companion = self.coboundary(&u, N_SYMBOL)?;
        let pcf = Pcf::from_matrix(&companion)?;
        let (polynomial, inflation) = pcf.polynomial_form();
        let (pcf, deflation) = if deflate_all {
            polynomial.deflate_all_with_factor()
        } else {
            (polynomial, RationalFunction::one())
        };
        let factor = &inflation * &deflation;
        let transform = Matrix::inflation_coboundary_matrix(2, &factor, N_SYMBOL).checked_mul(&u)?;
        tracing::debug!(target: "cfr::pcf", %pcf, "matrix reduced to continued fraction");
        Ok(PcfFromMatrix { pcf, transform })
    }
}

/// A continued fraction obtained from a matrix together with the
/// coboundary transform relating the two
#[derive(Debug, Clone, PartialEq)]
pub struct PcfFromMatrix {
    pub pcf: Pcf,
    /// `T` with `pcf.m() ∝ T(n) · M(n) · T(n+1)^-1`
    pub transform: Matrix,
}

impl PcfFromMatrix {
    /// Möbius transform between the matrix's limit and the continued
    /// fraction's limit: `pcf.a_matrix() · T(1)`
    pub fn relative_limit(&self) -> Result<Matrix> {
        let at_one: BTreeMap<String, Poly> = [(N_SYMBOL.to_string(), Poly::from(1))].into_iter().collect();
        self.pcf.a_matrix()?.checked_mul(&self.transform.subs(&at_one)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(grid: &[&[&str]]) -> Matrix {
        Matrix::parse_rows(grid).expect("valid matrix")
    }

    fn rf(s: &str) -> RationalFunction {
        s.parse().expect("valid expression")
    }

    #[test]
    fn test_is_companion() {
        assert!(m(&[&["0", "n^2"], &["1", "n"]]).is_companion());
        assert!(m(&[&["0", "0", "1"], &["1", "0", "n"], &["0", "1", "2"]]).is_companion());
        assert!(!m(&[&["1", "n^2"], &["1", "n"]]).is_companion());
        assert!(!m(&[&["0", "n^2"], &["2", "n"]]).is_companion());
    }

    #[test]
    fn test_as_companion_is_coboundary() {
        let a = m(&[&["1", "n"], &["n", "n + 1"]]);
        let companion = a.as_companion("n").expect("cyclic");
        assert!(companion.is_companion());
        let u = a.companion_coboundary_matrix("n").expect("cyclic");
        assert_eq!(a.coboundary(&u, "n").expect("invertible"), companion);
    }

    #[test]
    fn test_as_companion_3x3_preserves_det_up_to_coboundary() {
        let a = m(&[&["1", "n", "0"], &["0", "1", "n"], &["1", "0", "2"]]);
        let companion = a.as_companion("n").expect("cyclic");
        assert!(companion.is_companion());
        let u = a.companion_coboundary_matrix("n").expect("cyclic");
        let det_ratio = companion
            .det()
            .expect("square")
            .checked_div(&a.det().expect("square"))
            .expect("nonzero");
        let expected = u
            .det()
            .expect("square")
            .checked_div(&u.shift("n", 1).det().expect("square"))
            .expect("nonzero");
        assert_eq!(det_ratio, expected);
    }

    #[test]
    fn test_cyclic_vector_fallback() {
        // e_0 is an eigenvector, e_1 is cyclic
        let a = m(&[&["n", "1"], &["0", "2"]]);
        assert!(a.as_companion("n").expect("cyclic").is_companion());
        assert_eq!(
            Matrix::eye(2).as_companion("n"),
            Err(RecurrenceError::NotInvertible)
        );
    }

    #[test]
    fn test_inflate_companion_matches_formula() {
        let c = m(&[&["0", "0", "n^3"], &["1", "0", "n^2"], &["0", "1", "n"]]);
        let factor = rf("n + 2");
        let inflated = c.inflate(&factor, "n").expect("square");
        let expected = m(&[
            &["0", "0", "n^3 * (n + 2) * (n + 1) * n"],
            &["1", "0", "n^2 * (n + 2) * (n + 1)"],
            &["0", "1", "n * (n + 2)"],
        ]);
        assert_eq!(inflated, expected);
        assert_eq!(inflated.deflate(&factor, "n").expect("square"), c);
    }

    #[test]
    fn test_normalize_companion() {
        let c = m(&[&["0", "1/n"], &["1", "1/(n+1)"]]);
        let normalized = c.normalize_companion("n").expect("companion");
        assert!(normalized.is_companion());
        assert!(normalized.is_polynomial());
    }

    #[test]
    fn test_singular_points() {
        let a = m(&[&["0", "(n - 3)*(2n + 1)"], &["1", "1/(n + 4)"]]);
        let points = a.singular_points("n").expect("univariate");
        let expected: Vec<BigRational> = ["-4", "-1/2", "3"]
            .iter()
            .map(|s| rf(s).constant_value().expect("constant"))
            .collect();
        assert_eq!(points, expected);
        assert!(m(&[&["c", "n"], &["1", "1"]]).singular_points("n").is_err());
    }

    #[test]
    fn test_as_pcf_of_pcf_matrix() {
        let pcf = Pcf::new(rf("2n + 1"), rf("n^2"));
        let from = pcf.m().as_pcf(false).expect("2x2");
        assert_eq!(from.pcf, pcf);
        assert_eq!(from.transform, Matrix::eye(2));
    }

    #[test]
    fn test_as_pcf_general_matrix() {
        let a = m(&[&["1", "n"], &["n", "n + 1"]]);
        let from = a.as_pcf(false).expect("2x2");
        let x = a.coboundary(&from.transform, "n").expect("invertible");
        assert!(x.get(0, 0).is_zero());
        let scaled = x.checked_div_scalar(x.get(1, 0)).expect("nonzero");
        assert_eq!(scaled, from.pcf.m());
        assert!(from.pcf.a().is_polynomial() && from.pcf.b().is_polynomial());
        assert!(from.relative_limit().is_ok());
    }

    #[test]
    fn test_as_pcf_requires_2x2() {
        assert!(matches!(
            Matrix::eye(3).as_pcf(true),
            Err(RecurrenceError::Shape { rows: 3, cols: 3 })
        ));
    }
}
