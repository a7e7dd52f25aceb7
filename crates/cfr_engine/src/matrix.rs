//! Dense matrices of rational functions.
//!
//! Entries are stored row-major as canonical [`RationalFunction`]s, so
//! equality is exact (difference simplifies to zero) and no separate
//! simplification pass is needed after arithmetic.

use cfr_poly::{gcd_bigrational, lcm_all, Poly, RationalFunction};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use crate::error::{RecurrenceError, Result};

/// Matrix of rational functions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<RationalFunction>,
}

// =============================================================================
// Construction / access
// =============================================================================

impl Matrix {
    /// Build from row-major data; fails if `data.len() != rows * cols`
    pub fn new(rows: usize, cols: usize, data: Vec<RationalFunction>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(RecurrenceError::Shape { rows, cols });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from a literal grid; all rows must have the same length
    pub fn from_rows<T: Into<RationalFunction>>(grid: Vec<Vec<T>>) -> Result<Self> {
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows * cols);
        for row in grid {
            if row.len() != cols {
                return Err(RecurrenceError::Shape {
                    rows,
                    cols: row.len(),
                });
            }
            data.extend(row.into_iter().map(Into::into));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from a grid of expression strings, e.g. `[["0", "n^2"], ["1", "2n+1"]]`
    pub fn parse_rows(grid: &[&[&str]]) -> Result<Self> {
        let parsed = grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| RationalFunction::from_str(cell))
                    .collect::<std::result::Result<Vec<_>, _>>()
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::from_rows(parsed)
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![RationalFunction::zero(); rows * cols],
        }
    }

    pub fn eye(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = RationalFunction::one();
        }
        m
    }

    /// Standard basis vector of length `n` with a one at `index`,
    /// as a column (`n×1`) or a row (`1×n`)
    pub fn e(n: usize, index: usize, column: bool) -> Self {
        let mut m = if column {
            Self::zeros(n, 1)
        } else {
            Self::zeros(1, n)
        };
        if index < n {
            m.data[index] = RationalFunction::one();
        }
        m
    }

    /// Matrix with `value` everywhere on the diagonal
    pub fn diagonal(n: usize, value: &RationalFunction) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = value.clone();
        }
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Entry at (row, col)
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> &RationalFunction {
        &self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: RationalFunction) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> Vec<RationalFunction> {
        self.data[row * self.cols..(row + 1) * self.cols].to_vec()
    }

    pub fn col(&self, col: usize) -> Vec<RationalFunction> {
        (0..self.rows).map(|r| self.get(r, col).clone()).collect()
    }

    pub fn entries(&self) -> &[RationalFunction] {
        &self.data
    }

    pub(crate) fn require_square(&self) -> Result<()> {
        if self.is_square() {
            Ok(())
        } else {
            Err(RecurrenceError::Shape {
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    fn map(&self, f: impl Fn(&RationalFunction) -> RationalFunction) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    fn try_map(&self, f: impl Fn(&RationalFunction) -> Result<RationalFunction>) -> Result<Self> {
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect::<Result<Vec<_>>>()?,
        })
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl Matrix {
    /// Matrix product; fails on incompatible shapes
    pub fn checked_mul(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(RecurrenceError::Shape {
                rows: other.rows,
                cols: other.cols,
            });
        }
        let (m, k, p) = (self.rows, self.cols, other.cols);
        let mut data = Vec::with_capacity(m * p);
        for i in 0..m {
            for j in 0..p {
                let mut sum = RationalFunction::zero();
                for t in 0..k {
                    let a = &self.data[i * k + t];
                    let b = &other.data[t * p + j];
                    if a.is_zero() || b.is_zero() {
                        continue;
                    }
                    sum = &sum + &(a * b);
                }
                data.push(sum);
            }
        }
        Ok(Self {
            rows: m,
            cols: p,
            data,
        })
    }

    fn zip_with(
        &self,
        other: &Self,
        f: impl Fn(&RationalFunction, &RationalFunction) -> RationalFunction,
    ) -> Result<Self> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(RecurrenceError::Shape {
                rows: other.rows,
                cols: other.cols,
            });
        }
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| f(a, b)).collect(),
        })
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Multiply every entry by `k`
    pub fn scale(&self, k: &RationalFunction) -> Self {
        self.map(|x| x * k)
    }

    pub fn checked_div_scalar(&self, k: &RationalFunction) -> Result<Self> {
        self.try_map(|x| Ok(x.checked_div(k)?))
    }

    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for j in 0..self.cols {
            for i in 0..self.rows {
                data.push(self.get(i, j).clone());
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Integer power of a square matrix
    pub fn pow(&self, exp: u32) -> Result<Self> {
        self.require_square()?;
        let mut result = Self::eye(self.rows);
        let mut base = self.clone();
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                result = &result * &base;
            }
            e >>= 1;
            if e > 0 {
                base = &base * &base;
            }
        }
        Ok(result)
    }
}

macro_rules! forward_matrix_op {
    ($trait:ident, $method:ident, $checked:ident) => {
        /// # Panics
        ///
        /// Panics on incompatible shapes; use the `checked_*` form to get an error instead.
        impl $trait<&Matrix> for &Matrix {
            type Output = Matrix;
            fn $method(self, rhs: &Matrix) -> Matrix {
                match self.$checked(rhs) {
                    Ok(m) => m,
                    Err(e) => panic!("{e}"),
                }
            }
        }
        impl $trait<Matrix> for Matrix {
            type Output = Matrix;
            fn $method(self, rhs: Matrix) -> Matrix {
                (&self).$method(&rhs)
            }
        }
        impl $trait<&Matrix> for Matrix {
            type Output = Matrix;
            fn $method(self, rhs: &Matrix) -> Matrix {
                (&self).$method(rhs)
            }
        }
    };
}

forward_matrix_op!(Mul, mul, checked_mul);
forward_matrix_op!(Add, add, checked_add);
forward_matrix_op!(Sub, sub, checked_sub);

impl Neg for &Matrix {
    type Output = Matrix;
    fn neg(self) -> Matrix {
        self.map(|x| -x)
    }
}

impl Neg for Matrix {
    type Output = Matrix;
    fn neg(self) -> Matrix {
        -&self
    }
}

// =============================================================================
// Determinant / inverse
// =============================================================================

impl Matrix {
    pub fn det(&self) -> Result<RationalFunction> {
        self.require_square()?;
        Ok(det_of(self.rows, &self.data))
    }

    /// Transpose of the cofactor matrix
    pub fn adjugate(&self) -> Result<Self> {
        self.require_square()?;
        let n = self.rows;
        if n == 1 {
            return Ok(Self::eye(1));
        }
        let mut adj = Self::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let minor = minor_of(&self.data, n, i, j);
                let d = det_of(n - 1, &minor);
                let cofactor = if (i + j) % 2 == 0 { d } else { -d };
                adj.data[j * n + i] = cofactor;
            }
        }
        Ok(adj)
    }

    /// Inverse over the field of rational functions.
    ///
    /// Fails with `NotInvertible` when the determinant is the zero polynomial,
    /// even if it would be nonzero at particular points.
    pub fn inverse(&self) -> Result<Self> {
        let det = self.det()?;
        if det.is_zero() {
            return Err(RecurrenceError::NotInvertible);
        }
        self.adjugate()?.checked_div_scalar(&det)
    }
}

fn det_of(n: usize, data: &[RationalFunction]) -> RationalFunction {
    match n {
        0 => RationalFunction::one(),
        1 => data[0].clone(),
        2 => &data[0] * &data[3] - &data[1] * &data[2],
        3 => {
            let g = |r: usize, c: usize| &data[r * 3 + c];
            let pos = g(0, 0) * &(g(1, 1) * g(2, 2))
                + g(0, 1) * &(g(1, 2) * g(2, 0))
                + g(0, 2) * &(g(1, 0) * g(2, 1));
            let neg = g(0, 2) * &(g(1, 1) * g(2, 0))
                + g(0, 0) * &(g(1, 2) * g(2, 1))
                + g(0, 1) * &(g(1, 0) * g(2, 2));
            pos - neg
        }
        _ => {
            // Cofactor expansion along the first row
            let mut acc = RationalFunction::zero();
            for j in 0..n {
                if data[j].is_zero() {
                    continue;
                }
                let minor = minor_of(data, n, 0, j);
                let term = &data[j] * &det_of(n - 1, &minor);
                acc = if j % 2 == 0 { acc + term } else { acc - term };
            }
            acc
        }
    }
}

fn minor_of(data: &[RationalFunction], n: usize, row: usize, col: usize) -> Vec<RationalFunction> {
    let mut minor = Vec::with_capacity((n - 1) * (n - 1));
    for r in 0..n {
        if r == row {
            continue;
        }
        for c in 0..n {
            if c == col {
                continue;
            }
            minor.push(data[r * n + c].clone());
        }
    }
    minor
}

// =============================================================================
// Substitution and symbols
// =============================================================================

impl Matrix {
    /// Simultaneous substitution of polynomials; fails if a denominator vanishes
    pub fn subs(&self, values: &BTreeMap<String, Poly>) -> Result<Self> {
        if values.is_empty() {
            return Ok(self.clone());
        }
        self.try_map(|x| Ok(x.subs(values)?))
    }

    /// Substitution of rational functions
    pub fn subs_rational(&self, values: &BTreeMap<String, RationalFunction>) -> Result<Self> {
        self.try_map(|x| Ok(x.subs_rational(values)?))
    }

    /// `var -> var + k` in every entry
    pub fn shift(&self, var: &str, k: i64) -> Self {
        self.map(|x| x.shift(var, k))
    }

    /// Entries re-canonicalized over their occurring symbols only
    pub fn simplify(&self) -> Self {
        self.map(|x| {
            let (num, den) = x.clone().into_parts();
            RationalFunction::new(num.compact(), den.compact()).unwrap_or_else(|_| x.clone())
        })
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        self.data.iter().flat_map(RationalFunction::free_symbols).collect()
    }

    pub fn is_polynomial(&self) -> bool {
        self.data.iter().all(RationalFunction::is_polynomial)
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(RationalFunction::is_zero)
    }

    /// Lcm of all entry denominators
    pub fn denominator_lcm(&self) -> Poly {
        lcm_all(self.data.iter().map(RationalFunction::denominator))
    }

    /// The matrix multiplied by the lcm of its denominators
    pub fn as_polynomial(&self) -> Self {
        let lcm = self.denominator_lcm();
        if lcm.is_one() {
            return self.clone();
        }
        self.scale(&RationalFunction::from_poly(lcm))
    }

    /// Exact rational entries, or `NonNumeric` listing the free symbols
    pub fn to_rationals(&self) -> Result<Vec<BigRational>> {
        self.data
            .iter()
            .map(|x| {
                x.constant_value()
                    .ok_or_else(|| RecurrenceError::NonNumeric(self.free_symbols().into_iter().collect()))
            })
            .collect()
    }

    /// Rational gcd of the entries' contents (zero for the zero matrix)
    pub fn gcd(&self) -> BigRational {
        self.data
            .iter()
            .fold(BigRational::zero(), |acc, x| gcd_bigrational(&acc, &x.content()))
    }

    /// The matrix divided by its rational gcd
    pub fn normalize(&self) -> Self {
        let g = self.gcd();
        if g.is_zero() || g.is_one() {
            return self.clone();
        }
        let inv = g.recip();
        self.map(|x| x.mul_scalar(&inv))
    }
}

impl From<Vec<Vec<i64>>> for Matrix {
    /// Integer grid; ragged input is padded with zeros
    fn from(grid: Vec<Vec<i64>>) -> Self {
        let cols = grid.iter().map(Vec::len).max().unwrap_or(0);
        let rows = grid.len();
        let mut data = Vec::with_capacity(rows * cols);
        for mut row in grid {
            row.resize(cols, 0);
            data.extend(row.into_iter().map(RationalFunction::from));
        }
        Self { rows, cols, data }
    }
}

impl From<Vec<Vec<BigInt>>> for Matrix {
    fn from(grid: Vec<Vec<BigInt>>) -> Self {
        let cols = grid.iter().map(Vec::len).max().unwrap_or(0);
        let rows = grid.len();
        let mut data = Vec::with_capacity(rows * cols);
        for mut row in grid {
            row.resize(cols, BigInt::zero());
            data.extend(
                row.into_iter()
                    .map(|x| RationalFunction::constant(BigRational::from_integer(x))),
            );
        }
        Self { rows, cols, data }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for r in 0..self.rows {
            if r > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for c in 0..self.cols {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.get(r, c))?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
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

    fn rat(p: i64, q: i64) -> BigRational {
        BigRational::new(BigInt::from(p), BigInt::from(q))
    }

    #[test]
    fn test_multiply() {
        let a = Matrix::from(vec![vec![1, 2], vec![3, 4]]);
        let b = Matrix::from(vec![vec![5, 6], vec![7, 8]]);
        assert_eq!(&a * &b, Matrix::from(vec![vec![19, 22], vec![43, 50]]));
        let column = Matrix::from(vec![vec![1], vec![1]]);
        assert_eq!(&a * &column, Matrix::from(vec![vec![3], vec![7]]));
        assert!(column.checked_mul(&a).is_err());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let grid = vec![vec![RationalFunction::one()], vec![RationalFunction::one(), RationalFunction::zero()]];
        assert!(matches!(
            Matrix::from_rows(grid),
            Err(RecurrenceError::Shape { .. })
        ));
    }

    #[test]
    fn test_det_and_inverse() {
        let a = m(&[&["x", "1"], &["x^2", "y"]]);
        assert_eq!(a.det().expect("square"), rf("x*y - x^2"));
        let inv = a.inverse().expect("invertible");
        assert_eq!(&a * &inv, Matrix::eye(2));

        let b = m(&[&["1", "2", "0"], &["0", "n", "1"], &["1", "0", "n"]]);
        assert_eq!(b.det().expect("square"), rf("n^2 + 2"));
        assert_eq!(&b.inverse().expect("invertible") * &b, Matrix::eye(3));
    }

    #[test]
    fn test_det_cofactor_4x4() {
        let a = Matrix::from(vec![
            vec![2, 0, 0, 1],
            vec![0, 3, 0, 0],
            vec![0, 0, 4, 0],
            vec![1, 0, 0, 1],
        ]);
        assert_eq!(a.det().expect("square"), RationalFunction::from(12));
    }

    #[test]
    fn test_singular_inverse() {
        let a = m(&[&["n", "n"], &["1", "1"]]);
        assert_eq!(a.inverse(), Err(RecurrenceError::NotInvertible));
        let wide = Matrix::zeros(2, 3);
        assert!(matches!(wide.det(), Err(RecurrenceError::Shape { rows: 2, cols: 3 })));
    }

    #[test]
    fn test_subs_and_shift() {
        let a = m(&[&["0", "n^2"], &["1", "2n + 1"]]);
        let at_three: BTreeMap<String, Poly> = [("n".to_string(), Poly::from(3))].into_iter().collect();
        assert_eq!(
            a.subs(&at_three).expect("no poles"),
            Matrix::from(vec![vec![0, 9], vec![1, 7]])
        );
        assert_eq!(a.shift("n", 1), m(&[&["0", "(n+1)^2"], &["1", "2n + 3"]]));

        let pole = m(&[&["1/(n - 2)"]]);
        let at_two: BTreeMap<String, Poly> = [("n".to_string(), Poly::from(2))].into_iter().collect();
        assert!(pole.subs(&at_two).is_err());
    }

    #[test]
    fn test_gcd_and_normalize() {
        let a = m(&[&["6n", "3/2"], &["9", "0"]]);
        assert_eq!(a.gcd(), rat(3, 2));
        let normalized = a.normalize();
        assert_eq!(normalized.gcd(), rat(1, 1));
        assert_eq!(normalized.scale(&RationalFunction::constant(rat(3, 2))), a);
        assert_eq!(Matrix::zeros(2, 2).normalize(), Matrix::zeros(2, 2));
    }

    #[test]
    fn test_as_polynomial() {
        let a = m(&[&["1/n", "1"], &["0", "1/(n+1)"]]);
        assert!(!a.is_polynomial());
        let p = a.as_polynomial();
        assert!(p.is_polynomial());
        assert_eq!(p.get(0, 1), &rf("n^2 + n"));
    }

    #[test]
    fn test_pow_and_transpose() {
        let fib = Matrix::from(vec![vec![0, 1], vec![1, 1]]);
        assert_eq!(
            fib.pow(10).expect("square"),
            Matrix::from(vec![vec![34, 55], vec![55, 89]])
        );
        let a = Matrix::from(vec![vec![1, 2, 3]]);
        assert_eq!(a.transpose(), Matrix::from(vec![vec![1], vec![2], vec![3]]));
    }

    #[test]
    fn test_display() {
        let a = m(&[&["0", "n^2"], &["1", "1/n"]]);
        assert_eq!(a.to_string(), "[[0, n^2], [1, (1)/(n)]]");
    }
}
