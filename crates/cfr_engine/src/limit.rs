//! Convergents extracted from walk matrices.
//!
//! A [`Limit`] holds the walk matrix at some depth together with the matrix
//! one step earlier. The current matrix gives the convergent `p/q`, the
//! pair of them gives the precision (matching decimal digits between two
//! consecutive convergents).
//!
//! All arithmetic is exact; logarithms of huge integers go through
//! [`log10_abs`], which only looks at the bit length and the top bits.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;

use crate::error::{RecurrenceError, Result};
use crate::matrix::Matrix;
use crate::pslq::{self, pslq};
use cfr_poly::PolyError;

/// Row and column vectors `(v, w)` extracting the scalar `v · M · w`
pub type ExtractionVectors = (Matrix, Matrix);

/// Digits used by `as_rounded_number` when consecutive convergents coincide
const EXACT_DIGITS: usize = 50;

/// Working precision cap for relation searches
const MAX_IDENTIFY_BITS: u32 = 4096;

#[derive(Debug, Clone)]
pub struct Limit {
    current: Matrix,
    previous: Matrix,
    p_vectors: ExtractionVectors,
    q_vectors: ExtractionVectors,
}

/// `log10 |x|`; `-inf` for zero.
///
/// Uses the bit length plus the top 53 bits, so it works for integers far
/// beyond the `f64` range.
pub fn log10_abs(x: &BigInt) -> f64 {
    if x.is_zero() {
        return f64::NEG_INFINITY;
    }
    let magnitude = x.abs();
    let bits = magnitude.bits();
    if bits <= 53 {
        return magnitude.to_f64().map_or(f64::NAN, f64::log10);
    }
    let shift = bits - 53;
    let top = (&magnitude >> shift).to_f64().unwrap_or(f64::NAN);
    top.log10() + shift as f64 * std::f64::consts::LOG10_2
}

/// `log10 |x|` for a rational
pub fn log10_abs_rational(x: &BigRational) -> f64 {
    log10_abs(x.numer()) - log10_abs(x.denom())
}

/// Default numerator extraction: first row, last column
fn default_p_vectors(n: usize) -> ExtractionVectors {
    (Matrix::e(n, 0, false), Matrix::e(n, n.saturating_sub(1), true))
}

/// Default denominator extraction: second row, last column
fn default_q_vectors(n: usize) -> ExtractionVectors {
    (Matrix::e(n, 1.min(n.saturating_sub(1)), false), Matrix::e(n, n.saturating_sub(1), true))
}

impl Limit {
    pub fn new(current: Matrix, previous: Matrix) -> Self {
        let n = current.rows();
        Self {
            current,
            previous,
            p_vectors: default_p_vectors(n),
            q_vectors: default_q_vectors(n),
        }
    }

    /// Replace the extraction vectors for `p` and `q`
    pub fn with_vectors(mut self, p_vectors: ExtractionVectors, q_vectors: ExtractionVectors) -> Self {
        self.p_vectors = p_vectors;
        self.q_vectors = q_vectors;
        self
    }

    pub fn current(&self) -> &Matrix {
        &self.current
    }

    pub fn previous(&self) -> &Matrix {
        &self.previous
    }

    /// Matrix dimension
    pub fn n(&self) -> usize {
        self.current.rows()
    }

    /// Walks to every depth in `iterations` and to the depth before it, in
    /// one call to `walk`, then pairs them up. Results follow the order of
    /// `iterations`.
    pub fn walk_to_limit<F>(iterations: &[usize], walk: F) -> Result<Vec<Limit>>
    where
        F: FnOnce(&[usize]) -> Result<Vec<Matrix>>,
    {
        if iterations.contains(&0) {
            return Err(RecurrenceError::InvalidDepth);
        }
        let mut seen = std::collections::BTreeSet::new();
        if !iterations.iter().all(|d| seen.insert(*d)) {
            return Err(RecurrenceError::DuplicateIterations);
        }
        let mut depths: Vec<usize> = iterations.iter().flat_map(|&d| [d - 1, d]).collect();
        depths.sort_unstable();
        depths.dedup();

        let matrices = walk(&depths)?;
        tracing::debug!(target: "cfr::walk", requested = iterations.len(), walked = depths.len(), "limits");

        let mut limits = Vec::with_capacity(iterations.len());
        for depth in iterations {
            // Both depths were requested above
            let current = depths.binary_search(depth).map_err(|_| RecurrenceError::InvalidDepth)?;
            let previous = depths.binary_search(&(depth - 1)).map_err(|_| RecurrenceError::InvalidDepth)?;
            limits.push(Limit::new(matrices[current].clone(), matrices[previous].clone()));
        }
        Ok(limits)
    }

    fn extract(matrix: &Matrix, vectors: &ExtractionVectors) -> Result<BigRational> {
        let scalar = vectors.0.checked_mul(matrix)?.checked_mul(&vectors.1)?;
        if scalar.rows() != 1 || scalar.cols() != 1 {
            return Err(RecurrenceError::Shape {
                rows: scalar.rows(),
                cols: scalar.cols(),
            });
        }
        scalar
            .get(0, 0)
            .constant_value()
            .ok_or_else(|| RecurrenceError::NonNumeric(matrix.free_symbols().into_iter().collect()))
    }

    /// The convergent as an integer pair `(p, q)` (not reduced).
    /// `previous` selects the matrix one step earlier.
    pub fn as_rational(&self, previous: bool) -> Result<(BigInt, BigInt)> {
        let matrix = if previous { &self.previous } else { &self.current };
        let p = Self::extract(matrix, &self.p_vectors)?;
        let q = Self::extract(matrix, &self.q_vectors)?;
        Ok((p.numer() * q.denom(), p.denom() * q.numer()))
    }

    pub fn as_rational_number(&self) -> Result<BigRational> {
        let (p, q) = self.as_rational(false)?;
        if q.is_zero() {
            return Err(PolyError::DivisionByZero.into());
        }
        Ok(BigRational::new(p, q))
    }

    /// Matching decimal digits between the current and previous convergents:
    /// `floor(-log10 |p1/q1 - p2/q2|)`.
    ///
    /// Zero when either denominator vanishes, `i64::MAX` when the two
    /// convergents are equal.
    pub fn precision(&self) -> Result<i64> {
        let (p1, q1) = self.as_rational(false)?;
        let (p2, q2) = self.as_rational(true)?;
        let denominator = &q1 * &q2;
        if denominator.is_zero() {
            return Ok(0);
        }
        let numerator = &p1 * &q2 - &q1 * &p2;
        if numerator.is_zero() {
            return Ok(i64::MAX);
        }
        let digits = log10_abs(&denominator) - log10_abs(&numerator);
        Ok(digits.floor() as i64)
    }

    /// Truncated decimal expansion of the convergent with `digits` fractional digits
    pub fn as_decimal(&self, digits: usize) -> Result<String> {
        Ok(decimal_string(&self.as_rational_number()?, digits))
    }

    pub fn as_f64(&self) -> Result<f64> {
        let text = self.as_decimal(20)?;
        text.parse::<f64>()
            .map_err(|e| RecurrenceError::Poly(PolyError::Parse(e.to_string())))
    }

    /// The shortest decimal string within `10^-precision` of the convergent
    pub fn as_rounded_number(&self) -> Result<String> {
        let value = self.as_rational_number()?;
        let precision = self.precision()?;
        if precision == i64::MAX {
            return Ok(decimal_string(&value, EXACT_DIGITS));
        }
        let err = if precision >= 0 {
            BigRational::new(BigInt::one(), BigInt::from(10u32).pow(precision as u32))
        } else {
            BigRational::from_integer(BigInt::from(10u32).pow(precision.unsigned_abs() as u32))
        };
        let digits = precision.max(0) as usize + 5;
        let original = decimal_string(&value, digits);
        let up = round_attempt(&original, &decimal_string(&(&value + &err), digits));
        let down = round_attempt(&original, &decimal_string(&(&value - &err), digits));
        Ok(match (up, down) {
            (Some(a), Some(b)) => {
                if b.len() < a.len() {
                    b
                } else {
                    a
                }
            }
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => original,
        })
    }

    /// Convergence exponent against the limit `l`:
    /// `|p/q - l| = q'^(-1 - delta)` with `q' = |q / gcd(p, q)|`.
    ///
    /// Infinite when `q' = 1` or when the convergent equals `l` exactly.
    pub fn delta(&self, l: &BigRational) -> Result<f64> {
        let (p, q) = self.as_rational(false)?;
        if q.is_zero() {
            return Err(PolyError::DivisionByZero.into());
        }
        let g = p.gcd(&q);
        let reduced_q = (&q / &g).abs();
        if reduced_q.is_one() {
            return Ok(f64::INFINITY);
        }
        let error = (l - BigRational::new(p, q)).abs();
        if error.is_zero() {
            return Ok(f64::INFINITY);
        }
        Ok(-(1.0 + log10_abs_rational(&error) / log10_abs(&reduced_q)))
    }
}

// =============================================================================
// Integer relations
// =============================================================================

/// `0 = Σ a_i·p_i - L·Σ b_i·p_i` over entries `p_i` of the last column of
/// the walk matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerRelation {
    /// Column entries taking part, ascending
    pub indices: Vec<usize>,
    /// `a_i`, one per index
    pub numerator: Vec<BigInt>,
    /// `b_i`, one per index; empty for a relation without `L`
    pub denominator: Vec<BigInt>,
}

impl Limit {
    /// Entries of the last column of the current matrix
    fn last_column(&self) -> Result<Vec<BigRational>> {
        let last = self.current.cols().saturating_sub(1);
        self.current
            .col(last)
            .iter()
            .map(|entry| {
                entry
                    .constant_value()
                    .ok_or_else(|| RecurrenceError::NonNumeric(self.current.free_symbols().into_iter().collect()))
            })
            .collect()
    }

    /// Bits of the precision, clamped to what the relation search handles
    fn working_bits(&self) -> Result<u32> {
        let digits = self.precision()?;
        if digits == i64::MAX {
            return Ok(MAX_IDENTIFY_BITS);
        }
        let bits = (digits.max(0) as f64 * std::f64::consts::LOG2_10) as u32;
        Ok(bits.clamp(pslq::MIN_BITS, MAX_IDENTIFY_BITS))
    }

    /// Small integer relation among the last column entries, to within
    /// the precision of the limit
    pub fn identify_rational(&self) -> Result<Option<IntegerRelation>> {
        let column = self.last_column()?;
        let bits = self.working_bits()?;
        Ok(pslq(&column, bits).map(|numerator| IntegerRelation {
            indices: (0..column.len()).collect(),
            numerator,
            denominator: Vec::new(),
        }))
    }

    /// Expresses `l` as a ratio of integer combinations of the last column
    /// entries. Entries that depend on the others are dropped first; `l = 0`
    /// falls back to [`Limit::identify_rational`].
    pub fn identify(&self, l: &BigRational) -> Result<Option<IntegerRelation>> {
        if l.is_zero() {
            return self.identify_rational();
        }
        let column = self.last_column()?;
        let bits = self.working_bits()?;

        let mut indices: Vec<usize> = (0..column.len()).collect();
        while indices.len() > 1 {
            let values: Vec<BigRational> = indices.iter().map(|&i| column[i].clone()).collect();
            let Some(relation) = pslq(&values, bits) else {
                break;
            };
            match relation.iter().rposition(|c| !c.is_zero()) {
                Some(dependent) => {
                    tracing::debug!(target: "cfr::identify", index = indices[dependent], "dropping dependent entry");
                    indices.remove(dependent);
                }
                None => break,
            }
        }

        let mut values: Vec<BigRational> = indices.iter().map(|&i| column[i].clone()).collect();
        values.extend(indices.iter().map(|&i| l * &column[i]));
        Ok(pslq(&values, bits).map(|relation| {
            let (numerator, denominator) = relation.split_at(indices.len());
            IntegerRelation {
                numerator: numerator.to_vec(),
                denominator: denominator.iter().map(|c| -c).collect(),
                indices,
            }
        }))
    }
}

/// `3*p0 - p1`, or `0`
fn linear_combination(indices: &[usize], coefficients: &[BigInt]) -> String {
    let mut out = String::new();
    for (index, c) in indices.iter().zip(coefficients).filter(|(_, c)| !c.is_zero()) {
        let sign = if c.is_negative() { "-" } else { "+" };
        match (out.is_empty(), c.is_negative()) {
            (true, false) => {}
            (true, true) => out.push('-'),
            (false, _) => out.push_str(&format!(" {sign} ")),
        }
        let magnitude = c.abs();
        if magnitude.is_one() {
            out.push_str(&format!("p{index}"));
        } else {
            out.push_str(&format!("{magnitude}*p{index}"));
        }
    }
    if out.is_empty() {
        out.push('0');
    }
    out
}

impl fmt::Display for IntegerRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0 = {}", linear_combination(&self.indices, &self.numerator))?;
        if !self.denominator.is_empty() {
            write!(f, " - L*({})", linear_combination(&self.indices, &self.denominator))?;
        }
        Ok(())
    }
}

impl PartialEq for Limit {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current && self.previous == other.previous
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Limit({}, {})", self.current, self.previous)
    }
}

/// Truncated (toward zero) decimal expansion
fn decimal_string(value: &BigRational, digits: usize) -> String {
    let negative = value.is_negative();
    let numer = value.numer().abs();
    let denom = value.denom();
    let (int_part, rest) = numer.div_rem(denom);
    let scaled = rest * BigInt::from(10u32).pow(digits as u32) / denom;
    let mut out = String::new();
    if negative && !(int_part.is_zero() && scaled.is_zero()) {
        out.push('-');
    }
    out.push_str(&int_part.to_string());
    if digits > 0 {
        let frac = scaled.to_string();
        out.push('.');
        out.push_str(&"0".repeat(digits.saturating_sub(frac.len())));
        out.push_str(&frac);
    }
    out
}

/// Prefix of `with_error` up to and including the first digit that differs
/// from `original`; `None` if that prefix is not a number
fn round_attempt(original: &str, with_error: &str) -> Option<String> {
    let mismatch = original
        .bytes()
        .zip(with_error.bytes())
        .position(|(a, b)| a != b)
        .unwrap_or(original.len().min(with_error.len()));
    let end = (mismatch + 1).min(with_error.len());
    let candidate = with_error[..end].trim_end_matches('.');
    candidate
        .bytes()
        .any(|b| b.is_ascii_digit())
        .then(|| candidate.to_string())
}
