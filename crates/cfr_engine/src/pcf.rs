//! Polynomial continued fractions.
//!
//! `PCF(a, b)` stands for `a(0) + b(1)/(a(1) + b(2)/(a(2) + ...))`, i.e. the
//! walk of `M(n) = [[0, b(n)], [1, a(n)]]` from `n = 1`, preceded by
//! `A = [[1, a(0)], [0, 1]]`.

use cfr_poly::{coprime_basis, factor_integer, Poly, RationalFunction};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::config::AnalysisConfig;
use crate::error::{RecurrenceError, Result};
use crate::limit::Limit;
use crate::matrix::Matrix;
use crate::position::Position;
use crate::N_SYMBOL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcf {
    a_n: RationalFunction,
    b_n: RationalFunction,
}

impl Pcf {
    pub fn new(a_n: impl Into<RationalFunction>, b_n: impl Into<RationalFunction>) -> Self {
        Self {
            a_n: a_n.into(),
            b_n: b_n.into(),
        }
    }

    /// `[[0, *], [1, *]]`
    pub fn is_pcf(matrix: &Matrix) -> bool {
        matrix.rows() == 2
            && matrix.cols() == 2
            && matrix.get(0, 0).is_zero()
            && matrix.get(1, 0).is_one()
    }

    pub fn from_matrix(matrix: &Matrix) -> Result<Self> {
        if matrix.rows() != 2 || matrix.cols() != 2 {
            return Err(RecurrenceError::Shape {
                rows: matrix.rows(),
                cols: matrix.cols(),
            });
        }
        if !Self::is_pcf(matrix) {
            return Err(RecurrenceError::PcfShape(matrix.to_string()));
        }
        Ok(Self::new(matrix.get(1, 1).clone(), matrix.get(0, 1).clone()))
    }

    /// Partial denominators `a(n)`
    pub fn a(&self) -> &RationalFunction {
        &self.a_n
    }

    /// Partial numerators `b(n)`
    pub fn b(&self) -> &RationalFunction {
        &self.b_n
    }

    pub fn m(&self) -> Matrix {
        let mut m = Matrix::zeros(2, 2);
        m.set(0, 1, self.b_n.clone());
        m.set(1, 0, RationalFunction::one());
        m.set(1, 1, self.a_n.clone());
        m
    }

    /// `[[1, a(0)], [0, 1]]`; fails when `a` has a pole at 0
    pub fn a_matrix(&self) -> Result<Matrix> {
        let at_zero: BTreeMap<String, Poly> = [(N_SYMBOL.to_string(), Poly::zero())].into_iter().collect();
        let mut m = Matrix::eye(2);
        m.set(0, 1, self.a_n.subs(&at_zero)?);
        Ok(m)
    }

    /// Degrees of the numerators of `(a, b)` in `n`
    pub fn degree(&self) -> (u32, u32) {
        (
            self.a_n.numerator().degree_in(N_SYMBOL),
            self.b_n.numerator().degree_in(N_SYMBOL),
        )
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut symbols = self.a_n.free_symbols();
        symbols.extend(self.b_n.free_symbols());
        symbols
    }

    /// `(c(n)·a(n), c(n-1)·c(n)·b(n))`, same limit
    pub fn inflate(&self, c: &RationalFunction) -> Self {
        Self::new(&self.a_n * c, &self.b_n * &c.shift(N_SYMBOL, -1) * c)
    }

    pub fn deflate(&self, c: &RationalFunction) -> Result<Self> {
        Ok(self.inflate(&c.inv()?))
    }

    /// Equivalent continued fraction with integer polynomial `a` and `b`,
    /// together with the inflation factor that produced it.
    pub fn polynomial_form(&self) -> (Self, RationalFunction) {
        let mut factor = RationalFunction::one();
        let mut pcf = self.clone();

        let den = cfr_poly::lcm(self.a_n.denominator(), self.b_n.denominator());
        if !den.is_constant() {
            let c = RationalFunction::from_poly(den);
            pcf = pcf.inflate(&c);
            factor = c;
        }

        let k = pcf
            .a_n
            .numerator()
            .denominator_lcm()
            .lcm(&pcf.b_n.numerator().denominator_lcm());
        if !k.is_one() {
            let c = RationalFunction::constant(BigRational::from_integer(k));
            pcf = pcf.inflate(&c);
            factor = &factor * &c;
        }
        (pcf, factor)
    }

    /// Strips every common factor; see [`Pcf::deflate_all_with_factor`]
    pub fn deflate_all(&self) -> Self {
        self.deflate_all_with_factor().0
    }

    /// Fully deflated equivalent and the inflation factor `c` with
    /// `result = self.inflate(c)`.
    ///
    /// The pair is first made integral. Each candidate factor `f` of `a` is
    /// then removed while `f | a` and `f·f(n-1) | b` (for `n`-free factors
    /// this reads `f² | b`), recomputing the candidates until nothing
    /// divides. Last goes the largest integer `h` with `h | a`, `h² | b`.
    pub fn deflate_all_with_factor(&self) -> (Self, RationalFunction) {
        let (polynomial, inflation) = self.polynomial_form();
        let mut a = polynomial.a_n.numerator().clone();
        let mut b = polynomial.b_n.numerator().clone();
        if a.is_zero() || b.is_zero() {
            return (polynomial, inflation);
        }

        let mut removed = Poly::one();
        loop {
            let mut progress = false;
            for f in deflation_candidates(&a, &b) {
                let step = &f * &f.shift(N_SYMBOL, -1);
                while let (Some(a_rest), Some(b_rest)) = (a.div_exact(&f), b.div_exact(&step)) {
                    tracing::debug!(target: "cfr::pcf", factor = %f, "deflating");
                    a = a_rest;
                    b = b_rest;
                    removed = &removed * &f;
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }

        let h = integer_deflation(&a.content().to_integer(), &b.content().to_integer());
        if !h.is_one() {
            let scalar = BigRational::from_integer(h.clone());
            let squared = BigRational::from_integer(&h * &h);
            a = a.div_scalar(&scalar).unwrap_or(a);
            b = b.div_scalar(&squared).unwrap_or(b);
            removed = removed.mul_scalar(&scalar);
        }

        let deflation = RationalFunction::from_poly(removed)
            .inv()
            .unwrap_or_else(|_| RationalFunction::one());
        (Self::new(a, b), &inflation * &deflation)
    }

    /// Entries re-canonicalized over their occurring symbols only
    pub fn simplify(&self) -> Self {
        let simplified = self.m().simplify();
        Self::new(simplified.get(1, 1).clone(), simplified.get(0, 1).clone())
    }

    pub fn subs(&self, values: &BTreeMap<String, Poly>) -> Result<Self> {
        Ok(Self::new(self.a_n.subs(values)?, self.b_n.subs(values)?))
    }

    /// `n -> n + k`
    pub fn shift(&self, k: i64) -> Self {
        Self::new(self.a_n.shift(N_SYMBOL, k), self.b_n.shift(N_SYMBOL, k))
    }

    /// Positive integers `n` where `a(n)` or `b(n)` vanishes or has a pole,
    /// ascending
    pub fn singular_points(&self) -> Result<Vec<Position<BigInt>>> {
        let foreign: Vec<String> = self.free_symbols().into_iter().filter(|s| s != N_SYMBOL).collect();
        if !foreign.is_empty() {
            return Err(cfr_poly::PolyError::NotUnivariate { vars: foreign }.into());
        }
        let mut roots = BTreeSet::new();
        for p in [
            self.a_n.numerator(),
            self.a_n.denominator(),
            self.b_n.numerator(),
            self.b_n.denominator(),
        ] {
            if !p.is_zero() {
                roots.extend(p.integer_roots()?);
            }
        }
        Ok(roots
            .into_iter()
            .filter(BigInt::is_positive)
            .map(|r| Position::new().with(N_SYMBOL, r))
            .collect())
    }
}

/// Factors of `a` worth trying, in the order they are removed.
///
/// For a univariate pair these are the irreducible factors of `a`, by
/// ascending mean root, so `f` is removed before `f(n-1)`. With
/// extra symbols, a coprime basis of the square-free parts of `a`, `b` and
/// `b(n+1)` is refined against its own unit shifts, which separates factors
/// fused with their shifted copies (`f·f(n-1)` and the like).
fn deflation_candidates(a: &Poly, b: &Poly) -> Vec<Poly> {
    let univariate = a.free_symbols().iter().chain(&b.free_symbols()).all(|s| s == N_SYMBOL);
    if univariate {
        let mut factors: Vec<Poly> = a.factor_list().1.into_iter().map(|(f, _)| orient(f)).collect();
        factors.sort_by_cached_key(root_centroid);
        return factors;
    }
    let square_free: Vec<Poly> = [a.clone(), b.clone(), b.shift(N_SYMBOL, 1)]
        .iter()
        .flat_map(Poly::square_free)
        .map(|(f, _)| f)
        .collect();
    let shifted: Vec<Poly> = coprime_basis(&square_free)
        .into_iter()
        .flat_map(|f| [f.shift(N_SYMBOL, -1), f.shift(N_SYMBOL, 1), f])
        .collect();
    coprime_basis(&shifted).into_iter().map(orient).collect()
}

/// Mean of the roots of a univariate `f`
fn root_centroid(f: &Poly) -> BigRational {
    let coeffs = f.univariate_coefficients().unwrap_or_default();
    let Some(degree) = coeffs.len().checked_sub(1).filter(|&d| d > 0) else {
        return BigRational::zero();
    };
    let scale = &coeffs[degree] * BigRational::from_integer(BigInt::from(degree));
    -(&coeffs[degree - 1] / scale)
}

/// Positive for the leading coefficient in `n` (or overall, for `n`-free
/// factors), so that deflating keeps the sign of `a`
fn orient(f: Poly) -> Poly {
    let lead = if f.contains_var(N_SYMBOL) {
        f.leading_coeff_in(N_SYMBOL).leading_coefficient()
    } else {
        f.leading_coefficient()
    };
    if lead.is_negative() {
        -f
    } else {
        f
    }
}

/// Largest `h` with `h | a` and `h² | b`
fn integer_deflation(a: &BigInt, b: &BigInt) -> BigInt {
    let g = (a * a).gcd(b);
    if g.is_zero() {
        return BigInt::one();
    }
    factor_integer(&g)
        .into_iter()
        .fold(BigInt::one(), |acc, (p, mult)| acc * num_traits::pow(p, (mult / 2) as usize))
}

// =============================================================================
// Walks, limits and convergence rate
// =============================================================================

impl Pcf {
    fn trajectory() -> Position {
        Position::new().with(N_SYMBOL, 1)
    }

    /// `M(start) · M(start+1) ··· M(start+iterations-1)`
    pub fn walk(&self, iterations: usize, start: i64) -> Result<Matrix> {
        self.m()
            .walk(&Self::trajectory(), iterations, &Position::new().with(N_SYMBOL, start))
    }

    pub fn walk_many(&self, iterations: &[usize], start: i64) -> Result<Vec<Matrix>> {
        self.m()
            .walk_many(&Self::trajectory(), iterations, &Position::new().with(N_SYMBOL, start))
    }

    /// Convergent at `depth`. `A` counts as the first step, so this is
    /// `A · M(1) ··· M(depth-1)`.
    pub fn limit(&self, depth: usize) -> Result<Limit> {
        let mut limits = self.limit_many(&[depth])?;
        limits.pop().ok_or(RecurrenceError::InvalidDepth)
    }

    pub fn limit_many(&self, depths: &[usize]) -> Result<Vec<Limit>> {
        let a = self.a_matrix()?;
        Limit::walk_to_limit(depths, |walked| {
            let steps: Vec<usize> = walked.iter().filter(|&&d| d > 0).map(|d| d - 1).collect();
            let mut walks = self.walk_many(&steps, 1)?.into_iter();
            walked
                .iter()
                .map(|&d| match d {
                    0 => Ok(Matrix::eye(2)),
                    _ => a.checked_mul(&walks.next().ok_or(RecurrenceError::InvalidDepth)?),
                })
                .collect()
        })
    }

    /// Reference value for blind delta: the convergent at `depth · factor`
    fn blind_limit(&self, depth: usize, factor: usize) -> Result<BigRational> {
        self.limit(depth * factor)?.as_rational_number()
    }

    /// Convergence exponent at `depth` against `limit`, or against a deeper
    /// convergent when `limit` is `None`
    pub fn delta(&self, depth: usize, limit: Option<&BigRational>) -> Result<f64> {
        self.delta_with_config(depth, limit, &AnalysisConfig::default())
    }

    pub fn delta_with_config(
        &self,
        depth: usize,
        limit: Option<&BigRational>,
        config: &AnalysisConfig,
    ) -> Result<f64> {
        let reference = match limit {
            Some(l) => l.clone(),
            None => self.blind_limit(depth, config.blind_delta_factor)?,
        };
        self.limit(depth)?.delta(&reference)
    }

    /// `delta` at every depth `1..=depth` from a single walk. Blind mode uses
    /// one reference convergent at `depth · blind_delta_factor`.
    pub fn delta_sequence(&self, depth: usize, limit: Option<&BigRational>) -> Result<Vec<f64>> {
        self.delta_sequence_with_config(depth, limit, &AnalysisConfig::default())
    }

    pub fn delta_sequence_with_config(
        &self,
        depth: usize,
        limit: Option<&BigRational>,
        config: &AnalysisConfig,
    ) -> Result<Vec<f64>> {
        let reference = match limit {
            Some(l) => l.clone(),
            None => self.blind_limit(depth, config.blind_delta_factor)?,
        };
        let depths: Vec<usize> = (1..=depth).collect();
        self.limit_many(&depths)?
            .iter()
            .map(|l| l.delta(&reference))
            .collect()
    }
}

impl fmt::Display for Pcf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PCF({}, {})", self.a_n, self.b_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rf(s: &str) -> RationalFunction {
        s.parse().expect("valid expression")
    }

    fn pcf(a: &str, b: &str) -> Pcf {
        Pcf::new(rf(a), rf(b))
    }

    #[test]
    fn test_from_matrix() {
        let p = pcf("n + 1", "3 - n");
        assert_eq!(Pcf::from_matrix(&p.m()).expect("pcf shape"), p);
        let bad = Matrix::parse_rows(&[&["1", "n"], &["0", "n"]]).expect("valid");
        assert!(matches!(Pcf::from_matrix(&bad), Err(RecurrenceError::PcfShape(_))));
        assert!(matches!(
            Pcf::from_matrix(&Matrix::eye(3)),
            Err(RecurrenceError::Shape { rows: 3, cols: 3 })
        ));
    }

    #[test]
    fn test_degree() {
        assert_eq!(pcf("1 + n - n^2", "3 - n^9").degree(), (2, 9));
    }

    #[test]
    fn test_display() {
        assert_eq!(pcf("n + 1", "n^2").to_string(), "PCF(n + 1, n^2)");
    }

    #[test]
    fn test_singular_points() {
        let p = pcf("n + 1", "(n + 1)*(n - 17)*(n + 59)*(n - 102)");
        let points = p.singular_points().expect("univariate");
        let expected: Vec<Position<BigInt>> = [17, 102]
            .into_iter()
            .map(|r| Position::new().with("n", BigInt::from(r)))
            .collect();
        assert_eq!(points, expected);
        assert!(pcf("n + c", "n").singular_points().is_err());
    }

    #[test]
    fn test_limit() {
        let p = pcf("5 + 10n", "1 - 9n^2");
        let value = p.limit(100).expect("converges").as_f64().expect("numeric");
        let cbrt4 = 4f64.powf(1.0 / 3.0);
        let expected = (cbrt4 + 1.0) / (cbrt4 - 1.0);
        assert!(((value - expected) / expected).abs() < 1e-4);
    }

    #[test]
    fn test_walk_list() {
        let p = pcf("5 + 10n", "1 - 9n^2");
        let iterations = [1, 2, 3, 17, 29, 53, 99];
        let many = p.walk_many(&iterations, 1).expect("walks");
        for (depth, walked) in iterations.iter().zip(&many) {
            assert_eq!(&p.walk(*depth, 1).expect("walks"), walked);
        }
    }

    #[test]
    fn test_walk_start() {
        let p = pcf("n + 7", "3n^2 - 1");
        let iterations = [1usize, 2, 3, 17, 29];
        let total: usize = iterations.iter().sum();
        let expected = p.walk(total, 1).expect("walks");
        let mut actual = Matrix::eye(2);
        let mut start = 1i64;
        for depth in iterations {
            actual = &actual * &p.walk(depth, start).expect("walks");
            start += depth as i64;
        }
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_inflate_constant_and_symbol() {
        let p = pcf("n + 4", "n^2");
        assert_eq!(p.inflate(&rf("3")), pcf("3n + 12", "9n^2"));
        assert_eq!(p.inflate(&rf("c")), pcf("c*(n + 4)", "c^2*n^2"));
    }

    #[test]
    fn test_inflate_poly() {
        let p = pcf("n + 4", "n^2");
        let c = rf("n^7 + 5n - 3");
        let expected = pcf(
            "(n^7 + 5n - 3)*(n + 4)",
            "((n - 1)^7 + 5*(n - 1) - 3)*(n^7 + 5n - 3)*n^2",
        );
        assert_eq!(p.inflate(&c), expected);
        assert_eq!(p.m().inflate(&c, "n").expect("square"), p.inflate(&c).m());
    }

    #[test]
    fn test_deflate() {
        let p = pcf("n + 4", "n^2");
        assert_eq!(pcf("c*(n + 4)", "c^2*n^2").deflate(&rf("c")).expect("nonzero"), p);
        let c = rf("n^7 + 5n - 3");
        assert_eq!(p.inflate(&c).deflate(&c).expect("nonzero"), p);
        assert_eq!(
            p.inflate(&c).m().deflate(&c, "n").expect("square"),
            p.m()
        );
        assert!(p.deflate(&RationalFunction::zero()).is_err());
    }

    #[test]
    fn test_deflate_all_parametric() {
        let c_n = rf("c^2*(7n - 13c)*(2n - 5)^4*(3n + 11)");
        let reduced = pcf("n + c", "n^2 - c*n");
        assert_eq!(reduced.inflate(&c_n).deflate_all(), reduced);
    }

    #[test]
    fn test_deflate_all_to_unit() {
        let p = pcf("n^2 + 1", "n^4 - 2n^3 + 3n^2 - 2n + 2");
        assert_eq!(p.deflate_all(), pcf("1", "1"));
    }

    #[test]
    fn test_deflate_all_shifted_factors() {
        let p = pcf(
            "9n^4 + 72n^3 + 201n^2 + 228n + 85",
            "-18n^8 - 225n^7 - 1131n^6 - 2904n^5 - 3932n^4 - 2400n^3 + 66n^2 + 769n + 255",
        );
        let expected = pcf("3n^2 + 9n + 5", "-2n^4 - 9n^3 - 9n^2 + n + 3");
        let deflated = p.deflate_all();
        assert_eq!(deflated, expected);
        assert_eq!(deflated.deflate_all(), expected);
    }

    #[test]
    fn test_deflate_all_chained_linear_factors() {
        let p = pcf("n*(n - 1)", "n*(n - 1)*(n - 2)");
        assert_eq!(p.deflate_all(), pcf("n - 1", "n - 2"));
    }

    #[test]
    fn test_deflate_all_chained_quadratic_factors() {
        let p = pcf(
            "(n^2 + 1)*((n - 1)^2 + 1)",
            "(n^2 + 1)*((n - 1)^2 + 1)*((n - 2)^2 + 1)",
        );
        assert_eq!(p.deflate_all(), pcf("(n - 1)^2 + 1", "(n - 2)^2 + 1"));
    }

    #[test]
    fn test_deflate_all_parametric_chain() {
        let p = pcf("(n + c)*(n - 1 + c)", "(n + c)*(n - 1 + c)*(n - 2 + c)");
        let deflated = p.deflate_all();
        assert_eq!(deflated.degree(), (1, 1));
        let (_, factor) = p.deflate_all_with_factor();
        assert_eq!(p.inflate(&factor), deflated);
    }

    #[test]
    fn test_deflate_all_rational_and_integer_content() {
        assert_eq!(pcf("1/2", "1/4").deflate_all(), pcf("1", "1"));
        assert_eq!(pcf("2n + 2", "4n^2").deflate_all(), pcf("n + 1", "n^2"));
        let p = pcf("1/n", "1");
        let (polynomial, factor) = p.polynomial_form();
        assert_eq!(polynomial, pcf("1", "n*(n - 1)"));
        assert_eq!(p.inflate(&factor), polynomial);
    }

    #[test]
    fn test_deflate_all_factor_reproduces_result() {
        let p = pcf("6n + 6", "9n^2*(n + 1)*n");
        let (deflated, factor) = p.deflate_all_with_factor();
        assert_eq!(p.inflate(&factor), deflated);
    }

    #[test]
    fn test_precision_e() {
        let limit = pcf("n", "n").limit(1025).expect("converges");
        assert_eq!(limit.precision().expect("numeric"), 2642);
    }

    #[test]
    fn test_precision_phi() {
        let limit = pcf("1", "1").limit(1025).expect("converges");
        assert_eq!(limit.precision().expect("numeric"), 427);
    }

    #[test]
    fn test_delta_sequence_agrees_with_delta() {
        let p = pcf("2n + 1", "n^2");
        let four_over_pi = BigRational::new(
            BigInt::parse_bytes(b"12732395447351626861510701069801", 10).expect("digits"),
            BigInt::from(10).pow(31),
        );
        let sequence = p.delta_sequence(50, Some(&four_over_pi)).expect("numeric");
        assert_eq!(sequence.len(), 50);
        for (depth, value) in (1..=50).zip(&sequence) {
            assert_eq!(p.delta(depth, Some(&four_over_pi)).expect("numeric"), *value);
        }
    }

    #[test]
    fn test_blind_delta_sequence_agrees_with_blind_delta() {
        let p = pcf("2n + 1", "n^2");
        let reference = p.limit(100).expect("converges").as_rational_number().expect("numeric");
        let sequence = p.delta_sequence(50, None).expect("numeric");
        for (depth, value) in (1..=50).zip(&sequence) {
            assert_eq!(p.delta(depth, Some(&reference)).expect("numeric"), *value);
        }
    }

    fn decimal(digits: &str) -> BigRational {
        let (whole, fraction) = digits.split_once('.').expect("decimal point");
        let numer = BigInt::parse_bytes(format!("{whole}{fraction}").as_bytes(), 10).expect("digits");
        BigRational::new(numer, BigInt::from(10).pow(fraction.len() as u32))
    }

    #[test]
    fn test_identify_pi() {
        let pi = decimal("3.14159265358979323846264338327950288419716939937510582097494459230781640628620899862803483");
        let limit = pcf("2n + 1", "n^2").limit(100).expect("converges");
        let relation = limit.identify(&pi).expect("numeric").expect("4/pi");
        assert_eq!(relation.indices, vec![0, 1]);
        assert_eq!(relation.numerator, vec![BigInt::zero(), BigInt::from(4)]);
        assert_eq!(relation.denominator, vec![BigInt::one(), BigInt::zero()]);
        assert_eq!(relation.to_string(), "0 = 4*p1 - L*(p0)");
    }

    #[test]
    fn test_identify_e() {
        let e = decimal("2.71828182845904523536028747135266249775724709369995957496696762772407663035354759457138218");
        let limit = pcf("n", "n").limit(60).expect("converges");
        let relation = limit.identify(&e).expect("numeric").expect("1/(e - 1)");
        assert_eq!(relation.numerator, vec![BigInt::one(), BigInt::one()]);
        assert_eq!(relation.denominator, vec![BigInt::one(), BigInt::zero()]);
        assert_eq!(limit.identify_rational().expect("numeric"), None);
    }

    #[test]
    #[ignore = "deep walk"]
    fn test_blind_delta_apery() {
        let p = pcf("34n^3 + 51n^2 + 27n + 5", "-n^6");
        assert!(p.delta(2000, None).expect("numeric") > 0.08);
    }
}
