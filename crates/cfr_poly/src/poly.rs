//! Sparse multivariate polynomial over Q
//!
//! Representation: terms stored as (coefficient, monomial) pairs.
//! Monomial = Vec<u32> of exponents aligned with the sorted `vars` vector.
//! Operands built over different variable lists are aligned on the fly, so
//! `x + y` works without declaring the variable set up front.
//!
//! # Key Operations
//!
//! - Ring arithmetic through `std::ops` on owned and borrowed values
//! - Simultaneous substitution (`subs`) and exact evaluation (`eval`)
//! - Content / primitive part / exact sparse division
//! - Univariate views (`coefficients_in`) used by gcd, roots and factoring

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, Mul, Neg, Sub};

// =============================================================================
// Types
// =============================================================================

pub type Exp = u32;

/// Monomial = vector of exponents aligned with `vars`
/// Invariant: monomial.len() == vars.len()
pub type Monomial = Vec<Exp>;

/// Term: (coeff != 0, monomial)
pub type Term = (BigRational, Monomial);

/// Sparse multivariate polynomial over Q
#[derive(Clone, Debug, Default)]
pub struct Poly {
    /// Sorted, deduplicated variable list
    pub(crate) vars: Vec<String>,
    /// Terms in ascending lex order by monomial, no zero coefficients
    pub(crate) terms: Vec<Term>,
}

impl Poly {
    /// Create zero polynomial
    pub fn zero() -> Self {
        Self::default()
    }

    /// Create constant 1
    pub fn one() -> Self {
        Self::constant(BigRational::one())
    }

    /// Create from constant (no variables)
    pub fn constant(c: BigRational) -> Self {
        if c.is_zero() {
            Self::zero()
        } else {
            Self {
                vars: Vec::new(),
                terms: vec![(c, Vec::new())],
            }
        }
    }

    pub fn from_integer(c: BigInt) -> Self {
        Self::constant(BigRational::from_integer(c))
    }

    /// Create monomial x (single variable with exp 1)
    pub fn var(name: &str) -> Self {
        Self {
            vars: vec![name.to_string()],
            terms: vec![(BigRational::one(), vec![1])],
        }
    }

    /// Variable list (may include variables with zero exponent everywhere)
    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Check if constant 1
    pub fn is_one(&self) -> bool {
        self.terms.len() == 1 && self.terms[0].0.is_one() && self.terms[0].1.iter().all(|&e| e == 0)
    }

    /// Check if constant (possibly 0)
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty() || (self.terms.len() == 1 && self.terms[0].1.iter().all(|&e| e == 0))
    }

    /// Get constant value if constant
    pub fn constant_value(&self) -> Option<BigRational> {
        if self.is_zero() {
            Some(BigRational::zero())
        } else if self.is_constant() {
            Some(self.terms[0].0.clone())
        } else {
            None
        }
    }

    /// Variables that occur with a nonzero exponent
    pub fn free_symbols(&self) -> BTreeSet<String> {
        self.vars
            .iter()
            .enumerate()
            .filter(|(i, _)| self.terms.iter().any(|(_, m)| m[*i] > 0))
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn contains_var(&self, var: &str) -> bool {
        self.degree_in(var) > 0
    }

    fn var_index(&self, var: &str) -> Option<usize> {
        self.vars.binary_search_by(|v| v.as_str().cmp(var)).ok()
    }

    /// Degree in a specific variable
    pub fn degree_in(&self, var: &str) -> u32 {
        match self.var_index(var) {
            Some(i) => self.terms.iter().map(|(_, m)| m[i]).max().unwrap_or(0),
            None => 0,
        }
    }

    /// Total degree (max sum of exponents)
    pub fn total_degree(&self) -> u32 {
        self.terms
            .iter()
            .map(|(_, m)| m.iter().sum::<u32>())
            .max()
            .unwrap_or(0)
    }

    /// Number of terms
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Leading term in lex order (last in sorted list)
    pub fn leading_term(&self) -> Option<&Term> {
        self.terms.last()
    }

    /// Coefficient of the lex-largest monomial
    pub fn leading_coefficient(&self) -> BigRational {
        self.terms
            .last()
            .map(|(c, _)| c.clone())
            .unwrap_or_else(BigRational::zero)
    }
}

// =============================================================================
// Normalization (combine like terms, remove zeros, sort lex)
// =============================================================================

/// Merge two sorted variable lists
fn union_vars(a: &[String], b: &[String]) -> Vec<String> {
    if a == b {
        return a.to_vec();
    }
    let set: BTreeSet<&String> = a.iter().chain(b.iter()).collect();
    set.into_iter().cloned().collect()
}

impl Poly {
    /// Build from BTreeMap (map has Monomial as key, coeff as value)
    pub(crate) fn from_map(vars: Vec<String>, map: BTreeMap<Monomial, BigRational>) -> Self {
        let terms: Vec<Term> = map
            .into_iter()
            .filter(|(_, c)| !c.is_zero())
            .map(|(m, c)| (c, m))
            .collect();
        Self { vars, terms }
    }

    /// Terms re-expressed over `target`, a sorted superset of `self.vars`
    fn terms_over(&self, target: &[String]) -> Vec<Term> {
        if self.vars == target {
            return self.terms.clone();
        }
        let positions: Vec<usize> = self
            .vars
            .iter()
            .map(|v| target.binary_search(v).unwrap_or(0))
            .collect();
        self.terms
            .iter()
            .map(|(c, m)| {
                let mut mono = vec![0; target.len()];
                for (i, &e) in m.iter().enumerate() {
                    mono[positions[i]] += e;
                }
                (c.clone(), mono)
            })
            .collect()
    }

    /// Align to a larger variable set
    pub fn align_vars(&self, target: &[String]) -> Self {
        let vars = union_vars(&self.vars, target);
        let map: BTreeMap<Monomial, BigRational> = self
            .terms_over(&vars)
            .into_iter()
            .map(|(c, m)| (m, c))
            .collect();
        Self::from_map(vars, map)
    }

    /// Drop variables that do not occur
    pub fn compact(mut self) -> Self {
        let keep: Vec<bool> = (0..self.vars.len())
            .map(|i| self.terms.iter().any(|(_, m)| m[i] > 0))
            .collect();
        if keep.iter().all(|&k| k) {
            return self;
        }
        self.vars = self
            .vars
            .iter()
            .zip(keep.iter())
            .filter(|(_, &k)| k)
            .map(|(v, _)| v.clone())
            .collect();
        for (_, m) in self.terms.iter_mut() {
            *m = m
                .iter()
                .zip(keep.iter())
                .filter(|(_, &k)| k)
                .map(|(e, _)| *e)
                .collect();
        }
        self
    }
}

impl PartialEq for Poly {
    fn eq(&self, other: &Self) -> bool {
        if self.vars == other.vars {
            return self.terms == other.terms;
        }
        let a = self.clone().compact();
        let b = other.clone().compact();
        a.vars == b.vars && a.terms == b.terms
    }
}

impl Eq for Poly {}

// =============================================================================
// Arithmetic
// =============================================================================

impl Poly {
    fn add_ref(&self, other: &Self) -> Self {
        if other.is_zero() {
            return self.clone();
        }
        if self.is_zero() {
            return other.clone();
        }
        let vars = union_vars(&self.vars, &other.vars);
        let mut map: BTreeMap<Monomial, BigRational> = self
            .terms_over(&vars)
            .into_iter()
            .map(|(c, m)| (m, c))
            .collect();
        for (c, m) in other.terms_over(&vars) {
            let entry = map.entry(m).or_insert_with(BigRational::zero);
            *entry += c;
        }
        Self::from_map(vars, map)
    }

    fn neg_ref(&self) -> Self {
        let terms = self
            .terms
            .iter()
            .map(|(c, m)| (-c.clone(), m.clone()))
            .collect();
        Self {
            vars: self.vars.clone(),
            terms,
        }
    }

    fn mul_ref(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        if let Some(c) = other.constant_value() {
            return self.mul_scalar(&c);
        }
        if let Some(c) = self.constant_value() {
            return other.mul_scalar(&c);
        }
        let vars = union_vars(&self.vars, &other.vars);
        let lhs = self.terms_over(&vars);
        let rhs = other.terms_over(&vars);

        let mut map: BTreeMap<Monomial, BigRational> = BTreeMap::new();
        for (c1, m1) in &lhs {
            for (c2, m2) in &rhs {
                let mono: Monomial = m1.iter().zip(m2.iter()).map(|(a, b)| a + b).collect();
                let entry = map.entry(mono).or_insert_with(BigRational::zero);
                *entry += c1 * c2;
            }
        }
        Self::from_map(vars, map)
    }

    /// Multiply by scalar
    pub fn mul_scalar(&self, k: &BigRational) -> Self {
        if k.is_zero() {
            return Self::zero();
        }
        let terms = self.terms.iter().map(|(c, m)| (c * k, m.clone())).collect();
        Self {
            vars: self.vars.clone(),
            terms,
        }
    }

    /// Divide by a nonzero scalar
    pub fn div_scalar(&self, k: &BigRational) -> Option<Self> {
        if k.is_zero() {
            return None;
        }
        let terms = self.terms.iter().map(|(c, m)| (c / k, m.clone())).collect();
        Some(Self {
            vars: self.vars.clone(),
            terms,
        })
    }

    /// Power by binary exponentiation
    pub fn pow(&self, exp: u32) -> Self {
        let mut result = Self::one();
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
        result
    }

    /// Partial derivative
    pub fn derivative(&self, var: &str) -> Self {
        let Some(idx) = self.var_index(var) else {
            return Self::zero();
        };
        let mut map = BTreeMap::new();
        for (c, m) in &self.terms {
            if m[idx] == 0 {
                continue;
            }
            let mut mono = m.clone();
            mono[idx] -= 1;
            map.insert(mono, c * BigRational::from_integer(BigInt::from(m[idx])));
        }
        Self::from_map(self.vars.clone(), map)
    }
}

macro_rules! forward_binop {
    ($trait:ident, $method:ident, $inner:ident) => {
        impl $trait<&Poly> for &Poly {
            type Output = Poly;
            fn $method(self, rhs: &Poly) -> Poly {
                self.$inner(rhs)
            }
        }
        impl $trait<Poly> for Poly {
            type Output = Poly;
            fn $method(self, rhs: Poly) -> Poly {
                (&self).$inner(&rhs)
            }
        }
        impl $trait<&Poly> for Poly {
            type Output = Poly;
            fn $method(self, rhs: &Poly) -> Poly {
                (&self).$inner(rhs)
            }
        }
        impl $trait<Poly> for &Poly {
            type Output = Poly;
            fn $method(self, rhs: Poly) -> Poly {
                self.$inner(&rhs)
            }
        }
        impl $trait<i64> for Poly {
            type Output = Poly;
            fn $method(self, rhs: i64) -> Poly {
                (&self).$inner(&Poly::from(rhs))
            }
        }
        impl $trait<i64> for &Poly {
            type Output = Poly;
            fn $method(self, rhs: i64) -> Poly {
                self.$inner(&Poly::from(rhs))
            }
        }
        impl $trait<Poly> for i64 {
            type Output = Poly;
            fn $method(self, rhs: Poly) -> Poly {
                Poly::from(self).$inner(&rhs)
            }
        }
        impl $trait<&Poly> for i64 {
            type Output = Poly;
            fn $method(self, rhs: &Poly) -> Poly {
                Poly::from(self).$inner(rhs)
            }
        }
    };
}

impl Poly {
    fn sub_ref(&self, other: &Self) -> Self {
        self.add_ref(&other.neg_ref())
    }
}

forward_binop!(Add, add, add_ref);
forward_binop!(Sub, sub, sub_ref);
forward_binop!(Mul, mul, mul_ref);

impl Neg for Poly {
    type Output = Poly;
    fn neg(self) -> Poly {
        self.neg_ref()
    }
}

impl Neg for &Poly {
    type Output = Poly;
    fn neg(self) -> Poly {
        self.neg_ref()
    }
}

impl From<i64> for Poly {
    fn from(value: i64) -> Self {
        Self::from_integer(BigInt::from(value))
    }
}

impl From<BigInt> for Poly {
    fn from(value: BigInt) -> Self {
        Self::from_integer(value)
    }
}

impl From<BigRational> for Poly {
    fn from(value: BigRational) -> Self {
        Self::constant(value)
    }
}

impl Zero for Poly {
    fn zero() -> Self {
        Poly::zero()
    }

    fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }
}

impl One for Poly {
    fn one() -> Self {
        Poly::one()
    }
}

impl std::iter::Sum for Poly {
    fn sum<I: Iterator<Item = Poly>>(iter: I) -> Self {
        iter.fold(Poly::zero(), |acc, p| &acc + &p)
    }
}

impl std::iter::Product for Poly {
    fn product<I: Iterator<Item = Poly>>(iter: I) -> Self {
        iter.fold(Poly::one(), |acc, p| &acc * &p)
    }
}

// =============================================================================
// Substitution / Evaluation
// =============================================================================

impl Poly {
    /// Simultaneous substitution of variables by polynomials
    pub fn subs(&self, values: &BTreeMap<String, Poly>) -> Self {
        if !self.vars.iter().any(|v| values.contains_key(v)) {
            return self.clone();
        }
        let bases: Vec<Poly> = self
            .vars
            .iter()
            .map(|v| values.get(v).cloned().unwrap_or_else(|| Poly::var(v)))
            .collect();
        let mut powers: FxHashMap<(usize, Exp), Poly> = FxHashMap::default();
        let mut acc = Poly::zero();
        for (c, m) in &self.terms {
            let mut term = Poly::constant(c.clone());
            for (i, &e) in m.iter().enumerate() {
                if e == 0 {
                    continue;
                }
                let power = powers
                    .entry((i, e))
                    .or_insert_with(|| bases[i].pow(e));
                term = &term * &*power;
            }
            acc = &acc + &term;
        }
        acc.compact()
    }

    pub fn subs_var(&self, var: &str, value: &Poly) -> Self {
        let mut values = BTreeMap::new();
        values.insert(var.to_string(), value.clone());
        self.subs(&values)
    }

    /// var -> var + k
    pub fn shift(&self, var: &str, k: i64) -> Self {
        if k == 0 || !self.contains_var(var) {
            return self.clone();
        }
        self.subs_var(var, &(Poly::var(var) + k))
    }

    /// Evaluate at a rational point; None if a free variable is unassigned
    pub fn eval(&self, values: &BTreeMap<String, BigRational>) -> Option<BigRational> {
        let point: Vec<Option<&BigRational>> = self.vars.iter().map(|v| values.get(v)).collect();
        let mut acc = BigRational::zero();
        for (c, m) in &self.terms {
            let mut term = c.clone();
            for (i, &e) in m.iter().enumerate() {
                if e == 0 {
                    continue;
                }
                let x = point[i]?;
                term *= x.pow(e as i32);
            }
            acc += term;
        }
        Some(acc)
    }

    /// Evaluate a univariate polynomial (or constant) at a rational value
    pub fn eval_univariate(&self, x: &BigRational) -> BigRational {
        let mut acc = BigRational::zero();
        for (c, m) in &self.terms {
            let e: u32 = m.iter().sum();
            acc += c * x.pow(e as i32);
        }
        acc
    }
}

// =============================================================================
// Content / Primitive Part
// =============================================================================

/// GCD of two BigRational (as fractions)
pub fn gcd_bigrational(a: &BigRational, b: &BigRational) -> BigRational {
    if a.is_zero() {
        return b.abs();
    }
    if b.is_zero() {
        return a.abs();
    }
    // gcd of numerators / lcm of denominators
    let num_gcd = a.numer().gcd(b.numer());
    let den_lcm = a.denom().lcm(b.denom());
    BigRational::new(num_gcd, den_lcm)
}

impl Poly {
    /// Content: GCD of all coefficients (positive)
    pub fn content(&self) -> BigRational {
        let mut g = BigRational::zero();
        for (c, _) in &self.terms {
            g = gcd_bigrational(&g, c);
        }
        g
    }

    /// Primitive part: self / content
    pub fn primitive_part(&self) -> (BigRational, Self) {
        let c = self.content();
        if c.is_zero() || c.is_one() {
            return (c, self.clone());
        }
        let pp = self.div_scalar(&c).unwrap_or_else(|| self.clone());
        (c, pp)
    }

    /// Unit-normalized associate: integer coefficients with gcd 1 and a
    /// positive leading coefficient. Nonzero constants normalize to 1.
    pub fn normalize_unit(&self) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let (_, pp) = self.primitive_part();
        if pp.leading_coefficient().is_negative() {
            -pp
        } else {
            pp
        }
    }

    /// Least common multiple of all coefficient denominators
    pub fn denominator_lcm(&self) -> BigInt {
        self.terms
            .iter()
            .fold(BigInt::one(), |acc, (c, _)| acc.lcm(c.denom()))
    }
}

// =============================================================================
// Univariate views
// =============================================================================

impl Poly {
    /// Coefficients in `var`: index i holds the coefficient of var^i.
    /// The coefficients no longer mention `var`. Zero polynomial -> empty.
    pub fn coefficients_in(&self, var: &str) -> Vec<Poly> {
        if self.is_zero() {
            return Vec::new();
        }
        let Some(idx) = self.var_index(var) else {
            return vec![self.clone()];
        };
        let rest: Vec<String> = self
            .vars
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, v)| v.clone())
            .collect();
        let degree = self.degree_in(var) as usize;
        let mut maps: Vec<BTreeMap<Monomial, BigRational>> = vec![BTreeMap::new(); degree + 1];
        for (c, m) in &self.terms {
            let mono: Monomial = m
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, e)| *e)
                .collect();
            maps[m[idx] as usize].insert(mono, c.clone());
        }
        maps.into_iter()
            .map(|map| Poly::from_map(rest.clone(), map))
            .collect()
    }

    /// Inverse of `coefficients_in`
    pub fn from_coefficients(var: &str, coeffs: &[Poly]) -> Self {
        let x = Poly::var(var);
        let mut acc = Poly::zero();
        let mut power = Poly::one();
        for (i, c) in coeffs.iter().enumerate() {
            if i > 0 {
                power = &power * &x;
            }
            if !c.is_zero() {
                acc = &acc + &(c * &power);
            }
        }
        acc
    }

    /// Leading coefficient when viewed as a polynomial in `var`
    pub fn leading_coeff_in(&self, var: &str) -> Poly {
        self.coefficients_in(var).pop().unwrap_or_default()
    }

    /// Rational coefficients of a univariate polynomial, index = power
    pub fn univariate_coefficients(&self) -> Result<Vec<BigRational>, crate::PolyError> {
        let symbols = self.free_symbols();
        if symbols.len() > 1 {
            return Err(crate::PolyError::NotUnivariate {
                vars: symbols.into_iter().collect(),
            });
        }
        let degree = self.total_degree() as usize;
        let mut coeffs = vec![BigRational::zero(); if self.is_zero() { 0 } else { degree + 1 }];
        for (c, m) in &self.terms {
            let e: u32 = m.iter().sum();
            coeffs[e as usize] = c.clone();
        }
        Ok(coeffs)
    }
}

// =============================================================================
// Exact Division (sparse multivariate)
// =============================================================================

impl Poly {
    /// Exact division: self / divisor
    /// Returns None if doesn't divide exactly
    pub fn div_exact(&self, divisor: &Self) -> Option<Self> {
        if divisor.is_zero() {
            return None;
        }
        if self.is_zero() {
            return Some(Self::zero());
        }
        if let Some(c) = divisor.constant_value() {
            return self.div_scalar(&c);
        }

        let vars = union_vars(&self.vars, &divisor.vars);
        let n_vars = vars.len();
        let mut remainder: BTreeMap<Monomial, BigRational> = self
            .terms_over(&vars)
            .into_iter()
            .map(|(c, m)| (m, c))
            .collect();
        let divisor_terms = divisor.terms_over(&vars);
        let mut quotient: BTreeMap<Monomial, BigRational> = BTreeMap::new();

        // Leading term of divisor (largest in lex order)
        let (d_coeff, d_mono) = divisor_terms.last()?.clone();

        loop {
            // Get largest remaining term
            let (r_mono, r_coeff) = match remainder.iter().next_back() {
                Some((m, c)) => (m.clone(), c.clone()),
                None => break,
            };
            let mut q_mono = vec![0u32; n_vars];
            for i in 0..n_vars {
                if r_mono[i] < d_mono[i] {
                    // Cannot divide - not exact
                    return None;
                }
                q_mono[i] = r_mono[i] - d_mono[i];
            }
            let q_coeff = r_coeff / &d_coeff;

            for (dc, dm) in &divisor_terms {
                let sub_mono: Monomial = dm.iter().zip(q_mono.iter()).map(|(a, b)| a + b).collect();
                let entry = remainder.entry(sub_mono).or_insert_with(BigRational::zero);
                *entry -= dc * &q_coeff;
            }
            remainder.retain(|_, c| !c.is_zero());

            let qe = quotient.entry(q_mono).or_insert_with(BigRational::zero);
            *qe += q_coeff;
        }

        Some(Self::from_map(vars, quotient).compact())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> Poly {
        Poly::var("n")
    }

    fn rat(a: i64, b: i64) -> BigRational {
        BigRational::new(BigInt::from(a), BigInt::from(b))
    }

    #[test]
    fn test_mixed_variables_align() {
        let p = Poly::var("x") + Poly::var("y");
        assert_eq!(p.vars(), &["x".to_string(), "y".to_string()]);
        assert_eq!(p.num_terms(), 2);
        let q = &p - &Poly::var("y");
        assert_eq!(q, Poly::var("x"));
    }

    #[test]
    fn test_mul_and_pow() {
        let p = (n() + 1).pow(2);
        assert_eq!(p, &n() * &n() + 2 * n() + 1);
        assert_eq!((n() - 1) * (n() + 1), n().pow(2) - 1);
    }

    #[test]
    fn test_content() {
        let p = 2 * Poly::var("x") + 4 * Poly::var("y");
        assert_eq!(p.content(), rat(2, 1));
        let q = p.mul_scalar(&rat(1, 6));
        assert_eq!(q.content(), rat(1, 3));
    }

    #[test]
    fn test_normalize_unit() {
        let p = (-6 * n() + 4).mul_scalar(&rat(1, 5));
        assert_eq!(p.normalize_unit(), 3 * n() - 2);
        assert!(Poly::from(-7).normalize_unit().is_one());
    }

    #[test]
    fn test_subs_shift() {
        let p = n().pow(2) + 3;
        assert_eq!(p.shift("n", -1), n().pow(2) - 2 * n() + 4);
        let mut values = BTreeMap::new();
        values.insert("n".to_string(), Poly::var("x") + Poly::var("y"));
        let q = p.subs(&values);
        assert!(!q.contains_var("n"));
        assert_eq!(q.degree_in("x"), 2);
    }

    #[test]
    fn test_eval() {
        let p = Poly::var("x") * Poly::var("y") + 1;
        let mut point = BTreeMap::new();
        point.insert("x".to_string(), rat(3, 1));
        assert_eq!(p.eval(&point), None);
        point.insert("y".to_string(), rat(1, 2));
        assert_eq!(p.eval(&point), Some(rat(5, 2)));
    }

    #[test]
    fn test_coefficients_roundtrip() {
        let p = Poly::var("c") * n().pow(2) + n() - 7;
        let coeffs = p.coefficients_in("n");
        assert_eq!(coeffs.len(), 3);
        assert_eq!(coeffs[2], Poly::var("c"));
        assert_eq!(Poly::from_coefficients("n", &coeffs), p);
    }

    #[test]
    fn test_div_exact() {
        let p = n().pow(2) - 1;
        let q = p.div_exact(&(n() - 1)).expect("should divide exactly");
        assert_eq!(q, n() + 1);
    }

    #[test]
    fn test_div_exact_fails() {
        let p = n().pow(2) + 1;
        assert!(p.div_exact(&(n() - 1)).is_none());
    }

    #[test]
    fn test_derivative() {
        let p = n().pow(3) * Poly::var("x") + n();
        assert_eq!(p.derivative("n"), 3 * n().pow(2) * Poly::var("x") + 1);
        assert!(p.derivative("z").is_zero());
    }
}
