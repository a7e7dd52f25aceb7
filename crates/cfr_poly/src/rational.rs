//! Rational functions over Q: quotients of [`Poly`] kept in a canonical form.
//!
//! Canonical form:
//! - `num` and `den` share no non-constant factor
//! - `den` is unit-normalized (integer coefficients, content 1, positive
//!   leading coefficient)
//! - a constant denominator is folded into the numerator, so polynomials
//!   always have `den == 1`

use num_rational::BigRational;
use num_traits::Zero;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, Mul, Neg, Sub};

use crate::error::PolyError;
use crate::gcd::{gcd, lcm};
use crate::poly::Poly;

#[derive(Clone, Debug)]
pub struct RationalFunction {
    num: Poly,
    den: Poly,
}

impl RationalFunction {
    /// `num / den` in canonical form
    pub fn new(num: Poly, den: Poly) -> Result<Self, PolyError> {
        if den.is_zero() {
            return Err(PolyError::DivisionByZero);
        }
        Ok(Self::canonical(num, den))
    }

    /// Caller guarantees `den != 0`
    fn canonical(num: Poly, den: Poly) -> Self {
        if num.is_zero() {
            return Self::zero();
        }
        if let Some(c) = den.constant_value() {
            return Self::from_poly(num.div_scalar(&c).unwrap_or(num));
        }
        let g = gcd(&num, &den);
        let (num, den) = if g.is_one() {
            (num, den)
        } else {
            (
                num.div_exact(&g).unwrap_or(num),
                den.div_exact(&g).unwrap_or(den),
            )
        };
        if let Some(c) = den.constant_value() {
            return Self::from_poly(num.div_scalar(&c).unwrap_or(num));
        }
        let unit = den.normalize_unit();
        let scale = den.leading_coefficient() / unit.leading_coefficient();
        Self {
            num: num.div_scalar(&scale).unwrap_or(num),
            den: unit,
        }
    }

    pub fn from_poly(p: Poly) -> Self {
        Self {
            num: p,
            den: Poly::one(),
        }
    }

    pub fn zero() -> Self {
        Self::from_poly(Poly::zero())
    }

    pub fn one() -> Self {
        Self::from_poly(Poly::one())
    }

    pub fn var(name: &str) -> Self {
        Self::from_poly(Poly::var(name))
    }

    pub fn constant(c: BigRational) -> Self {
        Self::from_poly(Poly::constant(c))
    }

    pub fn numerator(&self) -> &Poly {
        &self.num
    }

    pub fn denominator(&self) -> &Poly {
        &self.den
    }

    pub fn into_parts(self) -> (Poly, Poly) {
        (self.num, self.den)
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.num.is_one() && self.den.is_one()
    }

    pub fn is_polynomial(&self) -> bool {
        self.den.is_one()
    }

    pub fn is_constant(&self) -> bool {
        self.den.is_one() && self.num.is_constant()
    }

    pub fn constant_value(&self) -> Option<BigRational> {
        if self.den.is_one() {
            self.num.constant_value()
        } else {
            None
        }
    }

    /// The numerator, if the denominator is 1
    pub fn as_poly(&self) -> Result<Poly, PolyError> {
        if self.den.is_one() {
            Ok(self.num.clone())
        } else {
            Err(PolyError::NotPolynomial(self.to_string()))
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut symbols = self.num.free_symbols();
        symbols.extend(self.den.free_symbols());
        symbols
    }

    pub fn contains_var(&self, var: &str) -> bool {
        self.num.contains_var(var) || self.den.contains_var(var)
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl RationalFunction {
    fn add_ref(&self, other: &Self) -> Self {
        if self.den.is_one() && other.den.is_one() {
            return Self::from_poly(&self.num + &other.num);
        }
        if self.den == other.den {
            return Self::canonical(&self.num + &other.num, self.den.clone());
        }
        Self::canonical(
            &self.num * &other.den + &other.num * &self.den,
            &self.den * &other.den,
        )
    }

    fn sub_ref(&self, other: &Self) -> Self {
        self.add_ref(&other.neg_ref())
    }

    fn neg_ref(&self) -> Self {
        Self {
            num: -&self.num,
            den: self.den.clone(),
        }
    }

    fn mul_ref(&self, other: &Self) -> Self {
        if self.den.is_one() && other.den.is_one() {
            return Self::from_poly(&self.num * &other.num);
        }
        Self::canonical(&self.num * &other.num, &self.den * &other.den)
    }

    pub fn mul_scalar(&self, k: &BigRational) -> Self {
        if k.is_zero() {
            return Self::zero();
        }
        Self {
            num: self.num.mul_scalar(k),
            den: self.den.clone(),
        }
    }

    /// Multiplicative inverse
    pub fn inv(&self) -> Result<Self, PolyError> {
        Self::new(self.den.clone(), self.num.clone())
    }

    pub fn checked_div(&self, other: &Self) -> Result<Self, PolyError> {
        if other.is_zero() {
            return Err(PolyError::DivisionByZero);
        }
        Ok(Self::canonical(&self.num * &other.den, &self.den * &other.num))
    }

    pub fn pow(&self, exp: u32) -> Self {
        Self {
            num: self.num.pow(exp),
            den: self.den.pow(exp),
        }
    }

    /// Integer power; negative exponents invert first
    pub fn powi(&self, exp: i64) -> Result<Self, PolyError> {
        let magnitude = u32::try_from(exp.unsigned_abs()).map_err(|_| PolyError::NegativeExponent(exp))?;
        if exp < 0 {
            Ok(self.inv()?.pow(magnitude))
        } else {
            Ok(self.pow(magnitude))
        }
    }

    /// Rational content of the numerator (the denominator has content 1)
    pub fn content(&self) -> BigRational {
        self.num.content()
    }

    /// gcd of numerators over lcm of denominators
    pub fn gcd(&self, other: &Self) -> Self {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }
        Self::canonical(gcd(&self.num, &other.num), lcm(&self.den, &other.den))
    }
}

macro_rules! forward_binop {
    ($trait:ident, $method:ident, $inner:ident) => {
        impl $trait<&RationalFunction> for &RationalFunction {
            type Output = RationalFunction;
            fn $method(self, rhs: &RationalFunction) -> RationalFunction {
                self.$inner(rhs)
            }
        }
        impl $trait<RationalFunction> for RationalFunction {
            type Output = RationalFunction;
            fn $method(self, rhs: RationalFunction) -> RationalFunction {
                (&self).$inner(&rhs)
            }
        }
        impl $trait<&RationalFunction> for RationalFunction {
            type Output = RationalFunction;
            fn $method(self, rhs: &RationalFunction) -> RationalFunction {
                (&self).$inner(rhs)
            }
        }
        impl $trait<RationalFunction> for &RationalFunction {
            type Output = RationalFunction;
            fn $method(self, rhs: RationalFunction) -> RationalFunction {
                self.$inner(&rhs)
            }
        }
        impl $trait<i64> for RationalFunction {
            type Output = RationalFunction;
            fn $method(self, rhs: i64) -> RationalFunction {
                (&self).$inner(&RationalFunction::from(rhs))
            }
        }
        impl $trait<i64> for &RationalFunction {
            type Output = RationalFunction;
            fn $method(self, rhs: i64) -> RationalFunction {
                self.$inner(&RationalFunction::from(rhs))
            }
        }
        impl $trait<RationalFunction> for i64 {
            type Output = RationalFunction;
            fn $method(self, rhs: RationalFunction) -> RationalFunction {
                RationalFunction::from(self).$inner(&rhs)
            }
        }
    };
}

forward_binop!(Add, add, add_ref);
forward_binop!(Sub, sub, sub_ref);
forward_binop!(Mul, mul, mul_ref);

impl Neg for RationalFunction {
    type Output = RationalFunction;
    fn neg(self) -> RationalFunction {
        self.neg_ref()
    }
}

impl Neg for &RationalFunction {
    type Output = RationalFunction;
    fn neg(self) -> RationalFunction {
        self.neg_ref()
    }
}

impl PartialEq for RationalFunction {
    fn eq(&self, other: &Self) -> bool {
        if self.den == other.den {
            return self.num == other.num;
        }
        &self.num * &other.den == &other.num * &self.den
    }
}

impl Eq for RationalFunction {}

impl Default for RationalFunction {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Poly> for RationalFunction {
    fn from(p: Poly) -> Self {
        Self::from_poly(p)
    }
}

impl From<i64> for RationalFunction {
    fn from(value: i64) -> Self {
        Self::from_poly(Poly::from(value))
    }
}

impl From<BigRational> for RationalFunction {
    fn from(value: BigRational) -> Self {
        Self::constant(value)
    }
}

impl std::iter::Sum for RationalFunction {
    fn sum<I: Iterator<Item = RationalFunction>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| &acc + &x)
    }
}

impl std::iter::Product for RationalFunction {
    fn product<I: Iterator<Item = RationalFunction>>(iter: I) -> Self {
        iter.fold(Self::one(), |acc, x| &acc * &x)
    }
}

// =============================================================================
// Substitution / Evaluation
// =============================================================================

impl RationalFunction {
    /// Simultaneous substitution. Fails if the denominator vanishes.
    pub fn subs(&self, values: &BTreeMap<String, Poly>) -> Result<Self, PolyError> {
        Self::new(self.num.subs(values), self.den.subs(values))
    }

    /// Substitution by rational functions
    pub fn subs_rational(&self, values: &BTreeMap<String, RationalFunction>) -> Result<Self, PolyError> {
        let num = subs_poly_rational(&self.num, values);
        let den = subs_poly_rational(&self.den, values);
        num.checked_div(&den)
    }

    /// var -> var + k
    pub fn shift(&self, var: &str, k: i64) -> Self {
        if k == 0 || !self.contains_var(var) {
            return self.clone();
        }
        Self::canonical(self.num.shift(var, k), self.den.shift(var, k))
    }

    /// Exact value at a rational point; `None` if a symbol is unassigned or
    /// the denominator vanishes
    pub fn eval(&self, values: &BTreeMap<String, BigRational>) -> Option<BigRational> {
        let den = self.den.eval(values)?;
        if den.is_zero() {
            return None;
        }
        Some(self.num.eval(values)? / den)
    }

    pub fn eval_partial(&self, values: &BTreeMap<String, BigRational>) -> Result<Self, PolyError> {
        Self::new(self.num.eval_partial(values), self.den.eval_partial(values))
    }
}

fn subs_poly_rational(p: &Poly, values: &BTreeMap<String, RationalFunction>) -> RationalFunction {
    let vars = p.vars();
    let mut acc = RationalFunction::zero();
    for (c, m) in p.terms() {
        let mut term = RationalFunction::constant(c.clone());
        for (i, &e) in m.iter().enumerate() {
            if e == 0 {
                continue;
            }
            let base = values
                .get(&vars[i])
                .cloned()
                .unwrap_or_else(|| RationalFunction::var(&vars[i]));
            term = &term * &base.pow(e);
        }
        acc = &acc + &term;
    }
    acc
}
