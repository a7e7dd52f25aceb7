//! Rational and integer roots of univariate polynomials.
//!
//! Rational root theorem on the primitive integer polynomial. Candidate
//! numerators/denominators come from the divisors of the trailing/leading
//! coefficients; divisors are enumerated from a trial-division factorization.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::collections::BTreeSet;

use crate::error::PolyError;
use crate::poly::Poly;

/// Trial division bound; a cofactor left after it is treated as prime
const TRIAL_DIVISION_LIMIT: u64 = 1_000_000;

/// Prime factorization by trial division: (prime, exponent) pairs
pub fn factor_integer(n: &BigInt) -> Vec<(BigInt, u32)> {
    let mut n = n.abs();
    let mut factors = Vec::new();
    if n.is_zero() || n.is_one() {
        return factors;
    }
    let mut p: u64 = 2;
    while p <= TRIAL_DIVISION_LIMIT {
        let bp = BigInt::from(p);
        if &bp * &bp > n {
            break;
        }
        let mut exp = 0;
        while (&n % &bp).is_zero() {
            n /= &bp;
            exp += 1;
        }
        if exp > 0 {
            factors.push((bp, exp));
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if !n.is_one() {
        factors.push((n, 1));
    }
    factors
}

/// All positive divisors, ascending
pub fn divisors(n: &BigInt) -> Vec<BigInt> {
    let mut result = vec![BigInt::one()];
    for (p, exp) in factor_integer(n) {
        let mut next = Vec::with_capacity(result.len() * (exp as usize + 1));
        for d in &result {
            let mut power = BigInt::one();
            for _ in 0..=exp {
                next.push(d * &power);
                power *= &p;
            }
        }
        result = next;
    }
    result.sort();
    result
}

/// Integer coefficients (index = power) of a univariate polynomial,
/// scaled by the lcm of the denominators
fn integer_coefficients(p: &Poly) -> Result<Vec<BigInt>, PolyError> {
    let coeffs = p.univariate_coefficients()?;
    let scale = p.denominator_lcm();
    Ok(coeffs
        .iter()
        .map(|c| (c * BigRational::from_integer(scale.clone())).to_integer())
        .collect())
}

/// q^deg * f(num/q) evaluated in integers
fn is_root(coeffs: &[BigInt], num: &BigInt, den: &BigInt) -> bool {
    let degree = coeffs.len() - 1;
    let mut acc = BigInt::zero();
    let mut num_power = BigInt::one();
    let mut den_powers = vec![BigInt::one(); degree + 1];
    for i in 1..=degree {
        den_powers[i] = &den_powers[i - 1] * den;
    }
    for (i, c) in coeffs.iter().enumerate() {
        if !c.is_zero() {
            acc += c * &num_power * &den_powers[degree - i];
        }
        num_power *= num;
    }
    acc.is_zero()
}

impl Poly {
    /// Distinct rational roots of a univariate polynomial, ascending.
    ///
    /// Constants have no roots (the zero polynomial included).
    pub fn rational_roots(&self) -> Result<Vec<BigRational>, PolyError> {
        let mut coeffs = integer_coefficients(self)?;
        let mut roots = BTreeSet::new();
        while coeffs.len() > 1 && coeffs[0].is_zero() {
            roots.insert(BigRational::zero());
            coeffs.remove(0);
        }
        if coeffs.len() <= 1 {
            return Ok(roots.into_iter().collect());
        }
        let trailing = coeffs[0].clone();
        let leading = coeffs[coeffs.len() - 1].clone();
        let dens = divisors(&leading);
        for num in divisors(&trailing) {
            for den in &dens {
                if !num.gcd(den).is_one() {
                    continue;
                }
                for signed in [num.clone(), -num.clone()] {
                    if is_root(&coeffs, &signed, den) {
                        roots.insert(BigRational::new(signed, den.clone()));
                    }
                }
            }
        }
        Ok(roots.into_iter().collect())
    }

    /// Distinct integer roots of a univariate polynomial, ascending
    pub fn integer_roots(&self) -> Result<Vec<BigInt>, PolyError> {
        let mut coeffs = integer_coefficients(self)?;
        let mut roots = BTreeSet::new();
        while coeffs.len() > 1 && coeffs[0].is_zero() {
            roots.insert(BigInt::zero());
            coeffs.remove(0);
        }
        if coeffs.len() <= 1 {
            return Ok(roots.into_iter().collect());
        }
        let one = BigInt::one();
        for num in divisors(&coeffs[0]) {
            for signed in [num.clone(), -num] {
                if is_root(&coeffs, &signed, &one) {
                    roots.insert(signed);
                }
            }
        }
        Ok(roots.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> Poly {
        Poly::var("n")
    }

    #[test]
    fn test_divisors() {
        let ds = divisors(&BigInt::from(12));
        let expected: Vec<BigInt> = [1, 2, 3, 4, 6, 12].iter().map(|&d| BigInt::from(d)).collect();
        assert_eq!(ds, expected);
    }

    #[test]
    fn test_integer_roots() {
        let p = (n() + 1) * (n() - 17) * (n() + 59) * (n() - 102);
        let roots = p.integer_roots().expect("univariate");
        let expected: Vec<BigInt> = [-59, -1, 17, 102].iter().map(|&r| BigInt::from(r)).collect();
        assert_eq!(roots, expected);
    }

    #[test]
    fn test_rational_roots() {
        let p = (2 * n() - 5) * (3 * n() + 11) * (n().pow(2) + 1);
        let roots = p.rational_roots().expect("univariate");
        assert_eq!(
            roots,
            vec![
                BigRational::new(BigInt::from(-11), BigInt::from(3)),
                BigRational::new(BigInt::from(5), BigInt::from(2)),
            ]
        );
    }

    #[test]
    fn test_zero_root() {
        let p = n().pow(3) - n();
        assert_eq!(p.integer_roots().expect("univariate").len(), 3);
    }

    #[test]
    fn test_multivariate_rejected() {
        let p = n() + Poly::var("x");
        assert!(p.integer_roots().is_err());
    }
}
