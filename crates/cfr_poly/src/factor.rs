//! Square-free decomposition, gcd-free (coprime) bases and factorization
//! with multiplicities.
//!
//! Univariate polynomials are factored into irreducibles over Q: rational
//! roots first, then Kronecker's method for the remaining higher-degree
//! pieces. Multivariate factors are only square-free and pairwise coprime.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::gcd::gcd;
use crate::poly::Poly;
use crate::roots::divisors as integer_divisors;

/// Divisor combinations tried per candidate degree before Kronecker's
/// method gives up and keeps the factor whole
const KRONECKER_COMBINATION_LIMIT: usize = 50_000;

/// Minimal gcd-domain interface shared by integers and polynomials
pub trait GcdDomain: Clone {
    fn gcd_with(&self, other: &Self) -> Self;
    fn exact_div(&self, divisor: &Self) -> Option<Self>;
    fn is_unit(&self) -> bool;
    fn is_zero_element(&self) -> bool;
    /// Canonical associate
    fn normalized(&self) -> Self;
}

impl GcdDomain for BigInt {
    fn gcd_with(&self, other: &Self) -> Self {
        self.gcd(other)
    }

    fn exact_div(&self, divisor: &Self) -> Option<Self> {
        if divisor.is_zero() {
            return None;
        }
        let (q, r) = self.div_rem(divisor);
        r.is_zero().then_some(q)
    }

    fn is_unit(&self) -> bool {
        self.abs().is_one()
    }

    fn is_zero_element(&self) -> bool {
        self.is_zero()
    }

    fn normalized(&self) -> Self {
        self.abs()
    }
}

impl GcdDomain for Poly {
    fn gcd_with(&self, other: &Self) -> Self {
        gcd(self, other)
    }

    fn exact_div(&self, divisor: &Self) -> Option<Self> {
        self.div_exact(divisor)
    }

    fn is_unit(&self) -> bool {
        self.is_constant() && !self.is_zero()
    }

    fn is_zero_element(&self) -> bool {
        self.is_zero()
    }

    fn normalized(&self) -> Self {
        self.normalize_unit()
    }
}

/// Gcd-free basis: pairwise coprime non-units such that every input is a
/// unit times a product of powers of basis elements.
pub fn coprime_basis<T: GcdDomain>(items: &[T]) -> Vec<T> {
    let mut basis: Vec<T> = Vec::new();
    let mut pending: Vec<T> = items
        .iter()
        .filter(|x| !x.is_zero_element() && !x.is_unit())
        .map(GcdDomain::normalized)
        .collect();

    while let Some(a) = pending.pop() {
        if a.is_unit() {
            continue;
        }
        let split = basis.iter().enumerate().find_map(|(i, b)| {
            let g = a.gcd_with(b);
            (!g.is_unit()).then_some((i, g))
        });
        match split {
            None => basis.push(a),
            Some((i, g)) => {
                let b = basis.swap_remove(i);
                let a_rest = a.exact_div(&g).unwrap_or_else(|| a.clone());
                let b_rest = b.exact_div(&g).unwrap_or_else(|| b.clone());
                for x in [g, a_rest, b_rest] {
                    if !x.is_unit() {
                        pending.push(x.normalized());
                    }
                }
            }
        }
    }
    basis
}

/// Number of times `factor` divides `value`, and the cofactor
pub fn multiplicity<T: GcdDomain>(value: &T, factor: &T) -> (u32, T) {
    let mut count = 0;
    let mut rest = value.clone();
    if factor.is_unit() || factor.is_zero_element() || value.is_zero_element() {
        return (0, rest);
    }
    while let Some(q) = rest.exact_div(factor) {
        count += 1;
        rest = q;
    }
    (count, rest)
}

impl Poly {
    /// Square-free decomposition (Yun): `(factor, multiplicity)` pairs with
    /// non-constant, unit-normalized, pairwise coprime factors. The rational
    /// content is dropped.
    pub fn square_free(&self) -> Vec<(Poly, u32)> {
        let mut result = Vec::new();
        self.square_free_into(&mut result);
        result
    }

    fn square_free_into(&self, out: &mut Vec<(Poly, u32)>) {
        if self.is_constant() {
            return;
        }
        let Some(var) = self.free_symbols().into_iter().next() else {
            return;
        };
        let content = self.content_in(&var);
        if !content.is_constant() {
            content.square_free_into(out);
        }
        let primitive = self
            .div_exact(&content)
            .unwrap_or_else(|| self.clone())
            .normalize_unit();
        if primitive.degree_in(&var) == 0 {
            return;
        }

        let derivative = primitive.derivative(&var);
        let g = gcd(&primitive, &derivative);
        let mut w = primitive.div_exact(&g).unwrap_or_else(|| primitive.clone());
        let y = derivative.div_exact(&g).unwrap_or_else(|| derivative.clone());
        let mut z = &y - &w.derivative(&var);
        let mut i = 1;
        while !w.is_constant() {
            let h = gcd(&w, &z);
            if !h.is_constant() {
                out.push((h.clone(), i));
            }
            w = w.div_exact(&h).unwrap_or_else(|| w.clone());
            let y = z.div_exact(&h).unwrap_or_else(|| z.clone());
            z = &y - &w.derivative(&var);
            i += 1;
        }
    }

    /// Factorization: rational content plus pairwise coprime factors with
    /// multiplicities. Univariate factors are irreducible over Q, with
    /// rational roots listed first as linear factors `q*x - p` in ascending
    /// root order. Multivariate factors are square-free only.
    pub fn factor_list(&self) -> (BigRational, Vec<(Poly, u32)>) {
        if self.is_zero() {
            return (BigRational::zero(), Vec::new());
        }
        let unit = self.normalize_unit();
        let scalar = self.leading_coefficient() / unit.leading_coefficient();

        let mut factors = Vec::new();
        for (f, mult) in unit.square_free() {
            let symbols = f.free_symbols();
            if symbols.len() != 1 {
                factors.push((f, mult));
                continue;
            }
            let Some(var) = symbols.into_iter().next() else {
                continue;
            };
            let mut rest = f.clone();
            for root in f.rational_roots().unwrap_or_default() {
                let scale = BigRational::from_integer(root.denom().clone());
                let linear = Poly::var(&var).mul_scalar(&scale) - Poly::from_integer(root.numer().clone());
                if let Some(q) = rest.div_exact(&linear) {
                    rest = q;
                    factors.push((linear.normalize_unit(), mult));
                }
            }
            if !rest.is_constant() {
                for piece in rest.irreducible_factors() {
                    factors.push((piece, mult));
                }
            }
        }
        (scalar, factors)
    }

    /// Irreducible factors over Q of a univariate polynomial, by Kronecker's
    /// method. Factors are primitive with positive leading coefficient and
    /// listed by ascending degree; repeated factors repeat. Constants have no
    /// factors and multivariate input is returned whole.
    pub fn irreducible_factors(&self) -> Vec<Poly> {
        if self.is_constant() {
            return Vec::new();
        }
        let symbols = self.free_symbols();
        let Some(var) = symbols.iter().next().filter(|_| symbols.len() == 1) else {
            return vec![self.normalize_unit()];
        };

        let mut pending = vec![self.normalize_unit()];
        let mut irreducible = Vec::new();
        while let Some(f) = pending.pop() {
            match kronecker_split(&f, var) {
                Some(g) => {
                    let Some(h) = f.div_exact(&g) else {
                        irreducible.push(f);
                        continue;
                    };
                    pending.push(g.normalize_unit());
                    pending.push(h.normalize_unit());
                }
                None => irreducible.push(f),
            }
        }
        irreducible.sort_by_key(|f| f.degree_in(var));
        irreducible
    }

    /// Every monic-normalized divisor built from the factor list
    /// (product of factor powers), including 1
    pub fn divisors(&self) -> Vec<Poly> {
        let (_, factors) = self.factor_list();
        let mut result = vec![Poly::one()];
        for (f, mult) in factors {
            let mut next = Vec::with_capacity(result.len() * (mult as usize + 1));
            for d in &result {
                let mut power = Poly::one();
                for _ in 0..=mult {
                    next.push(d * &power);
                    power = &power * &f;
                }
            }
            result = next;
        }
        result
    }
}

/// A proper factor of `f` of smallest degree, or `None` when `f` is
/// irreducible (or the divisor search would exceed its limit)
fn kronecker_split(f: &Poly, var: &str) -> Option<Poly> {
    let degree = f.degree_in(var);
    (1..=degree / 2).find_map(|k| factor_of_degree(f, var, k))
}

/// Integer points where `f` is nonzero, favoring values with few divisors.
/// Each point carries the positive divisors of `|f(x)|`.
fn evaluation_points(f: &Poly, var: &str, count: usize) -> Vec<(BigRational, Vec<BigInt>)> {
    let pool = count + f.degree_in(var) as usize + 2 * count;
    let mut points: Vec<(BigRational, Vec<BigInt>)> = (0..pool as i64)
        .map(|i| if i % 2 == 0 { i / 2 } else { -(i + 1) / 2 })
        .filter_map(|x| {
            let x = BigRational::from_integer(BigInt::from(x));
            let value = f.eval_univariate(&x);
            (!value.is_zero()).then(|| {
                let divisors = integer_divisors(&value.to_integer().abs());
                (x, divisors)
            })
        })
        .collect();
    points.sort_by_key(|(_, divisors)| divisors.len());
    points.truncate(count);
    points
}

/// Lagrange basis polynomials for the given nodes
fn lagrange_basis(var: &str, nodes: &[BigRational]) -> Vec<Poly> {
    let x = Poly::var(var);
    nodes
        .iter()
        .enumerate()
        .map(|(i, xi)| {
            nodes
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .fold(Poly::one(), |acc, (_, xj)| {
                    let linear = &x - &Poly::constant(xj.clone());
                    (&acc * &linear).mul_scalar(&(xi - xj).recip())
                })
        })
        .collect()
}

/// Searches for an integer factor of `f` of exact degree `k`: its values at
/// `k + 1` points must divide the values of `f`, so each divisor choice
/// interpolates one candidate
fn factor_of_degree(f: &Poly, var: &str, k: u32) -> Option<Poly> {
    let points = evaluation_points(f, var, k as usize + 1);
    if points.len() <= k as usize {
        return None;
    }
    let nodes: Vec<BigRational> = points.iter().map(|(x, _)| x.clone()).collect();
    // The first value stays positive: g and -g are the same factor
    let choices: Vec<Vec<BigInt>> = points
        .iter()
        .enumerate()
        .map(|(i, (_, positive))| {
            if i == 0 {
                positive.clone()
            } else {
                positive.iter().flat_map(|d| [d.clone(), -d]).collect()
            }
        })
        .collect();
    let combinations = choices
        .iter()
        .try_fold(1usize, |acc, c| acc.checked_mul(c.len()))
        .filter(|&total| total <= KRONECKER_COMBINATION_LIMIT);
    let Some(combinations) = combinations else {
        tracing::debug!(target: "cfr::factor", %f, degree = k, "divisor search too large, factor kept whole");
        return None;
    };
    let basis = lagrange_basis(var, &nodes);

    let mut index = vec![0usize; choices.len()];
    for _ in 0..combinations {
        let candidate: Poly = basis
            .iter()
            .zip(&index)
            .zip(&choices)
            .map(|((l, &i), values)| l.mul_scalar(&BigRational::from_integer(values[i].clone())))
            .sum();
        if candidate.degree_in(var) == k
            && candidate.denominator_lcm().is_one()
            && f.div_exact(&candidate).is_some()
        {
            return Some(candidate);
        }
        for (slot, values) in index.iter_mut().zip(&choices) {
            *slot += 1;
            if *slot < values.len() {
                break;
            }
            *slot = 0;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> Poly {
        Poly::var("n")
    }

    fn product(factors: &[(Poly, u32)]) -> Poly {
        factors.iter().map(|(f, m)| f.pow(*m)).product()
    }

    #[test]
    fn test_square_free() {
        let p = (n() + 1).pow(3) * (n() - 2) * (n().pow(2) + 1).pow(2);
        let sqf = p.square_free();
        assert_eq!(product(&sqf), p);
        assert!(sqf.iter().any(|(f, m)| *m == 3 && *f == n() + 1));
    }

    #[test]
    fn test_square_free_multivariate() {
        let c = Poly::var("c");
        let p = c.pow(2) * (n() - &c).pow(2) * (2 * n() - 5);
        let sqf = p.square_free();
        assert_eq!(product(&sqf), p.normalize_unit());
    }

    #[test]
    fn test_coprime_basis_poly() {
        let a = (n() + 1) * (n() + 2);
        let b = (n() + 2) * (n() + 3);
        let basis = coprime_basis(&[a, b]);
        assert_eq!(basis.len(), 3);
        for (i, x) in basis.iter().enumerate() {
            for y in basis.iter().skip(i + 1) {
                assert!(gcd(x, y).is_one());
            }
        }
    }

    #[test]
    fn test_coprime_basis_integers() {
        let basis = coprime_basis(&[BigInt::from(12), BigInt::from(18)]);
        let mut values: Vec<BigInt> = basis;
        values.sort();
        assert_eq!(values, vec![BigInt::from(2), BigInt::from(3)]);
    }

    #[test]
    fn test_multiplicity() {
        let (m, rest) = multiplicity(&BigInt::from(72), &BigInt::from(2));
        assert_eq!(m, 3);
        assert_eq!(rest, BigInt::from(9));
    }

    #[test]
    fn test_factor_list_linear_split() {
        let p = (2 * n() - 5).pow(4) * (3 * n() + 11) * 7;
        let (content, factors) = p.factor_list();
        assert_eq!(content, BigRational::from_integer(BigInt::from(7)));
        assert!(factors.contains(&(2 * n() - 5, 4)));
        assert!(factors.contains(&(3 * n() + 11, 1)));
    }

    #[test]
    fn test_divisors() {
        let p = n().pow(2) * (n() + 1);
        assert_eq!(p.divisors().len(), 6);
    }

    #[test]
    fn test_factor_list_splits_quadratics() {
        let first = n().pow(2) + 1;
        let second = n().pow(2) - 2 * n() - 2;
        let (content, factors) = (&first * &second).factor_list();
        assert!(content.is_one());
        assert_eq!(factors.len(), 2);
        assert!(factors.contains(&(first, 1)));
        assert!(factors.contains(&(second, 1)));
    }

    #[test]
    fn test_irreducible_factors_sophie_germain() {
        let factors = (n().pow(4) + 4).irreducible_factors();
        assert_eq!(factors.len(), 2);
        assert!(factors.contains(&(n().pow(2) + 2 * n() + 2)));
        assert!(factors.contains(&(n().pow(2) - 2 * n() + 2)));
    }

    #[test]
    fn test_irreducible_factors_keeps_irreducible() {
        assert_eq!((n().pow(4) + 1).irreducible_factors(), vec![n().pow(4) + 1]);
        assert_eq!((n().pow(2) - 2).irreducible_factors(), vec![n().pow(2) - 2]);
    }

    #[test]
    fn test_irreducible_factors_mixed_degrees() {
        let cubic = n().pow(3) - 2;
        let quadratic = 2 * n().pow(2) + 3;
        let factors = (&cubic * &quadratic).irreducible_factors();
        assert_eq!(factors, vec![quadratic, cubic]);
    }

    #[test]
    fn test_divisors_of_quadratic_product() {
        let p = n() * (n().pow(2) + 1) * (n().pow(2) - 2 * n() - 2);
        let divisors = p.divisors();
        assert_eq!(divisors.len(), 8);
        assert!(divisors.contains(&(n().pow(2) + 1)));
    }
}
