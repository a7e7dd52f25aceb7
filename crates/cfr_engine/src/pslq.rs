//! Integer relation search (PSLQ) in fixed-point integer arithmetic.
//!
//! Values are scaled by their largest magnitude and held as integers with
//! `bits` fractional bits plus guard bits. A relation is accepted once a
//! reduced entry falls below `2^(-3·bits/4)` with every coefficient under
//! [`MAX_COEFFICIENT`] in absolute value.

use num_bigint::BigInt;
use num_integer::{Integer, Roots};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Relations with a larger coefficient are rejected
pub const MAX_COEFFICIENT: i64 = 1000;

/// Reduction rounds before giving up
pub const MAX_STEPS: usize = 100;

const GUARD_BITS: u32 = 60;

/// Lowest working precision; anything below is meaningless for PSLQ
pub const MIN_BITS: u32 = 53;

/// Fixed-point numbers with `prec` fractional bits
struct Fixed {
    prec: u32,
}

impl Fixed {
    fn one(&self) -> BigInt {
        BigInt::one() << self.prec
    }

    fn from_rational(&self, x: &BigRational) -> BigInt {
        (x.numer() << self.prec).div_floor(x.denom())
    }

    fn mul(&self, a: &BigInt, b: &BigInt) -> BigInt {
        (a * b) >> self.prec
    }

    fn div(&self, a: &BigInt, b: &BigInt) -> BigInt {
        (a << self.prec).div_floor(b)
    }

    /// Square root of a non-negative value
    fn sqrt(&self, a: &BigInt) -> BigInt {
        (a << self.prec).sqrt()
    }

    /// Nearest integer, still in fixed point
    fn round(&self, a: &BigInt) -> BigInt {
        ((a + (self.one() >> 1)) >> self.prec) << self.prec
    }
}

/// Integer vector `r` (not all zero) with `Σ r_i·x_i ≈ 0`, first nonzero
/// entry positive. A zero input yields the matching unit vector.
pub fn pslq(values: &[BigRational], bits: u32) -> Option<Vec<BigInt>> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    if let Some(zero) = values.iter().position(Zero::is_zero) {
        return Some((0..n).map(|i| BigInt::from(u8::from(i == zero))).collect());
    }

    let bits = bits.max(MIN_BITS);
    let fx = Fixed { prec: bits + GUARD_BITS };
    let tolerance = BigInt::one() << (fx.prec - bits * 3 / 4);
    let largest = values.iter().map(BigRational::abs).max()?;
    let x: Vec<BigInt> = values.iter().map(|v| fx.from_rational(&(v / &largest))).collect();
    let smallest = x.iter().map(BigInt::abs).min()?;
    if smallest < &tolerance / 100 {
        tracing::debug!(target: "cfr::identify", "an entry is below the tolerance");
        return None;
    }

    let gamma = fx.sqrt(&((fx.one() * 4) / 3));
    let mut a = identity(n, &fx);
    let mut b = identity(n, &fx);
    let mut h = vec![vec![BigInt::zero(); n]; n];

    let mut s: Vec<BigInt> = (0..n)
        .map(|k| {
            let sum: BigInt = x[k..].iter().map(|v| (v * v) >> fx.prec).sum();
            fx.sqrt(&sum)
        })
        .collect();
    let norm = s[0].clone();
    let mut y: Vec<BigInt> = x.iter().map(|v| fx.div(v, &norm)).collect();
    for value in s.iter_mut() {
        *value = fx.div(value, &norm);
    }
    for i in 0..n {
        if i + 1 < n && !s[i].is_zero() {
            h[i][i] = fx.div(&s[i + 1], &s[i]);
        }
        for j in 0..i {
            let denominator = &s[j] * &s[j + 1];
            if !denominator.is_zero() {
                h[i][j] = ((-(&y[i] * &y[j])) << fx.prec).div_floor(&denominator);
            }
        }
    }
    for i in 1..n {
        for j in (0..i).rev() {
            if h[j][j].is_zero() {
                continue;
            }
            let t = fx.round(&fx.div(&h[i][j], &h[j][j]));
            reduce(&fx, &t, i, j, &mut y, &mut h, &mut a, &mut b);
        }
    }

    for step in 0..MAX_STEPS {
        let mut m = 0;
        let mut weight_max = BigInt::from(-1);
        let mut gamma_power = gamma.clone();
        for i in 0..n - 1 {
            let weight = (&gamma_power * h[i][i].abs()) >> (fx.prec * i as u32);
            if weight > weight_max {
                m = i;
                weight_max = weight;
            }
            gamma_power = &gamma_power * &gamma;
        }

        y.swap(m, m + 1);
        h.swap(m, m + 1);
        a.swap(m, m + 1);
        for row in b.iter_mut() {
            row.swap(m, m + 1);
        }

        if m + 2 < n {
            let t0 = fx.sqrt(&((&h[m][m] * &h[m][m] + &h[m][m + 1] * &h[m][m + 1]) >> fx.prec));
            if t0.is_zero() {
                break;
            }
            let t1 = fx.div(&h[m][m], &t0);
            let t2 = fx.div(&h[m][m + 1], &t0);
            for row in h.iter_mut().skip(m) {
                let (t3, t4) = (row[m].clone(), row[m + 1].clone());
                row[m] = (&t1 * &t3 + &t2 * &t4) >> fx.prec;
                row[m + 1] = (&t1 * &t4 - &t2 * &t3) >> fx.prec;
            }
        }

        for i in m + 1..n {
            for j in (0..=(i - 1).min(m + 1)).rev() {
                if h[j][j].is_zero() {
                    break;
                }
                let t = fx.round(&fx.div(&h[i][j], &h[j][j]));
                reduce(&fx, &t, i, j, &mut y, &mut h, &mut a, &mut b);
            }
        }

        for i in 0..n {
            if y[i].abs() >= tolerance {
                continue;
            }
            let relation: Vec<BigInt> = (0..n).map(|j| fx.round(&b[j][i]) >> fx.prec).collect();
            if relation.iter().all(|c| c.abs() < BigInt::from(MAX_COEFFICIENT)) && !relation.iter().all(Zero::is_zero) {
                tracing::debug!(target: "cfr::identify", step, "relation found");
                return Some(orient(relation));
            }
        }

        let largest_h = h.iter().flatten().map(BigInt::abs).max().unwrap_or_default();
        if !largest_h.is_zero() {
            let bound = ((BigInt::one() << (2 * fx.prec)) / largest_h >> fx.prec) / 100;
            if bound >= BigInt::from(MAX_COEFFICIENT) {
                tracing::debug!(target: "cfr::identify", step, "norm bound exceeds the coefficient limit");
                break;
            }
        }
    }
    None
}

fn identity(n: usize, fx: &Fixed) -> Vec<Vec<BigInt>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { fx.one() } else { BigInt::zero() }).collect())
        .collect()
}

/// Subtracts `t` times row `j` from row `i` (and the matching column
/// update of the inverse basis)
#[allow(clippy::too_many_arguments)]
fn reduce(
    fx: &Fixed,
    t: &BigInt,
    i: usize,
    j: usize,
    y: &mut [BigInt],
    h: &mut [Vec<BigInt>],
    a: &mut [Vec<BigInt>],
    b: &mut [Vec<BigInt>],
) {
    let carried = fx.mul(t, &y[i]);
    y[j] += carried;
    for k in 0..=j {
        let d = fx.mul(t, &h[j][k]);
        h[i][k] -= d;
    }
    for k in 0..y.len() {
        let d = fx.mul(t, &a[j][k]);
        a[i][k] -= d;
        let d = fx.mul(t, &b[k][i]);
        b[k][j] += d;
    }
}

/// Sign with the first nonzero entry positive
fn orient(relation: Vec<BigInt>) -> Vec<BigInt> {
    match relation.iter().find(|c| !c.is_zero()) {
        Some(first) if first.is_negative() => relation.into_iter().map(|c| -c).collect(),
        _ => relation,
    }
}
