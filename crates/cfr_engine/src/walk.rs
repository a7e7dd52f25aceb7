//! Walks: ordered products of a position-dependent matrix along a trajectory.
//!
//! `walk_many(t, [k1, k2, ..], s)` computes the prefixes
//! `M(s) · M(s + t) · … · M(s + (k - 1)·t)` of a single product chain, so
//! every requested depth costs at most one pass to the largest one.
//!
//! When the start is numeric and the trajectory covers every free symbol
//! of the matrix, the chain is accumulated over `BigInt` with one common
//! denominator and only converted back to rational functions at the
//! requested depths.

use cfr_poly::{Poly, RationalFunction};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Zero};
use std::collections::BTreeMap;

use crate::error::{RecurrenceError, Result};
use crate::limit::Limit;
use crate::matrix::Matrix;
use crate::position::Position;

impl Matrix {
    /// Walk product for a single depth
    pub fn walk<T: Clone + Into<Poly>>(
        &self,
        trajectory: &Position,
        iterations: usize,
        start: &Position<T>,
    ) -> Result<Matrix> {
        let mut results = self.walk_many(trajectory, &[iterations], start)?;
        results.pop().ok_or(RecurrenceError::InvalidDepth)
    }

    /// Walk products for every depth in `iterations`, in the order given.
    ///
    /// Depth 0 is the identity. Fails on a non-square matrix, when `start`
    /// and `trajectory` have different axes, or on repeated depths.
    pub fn walk_many<T: Clone + Into<Poly>>(
        &self,
        trajectory: &Position,
        iterations: &[usize],
        start: &Position<T>,
    ) -> Result<Vec<Matrix>> {
        self.require_square()?;
        if !start.same_keys(trajectory) {
            return Err(RecurrenceError::KeyMismatch {
                expected: trajectory.key_vec(),
                found: start.key_vec(),
            });
        }
        let mut requested: BTreeMap<usize, usize> = BTreeMap::new();
        for (index, &depth) in iterations.iter().enumerate() {
            if requested.insert(depth, index).is_some() {
                return Err(RecurrenceError::DuplicateIterations);
            }
        }
        let Some(&max_depth) = requested.keys().next_back() else {
            return Ok(Vec::new());
        };

        let start = start.to_poly();
        let numeric_start = numeric_position(&start);
        let covered = self.free_symbols().iter().all(|s| trajectory.contains_key(s));
        tracing::debug!(
            target: "cfr::walk",
            depth = max_depth,
            requested = iterations.len(),
            numeric = numeric_start.is_some() && covered,
            "walk"
        );

        let mut results: Vec<Option<Matrix>> = vec![None; iterations.len()];
        match numeric_start {
            Some(values) if covered => {
                self.walk_numeric(trajectory, &requested, max_depth, values, &mut results)?
            }
            _ => self.walk_symbolic(trajectory, &requested, max_depth, start, &mut results)?,
        }
        results
            .into_iter()
            .map(|m| m.ok_or(RecurrenceError::InvalidDepth))
            .collect()
    }

    fn walk_symbolic(
        &self,
        trajectory: &Position,
        requested: &BTreeMap<usize, usize>,
        max_depth: usize,
        start: Position<Poly>,
        results: &mut [Option<Matrix>],
    ) -> Result<()> {
        let step = trajectory.to_poly();
        let mut position = start;
        let mut acc = Matrix::eye(self.rows());
        for depth in 0..=max_depth {
            if let Some(&index) = requested.get(&depth) {
                results[index] = Some(acc.clone());
            }
            if depth == max_depth {
                break;
            }
            let step_matrix = self.subs(&position.to_subs()).map_err(|e| match e {
                RecurrenceError::Poly(_) => RecurrenceError::Singular {
                    position: position.to_string(),
                },
                other => other,
            })?;
            acc = acc.checked_mul(&step_matrix)?;
            position += &step;
        }
        Ok(())
    }

    /// Exact integer accumulation: `acc = acc_num / acc_den`
    fn walk_numeric(
        &self,
        trajectory: &Position,
        requested: &BTreeMap<usize, usize>,
        max_depth: usize,
        mut values: BTreeMap<String, BigRational>,
        results: &mut [Option<Matrix>],
    ) -> Result<()> {
        let n = self.rows();
        let mut acc_num: Vec<BigInt> = Matrix::eye(n)
            .to_rationals()?
            .into_iter()
            .map(|x| x.to_integer())
            .collect();
        let mut acc_den = BigInt::one();
        let steps: Vec<(String, BigRational)> = trajectory
            .iter()
            .map(|(k, v)| (k.clone(), BigRational::from_integer(BigInt::from(*v))))
            .collect();

        for depth in 0..=max_depth {
            if let Some(&index) = requested.get(&depth) {
                results[index] = Some(integer_matrix(n, &acc_num, &acc_den));
            }
            if depth == max_depth {
                break;
            }
            let (step_num, step_den) = self.eval_integral(&values)?;
            acc_num = mul_integer(n, &acc_num, &step_num);
            acc_den *= step_den;
            if depth % 64 == 63 {
                reduce_common(&mut acc_num, &mut acc_den);
            }
            for (axis, step) in &steps {
                if let Some(v) = values.get_mut(axis) {
                    *v += step;
                }
            }
        }
        Ok(())
    }

    /// Entries at a rational point as integers over a common denominator
    fn eval_integral(&self, values: &BTreeMap<String, BigRational>) -> Result<(Vec<BigInt>, BigInt)> {
        let entries = self
            .entries()
            .iter()
            .map(|x| x.eval(values))
            .collect::<Option<Vec<BigRational>>>()
            .ok_or_else(|| RecurrenceError::Singular {
                position: format_point(values),
            })?;
        let den = entries.iter().fold(BigInt::one(), |acc, x| acc.lcm(x.denom()));
        let num = entries
            .into_iter()
            .map(|x| x.numer() * (&den / x.denom()))
            .collect();
        Ok((num, den))
    }

    pub fn limit<T: Clone + Into<Poly>>(
        &self,
        trajectory: &Position,
        iterations: usize,
        start: &Position<T>,
    ) -> Result<Limit> {
        let mut limits = self.limit_many(trajectory, &[iterations], start)?;
        limits.pop().ok_or(RecurrenceError::InvalidDepth)
    }

    /// Limits at every depth in `iterations` (each depth must be positive)
    pub fn limit_many<T: Clone + Into<Poly>>(
        &self,
        trajectory: &Position,
        iterations: &[usize],
        start: &Position<T>,
    ) -> Result<Vec<Limit>> {
        Limit::walk_to_limit(iterations, |depths| self.walk_many(trajectory, depths, start))
    }
}

/// Rational values of a position whose values are all constants
fn numeric_position(position: &Position<Poly>) -> Option<BTreeMap<String, BigRational>> {
    position
        .iter()
        .map(|(k, v)| v.constant_value().map(|c| (k.clone(), c)))
        .collect()
}

fn format_point(values: &BTreeMap<String, BigRational>) -> String {
    let parts: Vec<String> = values.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    format!("{{{}}}", parts.join(", "))
}

fn mul_integer(n: usize, a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    let mut out = vec![BigInt::zero(); n * n];
    for i in 0..n {
        for t in 0..n {
            let x = &a[i * n + t];
            if x.is_zero() {
                continue;
            }
            for j in 0..n {
                let y = &b[t * n + j];
                if !y.is_zero() {
                    out[i * n + j] += x * y;
                }
            }
        }
    }
    out
}

/// Divide numerators and denominator by their common gcd
fn reduce_common(num: &mut [BigInt], den: &mut BigInt) {
    let g = num.iter().fold(den.clone(), |acc, x| acc.gcd(x));
    if g.is_zero() || g.is_one() {
        return;
    }
    for x in num.iter_mut() {
        *x = &*x / &g;
    }
    *den = &*den / &g;
}

fn integer_matrix(n: usize, num: &[BigInt], den: &BigInt) -> Matrix {
    let grid: Vec<Vec<RationalFunction>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| RationalFunction::constant(BigRational::new(num[i * n + j].clone(), den.clone())))
                .collect()
        })
        .collect();
    // Square by construction
    Matrix::from_rows(grid).unwrap_or_else(|_| Matrix::eye(n))
}
