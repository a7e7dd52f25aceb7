//! Linear recurrences `a_0(n)·p(n) = a_1(n)·p(n-1) + ... + a_N(n)·p(n-N)`.
//!
//! The relation is kept primitive: it is scaled so that the companion
//! matrix's last column `a_{N-i}/a_0` is recovered exactly, with `a_0` the
//! lcm of that column's denominators and no common rational content.

use cfr_poly::{gcd_bigrational, solve, Poly, RationalFunction, Solution};
use num_rational::BigRational;
use num_traits::{One, Zero};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{RecurrenceError, Result};
use crate::limit::Limit;
use crate::matrix::Matrix;
use crate::position::Position;
use crate::N_SYMBOL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearRecurrence {
    relation: Vec<Poly>,
}

/// A successful split of a recurrence into `recurrence` composed with
/// `composition`.
///
/// `inflation` is the factor the original was inflated by before the split
/// (one when none was needed); `substitution` holds parameter values the
/// split depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub recurrence: LinearRecurrence,
    pub composition: Poly,
    pub inflation: RationalFunction,
    pub substitution: Solution,
}

impl LinearRecurrence {
    /// From coefficients `[a_0, a_1, ..., a_N]`; trailing zeros are dropped
    pub fn new<T: Into<RationalFunction>>(relation: Vec<T>) -> Result<Self> {
        let mut relation: Vec<RationalFunction> = relation.into_iter().map(Into::into).collect();
        while relation.last().is_some_and(RationalFunction::is_zero) {
            relation.pop();
        }
        if relation.len() < 2 {
            return Err(RecurrenceError::DegenerateRecurrence(format!(
                "need at least two nonzero coefficients, got {}",
                relation.len()
            )));
        }
        let leading = relation[0].clone();
        if leading.is_zero() {
            return Err(RecurrenceError::DegenerateRecurrence(
                "leading coefficient is zero".to_string(),
            ));
        }
        let column = relation[1..]
            .iter()
            .map(|c| c.checked_div(&leading))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::from_column(&column)
    }

    /// `column[i]` is `a_{i+1} / a_0`
    fn from_column(column: &[RationalFunction]) -> Result<Self> {
        let den = cfr_poly::lcm_all(column.iter().map(RationalFunction::denominator));
        let den_rf = RationalFunction::from_poly(den.clone());
        let mut relation = vec![den];
        for c in column {
            relation.push((c * &den_rf).as_poly()?);
        }
        let content = relation
            .iter()
            .fold(BigRational::zero(), |acc, p| gcd_bigrational(&acc, &p.content()));
        if !content.is_zero() && !content.is_one() {
            relation = relation
                .into_iter()
                .map(|p| p.div_scalar(&content).unwrap_or(p))
                .collect();
        }
        Ok(Self { relation })
    }

    /// Recurrence of the companion form of `matrix` in `n`
    pub fn from_matrix(matrix: &Matrix) -> Result<Self> {
        let companion = if matrix.is_companion() {
            matrix.clone()
        } else {
            matrix.as_companion(N_SYMBOL)?
        };
        let mut column = companion.col(companion.cols() - 1);
        column.reverse();
        if column.iter().all(RationalFunction::is_zero) {
            return Err(RecurrenceError::DegenerateRecurrence(
                "companion column is zero".to_string(),
            ));
        }
        while column.last().is_some_and(RationalFunction::is_zero) {
            column.pop();
        }
        Self::from_column(&column)
    }

    /// Coefficients `[a_0, ..., a_N]`
    pub fn relation(&self) -> &[Poly] {
        &self.relation
    }

    /// Order `N`
    pub fn depth(&self) -> usize {
        self.relation.len() - 1
    }

    /// Companion matrix: ones on the subdiagonal, row `i` of the last
    /// column is `a_{N-i} / a_0`
    pub fn recurrence_matrix(&self) -> Matrix {
        let n = self.depth();
        let mut m = Matrix::zeros(n, n);
        for i in 1..n {
            m.set(i, i - 1, RationalFunction::one());
        }
        let leading = RationalFunction::from_poly(self.relation[0].clone());
        for i in 0..n {
            let coefficient = RationalFunction::from_poly(self.relation[n - i].clone());
            // a_0 is nonzero by construction
            let entry = coefficient.checked_div(&leading).unwrap_or_else(|_| RationalFunction::zero());
            m.set(i, n - 1, entry);
        }
        m
    }

    pub fn limit(&self, iterations: usize, start: i64) -> Result<Limit> {
        let mut limits = self.limit_many(&[iterations], start)?;
        limits.pop().ok_or(RecurrenceError::InvalidDepth)
    }

    pub fn limit_many(&self, iterations: &[usize], start: i64) -> Result<Vec<Limit>> {
        let trajectory = Position::new().with(N_SYMBOL, 1);
        let start = Position::new().with(N_SYMBOL, start);
        self.recurrence_matrix().limit_many(&trajectory, iterations, &start)
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        self.relation.iter().flat_map(Poly::free_symbols).collect()
    }

    pub fn subs(&self, values: &BTreeMap<String, Poly>) -> Result<Self> {
        Self::new(self.relation.iter().map(|p| p.subs(values)).collect())
    }

    /// Multiplies `a_k` by `c(n)·c(n-1)···c(n-k+1)`; the companion matrix
    /// changes the same way as [`Matrix::inflate`]
    pub fn inflate(&self, c: &RationalFunction) -> Result<Self> {
        let mut factor = RationalFunction::one();
        let mut relation = Vec::with_capacity(self.relation.len());
        for (k, a) in self.relation.iter().enumerate() {
            if k > 0 {
                factor = &factor * &c.shift(N_SYMBOL, 1 - k as i64);
            }
            relation.push(&RationalFunction::from_poly(a.clone()) * &factor);
        }
        Self::new(relation)
    }

    pub fn deflate(&self, c: &RationalFunction) -> Result<Self> {
        self.inflate(&c.inv()?)
    }

    /// The recurrence `R(n) + d(n)·R(n-1)`, satisfied by every solution of `R`
    pub fn compose(&self, d: &RationalFunction) -> Result<Self> {
        self.compose_shifted(1, d)
    }

    /// `R(n) + d(n)·R(n-shift)`
    pub fn compose_shifted(&self, shift: usize, d: &RationalFunction) -> Result<Self> {
        let back = -(shift as i64);
        let relation: Vec<RationalFunction> = self.relation.iter().cloned().map(RationalFunction::from_poly).collect();
        let mut modification = vec![RationalFunction::zero(); shift];
        modification.push(-(d * &relation[0].shift(N_SYMBOL, back)));
        modification.extend(relation[1..].iter().map(|c| d * &c.shift(N_SYMBOL, back)));

        let len = relation.len().max(modification.len());
        let combined: Vec<RationalFunction> = (0..len)
            .map(|i| {
                let x = relation.get(i).cloned().unwrap_or_default();
                let y = modification.get(i).cloned().unwrap_or_default();
                x + y
            })
            .collect();
        Self::new(combined)
    }

    /// Attempts to write this recurrence as `R'.compose(candidate)`.
    ///
    /// Symbols of `candidate` or of the relation (other than `n`) are
    /// treated as unknowns when the split does not hold identically; the
    /// solved values are reported in the decomposition's `substitution`.
    pub fn decompose_poly(&self, candidate: &Poly) -> Option<Decomposition> {
        if self.depth() < 2 || candidate.is_zero() {
            return None;
        }
        let (reduced, residual) = peel(&self.relation, candidate);
        if residual.is_zero() {
            return decomposition(reduced, candidate.clone(), Solution::new());
        }
        let unknowns: Vec<String> = residual
            .free_symbols()
            .into_iter()
            .filter(|s| s != N_SYMBOL)
            .collect();
        if unknowns.is_empty() {
            return None;
        }
        let equations = residual.coefficients_in(N_SYMBOL);
        for solution in solve(&equations, &unknowns) {
            let values: BTreeMap<String, Poly> = solution
                .iter()
                .map(|(k, v)| (k.clone(), Poly::constant(v.clone())))
                .collect();
            let d = candidate.subs(&values);
            if d.is_zero() {
                continue;
            }
            let relation: Vec<Poly> = self.relation.iter().map(|p| p.subs(&values)).collect();
            let (reduced, residual) = peel(&relation, &d);
            if residual.is_zero() {
                tracing::debug!(target: "cfr::recurrence", composition = %d, ?solution, "decomposed under substitution");
                return decomposition(reduced, d, solution);
            }
        }
        None
    }

    /// Every decomposition whose composition polynomial is a scalar
    /// multiple of a divisor of the trailing coefficient.
    ///
    /// With `inflation_degree > 0` the recurrence is also inflated and
    /// deflated by each divisor of its coefficients of degree at most
    /// `inflation_degree` in `n`, and those variants are searched too.
    pub fn decompose(&self, inflation_degree: u32) -> Vec<Decomposition> {
        let mut variants = vec![(self.clone(), RationalFunction::one())];
        for c in self.inflation_candidates(inflation_degree) {
            let c = RationalFunction::from_poly(c);
            if let Ok(inflated) = self.inflate(&c) {
                variants.push((inflated, c.clone()));
            }
            if let (Ok(deflated), Ok(inverse)) = (self.deflate(&c), c.inv()) {
                variants.push((deflated, inverse));
            }
        }

        let mut jobs = Vec::new();
        for (recurrence, inflation) in &variants {
            let Some(trailing) = recurrence.relation.last() else {
                continue;
            };
            let scalar = fresh_symbol(&recurrence.free_symbols());
            for divisor in trailing.divisors() {
                jobs.push((recurrence, inflation, &divisor * &Poly::var(&scalar), scalar.clone()));
            }
        }
        tracing::debug!(target: "cfr::recurrence", variants = variants.len(), candidates = jobs.len(), "decomposing");

        jobs.par_iter()
            .filter_map(|(recurrence, inflation, candidate, scalar)| {
                let mut found = recurrence.decompose_poly(candidate)?;
                found.substitution.remove(scalar);
                found.inflation = (*inflation).clone();
                Some(found)
            })
            .collect()
    }

    /// Non-constant divisors of the coefficients with degree in `n` at most
    /// `degree`
    fn inflation_candidates(&self, degree: u32) -> Vec<Poly> {
        let mut candidates: Vec<Poly> = Vec::new();
        if degree == 0 {
            return candidates;
        }
        for coefficient in &self.relation {
            for d in coefficient.divisors() {
                if !d.is_constant() && d.degree_in(N_SYMBOL) <= degree && !candidates.contains(&d) {
                    candidates.push(d);
                }
            }
        }
        candidates
    }
}

/// Solves `relation = R + d·R(n-1)` for `R` term by term; the residual is
/// zero iff the split is exact
fn peel(relation: &[Poly], d: &Poly) -> (Vec<Poly>, Poly) {
    let last = relation.len() - 1;
    let mut reduced: Vec<Poly> = Vec::with_capacity(last);
    reduced.push(relation[0].clone());
    for (k, c) in relation.iter().enumerate().take(last).skip(1) {
        let carried = d * &reduced[k - 1].shift(N_SYMBOL, -1);
        reduced.push(if k == 1 { c + &carried } else { c - &carried });
    }
    let carried = d * &reduced[last - 1].shift(N_SYMBOL, -1);
    (reduced, &relation[last] - &carried)
}

fn decomposition(reduced: Vec<Poly>, composition: Poly, substitution: Solution) -> Option<Decomposition> {
    let recurrence = LinearRecurrence::new(reduced).ok()?;
    Some(Decomposition {
        recurrence,
        composition,
        inflation: RationalFunction::one(),
        substitution,
    })
}

/// `t`, `t1`, `t2`, ... whichever is not taken
fn fresh_symbol(taken: &BTreeSet<String>) -> String {
    std::iter::once("t".to_string())
        .chain((1..).map(|i| format!("t{i}")))
        .find(|s| !taken.contains(s))
        .unwrap_or_else(|| "t".to_string())
}

impl fmt::Display for LinearRecurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.relation.iter().map(ToString::to_string).collect();
        write!(f, "LinearRecurrence([{}])", parts.join(", "))
    }
}
