//! Exact rational solutions of small polynomial systems.
//!
//! Two shapes are handled:
//! - systems linear in the unknowns (Gaussian elimination over Q, only a
//!   unique solution counts);
//! - triangular systems where some equation is univariate in one unknown
//!   (rational roots, back-substitution, recursion).
//!
//! Anything else yields no solutions.

use num_rational::BigRational;
use num_traits::Zero;
use std::collections::{BTreeMap, BTreeSet};

use crate::poly::Poly;

pub type Solution = BTreeMap<String, BigRational>;

/// Solve `equations == 0` for `unknowns` over Q.
///
/// Unknowns that no equation mentions are left out of the solutions.
/// Equations that mention symbols outside `unknowns` make the system
/// unsolvable here (empty result).
pub fn solve(equations: &[Poly], unknowns: &[String]) -> Vec<Solution> {
    let wanted: BTreeSet<String> = unknowns.iter().cloned().collect();
    let equations: Vec<Poly> = equations.iter().filter(|e| !e.is_zero()).cloned().collect();

    let mut mentioned = BTreeSet::new();
    for eq in &equations {
        let symbols = eq.free_symbols();
        if eq.is_constant() || !symbols.is_subset(&wanted) {
            tracing::debug!(target: "cfr::solve", equation = ?eq, "equation has no solution over the unknowns");
            return Vec::new();
        }
        mentioned.extend(symbols);
    }
    if equations.is_empty() {
        return Vec::new();
    }
    let unknowns: Vec<String> = mentioned.into_iter().collect();

    if equations.iter().all(|e| e.total_degree() <= 1) {
        return solve_linear(&equations, &unknowns).into_iter().collect();
    }
    solve_triangular(&equations, &unknowns)
}

/// Gaussian elimination; `None` unless the solution is unique
fn solve_linear(equations: &[Poly], unknowns: &[String]) -> Option<Solution> {
    let cols = unknowns.len();
    let mut rows: Vec<Vec<BigRational>> = equations
        .iter()
        .map(|eq| {
            let mut row: Vec<BigRational> = unknowns
                .iter()
                .map(|u| {
                    eq.coefficients_in(u)
                        .get(1)
                        .and_then(Poly::constant_value)
                        .unwrap_or_else(BigRational::zero)
                })
                .collect();
            let mut point = BTreeMap::new();
            for u in unknowns {
                point.insert(u.clone(), BigRational::zero());
            }
            let constant = eq.eval(&point).unwrap_or_else(BigRational::zero);
            row.push(-constant);
            row
        })
        .collect();

    let mut pivot_row = 0;
    for col in 0..cols {
        let pivot = (pivot_row..rows.len()).find(|&r| !rows[r][col].is_zero())?;
        rows.swap(pivot_row, pivot);
        let lead = rows[pivot_row][col].clone();
        for value in rows[pivot_row].iter_mut() {
            *value = &*value / &lead;
        }
        for r in 0..rows.len() {
            if r == pivot_row || rows[r][col].is_zero() {
                continue;
            }
            let factor = rows[r][col].clone();
            for c in 0..=cols {
                let delta = &factor * &rows[pivot_row][c];
                rows[r][c] -= delta;
            }
        }
        pivot_row += 1;
    }

    // Leftover rows must be 0 = 0
    if rows[pivot_row..].iter().any(|row| !row[cols].is_zero()) {
        return None;
    }
    Some(
        unknowns
            .iter()
            .enumerate()
            .map(|(i, u)| (u.clone(), rows[i][cols].clone()))
            .collect(),
    )
}

fn solve_triangular(equations: &[Poly], unknowns: &[String]) -> Vec<Solution> {
    let univariate = equations.iter().find_map(|eq| {
        let symbols = eq.free_symbols();
        (symbols.len() == 1).then(|| (eq, symbols.into_iter().next()))
    });
    let Some((eq, Some(var))) = univariate else {
        return Vec::new();
    };
    let Ok(roots) = eq.rational_roots() else {
        return Vec::new();
    };

    let rest: Vec<String> = unknowns.iter().filter(|u| **u != var).cloned().collect();
    let mut solutions = Vec::new();
    for root in roots {
        let value = Poly::constant(root.clone());
        let reduced: Vec<Poly> = equations.iter().map(|e| e.subs_var(&var, &value)).collect();
        if reduced.iter().any(|e| e.is_constant() && !e.is_zero()) {
            continue;
        }
        let remaining: Vec<Poly> = reduced.into_iter().filter(|e| !e.is_zero()).collect();
        if remaining.is_empty() {
            let mut solution = Solution::new();
            solution.insert(var.clone(), root);
            solutions.push(solution);
            continue;
        }
        for mut partial in solve(&remaining, &rest) {
            partial.insert(var.clone(), root.clone());
            solutions.push(partial);
        }
    }
    solutions
}

/// Check a candidate solution against every equation
pub fn satisfies(equations: &[Poly], solution: &Solution) -> bool {
    equations
        .iter()
        .all(|eq| eq.eval_partial(solution).is_zero())
}

impl Poly {
    /// Substitute rational values for some variables, keep the rest symbolic
    pub fn eval_partial(&self, values: &BTreeMap<String, BigRational>) -> Poly {
        let subs: BTreeMap<String, Poly> = values
            .iter()
            .filter(|(k, _)| self.contains_var(k))
            .map(|(k, v)| (k.clone(), Poly::constant(v.clone())))
            .collect();
        if subs.is_empty() {
            return self.clone();
        }
        self.subs(&subs)
    }
}
