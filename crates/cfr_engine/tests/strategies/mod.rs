#![allow(dead_code)]

use cfr_engine::{Matrix, Pcf};
use cfr_poly::Poly;
use proptest::prelude::*;

/// Polynomials in `n` with small integer coefficients
pub fn arb_poly(max_degree: u32) -> impl Strategy<Value = Poly> {
    prop::collection::vec(-4i64..=4, 1..=(max_degree as usize + 1)).prop_map(|coefficients| {
        coefficients
            .into_iter()
            .enumerate()
            .map(|(k, c)| c * Poly::var("n").pow(k as u32))
            .sum()
    })
}

pub fn arb_nonzero_poly(max_degree: u32) -> impl Strategy<Value = Poly> {
    arb_poly(max_degree).prop_filter("nonzero", |p| !p.is_zero())
}

/// 2x2 polynomial matrices in `n`
pub fn arb_matrix() -> impl Strategy<Value = Matrix> {
    prop::collection::vec(arb_poly(2), 4).prop_map(|entries| {
        let mut it = entries.into_iter();
        let mut row = || vec![it.next().unwrap_or_default(), it.next().unwrap_or_default()];
        let grid = vec![row(), row()];
        Matrix::from_rows(grid).expect("rectangular grid")
    })
}

pub fn arb_nonzero_matrix() -> impl Strategy<Value = Matrix> {
    arb_matrix().prop_filter("nonzero", |m| !m.is_zero())
}

/// Distinct walk depths, in random order
pub fn arb_depths() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::btree_set(0usize..16, 1..5)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

pub fn arb_pcf() -> impl Strategy<Value = Pcf> {
    (arb_nonzero_poly(2), arb_nonzero_poly(2)).prop_map(|(a, b)| Pcf::new(a, b))
}
