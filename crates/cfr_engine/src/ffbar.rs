//! Two-axis fields generated by a polynomial pair `f(x, y)`, `f̄(x, y)`.
//!
//! The pair must satisfy the linear condition
//! `f(x+1, y-1) - f̄(x, y-1) + f̄(x+1, y) - f(x, y) = 0` and the quadratic
//! condition that `f·f̄` splits into a part in `x` plus a part in `y`. The
//! field is then
//!
//! ```text
//! M_x = [[0, b], [1, a]],  M_y = [[f̄, b], [1, f]]
//! a = f - f̄(x+1, y),  b = (f·f̄)(x, 0) - (f·f̄)(0, 0)
//! ```

use cfr_poly::{Poly, RationalFunction};
use std::collections::BTreeMap;

use crate::cmf::Cmf;
use crate::error::{RecurrenceError, Result};
use crate::matrix::Matrix;

const X: &str = "x";
const Y: &str = "y";

pub fn linear_condition(f: &Poly, fbar: &Poly) -> bool {
    let lhs = &f.shift(X, 1).shift(Y, -1) - &fbar.shift(Y, -1);
    (&lhs + &fbar.shift(X, 1) - f).is_zero()
}

pub fn quadratic_condition(f: &Poly, fbar: &Poly) -> bool {
    let product = f * fbar;
    let zero = Poly::zero();
    let at_x0 = product.subs_var(X, &zero);
    let at_y0 = product.subs_var(Y, &zero);
    let at_origin = at_x0.subs_var(Y, &zero);
    (&product - &at_x0 - &at_y0 + &at_origin).is_zero()
}

impl Cmf {
    /// Field of the pair `(f, f̄)` on axes `x`, `y`
    pub fn ffbar(f: &Poly, fbar: &Poly) -> Result<Cmf> {
        let failed = |condition| RecurrenceError::FfbarCondition {
            condition,
            f: f.to_string(),
            fbar: fbar.to_string(),
        };
        if !linear_condition(f, fbar) {
            return Err(failed("linear"));
        }
        if !quadratic_condition(f, fbar) {
            return Err(failed("quadratic"));
        }

        let a = f - &fbar.shift(X, 1);
        let product_y0 = (f * fbar).subs_var(Y, &Poly::zero());
        let b = &product_y0 - &product_y0.subs_var(X, &Poly::zero());
        let grid = |top_left: &Poly, bottom_right: &Poly| -> Result<Matrix> {
            Matrix::from_rows(vec![
                vec![RationalFunction::from_poly(top_left.clone()), RationalFunction::from_poly(b.clone())],
                vec![RationalFunction::one(), RationalFunction::from_poly(bottom_right.clone())],
            ])
        };
        let matrices: BTreeMap<String, Matrix> = [
            (X.to_string(), grid(&Poly::zero(), &a)?),
            (Y.to_string(), grid(fbar, f)?),
        ]
        .into_iter()
        .collect();
        tracing::debug!(target: "cfr::cmf", %f, %fbar, "ffbar field");
        Cmf::new(matrices)
    }
}
