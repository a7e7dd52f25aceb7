//! Text rendering for [`Poly`] and [`RationalFunction`].
//!
//! The output is accepted back by the parser: terms in descending lex
//! order, `*` between factors, `^` for powers, `(num)/(den)` for proper
//! rational functions.

use num_rational::BigRational;
use num_traits::{One, Signed};
use std::fmt;

use crate::poly::Poly;
use crate::rational::RationalFunction;

fn write_rational(f: &mut fmt::Formatter<'_>, c: &BigRational) -> fmt::Result {
    if c.is_integer() {
        write!(f, "{}", c.numer())
    } else {
        write!(f, "{}/{}", c.numer(), c.denom())
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        for (i, (c, m)) in self.terms.iter().rev().enumerate() {
            let negative = c.is_negative();
            match (i, negative) {
                (0, true) => write!(f, "-")?,
                (0, false) => {}
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }
            let magnitude = c.abs();
            let is_unit_monomial = m.iter().all(|&e| e == 0);
            if is_unit_monomial {
                write_rational(f, &magnitude)?;
                continue;
            }
            let mut first = true;
            if !magnitude.is_one() {
                write_rational(f, &magnitude)?;
                first = false;
            }
            for (var, &e) in self.vars.iter().zip(m.iter()) {
                if e == 0 {
                    continue;
                }
                if !first {
                    write!(f, "*")?;
                }
                first = false;
                if e == 1 {
                    write!(f, "{var}")?;
                } else {
                    write!(f, "{var}^{e}")?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for RationalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_polynomial() {
            write!(f, "{}", self.numerator())
        } else {
            write!(f, "({})/({})", self.numerator(), self.denominator())
        }
    }
}
