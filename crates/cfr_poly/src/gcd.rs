//! Multivariate polynomial GCD over Q.
//!
//! Recursive primitive PRS: pick the first variable, split off the content
//! (gcd of the coefficients, computed recursively over the remaining
//! variables), then run a primitive pseudo-remainder sequence on the
//! primitive parts. Results are unit-normalized (see [`Poly::normalize_unit`]),
//! so `gcd` is unique and the gcd of two nonzero constants is 1.

use crate::poly::Poly;

impl Poly {
    /// Sparse pseudo-remainder of `self` by `divisor`, both viewed in `var`.
    ///
    /// Equal to the classical pseudo-remainder up to a power of the
    /// divisor's leading coefficient.
    pub fn pseudo_rem(&self, divisor: &Poly, var: &str) -> Poly {
        let d = divisor.coefficients_in(var);
        let Some(lc) = d.last() else {
            return self.clone();
        };
        let dd = d.len() - 1;
        let mut r = self.coefficients_in(var);
        while r.len() > dd {
            let dr = r.len() - 1;
            let lr = r[dr].clone();
            let shift = dr - dd;
            for c in r.iter_mut() {
                *c = &*c * lc;
            }
            for (j, dj) in d.iter().enumerate() {
                r[j + shift] = &r[j + shift] - &(&lr * dj);
            }
            while r.last().is_some_and(Poly::is_zero) {
                r.pop();
            }
        }
        Poly::from_coefficients(var, &r)
    }

    /// Content with respect to `var`: gcd of the coefficients in `var`
    pub fn content_in(&self, var: &str) -> Poly {
        let mut coeffs = self.coefficients_in(var).into_iter().filter(|c| !c.is_zero());
        let Some(first) = coeffs.next() else {
            return Poly::zero();
        };
        let mut g = first.normalize_unit();
        for c in coeffs {
            if g.is_one() {
                break;
            }
            g = gcd(&g, &c);
        }
        g
    }

    /// Primitive part with respect to `var` (unit-normalized)
    pub fn primitive_in(&self, var: &str) -> Poly {
        let c = self.content_in(var);
        if c.is_zero() {
            return Poly::zero();
        }
        self.div_exact(&c)
            .unwrap_or_else(|| self.clone())
            .normalize_unit()
    }
}

/// Greatest common divisor of two polynomials (unit-normalized)
pub fn gcd(a: &Poly, b: &Poly) -> Poly {
    if a.is_zero() {
        return b.normalize_unit();
    }
    if b.is_zero() {
        return a.normalize_unit();
    }
    if a.is_constant() || b.is_constant() {
        return Poly::one();
    }
    if a.div_exact(b).is_some() {
        return b.normalize_unit();
    }
    if b.div_exact(a).is_some() {
        return a.normalize_unit();
    }

    let mut symbols = a.free_symbols();
    symbols.extend(b.free_symbols());
    let Some(x) = symbols.into_iter().next() else {
        return Poly::one();
    };

    let ca = a.content_in(&x);
    let cb = b.content_in(&x);
    let content = gcd(&ca, &cb);
    if a.degree_in(&x) == 0 || b.degree_in(&x) == 0 {
        return content;
    }

    let pa = a.div_exact(&ca).unwrap_or_else(|| a.clone());
    let pb = b.div_exact(&cb).unwrap_or_else(|| b.clone());
    let (mut f, mut g) = if pa.degree_in(&x) >= pb.degree_in(&x) {
        (pa, pb)
    } else {
        (pb, pa)
    };

    let primitive = loop {
        let r = f.pseudo_rem(&g, &x);
        if r.is_zero() {
            break g.primitive_in(&x);
        }
        if r.degree_in(&x) == 0 {
            break Poly::one();
        }
        f = g;
        g = r.primitive_in(&x);
    };

    (&content * &primitive).normalize_unit()
}

/// Least common multiple (unit-normalized)
pub fn lcm(a: &Poly, b: &Poly) -> Poly {
    if a.is_zero() || b.is_zero() {
        return Poly::zero();
    }
    let g = gcd(a, b);
    (a * b)
        .div_exact(&g)
        .unwrap_or_else(|| a * b)
        .normalize_unit()
}

/// Fold `gcd` over a sequence
pub fn gcd_all<'a, I: IntoIterator<Item = &'a Poly>>(items: I) -> Poly {
    let mut g = Poly::zero();
    for p in items {
        if g.is_one() {
            break;
        }
        g = gcd(&g, p);
    }
    g
}

/// Fold `lcm` over a sequence (1 for an empty sequence)
pub fn lcm_all<'a, I: IntoIterator<Item = &'a Poly>>(items: I) -> Poly {
    items
        .into_iter()
        .filter(|p| !p.is_zero())
        .fold(Poly::one(), |acc, p| lcm(&acc, p))
}
