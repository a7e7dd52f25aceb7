use cfr_poly::{gcd, Poly, RationalFunction};
use proptest::prelude::*;

/// Small polynomials in `n` and `x` with integer coefficients
fn arb_poly() -> impl Strategy<Value = Poly> {
    prop::collection::vec((-5i64..=5, 0u32..=3, 0u32..=2), 0..=4).prop_map(|terms| {
        terms
            .into_iter()
            .map(|(c, en, ex)| c * Poly::var("n").pow(en) * Poly::var("x").pow(ex))
            .sum()
    })
}

fn arb_nonzero_poly() -> impl Strategy<Value = Poly> {
    arb_poly().prop_filter("nonzero", |p| !p.is_zero())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_ring_laws(a in arb_poly(), b in arb_poly(), c in arb_poly()) {
        prop_assert_eq!(&a + &b, &b + &a);
        prop_assert_eq!(&a * &b, &b * &a);
        prop_assert_eq!(&a * &(&b + &c), &a * &b + &a * &c);
        prop_assert!((&a - &a).is_zero());
    }

    #[test]
    fn test_exact_division_inverts_product(a in arb_poly(), b in arb_nonzero_poly()) {
        let product = &a * &b;
        prop_assert_eq!(product.div_exact(&b), Some(a));
    }

    #[test]
    fn test_gcd_divides_both(a in arb_nonzero_poly(), b in arb_nonzero_poly(), common in arb_nonzero_poly()) {
        let fa = &a * &common;
        let fb = &b * &common;
        let g = gcd(&fa, &fb);
        prop_assert!(fa.div_exact(&g).is_some());
        prop_assert!(fb.div_exact(&g).is_some());
        // The common factor divides the gcd
        prop_assert!(g.div_exact(&common).is_some());
    }

    #[test]
    fn test_shift_roundtrip(a in arb_poly(), k in -4i64..=4) {
        prop_assert_eq!(a.shift("n", k).shift("n", -k), a);
    }

    #[test]
    fn test_display_parse_roundtrip(a in arb_poly()) {
        let text = a.to_string();
        let parsed: Poly = text.parse().map_err(|e| TestCaseError::fail(format!("{text}: {e}")))?;
        prop_assert_eq!(parsed, a);
    }

    #[test]
    fn test_rational_function_cancels(a in arb_poly(), b in arb_nonzero_poly()) {
        let f = RationalFunction::new(&a * &b, b.clone()).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(f.is_polynomial());
        prop_assert_eq!(f.as_poly().map_err(|e| TestCaseError::fail(e.to_string()))?, a);
    }
}
