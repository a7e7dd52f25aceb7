mod strategies;

use cfr_engine::{LinearRecurrence, Position};
use cfr_poly::{Poly, RationalFunction};
use num_traits::One;
use proptest::prelude::*;
use strategies::{arb_depths, arb_matrix, arb_nonzero_matrix, arb_nonzero_poly, arb_pcf, arb_poly};

fn along_n(value: i64) -> Position {
    Position::new().with("n", value)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_batched_walk_matches_single(m in arb_matrix(), depths in arb_depths(), start in 1i64..4) {
        let batched = m.walk_many(&along_n(1), &depths, &along_n(start)).expect("square matrix");
        prop_assert_eq!(batched.len(), depths.len());
        for (depth, walked) in depths.iter().zip(&batched) {
            let single = m.walk(&along_n(1), *depth, &along_n(start)).expect("square matrix");
            prop_assert_eq!(&single, walked);
        }
    }

    #[test]
    fn test_normalize_has_unit_gcd(m in arb_nonzero_matrix()) {
        let g = m.gcd();
        let normalized = m.normalize();
        prop_assert!(normalized.gcd().is_one());
        prop_assert_eq!(normalized.scale(&RationalFunction::constant(g)), m);
    }

    #[test]
    fn test_inflate_then_deflate(pcf in arb_pcf(), c in arb_nonzero_poly(2)) {
        let c = RationalFunction::from_poly(c);
        prop_assert_eq!(pcf.inflate(&c).deflate(&c).expect("nonzero factor"), pcf);
    }

    #[test]
    fn test_deflate_all_idempotent(pcf in arb_pcf(), c in arb_nonzero_poly(1)) {
        let inflated = pcf.inflate(&RationalFunction::from_poly(c));
        let once = inflated.deflate_all();
        prop_assert_eq!(once.deflate_all(), once);
    }

    #[test]
    fn test_deflate_all_after_shift_chain(pcf in arb_pcf(), c in arb_nonzero_poly(2)) {
        let c = RationalFunction::from_poly(c);
        let chain = &c * &c.shift("n", -1);
        let inflated = pcf.inflate(&chain);
        let (once, factor) = inflated.deflate_all_with_factor();
        prop_assert_eq!(inflated.inflate(&factor), once.clone());
        prop_assert_eq!(once.deflate_all(), once);
    }

    #[test]
    fn test_deflate_all_after_quadratic(pcf in arb_pcf(), c in arb_nonzero_poly(1)) {
        let c = RationalFunction::from_poly(c * Poly::var("n") + 1);
        let once = pcf.inflate(&c).deflate_all();
        prop_assert_eq!(once.deflate_all(), once);
    }

    #[test]
    fn test_deflate_all_factor_reproduces(pcf in arb_pcf()) {
        let (deflated, factor) = pcf.deflate_all_with_factor();
        prop_assert_eq!(pcf.inflate(&factor), deflated);
    }

    #[test]
    fn test_compose_then_decompose(
        tail in prop::collection::vec(arb_poly(2), 1..3),
        last in arb_nonzero_poly(2),
        d in arb_nonzero_poly(2),
    ) {
        let mut relation = vec![Poly::one()];
        relation.extend(tail);
        relation.push(last);
        let r = LinearRecurrence::new(relation).expect("nonzero leading coefficient");
        let composed = r.compose(&RationalFunction::from_poly(d.clone())).expect("valid");
        let found = composed.decompose_poly(&d).expect("composition splits");
        prop_assert_eq!(found.recurrence, r);
        prop_assert_eq!(found.composition, d);
    }

    #[test]
    fn test_decompose_searches_every_divisor(
        tail in prop::collection::vec(arb_poly(1), 1..3),
        last in arb_nonzero_poly(1),
        d in arb_nonzero_poly(2),
    ) {
        let mut relation = vec![Poly::one()];
        relation.extend(tail);
        relation.push(last);
        let r = LinearRecurrence::new(relation).expect("nonzero leading coefficient");
        let composed = r.compose(&RationalFunction::from_poly(d)).expect("valid");
        let found = composed.decompose(0);
        prop_assert!(!found.is_empty());
        for x in &found {
            let recomposed = x.recurrence.compose(&RationalFunction::from_poly(x.composition.clone())).expect("valid");
            prop_assert_eq!(&recomposed, &composed);
        }
    }
}
