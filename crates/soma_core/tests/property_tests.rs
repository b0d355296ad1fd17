//! Property-based tests for soma_core.
//!
//! Uses proptest to verify invariants that must hold for ALL possible inputs,
//! not just hand-picked examples.

use proptest::prelude::*;
use soma_core::{DecayRates, ModuleSet, Need, NeedsVector};

fn arb_need() -> impl Strategy<Value = Need> {
    (0usize..Need::ALL.len()).prop_map(|i| Need::ALL[i])
}

/// Any f64 at all, including NaN and the infinities.
fn arb_wild_f64() -> impl Strategy<Value = f64> {
    prop_oneof![
        any::<f64>(),
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
        -1.0e6f64..1.0e6,
    ]
}

proptest! {
    /// **Core invariant**: whatever is written, the stored value is finite and in [0, 100].
    #[test]
    fn set_always_stores_in_range(need in arb_need(), value in arb_wild_f64()) {
        let mut needs = NeedsVector::default();
        needs.set(need, value);
        let v = needs.get(need);
        prop_assert!(v.is_finite(), "{} not finite: {}", need, v);
        prop_assert!((0.0..=100.0).contains(&v), "{} out of range: {}", need, v);
    }

    /// Repeated adjustments never escape the range either.
    #[test]
    fn adjust_sequence_stays_in_range(
        need in arb_need(),
        deltas in prop::collection::vec(-500.0f64..500.0, 1..50),
    ) {
        let mut needs = NeedsVector::default();
        for d in deltas {
            needs.adjust(need, d);
            let v = needs.get(need);
            prop_assert!((0.0..=100.0).contains(&v));
        }
    }

    /// The integer level is the rounded value and never exceeds 100.
    #[test]
    fn level_matches_rounding(need in arb_need(), value in 0.0f64..=100.0) {
        let mut needs = NeedsVector::default();
        needs.set(need, value);
        prop_assert_eq!(needs.level(need) as f64, value.round());
    }

    /// Effective decay rates are always usable numbers.
    #[test]
    fn decay_rates_always_finite_non_negative(need in arb_need(), value in arb_wild_f64()) {
        let mut rates = DecayRates::default();
        match need {
            Need::Energy => rates.energy = Some(value),
            Need::Hunger => rates.hunger = Some(value),
            Need::Thirst => rates.thirst = Some(value),
            Need::Hygiene => rates.hygiene = Some(value),
            Need::Bladder => rates.bladder = Some(value),
            Need::Bowel => rates.bowel = Some(value),
            Need::Stress => rates.stress = Some(value),
            Need::Arousal => rates.arousal = Some(value),
            Need::Libido => rates.libido = Some(value),
        }
        let r = rates.rate(need);
        prop_assert!(r.is_finite() && r >= 0.0);
    }

    /// Eros needs only show up when the module is on.
    #[test]
    fn active_needs_follow_eros_flag(eros in any::<bool>()) {
        let modules = ModuleSet { eros, ..Default::default() };
        let active = NeedsVector::default().active(&modules);
        let has_eros = active.iter().any(|(n, _)| n.is_eros());
        prop_assert_eq!(has_eros, eros);
    }
}
