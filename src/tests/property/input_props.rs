//! Property-based tests for HP and dice input
//!
//! Tests invariants:
//! - HP edits always land in `[0, max]` and never touch max or temp
//! - Dice totals fall between the expression's min and max

use proptest::prelude::*;

use crate::core::dice::DiceExpression;
use crate::core::session::{apply_hp_input, HitPoints};

fn arb_hp() -> impl Strategy<Value = HitPoints> {
    (0i32..300, 0i32..50)
        .prop_flat_map(|(max, temp)| (0..=max, Just(max), Just(temp)))
        .prop_map(|(current, max, temp)| HitPoints { current, max, temp })
}

proptest! {
    /// Property: deltas and assignments are clamped into range
    #[test]
    fn prop_hp_clamped(hp in arb_hp(), value in -1000i32..1000, assign in any::<bool>()) {
        let input = if assign { format!("={}", value) } else { format!("{:+}", value) };
        let updated = apply_hp_input(&hp, &input);

        prop_assert!(updated.current >= 0 && updated.current <= hp.max);
        prop_assert_eq!(updated.max, hp.max);
        prop_assert_eq!(updated.temp, hp.temp);
        if assign {
            prop_assert_eq!(updated.current, value.clamp(0, hp.max));
        } else {
            prop_assert_eq!(updated.current, (hp.current + value).clamp(0, hp.max));
        }
    }

    /// Property: arbitrary text never panics and never leaves the valid range
    #[test]
    fn prop_hp_garbage_is_safe(hp in arb_hp(), input in ".{0,12}") {
        let updated = apply_hp_input(&hp, &input);
        prop_assert!(updated.current >= 0 && updated.current <= hp.max.max(hp.current));
    }

    /// Property: rolled totals are bounded by the expression
    #[test]
    fn prop_roll_within_bounds(
        count in 1u32..10,
        sides in 1u32..21,
        modifier in -10i64..10,
        seed in any::<u64>()
    ) {
        use rand::SeedableRng;

        let text = format!("{}d{}{:+}", count, sides, modifier);
        let expression = DiceExpression::parse(&text).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let result = expression.roll_with(&mut rng);

        prop_assert!(result.total >= expression.min_total());
        prop_assert!(result.total <= expression.max_total());
        prop_assert_eq!(result.rolls.len(), count as usize);
    }
}
