//! Property-based tests for the turn engine
//!
//! Tests invariants:
//! - Turn advancement keeps the order intact and the pointer in range
//! - A full lap increments the round exactly once
//! - Anchored and round-based conditions expire on exactly the right call

use proptest::prelude::*;

use crate::core::session::CombatState;
use crate::tests::common::fixtures::*;

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("c{}", i)).collect()
}

fn combat_of(n: usize, current_index: usize, round: u32) -> CombatState {
    let names = ids(n);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut state = create_test_combat(&refs);
    state.current_index = current_index;
    state.round = round;
    state
}

/// Combat size, starting pointer and round
fn arb_combat() -> impl Strategy<Value = CombatState> {
    (1usize..8)
        .prop_flat_map(|n| (Just(n), 0..n, 1u32..5))
        .prop_map(|(n, current, round)| combat_of(n, current, round))
}

/// Combat size, starting pointer, holder index and anchor index
fn arb_anchor_case() -> impl Strategy<Value = (usize, usize, usize, usize)> {
    (1usize..7).prop_flat_map(|n| (Just(n), 0..n, 0..n, 0..n))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: advancing never changes the order and keeps the pointer in range
    #[test]
    fn prop_advance_keeps_pointer_in_range(state in arb_combat(), steps in 1usize..20) {
        let mut current = state.clone();
        for _ in 0..steps {
            current = current.advance_turn().state;
            prop_assert_eq!(&current.order, &state.order);
            prop_assert!(current.current_index < current.order.len());
            prop_assert!(current.check_invariants().is_ok());
        }
    }

    /// Property: a full lap adds one round and returns to the starting slot
    #[test]
    fn prop_full_lap_adds_one_round(state in arb_combat()) {
        let lapped = advance_times(&state, state.order.len());
        prop_assert_eq!(lapped.round, state.round + 1);
        prop_assert_eq!(lapped.current_index, state.current_index);
    }

    /// Property: startOfNextTurn expires on the call that makes the anchor current
    #[test]
    fn prop_start_anchor_expires_when_anchor_starts((n, start, holder, anchor) in arb_anchor_case()) {
        let names = ids(n);
        let mut state = combat_of(n, start, 1);
        state = with_condition(state, &names[holder], create_condition("x", start_of_turn(&names[anchor], 1)));

        let expected_call = (anchor + n - start - 1) % n + 1;
        for call in 1..=expected_call {
            let result = state.advance_turn();
            if call < expected_call {
                prop_assert!(has_condition(&result.state, "x"), "expired early at call {}", call);
            } else {
                prop_assert_eq!(result.state.current_id(), Some(names[anchor].as_str()));
                prop_assert!(result.expired_condition_ids.contains(&"x".to_string()));
                prop_assert!(!has_condition(&result.state, "x"));
            }
            state = result.state;
        }
    }

    /// Property: endOfNextTurn expires on the call where the anchor was current
    #[test]
    fn prop_end_anchor_expires_when_anchor_ends((n, start, holder, anchor) in arb_anchor_case()) {
        let names = ids(n);
        let mut state = combat_of(n, start, 1);
        state = with_condition(state, &names[holder], create_condition("x", end_of_turn(&names[anchor], 1)));

        let expected_call = (anchor + n - start) % n + 1;
        for call in 1..=expected_call {
            let was_current = state.current_id().map(str::to_string);
            let result = state.advance_turn();
            if call < expected_call {
                prop_assert!(has_condition(&result.state, "x"), "expired early at call {}", call);
            } else {
                prop_assert_eq!(was_current.as_deref(), Some(names[anchor].as_str()));
                prop_assert!(!has_condition(&result.state, "x"));
            }
            state = result.state;
        }
    }

    /// Property: rounds{N} survives N-1 wraparounds and is gone after the N-th
    #[test]
    fn prop_rounds_survive_n_minus_one_wraps(state in arb_combat(), n in 1u32..5) {
        let holder = state.order[0].clone();
        let mut state = with_condition(state, &holder, create_condition("r", rounds(n)));

        let mut wraps = 0;
        while wraps < n {
            let result = state.advance_turn();
            if result.new_round {
                wraps += 1;
            }
            let alive = has_condition(&result.state, "r");
            prop_assert_eq!(alive, wraps < n, "after {} wraps", wraps);
            state = result.state;
        }
    }

    /// Property: expired ids are exactly the conditions that disappeared
    #[test]
    fn prop_expired_ids_match_removed(state in arb_combat(), turns in 1u32..3) {
        let holder = state.order[state.current_index].clone();
        let state = with_condition(state, &holder, create_condition("e", end_of_turn(&holder, 1)));
        let state = with_condition(state, &holder, create_condition("r", rounds(turns)));

        let result = state.advance_turn();
        for id in ["e", "r"] {
            let gone = !has_condition(&result.state, id);
            prop_assert_eq!(gone, result.expired_condition_ids.contains(&id.to_string()));
        }
    }
}
