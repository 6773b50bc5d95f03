//! Condition Expiry Tests
//!
//! Two-combatant scenarios with order `[a, b]`, pointer 0, round 1.

use crate::core::session::{remove_conditions_by_source, CombatState, Condition};
use crate::tests::common::fixtures::*;

fn base_state() -> CombatState {
    create_test_combat(&["a", "b"])
}

fn held_by_b(condition: Condition) -> CombatState {
    with_condition(base_state(), "b", condition)
}

// =============================================================================
// Boundary Tests
// =============================================================================

#[test]
fn test_expires_at_start_of_next_turn_boundary() {
    let state = held_by_b(create_condition("c1", start_of_turn("a", 1)));

    let first = state.advance_turn();
    assert!(has_condition(&first.state, "c1"));
    assert!(first.expired_condition_ids.is_empty());

    let second = first.state.advance_turn();
    assert!(!has_condition(&second.state, "c1"));
    assert_eq!(second.expired_condition_ids, vec!["c1".to_string()]);
}

#[test]
fn test_expires_at_end_of_target_next_turn_boundary() {
    let state = held_by_b(create_condition("c2", end_of_turn("b", 1)));

    let first = state.advance_turn();
    assert!(has_condition(&first.state, "c2"));

    let second = first.state.advance_turn();
    assert!(!has_condition(&second.state, "c2"));
    assert_eq!(second.expired_condition_ids, vec!["c2".to_string()]);
}

#[test]
fn test_expires_after_round_countdown() {
    let state = with_condition(base_state(), "a", create_condition("c3", rounds(1)));

    let second = advance_times(&state, 2);
    assert_eq!(second.round, 2);
    assert!(!has_condition(&second, "c3"));
}

#[test]
fn test_end_of_turn_matches_departing_actor_exactly() {
    // `a` is current when the call starts, so its end boundary fires now
    let state = held_by_b(create_condition("c4", end_of_turn("a", 1)));
    let result = state.advance_turn();
    assert_eq!(result.expired_condition_ids, vec!["c4".to_string()]);

    // Starting from `b`, the departing actor is `b`; `a` only starts
    let mut from_b = held_by_b(create_condition("c5", end_of_turn("a", 1)));
    from_b.current_index = 1;
    let result = from_b.advance_turn();
    assert!(result.expired_condition_ids.is_empty());
    assert!(has_condition(&result.state, "c5"));
}

#[test]
fn test_rounds_survive_n_minus_one_wraps() {
    let state = with_condition(base_state(), "b", create_condition("r3", rounds(3)));

    let two_rounds = advance_times(&state, 4);
    assert_eq!(two_rounds.round, 3);
    assert!(has_condition(&two_rounds, "r3"));

    let three_rounds = advance_times(&two_rounds, 2);
    assert_eq!(three_rounds.round, 4);
    assert!(!has_condition(&three_rounds, "r3"));
}

#[test]
fn test_expired_ids_in_boundary_order() {
    // b -> a wraps: end(b), then round, then start(a)
    let mut state = base_state();
    state.current_index = 1;
    let state = with_condition(state, "a", create_condition("start", start_of_turn("a", 1)));
    let state = with_condition(state, "a", create_condition("round", rounds(1)));
    let state = with_condition(state, "a", create_condition("end", end_of_turn("b", 1)));

    let result = state.advance_turn();
    assert_eq!(result.expired_condition_ids, vec!["end", "round", "start"]);
    assert!(result.state.combatant("a").unwrap().conditions.is_empty());
}

#[test]
fn test_concentration_never_expires_on_its_own() {
    let state = held_by_b(create_condition("held", concentration("a")));
    let later = advance_times(&state, 20);
    assert!(has_condition(&later, "held"));
}

#[test]
fn test_multi_turn_countdown() {
    let state = held_by_b(create_condition("slow", start_of_turn("b", 2)));

    let first = state.advance_turn();
    assert!(has_condition(&first.state, "slow"));

    let later = advance_times(&first.state, 2);
    assert!(!has_condition(&later, "slow"));
}

// =============================================================================
// Concentration Tests
// =============================================================================

#[test]
fn test_remove_by_source_all_and_only() {
    let state = base_state();
    let state = with_condition(state, "a", create_condition("x1", concentration("x")));
    let state = with_condition(state, "b", create_condition("x2", concentration("x")));
    let state = with_condition(state, "b", create_condition("y1", concentration("y")));
    let state = with_condition(state, "b", create_condition("r", rounds(2)).from_source("x"));
    let state = with_condition(state, "b", create_condition("s", start_of_turn("x", 1)).from_source("x"));

    let cleaned = remove_conditions_by_source(&state.combatants, "x");
    let left: Vec<&str> = cleaned
        .iter()
        .flat_map(|c| c.conditions.iter().map(|cond| cond.id.as_str()))
        .collect();
    assert_eq!(left, vec!["y1", "r", "s"]);
}

#[test]
fn test_breaking_concentration_via_toggle() {
    let state = base_state().add_condition("b", create_condition("held", concentration("a")));
    assert!(state.combatant("a").unwrap().is_concentrating);

    let state = state.toggle_concentration("a");
    assert!(!has_condition(&state, "held"));
}

#[test]
fn test_concentration_from_unknown_source_sets_no_flag() {
    let state = base_state().add_condition("b", create_condition("held", concentration("ghost")));
    assert!(has_condition(&state, "held"));
    assert!(state.combatants.iter().all(|c| !c.is_concentrating));
}
