//! Test Fixtures
//!
//! Shared helpers for creating combatants, combat states and conditions with
//! predictable ids.

use crate::core::session::{CombatState, Combatant, CombatantKind, Condition, ConditionDuration, HitPoints};

// =============================================================================
// Combatant Fixtures
// =============================================================================

/// Create a PC with a fixed id and initiative.
pub fn create_test_combatant(id: &str, initiative: i32) -> Combatant {
    let mut combatant = Combatant::new(id.to_uppercase(), CombatantKind::Pc);
    combatant.id = id.to_string();
    combatant.initiative = initiative;
    combatant
}

/// Create a combatant with full HP configuration.
pub fn create_combatant_with_hp(id: &str, current: i32, max: i32, temp: i32) -> Combatant {
    let mut combatant = create_test_combatant(id, 10);
    combatant.hp = HitPoints { current, max, temp };
    combatant
}

/// Create a monster instance linked to a template.
pub fn create_monster(id: &str, template: &str) -> Combatant {
    let mut combatant = Combatant::new(id, CombatantKind::Monster);
    combatant.id = id.to_string();
    combatant.monster_id = Some(template.to_string());
    combatant
}

/// Create the lair slot for a template.
pub fn create_lair(id: &str, template: &str) -> Combatant {
    let mut lair = Combatant::lair(format!("{} Lair", template), template);
    lair.id = id.to_string();
    lair
}

// =============================================================================
// Combat State Fixtures
// =============================================================================

/// Combat whose order is exactly `ids`, pointer at 0, round 1.
pub fn create_test_combat(ids: &[&str]) -> CombatState {
    let roster = ids
        .iter()
        .enumerate()
        .map(|(i, id)| create_test_combatant(id, 20 - i as i32))
        .collect();
    CombatState::new("Test Combat").add_combatants(roster)
}

/// Advance `times` turns, returning the final state.
pub fn advance_times(state: &CombatState, times: usize) -> CombatState {
    (0..times).fold(state.clone(), |s, _| s.advance_turn().state)
}

/// Attach a condition to `target` directly, bypassing side effects.
pub fn with_condition(mut state: CombatState, target: &str, condition: Condition) -> CombatState {
    if let Some(c) = state.combatants.iter_mut().find(|c| c.id == target) {
        c.conditions.push(condition);
    }
    state
}

// =============================================================================
// Condition Fixtures
// =============================================================================

/// Condition with a fixed id.
pub fn create_condition(id: &str, duration: ConditionDuration) -> Condition {
    let mut condition = Condition::new(id, duration, 1);
    condition.id = id.to_string();
    condition
}

pub fn start_of_turn(anchor: &str, turns: u32) -> ConditionDuration {
    ConditionDuration::StartOfNextTurn { anchor_id: anchor.to_string(), remaining_turns: turns }
}

pub fn end_of_turn(anchor: &str, turns: u32) -> ConditionDuration {
    ConditionDuration::EndOfNextTurn { anchor_id: anchor.to_string(), remaining_turns: turns }
}

pub fn rounds(n: u32) -> ConditionDuration {
    ConditionDuration::Rounds { remaining_rounds: n }
}

pub fn concentration(source: &str) -> ConditionDuration {
    ConditionDuration::Concentration { source_id: source.to_string() }
}

/// Whether any combatant still holds condition `id`.
pub fn has_condition(state: &CombatState, id: &str) -> bool {
    state.combatants.iter().any(|c| c.condition(id).is_some())
}
