//! Session Module
//!
//! Live combat: the turn engine, condition expiry, initiative, hit point
//! edits and the undo-aware tracker.

pub mod combat;
pub mod conditions;
pub mod hp;
pub mod initiative;
pub mod tracker;

// Re-exports for convenience
pub use combat::{
    normalize_order, now_millis, CombatState, Combatant, CombatantKind, HitPoints,
    InvariantViolation, TurnResult,
};

pub use conditions::{
    expire_boundary, expire_round_conditions, remove_conditions_by_source, Boundary, Condition,
    ConditionDuration, ConditionRequest, DurationChoice, ExpiryOutcome,
};

pub use hp::apply_hp_input;
pub use initiative::{order_by_initiative, roll_initiative, LAIR_INITIATIVE};
pub use tracker::{
    CombatError, CombatHistory, CombatResult, CombatTracker, TurnReport, DEFAULT_UNDO_LIMIT,
};
