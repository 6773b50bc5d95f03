//! Combat State & Turn Engine
//!
//! Holds the roster, the turn order and the round counter, and provides the
//! transitions that keep them consistent: advancing the turn, adding,
//! removing and reordering combatants, and roster edits (HP, conditions,
//! concentration).
//!
//! Every transition takes `&CombatState` and returns a fresh snapshot; the
//! input is never modified.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::conditions::{
    expire_boundary, expire_round_conditions, remove_conditions_by_source, Boundary, Condition,
    ConditionDuration,
};
use super::hp::apply_hp_input;
use super::initiative::{order_by_initiative, roll_initiative, LAIR_INITIATIVE};
use crate::core::dice::RollSource;

/// Current time as epoch milliseconds (the `updatedAt` unit)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// ============================================================================
// Combatant Types
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CombatantKind {
    Pc,
    Npc,
    Monster,
    /// Pseudo-actor holding a monster's lair-action initiative slot
    Lair,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HitPoints {
    pub current: i32,
    pub max: i32,
    pub temp: i32,
}

impl HitPoints {
    /// Full health at `max`
    pub fn full(max: i32) -> Self {
        let max = max.max(0);
        Self { current: max, max, temp: 0 }
    }

    pub fn is_down(&self) -> bool {
        self.max > 0 && self.current == 0
    }
}

// ============================================================================
// Combatant
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    pub id: String,
    pub name: String,
    pub kind: CombatantKind,
    /// Monster template this combatant was spawned from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monster_id: Option<String>,
    pub initiative: i32,
    /// Dexterity score, used only when rerolling initiative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dex: Option<i32>,
    pub hp: HitPoints,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_concentrating: bool,
    pub updated_at: i64,
}

impl Combatant {
    /// Create a blank combatant (initiative 10, 10/10 HP)
    pub fn new(name: impl Into<String>, kind: CombatantKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            monster_id: None,
            initiative: 10,
            dex: None,
            hp: HitPoints::full(10),
            conditions: Vec::new(),
            notes: String::new(),
            is_concentrating: false,
            updated_at: now_millis(),
        }
    }

    /// Create the lair slot for a monster template
    pub fn lair(name: impl Into<String>, monster_id: impl Into<String>) -> Self {
        Self {
            monster_id: Some(monster_id.into()),
            initiative: LAIR_INITIATIVE,
            hp: HitPoints::default(),
            ..Self::new(name, CombatantKind::Lair)
        }
    }

    pub fn is_lair(&self) -> bool {
        self.kind == CombatantKind::Lair
    }

    /// Check if any condition with the given name is active
    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn condition(&self, condition_id: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.id == condition_id)
    }

    fn touch(&mut self) {
        self.updated_at = now_millis();
    }
}

// ============================================================================
// Order Helpers
// ============================================================================

/// Reconcile a possibly stale turn order with the roster.
///
/// Ids no longer in the roster are dropped, survivors keep their relative
/// order, and roster ids missing from the order are appended in roster order.
pub fn normalize_order(combatants: &[Combatant], order: &[String]) -> Vec<String> {
    let roster: HashSet<&str> = combatants.iter().map(|c| c.id.as_str()).collect();
    let mut seen = HashSet::with_capacity(order.len());
    let mut normalized: Vec<String> = order
        .iter()
        .filter(|id| roster.contains(id.as_str()) && seen.insert(id.as_str()))
        .cloned()
        .collect();

    for combatant in combatants {
        if !seen.contains(combatant.id.as_str()) {
            seen.insert(combatant.id.as_str());
            normalized.push(combatant.id.clone());
        }
    }
    normalized
}

// ============================================================================
// Combat State
// ============================================================================

/// Broken structural invariant in a [`CombatState`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Duplicate combatant id: {0}")]
    DuplicateCombatant(String),

    #[error("Turn order does not match the roster")]
    OrderMismatch,

    #[error("Current index {index} out of range for {len} combatants")]
    CurrentIndexOutOfRange { index: usize, len: usize },

    #[error("Round must be at least 1")]
    InvalidRound,

    #[error("Condition {0} has an exhausted countdown")]
    ExhaustedCondition(String),

    #[error("Combatant {id} has {current}/{max} HP")]
    HpOutOfRange { id: String, current: i32, max: i32 },

    #[error("Condition {0} was applied before round 1")]
    InvalidAppliedRound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatState {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter_id: Option<String>,
    pub combatants: Vec<Combatant>,
    /// Turn sequence; a permutation of the combatant ids
    pub order: Vec<String>,
    pub current_index: usize,
    pub round: u32,
    pub updated_at: i64,
}

/// Result of advancing a turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    pub state: CombatState,
    /// Ids of expired conditions: end boundary, then round, then start boundary
    pub expired_condition_ids: Vec<String>,
    pub new_round: bool,
}

impl CombatState {
    /// Create an empty combat at round 1
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            encounter_id: None,
            combatants: Vec::new(),
            order: Vec::new(),
            current_index: 0,
            round: 1,
            updated_at: now_millis(),
        }
    }

    /// Get a combatant by ID
    pub fn combatant(&self, combatant_id: &str) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == combatant_id)
    }

    /// Id of the combatant whose turn it is (pointer clamped into range)
    pub fn current_id(&self) -> Option<&str> {
        let last = self.order.len().checked_sub(1)?;
        self.order.get(self.current_index.min(last)).map(String::as_str)
    }

    /// Get the current combatant
    pub fn current_combatant(&self) -> Option<&Combatant> {
        self.current_id().and_then(|id| self.combatant(id))
    }

    /// The combatant after the current one; needs at least two in the order
    pub fn on_deck(&self) -> Option<&Combatant> {
        if self.order.len() < 2 {
            return None;
        }
        let current = self.current_index.min(self.order.len() - 1);
        let next = &self.order[(current + 1) % self.order.len()];
        self.combatant(next)
    }

    /// Advance to the next turn.
    ///
    /// Runs end-of-turn expiry for the departing actor, round countdown on
    /// wraparound, then start-of-turn expiry for the incoming actor.
    pub fn advance_turn(&self) -> TurnResult {
        if self.order.is_empty() {
            return TurnResult {
                state: self.clone(),
                expired_condition_ids: Vec::new(),
                new_round: false,
            };
        }

        let current = self.current_index.min(self.order.len() - 1);
        let end = expire_boundary(&self.combatants, Boundary::End, &self.order[current]);
        let mut combatants = end.combatants;
        let mut expired = end.expired;

        let mut next = current + 1;
        let mut round = self.round;
        let new_round = next >= self.order.len();
        if new_round {
            next = 0;
            round += 1;
            let tick = expire_round_conditions(&combatants);
            combatants = tick.combatants;
            expired.extend(tick.expired);
        }

        let start = expire_boundary(&combatants, Boundary::Start, &self.order[next]);
        expired.extend(start.expired);

        TurnResult {
            state: Self {
                combatants: start.combatants,
                current_index: next,
                round,
                updated_at: now_millis(),
                ..self.clone()
            },
            expired_condition_ids: expired,
            new_round,
        }
    }

    /// Stable sort of the turn order by initiative (highest first); the
    /// pointer returns to the top.
    pub fn sort_by_initiative(&self) -> Self {
        Self {
            order: order_by_initiative(&self.combatants),
            current_index: 0,
            updated_at: now_millis(),
            ..self.clone()
        }
    }

    /// Reroll everyone's initiative and re-sort
    pub fn reroll_initiative<S: RollSource + ?Sized>(&self, source: &mut S) -> Self {
        let combatants = roll_initiative(&self.combatants, source);
        Self {
            order: order_by_initiative(&combatants),
            combatants,
            current_index: 0,
            updated_at: now_millis(),
            ..self.clone()
        }
    }

    /// Append combatants to the roster and the end of the turn order
    pub fn add_combatants(&self, additions: Vec<Combatant>) -> Self {
        let mut order = self.order.clone();
        order.extend(additions.iter().map(|c| c.id.clone()));

        let mut combatants = self.combatants.clone();
        combatants.extend(additions);

        Self {
            order: normalize_order(&combatants, &order),
            combatants,
            updated_at: now_millis(),
            ..self.clone()
        }
    }

    /// Remove a combatant.
    ///
    /// Concentration conditions it sourced are dropped, and the pointer stays
    /// on the same combatant (index 0 if that was the one removed). Removing
    /// the last instance of a monster template also removes that template's
    /// lair slot.
    pub fn remove_combatant(&self, combatant_id: &str) -> Self {
        let mut removed_ids = vec![combatant_id.to_string()];

        if let Some(removed) = self.combatant(combatant_id) {
            if let (CombatantKind::Monster, Some(template)) = (removed.kind, removed.monster_id.as_deref()) {
                let still_referenced = self.combatants.iter().any(|c| {
                    c.id != combatant_id && !c.is_lair() && c.monster_id.as_deref() == Some(template)
                });
                if !still_referenced {
                    for lair in self
                        .combatants
                        .iter()
                        .filter(|c| c.is_lair() && c.monster_id.as_deref() == Some(template))
                    {
                        log::info!("Removing lair {} with the last {} instance", lair.name, template);
                        removed_ids.push(lair.id.clone());
                    }
                }
            }
        }

        let mut combatants: Vec<Combatant> = self
            .combatants
            .iter()
            .filter(|c| !removed_ids.contains(&c.id))
            .cloned()
            .collect();
        for removed_id in &removed_ids {
            combatants = remove_conditions_by_source(&combatants, removed_id);
        }

        let order = normalize_order(&combatants, &self.order);
        let current_index = self
            .current_id()
            .and_then(|current| order.iter().position(|id| id == current))
            .unwrap_or(0);

        Self {
            combatants,
            order,
            current_index,
            updated_at: now_millis(),
            ..self.clone()
        }
    }

    /// Move `moving_id` into `target_id`'s slot, shifting the rest.
    /// The pointer follows the current combatant.
    pub fn move_combatant(&self, moving_id: &str, target_id: &str) -> Self {
        let from = self.order.iter().position(|id| id == moving_id);
        let to = self.order.iter().position(|id| id == target_id);
        let (Some(from), Some(to)) = (from, to) else {
            return self.clone();
        };
        if from == to {
            return self.clone();
        }

        let mut order = self.order.clone();
        let moved = order.remove(from);
        order.insert(to, moved);

        let current_index = self
            .current_id()
            .and_then(|current| order.iter().position(|id| id == current))
            .unwrap_or(0);

        Self {
            order,
            current_index,
            updated_at: now_millis(),
            ..self.clone()
        }
    }

    /// Apply a combatant edit; unknown ids leave the state unchanged
    pub fn update_combatant(&self, combatant_id: &str, edit: impl FnOnce(&mut Combatant)) -> Self {
        let mut next = self.clone();
        if let Some(combatant) = next.combatants.iter_mut().find(|c| c.id == combatant_id) {
            edit(combatant);
            combatant.touch();
            next.updated_at = now_millis();
        }
        next
    }

    /// Apply an HP edit string (see [`apply_hp_input`])
    pub fn apply_hp(&self, combatant_id: &str, input: &str) -> Self {
        self.update_combatant(combatant_id, |c| c.hp = apply_hp_input(&c.hp, input))
    }

    /// Attach a condition to `target_id`.
    ///
    /// A concentration condition also marks its source as concentrating.
    pub fn add_condition(&self, target_id: &str, condition: Condition) -> Self {
        if self.combatant(target_id).is_none() {
            return self.clone();
        }

        let concentration_source = match &condition.duration {
            ConditionDuration::Concentration { source_id } => Some(source_id.clone()),
            _ => None,
        };

        let mut next = self.update_combatant(target_id, |c| c.conditions.push(condition));
        if let Some(source_id) = concentration_source {
            if let Some(source) = next.combatants.iter_mut().find(|c| c.id == source_id) {
                source.is_concentrating = true;
            }
        }
        next
    }

    /// Remove a single condition from `target_id`
    pub fn remove_condition(&self, target_id: &str, condition_id: &str) -> Self {
        self.update_combatant(target_id, |c| c.conditions.retain(|cond| cond.id != condition_id))
    }

    /// Flip a combatant's concentration flag. Breaking concentration drops
    /// every concentration condition it sourced.
    pub fn toggle_concentration(&self, combatant_id: &str) -> Self {
        let toggled = self.update_combatant(combatant_id, |c| c.is_concentrating = !c.is_concentrating);
        let broke = toggled
            .combatant(combatant_id)
            .is_some_and(|c| !c.is_concentrating);
        if !broke {
            return toggled;
        }
        Self {
            combatants: remove_conditions_by_source(&toggled.combatants, combatant_id),
            ..toggled
        }
    }

    /// Verify the structural invariants of the snapshot
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut ids = HashSet::with_capacity(self.combatants.len());
        for combatant in &self.combatants {
            if !ids.insert(combatant.id.as_str()) {
                return Err(InvariantViolation::DuplicateCombatant(combatant.id.clone()));
            }
        }

        let order_ids: HashSet<&str> = self.order.iter().map(String::as_str).collect();
        if self.order.len() != self.combatants.len() || order_ids != ids {
            return Err(InvariantViolation::OrderMismatch);
        }

        if !self.order.is_empty() && self.current_index >= self.order.len() {
            return Err(InvariantViolation::CurrentIndexOutOfRange {
                index: self.current_index,
                len: self.order.len(),
            });
        }

        if self.round == 0 {
            return Err(InvariantViolation::InvalidRound);
        }

        for combatant in &self.combatants {
            let hp = combatant.hp;
            if hp.current < 0 || hp.current > hp.max {
                return Err(InvariantViolation::HpOutOfRange {
                    id: combatant.id.clone(),
                    current: hp.current,
                    max: hp.max,
                });
            }
        }

        for condition in self.combatants.iter().flat_map(|c| &c.conditions) {
            if condition.duration.remaining() == Some(0) {
                return Err(InvariantViolation::ExhaustedCondition(condition.id.clone()));
            }
            if condition.applied_round == 0 {
                return Err(InvariantViolation::InvalidAppliedRound(condition.id.clone()));
            }
        }

        Ok(())
    }
}

impl Default for CombatState {
    fn default() -> Self {
        Self::new("New Combat")
    }
}

// ============================================================================
// Tests
// ============================================================================
