//! Combat Tracker
//!
//! Owns the live [`CombatState`] and a bounded undo history. Every mutating
//! command snapshots the previous state before swapping in the new one, so
//! `undo` always restores exactly what was there before the last command.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, info};

use super::combat::{Combatant, CombatState};
use super::conditions::{Condition, ConditionRequest};
use crate::core::dice::RollSource;

/// Default number of undo snapshots kept
pub const DEFAULT_UNDO_LIMIT: usize = 30;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CombatError {
    #[error("Combatant not found: {0}")]
    CombatantNotFound(String),

    #[error("Condition not found: {0}")]
    ConditionNotFound(String),

    #[error("Duplicate combatant id: {0}")]
    DuplicateCombatant(String),

    #[error("Condition name cannot be empty")]
    EmptyConditionName,

    #[error("Nothing to undo")]
    NothingToUndo,
}

pub type CombatResult<T> = std::result::Result<T, CombatError>;

// ============================================================================
// Undo History
// ============================================================================

/// Bounded stack of previous combat states, oldest dropped first
#[derive(Debug, Clone, PartialEq)]
pub struct CombatHistory {
    snapshots: VecDeque<CombatState>,
    limit: usize,
}

impl CombatHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, snapshot: CombatState) {
        if self.limit == 0 {
            return;
        }
        while self.snapshots.len() >= self.limit {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    pub fn pop(&mut self) -> Option<CombatState> {
        self.snapshots.pop_back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

impl Default for CombatHistory {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

/// What happened on a turn advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub expired_condition_ids: Vec<String>,
    pub new_round: bool,
    pub round: u32,
}

// ============================================================================
// Tracker
// ============================================================================

#[derive(Debug, Clone)]
pub struct CombatTracker {
    state: CombatState,
    history: CombatHistory,
}

impl CombatTracker {
    pub fn new(state: CombatState) -> Self {
        Self::with_undo_limit(state, DEFAULT_UNDO_LIMIT)
    }

    pub fn with_undo_limit(state: CombatState, undo_limit: usize) -> Self {
        Self {
            state,
            history: CombatHistory::new(undo_limit),
        }
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn into_state(self) -> CombatState {
        self.state
    }

    pub fn history(&self) -> &CombatHistory {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Snapshot the current state, then swap in `next`
    fn commit(&mut self, next: CombatState) {
        debug_assert!(
            next.check_invariants().is_ok(),
            "combat state invariant broken: {:?}",
            next.check_invariants()
        );
        let previous = std::mem::replace(&mut self.state, next);
        self.history.push(previous);
    }

    fn require_combatant(&self, combatant_id: &str) -> CombatResult<&Combatant> {
        self.state
            .combatant(combatant_id)
            .ok_or_else(|| CombatError::CombatantNotFound(combatant_id.to_string()))
    }

    // ========================================================================
    // Turn Commands
    // ========================================================================

    /// Advance to the next combatant. An empty turn order is left as is
    /// and records no undo snapshot.
    pub fn next_turn(&mut self) -> CombatResult<TurnReport> {
        if self.state.order.is_empty() {
            return Ok(TurnReport {
                expired_condition_ids: Vec::new(),
                new_round: false,
                round: self.state.round,
            });
        }

        let result = self.state.advance_turn();
        let report = TurnReport {
            expired_condition_ids: result.expired_condition_ids,
            new_round: result.new_round,
            round: result.state.round,
        };
        self.commit(result.state);

        if report.new_round {
            info!(combat_id = %self.state.id, round = report.round, "New round");
        }
        debug!(
            combat_id = %self.state.id,
            current = ?self.state.current_id(),
            expired = report.expired_condition_ids.len(),
            "Advanced turn"
        );
        Ok(report)
    }

    pub fn sort_by_initiative(&mut self) {
        let next = self.state.sort_by_initiative();
        self.commit(next);
    }

    pub fn reroll_initiative<S: RollSource + ?Sized>(&mut self, source: &mut S) {
        let next = self.state.reroll_initiative(source);
        self.commit(next);
        info!(combat_id = %self.state.id, "Rolled initiative");
    }

    // ========================================================================
    // Roster Commands
    // ========================================================================

    pub fn add_combatants(&mut self, additions: Vec<Combatant>) -> CombatResult<()> {
        let mut seen: Vec<&str> = self.state.combatants.iter().map(|c| c.id.as_str()).collect();
        for combatant in &additions {
            if seen.contains(&combatant.id.as_str()) {
                return Err(CombatError::DuplicateCombatant(combatant.id.clone()));
            }
            seen.push(&combatant.id);
        }

        let count = additions.len();
        let next = self.state.add_combatants(additions);
        self.commit(next);
        info!(combat_id = %self.state.id, count, "Added combatants");
        Ok(())
    }

    pub fn remove_combatant(&mut self, combatant_id: &str) -> CombatResult<()> {
        self.require_combatant(combatant_id)?;
        let next = self.state.remove_combatant(combatant_id);
        self.commit(next);
        info!(combat_id = %self.state.id, combatant_id, "Removed combatant");
        Ok(())
    }

    pub fn move_combatant(&mut self, moving_id: &str, target_id: &str) -> CombatResult<()> {
        self.require_combatant(moving_id)?;
        self.require_combatant(target_id)?;
        let next = self.state.move_combatant(moving_id, target_id);
        self.commit(next);
        Ok(())
    }

    pub fn apply_hp(&mut self, combatant_id: &str, input: &str) -> CombatResult<()> {
        self.require_combatant(combatant_id)?;
        let next = self.state.apply_hp(combatant_id, input);
        self.commit(next);
        Ok(())
    }

    /// Free-form field edit. Does not create an undo snapshot.
    pub fn update_combatant(
        &mut self,
        combatant_id: &str,
        edit: impl FnOnce(&mut Combatant),
    ) -> CombatResult<()> {
        self.require_combatant(combatant_id)?;
        self.state = self.state.update_combatant(combatant_id, edit);
        Ok(())
    }

    // ========================================================================
    // Condition Commands
    // ========================================================================

    pub fn add_condition(&mut self, target_id: &str, condition: Condition) -> CombatResult<()> {
        self.require_combatant(target_id)?;
        let name = condition.name.clone();
        let next = self.state.add_condition(target_id, condition);
        self.commit(next);
        debug!(target_id, condition = %name, "Added condition");
        Ok(())
    }

    /// Build a condition from a form request at the current round and attach it
    pub fn apply_condition(&mut self, target_id: &str, request: &ConditionRequest) -> CombatResult<String> {
        self.require_combatant(target_id)?;
        if let Some(source_id) = request.source_id.as_deref().filter(|id| !id.is_empty()) {
            self.require_combatant(source_id)?;
        }
        let condition = request
            .build(target_id, self.state.round)
            .ok_or(CombatError::EmptyConditionName)?;
        let id = condition.id.clone();
        self.add_condition(target_id, condition)?;
        Ok(id)
    }

    pub fn remove_condition(&mut self, target_id: &str, condition_id: &str) -> CombatResult<()> {
        if self.require_combatant(target_id)?.condition(condition_id).is_none() {
            return Err(CombatError::ConditionNotFound(condition_id.to_string()));
        }
        let next = self.state.remove_condition(target_id, condition_id);
        self.commit(next);
        Ok(())
    }

    pub fn toggle_concentration(&mut self, combatant_id: &str) -> CombatResult<bool> {
        self.require_combatant(combatant_id)?;
        let next = self.state.toggle_concentration(combatant_id);
        self.commit(next);
        Ok(self
            .state
            .combatant(combatant_id)
            .map(|c| c.is_concentrating)
            .unwrap_or(false))
    }

    // ========================================================================
    // Undo
    // ========================================================================

    pub fn undo(&mut self) -> CombatResult<()> {
        let previous = self.history.pop().ok_or(CombatError::NothingToUndo)?;
        self.state = previous;
        debug!(combat_id = %self.state.id, remaining = self.history.len(), "Undid last command");
        Ok(())
    }
}
