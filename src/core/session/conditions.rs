//! Condition Expiry Engine
//!
//! Timed effects attached to combatants and the rules that count them down.
//! The turn engine calls in at three boundaries per transition:
//! end of the departing actor's turn, round wraparound, and start of the
//! incoming actor's turn. Every function here is a pure transformation over
//! a roster slice.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::combat::Combatant;

// ============================================================================
// Duration Types
// ============================================================================

/// How a condition's lifetime is measured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ConditionDuration {
    /// Ends when it is about to become `anchor_id`'s turn
    StartOfNextTurn { anchor_id: String, remaining_turns: u32 },
    /// Ends when `anchor_id`'s turn has just ended
    EndOfNextTurn { anchor_id: String, remaining_turns: u32 },
    /// Ends after a number of round wraparounds
    Rounds { remaining_rounds: u32 },
    /// Lasts while `source_id` keeps concentrating
    Concentration { source_id: String },
}

impl ConditionDuration {
    /// Human-readable description of the remaining duration
    pub fn description(&self) -> String {
        match self {
            Self::StartOfNextTurn { remaining_turns: 1, .. } => "until start of next turn".to_string(),
            Self::StartOfNextTurn { remaining_turns, .. } => {
                format!("until start of turn ({} left)", remaining_turns)
            }
            Self::EndOfNextTurn { remaining_turns: 1, .. } => "until end of next turn".to_string(),
            Self::EndOfNextTurn { remaining_turns, .. } => {
                format!("until end of turn ({} left)", remaining_turns)
            }
            Self::Rounds { remaining_rounds } => format!(
                "{} round{}",
                remaining_rounds,
                if *remaining_rounds == 1 { "" } else { "s" }
            ),
            Self::Concentration { .. } => "concentration".to_string(),
        }
    }

    /// Whether this duration counts down on its own
    pub fn is_timed(&self) -> bool {
        !matches!(self, Self::Concentration { .. })
    }

    /// Remaining countdown, if any
    pub fn remaining(&self) -> Option<u32> {
        match self {
            Self::StartOfNextTurn { remaining_turns, .. } | Self::EndOfNextTurn { remaining_turns, .. } => {
                Some(*remaining_turns)
            }
            Self::Rounds { remaining_rounds } => Some(*remaining_rounds),
            Self::Concentration { .. } => None,
        }
    }
}

/// Turn boundary at which anchored durations are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    Start,
    End,
}

// ============================================================================
// Condition
// ============================================================================

/// A named timed effect attached to a combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    pub name: String,
    /// Combatant who applied it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub duration: ConditionDuration,
    pub applied_round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Condition {
    pub fn new(name: impl Into<String>, duration: ConditionDuration, applied_round: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            source_id: None,
            duration,
            applied_round: applied_round.max(1),
            notes: None,
        }
    }

    /// Builder: set source
    pub fn from_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Builder: attach notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Tick against a turn boundary.
    /// Returns `None` when the condition expires here.
    fn tick_boundary(mut self, boundary: Boundary, anchor: &str) -> Option<Self> {
        if let (ConditionDuration::StartOfNextTurn { anchor_id, remaining_turns }, Boundary::Start)
        | (ConditionDuration::EndOfNextTurn { anchor_id, remaining_turns }, Boundary::End) =
            (&mut self.duration, boundary)
        {
            if *anchor_id == anchor {
                *remaining_turns = remaining_turns.saturating_sub(1);
                if *remaining_turns == 0 {
                    return None;
                }
            }
        }
        Some(self)
    }

    /// Tick for a round wraparound.
    /// Returns `None` when the condition expires here.
    fn tick_round(mut self) -> Option<Self> {
        if let ConditionDuration::Rounds { remaining_rounds } = &mut self.duration {
            *remaining_rounds = remaining_rounds.saturating_sub(1);
            if *remaining_rounds == 0 {
                return None;
            }
        }
        Some(self)
    }
}

// ============================================================================
// Expiry
// ============================================================================

/// Updated roster plus the ids of conditions that expired, in removal order
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryOutcome {
    pub combatants: Vec<Combatant>,
    pub expired: Vec<String>,
}

fn tick_all(
    combatants: &[Combatant],
    mut tick: impl FnMut(Condition) -> Option<Condition>,
) -> ExpiryOutcome {
    let mut expired = Vec::new();
    let combatants = combatants
        .iter()
        .map(|combatant| {
            let mut next = combatant.clone();
            next.conditions = combatant
                .conditions
                .iter()
                .cloned()
                .filter_map(|condition| {
                    let id = condition.id.clone();
                    let kept = tick(condition);
                    if kept.is_none() {
                        expired.push(id);
                    }
                    kept
                })
                .collect();
            next
        })
        .collect();

    ExpiryOutcome { combatants, expired }
}

/// Count down `startOfNextTurn` (for [`Boundary::Start`]) or `endOfNextTurn`
/// (for [`Boundary::End`]) conditions anchored on `anchor_id`.
pub fn expire_boundary(combatants: &[Combatant], boundary: Boundary, anchor_id: &str) -> ExpiryOutcome {
    tick_all(combatants, |condition| condition.tick_boundary(boundary, anchor_id))
}

/// Count down every `rounds` condition regardless of anchor.
pub fn expire_round_conditions(combatants: &[Combatant]) -> ExpiryOutcome {
    tick_all(combatants, Condition::tick_round)
}

/// Drop every concentration condition sourced by `source_id`.
/// Other duration kinds are never removed by source.
pub fn remove_conditions_by_source(combatants: &[Combatant], source_id: &str) -> Vec<Combatant> {
    combatants
        .iter()
        .map(|combatant| {
            let mut next = combatant.clone();
            next.conditions.retain(|condition| match &condition.duration {
                ConditionDuration::Concentration { source_id: source } => source != source_id,
                _ => true,
            });
            next
        })
        .collect()
}

// ============================================================================
// Condition Builder
// ============================================================================

/// Duration picked when applying a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DurationChoice {
    /// Until the start of the source's (or target's) next turn
    Start,
    /// Until the end of the target's next turn
    End,
    /// A number of rounds (at least one)
    Rounds(u32),
    /// Tied to the source's (or target's) concentration
    Concentration,
}

/// Request to apply a condition to a combatant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRequest {
    pub name: String,
    pub duration: DurationChoice,
    pub source_id: Option<String>,
}

impl ConditionRequest {
    pub fn new(name: impl Into<String>, duration: DurationChoice) -> Self {
        Self {
            name: name.into(),
            duration,
            source_id: None,
        }
    }

    /// Builder: set source
    pub fn from_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Resolve the request into a condition for `target_id`.
    /// Returns `None` for a blank name.
    pub fn build(&self, target_id: &str, round: u32) -> Option<Condition> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }

        let source = self
            .source_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(target_id)
            .to_string();

        let duration = match self.duration {
            DurationChoice::Start => ConditionDuration::StartOfNextTurn {
                anchor_id: source,
                remaining_turns: 1,
            },
            DurationChoice::End => ConditionDuration::EndOfNextTurn {
                anchor_id: target_id.to_string(),
                remaining_turns: 1,
            },
            DurationChoice::Rounds(n) => ConditionDuration::Rounds {
                remaining_rounds: n.max(1),
            },
            DurationChoice::Concentration => ConditionDuration::Concentration { source_id: source },
        };

        let mut condition = Condition::new(name, duration, round);
        condition.source_id = self.source_id.clone().filter(|id| !id.is_empty());
        Some(condition)
    }
}

// ============================================================================
// Tests
// ============================================================================
