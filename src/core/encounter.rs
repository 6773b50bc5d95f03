//! Encounters & Monsters
//!
//! Stored monster templates and prepared encounters, and the expansion of an
//! encounter into a ready-to-run [`CombatState`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::session::combat::{now_millis, CombatState, Combatant, CombatantKind, HitPoints};
use crate::core::session::initiative::order_by_initiative;

// ============================================================================
// Monster Templates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(rename = "str")]
    pub strength: i32,
    #[serde(rename = "dex")]
    pub dexterity: i32,
    #[serde(rename = "con")]
    pub constitution: i32,
    #[serde(rename = "int")]
    pub intelligence: i32,
    #[serde(rename = "wis")]
    pub wisdom: i32,
    #[serde(rename = "cha")]
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defense {
    pub ac: i32,
    pub hp: i32,
    /// Speeds, resistances and the rest of the stat block
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Defense {
    fn default() -> Self {
        Self { ac: 12, hp: 10, extra: Map::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LairAction {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A monster stat block.
///
/// Only the fields combat reads are typed; everything else in the stat block
/// is kept verbatim in `extra` so exports round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monster {
    pub id: String,
    pub name: String,
    pub cr: f32,
    pub abilities: AbilityScores,
    pub defense: Defense,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lair_actions: Vec<LairAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lair_name: Option<String>,
    pub updated_at: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Monster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            cr: 1.0,
            abilities: AbilityScores::default(),
            defense: Defense::default(),
            lair_actions: Vec::new(),
            lair_name: None,
            updated_at: now_millis(),
            extra: Map::new(),
        }
    }

    pub fn has_lair(&self) -> bool {
        !self.lair_actions.is_empty()
    }

    /// Display name of this monster's lair slot
    pub fn lair_display_name(&self) -> String {
        match self.lair_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{} Lair", self.name),
        }
    }

    /// Lair combatant for this template
    pub fn lair_combatant(&self) -> Combatant {
        Combatant::lair(self.lair_display_name(), self.id.clone())
    }
}

// ============================================================================
// Encounters
// ============================================================================

/// One roster line of a prepared encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterEntry {
    pub id: String,
    pub name: String,
    pub kind: CombatantKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monster_id: Option<String>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EncounterEntry {
    pub fn new(name: impl Into<String>, kind: CombatantKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            monster_id: None,
            quantity: 1,
            hp_max: None,
            initiative: None,
            notes: None,
        }
    }

    /// Entry spawning `quantity` copies of a monster template
    pub fn for_monster(monster: &Monster, quantity: u32) -> Self {
        Self {
            monster_id: Some(monster.id.clone()),
            quantity: quantity.max(1),
            ..Self::new(monster.name.clone(), CombatantKind::Monster)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub combatants: Vec<EncounterEntry>,
    pub updated_at: i64,
}

impl Encounter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            notes: Some(String::new()),
            combatants: Vec::new(),
            updated_at: now_millis(),
        }
    }

    /// Builder: add a roster line
    pub fn with_entry(mut self, entry: EncounterEntry) -> Self {
        self.combatants.push(entry);
        self
    }
}

// ============================================================================
// Expansion
// ============================================================================

/// Fallback values for combatants without explicit stats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatDefaults {
    pub initiative: i32,
    pub hp: i32,
}

impl Default for CombatDefaults {
    fn default() -> Self {
        Self {
            initiative: 10,
            hp: 10,
        }
    }
}

fn entry_combatants(
    entry: &EncounterEntry,
    monster: Option<&Monster>,
    defaults: &CombatDefaults,
) -> Vec<Combatant> {
    let quantity = entry.quantity.max(1);
    let hp = entry
        .hp_max
        .or_else(|| monster.map(|m| m.defense.hp))
        .unwrap_or(defaults.hp);

    (1..=quantity)
        .map(|n| {
            let name = if quantity > 1 {
                format!("{} {}", entry.name, n)
            } else {
                entry.name.clone()
            };
            let mut combatant = Combatant::new(name, entry.kind);
            combatant.monster_id = entry.monster_id.clone();
            combatant.initiative = entry.initiative.unwrap_or(defaults.initiative);
            combatant.dex = monster.map(|m| m.abilities.dexterity);
            combatant.hp = HitPoints::full(hp);
            combatant.notes = entry.notes.clone().unwrap_or_default();
            combatant
        })
        .collect()
}

/// Expand an encounter into a fresh combat.
///
/// Each entry yields `quantity` combatants (numbered when more than one).
/// Every distinct template with lair actions adds one lair combatant. The
/// turn order is sorted by initiative.
pub fn create_combat_from_encounter(
    encounter: &Encounter,
    monsters: &[Monster],
    defaults: &CombatDefaults,
) -> CombatState {
    let by_id: HashMap<&str, &Monster> = monsters.iter().map(|m| (m.id.as_str(), m)).collect();
    let mut combatants = Vec::new();
    let mut lair_templates: Vec<&Monster> = Vec::new();

    for entry in &encounter.combatants {
        let monster = entry.monster_id.as_deref().and_then(|id| by_id.get(id).copied());
        if entry.monster_id.is_some() && monster.is_none() {
            log::warn!("Encounter entry {} references unknown monster {:?}", entry.name, entry.monster_id);
        }
        if let Some(monster) = monster.filter(|m| m.has_lair()) {
            if !lair_templates.iter().any(|m| m.id == monster.id) {
                lair_templates.push(monster);
            }
        }
        combatants.extend(entry_combatants(entry, monster, defaults));
    }

    combatants.extend(lair_templates.iter().map(|m| m.lair_combatant()));

    log::info!(
        "Created combat from encounter {} with {} combatants ({} lairs)",
        encounter.name,
        combatants.len(),
        lair_templates.len()
    );

    CombatState {
        encounter_id: Some(encounter.id.clone()),
        order: order_by_initiative(&combatants),
        combatants,
        ..CombatState::new(encounter.name.clone())
    }
}

/// Quick-add `count` instances of a monster template.
/// Numbering starts after the instances already present in `existing`.
pub fn monster_combatants(
    monster: &Monster,
    count: u32,
    existing: &[Combatant],
    defaults: &CombatDefaults,
) -> Vec<Combatant> {
    let already = existing
        .iter()
        .filter(|c| !c.is_lair() && c.monster_id.as_deref() == Some(monster.id.as_str()))
        .count() as u32;
    let count = count.max(1);
    let numbered = already + count > 1;

    let mut added: Vec<Combatant> = (1..=count)
        .map(|n| {
            let name = if numbered {
                format!("{} {}", monster.name, already + n)
            } else {
                monster.name.clone()
            };
            let mut combatant = Combatant::new(name, CombatantKind::Monster);
            combatant.monster_id = Some(monster.id.clone());
            combatant.initiative = defaults.initiative;
            combatant.dex = Some(monster.abilities.dexterity);
            combatant.hp = HitPoints::full(monster.defense.hp);
            combatant
        })
        .collect();

    let lair_present = existing
        .iter()
        .any(|c| c.is_lair() && c.monster_id.as_deref() == Some(monster.id.as_str()));
    if monster.has_lair() && !lair_present {
        added.push(monster.lair_combatant());
    }
    added
}

/// Blank roster entry added by hand
pub fn custom_combatant(name: &str, kind: CombatantKind) -> Combatant {
    let name = name.trim();
    let name = if name.is_empty() { "New Combatant" } else { name };
    Combatant::new(name, kind)
}
