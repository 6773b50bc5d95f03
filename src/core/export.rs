//! Export & Import
//!
//! The whole data set (monsters, encounters, combat states, settings) as one
//! pretty-printed JSON document. Imports are validated before anything is
//! handed back to the caller; a file that fails validation is rejected whole.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::encounter::{Encounter, Monster};
use crate::core::session::combat::{CombatState, CombatantKind};
use crate::core::store::{CombatStore, InMemoryCombatStore, StoreError};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Id of the single settings record
pub const SETTINGS_ID: &str = "app";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_encounter_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            last_encounter_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub monsters: Vec<Monster>,
    pub encounters: Vec<Encounter>,
    pub combat_states: Vec<CombatState>,
    pub settings: Vec<Settings>,
}

impl ExportData {
    pub fn to_json(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate an export document
    pub fn from_json(json: &str) -> ExportResult<Self> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        log::info!(
            "Imported {} monsters, {} encounters, {} combats",
            data.monsters.len(),
            data.encounters.len(),
            data.combat_states.len()
        );
        Ok(data)
    }

    pub fn read_file(path: &Path) -> ExportResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn write_file(&self, path: &Path) -> ExportResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        log::debug!("Wrote export to {}", path.display());
        Ok(())
    }

    pub fn combat(&self, id: &str) -> Option<&CombatState> {
        self.combat_states.iter().find(|c| c.id == id)
    }

    pub fn encounter(&self, id: &str) -> Option<&Encounter> {
        self.encounters.iter().find(|e| e.id == id)
    }

    /// Insert or replace a combat state by id
    pub fn upsert_combat(&mut self, state: CombatState) {
        match self.combat_states.iter_mut().find(|c| c.id == state.id) {
            Some(existing) => *existing = state,
            None => self.combat_states.push(state),
        }
    }

    /// Store seeded with this document's combats
    pub fn combat_store(&self) -> InMemoryCombatStore {
        InMemoryCombatStore::with_combats(self.combat_states.iter().cloned())
    }

    /// Replace this document's combats with the contents of `store`.
    /// Combats keep their position; new ones are appended newest first.
    pub fn sync_combats(&mut self, store: &dyn CombatStore) -> ExportResult<()> {
        let stored = store.list()?;
        self.combat_states
            .retain(|existing| stored.iter().any(|c| c.id == existing.id));
        for state in stored {
            self.upsert_combat(state);
        }
        Ok(())
    }

    /// Most recently updated combat
    pub fn latest_combat(&self) -> Option<&CombatState> {
        self.combat_states.iter().max_by_key(|c| c.updated_at)
    }

    /// Check everything serde cannot: quantities, id uniqueness and the
    /// structural invariants of every combat state.
    pub fn validate(&self) -> ExportResult<()> {
        unique_ids("monster", self.monsters.iter().map(|m| m.id.as_str()))?;
        unique_ids("encounter", self.encounters.iter().map(|e| e.id.as_str()))?;
        unique_ids("combat", self.combat_states.iter().map(|c| c.id.as_str()))?;

        for encounter in &self.encounters {
            for entry in &encounter.combatants {
                if entry.quantity < 1 {
                    return Err(invalid(format!(
                        "encounter {} entry {} has quantity 0",
                        encounter.id, entry.id
                    )));
                }
                if entry.kind == CombatantKind::Lair {
                    return Err(invalid(format!(
                        "encounter {} entry {} cannot be a lair",
                        encounter.id, entry.id
                    )));
                }
            }
        }

        for state in &self.combat_states {
            state
                .check_invariants()
                .map_err(|e| invalid(format!("combat {}: {}", state.id, e)))?;
        }

        if let Some(settings) = self.settings.iter().find(|s| s.id != SETTINGS_ID) {
            return Err(invalid(format!("unexpected settings id {}", settings.id)));
        }
        Ok(())
    }
}

fn invalid(message: String) -> ExportError {
    ExportError::InvalidData(message)
}

fn unique_ids<'a>(what: &str, ids: impl Iterator<Item = &'a str>) -> ExportResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(invalid(format!("duplicate {} id {}", what, id)));
        }
    }
    Ok(())
}

/// Default download name for an export taken on `date`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("dnd-tracker-export-{}.json", date.format("%Y-%m-%d"))
}
