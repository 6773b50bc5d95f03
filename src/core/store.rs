//! Combat Store
//!
//! Persistence seam for combat states. The engine never talks to storage
//! directly; callers load and save snapshots through [`CombatStore`]. The
//! CLI seeds an [`InMemoryCombatStore`] from the export document and writes
//! it back with [`ExportData::sync_combats`].
//!
//! [`ExportData::sync_combats`]: crate::core::export::ExportData::sync_combats

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use crate::core::session::combat::CombatState;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Combat not found: {0}")]
    NotFound(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Keyed storage for combat snapshots. Writes are last-write-wins.
pub trait CombatStore: Send + Sync {
    fn get(&self, id: &str) -> StoreResult<Option<CombatState>>;

    fn put(&self, state: CombatState) -> StoreResult<()>;

    fn delete(&self, id: &str) -> StoreResult<()>;

    /// All stored combats, most recently updated first
    fn list(&self) -> StoreResult<Vec<CombatState>>;

    /// Like [`CombatStore::get`] but missing ids are an error
    fn require(&self, id: &str) -> StoreResult<CombatState> {
        self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

/// Process-local store backed by a map
#[derive(Debug, Default)]
pub struct InMemoryCombatStore {
    combats: RwLock<HashMap<String, CombatState>>,
}

impl InMemoryCombatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from existing snapshots
    pub fn with_combats(combats: impl IntoIterator<Item = CombatState>) -> Self {
        let combats = combats.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            combats: RwLock::new(combats),
        }
    }
}

impl CombatStore for InMemoryCombatStore {
    fn get(&self, id: &str) -> StoreResult<Option<CombatState>> {
        let combats = self.combats.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(combats.get(id).cloned())
    }

    fn put(&self, state: CombatState) -> StoreResult<()> {
        let mut combats = self.combats.write().map_err(|_| StoreError::LockPoisoned)?;
        log::debug!("Storing combat {} (round {})", state.id, state.round);
        combats.insert(state.id.clone(), state);
        Ok(())
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let mut combats = self.combats.write().map_err(|_| StoreError::LockPoisoned)?;
        combats
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list(&self) -> StoreResult<Vec<CombatState>> {
        let combats = self.combats.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut all: Vec<CombatState> = combats.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }
}
