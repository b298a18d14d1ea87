//! Save/load persistence with migration
//!
//! Features:
//! - One JSON blob under a single storage key
//! - Additive migration of older or partial blobs
//! - Corruption recovery (a bad blob loads as a fresh game)

pub mod migration;

use thiserror::Error;

use crate::consts::STORAGE_KEY;
use crate::platform::{Storage, StorageError};
use crate::sim::state::ProgressState;

pub use migration::{MigrationError, migrate, migrate_str};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("could not serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Progress store over any [`Storage`] backend
#[derive(Debug, Clone)]
pub struct PersistentStore<S: Storage> {
    storage: S,
    key: String,
}

impl<S: Storage> PersistentStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            key: STORAGE_KEY.to_string(),
        }
    }

    /// Load progress. Never fails: missing, unreadable or malformed data
    /// yields a fresh state.
    pub fn load(&self) -> ProgressState {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::info!("No saved progress found, starting fresh");
                return ProgressState::default();
            }
            Err(e) => {
                log::warn!("Could not read saved progress ({}), starting fresh", e);
                return ProgressState::default();
            }
        };

        match migrate_str(&raw) {
            Ok(state) => {
                log::info!("Loaded saved progress");
                state
            }
            Err(e) => {
                log::warn!("Saved progress is malformed ({}), starting fresh", e);
                ProgressState::default()
            }
        }
    }

    pub fn save(&mut self, state: &ProgressState) -> Result<(), PersistError> {
        let json = serde_json::to_string(state)?;
        self.storage.set(&self.key, &json)?;
        log::trace!("Progress saved");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), PersistError> {
        self.storage.remove(&self.key)?;
        log::info!("Saved progress cleared");
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
