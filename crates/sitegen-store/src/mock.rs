//! Mock store implementation for testing.
//!
//! Provides [`MockStore`] for unit testing without filesystem access.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::model::Structure;
use crate::store::{StoreError, StructureStore};

/// In-memory structure store.
///
/// Keeps the "persisted" structure in memory. Saves can be made to fail to
/// exercise the write-failure path.
///
/// # Example
///
/// ```ignore
/// use sitegen_store::{MockStore, StructureStore};
///
/// let store = MockStore::new().with_structure(structure);
/// store.fail_saves(true);
/// assert!(store.save(&other).is_err());
/// ```
#[derive(Debug, Default)]
pub struct MockStore {
    structure: RwLock<Structure>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
    transaction_lock: Mutex<()>,
}

impl MockStore {
    /// Create an empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the persisted structure.
    #[must_use]
    pub fn with_structure(self, structure: Structure) -> Self {
        *self
            .structure
            .write()
            .unwrap_or_else(PoisonError::into_inner) = structure;
        self
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Snapshot of the persisted structure.
    #[must_use]
    pub fn snapshot(&self) -> Structure {
        self.structure
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StructureStore for MockStore {
    fn load(&self) -> Result<Structure, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, structure: &Structure) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Serialize("codec unavailable".to_owned()));
        }
        *self
            .structure
            .write()
            .unwrap_or_else(PoisonError::into_inner) = structure.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_owned()
    }

    fn transaction_lock(&self) -> &Mutex<()> {
        &self.transaction_lock
    }
}
