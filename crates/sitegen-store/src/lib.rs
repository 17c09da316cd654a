//! Structure document persistence for sitegen.
//!
//! This crate owns the persisted site structure: the ordered list of menu
//! entries and offering cards that every other sitegen component derives
//! its output from.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Structure`], [`MenuNode`] and [`OfferingItem`] data model
//! - [`StructureStore`] trait with `load()` and `save()`
//! - [`FileStore`] for TOML/JSON documents with atomic saves
//! - [`Synchronizer`] applying editor change batches (two-tier upsert)
//! - [`check_integrity`] for tolerated read-time inconsistencies
//! - [`MockStore`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sitegen_store::{Change, ChangeKind, FileStore, Synchronizer};
//!
//! let store = Arc::new(FileStore::new("site_structure.toml")?);
//! let sync = Synchronizer::new(store);
//! sync.apply(&[Change::new(ChangeKind::Menu).with_id(2).with_text("Updated")])?;
//! ```

mod fs;
mod integrity;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod model;
mod store;
mod sync;

pub use fs::{FileStore, write_atomic};
pub use integrity::{IntegrityWarning, check_integrity};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockStore;
pub use model::{MenuNode, OfferingItem, Structure};
pub use store::{Format, StoreError, StructureStore};
pub use sync::{
    Action, Change, ChangeKind, ChangeOutcome, MatchedBy, SyncError, SyncReport, Synchronizer,
    apply_changes, parse_changes,
};
