//! Batch upsert of editor changes.
//!
//! Each [`Change`] targets either a menu or an offering. Lookup is two-tier:
//!
//! 1. **Primary**: by `id`, whenever the change carries one.
//! 2. **Legacy fallback**: only when no id is given. Menus match on their
//!    title; offerings match on owning menu plus `old_text`.
//!
//! A matched record gets only the fields present in the change. Unmatched
//! changes insert a new record with the next free id of that collection.
//!
//! Changes apply strictly in order to a private copy of the structure, so a
//! later change can target a record inserted earlier in the same batch, and
//! a failing change leaves the caller's structure untouched.

use std::fmt;
use std::sync::{Arc, PoisonError};

use serde::{Deserialize, Serialize};

use crate::model::{MenuNode, OfferingItem, Structure, deserialize_id};
use crate::store::{StoreError, StructureStore};

/// Which collection a change targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A navigation entry.
    Menu,
    /// An offering card.
    Offering,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menu => f.write_str("menu"),
            Self::Offering => f.write_str("offering"),
        }
    }
}

/// One edit submitted by the editor.
///
/// Absent fields are left alone on update and not written on insert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Target collection.
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Explicit record id.
    #[serde(
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<u64>,
    /// Menu title (menus) or owning menu reference (offerings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<String>,
    /// Parent reference (menus only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// New text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// New description (menus only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New link (offerings only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// New logical image name (offerings only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Previous offering text, used as the legacy match key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_text: Option<String>,
}

impl Change {
    /// Start an empty change of the given kind.
    #[must_use]
    pub fn new(kind: ChangeKind) -> Self {
        Self {
            kind,
            id: None,
            menu: None,
            parent: None,
            text: None,
            description: None,
            link: None,
            image: None,
            old_text: None,
        }
    }

    /// Set the explicit id.
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the menu title / owning menu.
    #[must_use]
    pub fn with_menu(mut self, menu: impl Into<String>) -> Self {
        self.menu = Some(menu.into());
        self
    }

    /// Set the parent reference.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the link.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Set the image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the legacy match text.
    #[must_use]
    pub fn with_old_text(mut self, old_text: impl Into<String>) -> Self {
        self.old_text = Some(old_text.into());
        self
    }
}

/// How an existing record was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    /// Primary lookup by id.
    Id,
    /// Legacy fallback by title (menus) or menu + previous text (offerings).
    LegacyKey,
}

/// What happened to one change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// A new record was appended.
    Inserted,
    /// An existing record was updated.
    Updated,
}

/// Result of applying one change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeOutcome {
    /// Target collection.
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Id of the affected record (legacy records may have none).
    pub id: Option<u64>,
    /// Insert or update.
    pub action: Action,
    /// Lookup tier that found the record, for updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_by: Option<MatchedBy>,
    /// References rewritten by a menu rename.
    #[serde(skip_serializing_if = "is_zero")]
    pub references_updated: usize,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Outcomes of a whole batch, in submission order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// One entry per change.
    pub outcomes: Vec<ChangeOutcome>,
}

impl SyncReport {
    /// Number of inserted records.
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.count(Action::Inserted)
    }

    /// Number of updated records.
    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(Action::Updated)
    }

    fn count(&self, action: Action) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }
}

/// Error returned when a batch can't be applied.
///
/// Any error rejects the whole batch.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// An insert lacks a required field.
    #[error("change #{index}: inserting a {kind} requires '{field}'")]
    MissingField {
        /// Position in the batch.
        index: usize,
        /// Target collection.
        kind: ChangeKind,
        /// Missing field name.
        field: &'static str,
    },
    /// The change's `type` is neither `menu` nor `offering`.
    #[error("change #{index}: unknown change type '{kind}'")]
    UnknownKind {
        /// Position in the batch.
        index: usize,
        /// The rejected type value.
        kind: String,
    },
    /// The change is not a well-formed change object.
    #[error("change #{index}: {message}")]
    Malformed {
        /// Position in the batch.
        index: usize,
        /// Decoder message.
        message: String,
    },
    /// An offering references a menu that doesn't exist.
    #[error("change #{index}: menu '{menu}' does not exist")]
    UnknownMenu {
        /// Position in the batch.
        index: usize,
        /// Unresolved reference.
        menu: String,
    },
    /// A menu parent references a menu that doesn't exist.
    #[error("change #{index}: parent '{parent}' does not exist")]
    UnknownParent {
        /// Position in the batch.
        index: usize,
        /// Unresolved reference.
        parent: String,
    },
    /// The change would create a second root menu.
    #[error("change #{index}: '{menu}' has no parent but '{root}' is already the root")]
    SecondRoot {
        /// Position in the batch.
        index: usize,
        /// Menu that would become a root.
        menu: String,
        /// Existing root title.
        root: String,
    },
    /// Another menu already uses the title.
    #[error("change #{index}: menu title '{title}' is already used")]
    DuplicateTitle {
        /// Position in the batch.
        index: usize,
        /// Conflicting title.
        title: String,
    },
    /// The new parent is the menu itself or one of its descendants.
    #[error("change #{index}: parent '{parent}' would make '{menu}' its own ancestor")]
    Cycle {
        /// Position in the batch.
        index: usize,
        /// Menu being re-parented.
        menu: String,
        /// Requested parent.
        parent: String,
    },
    /// The collection already holds the largest representable id.
    #[error("change #{index}: no {kind} id left to allocate")]
    IdExhausted {
        /// Position in the batch.
        index: usize,
        /// Target collection.
        kind: ChangeKind,
    },
    /// Loading or persisting the structure failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Decode an editor change list.
///
/// Items are checked one by one so errors point at the offending change.
///
/// # Errors
///
/// Returns [`SyncError::UnknownKind`] for unrecognised types and
/// [`SyncError::Malformed`] for a missing `type` or anything else the
/// decoder rejects.
pub fn parse_changes(items: &[serde_json::Value]) -> Result<Vec<Change>, SyncError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let kind = match item.get("type") {
                Some(serde_json::Value::String(kind)) => kind.as_str(),
                Some(other) => {
                    return Err(SyncError::UnknownKind {
                        index,
                        kind: other.to_string(),
                    });
                }
                None => {
                    return Err(SyncError::Malformed {
                        index,
                        message: "missing 'type'".to_owned(),
                    });
                }
            };
            if kind != "menu" && kind != "offering" {
                return Err(SyncError::UnknownKind {
                    index,
                    kind: kind.to_owned(),
                });
            }
            Change::deserialize(item).map_err(|e| SyncError::Malformed {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Apply a batch to a copy of `base`.
///
/// Returns the updated structure and per-change outcomes. `base` is never
/// modified, so a failure anywhere in the batch discards every change.
///
/// # Errors
///
/// Returns [`SyncError`] for the first change that can't be applied.
pub fn apply_changes(
    base: &Structure,
    changes: &[Change],
) -> Result<(Structure, SyncReport), SyncError> {
    let mut structure = base.clone();
    let mut report = SyncReport::default();

    for (index, change) in changes.iter().enumerate() {
        let outcome = match change.kind {
            ChangeKind::Menu => apply_menu(&mut structure, index, change)?,
            ChangeKind::Offering => apply_offering(&mut structure, index, change)?,
        };
        tracing::debug!(
            index,
            kind = %outcome.kind,
            id = ?outcome.id,
            action = ?outcome.action,
            matched_by = ?outcome.matched_by,
            "Change applied"
        );
        report.outcomes.push(outcome);
    }

    Ok((structure, report))
}

fn apply_menu(
    structure: &mut Structure,
    index: usize,
    change: &Change,
) -> Result<ChangeOutcome, SyncError> {
    let found = match change.id {
        Some(id) => structure
            .menus
            .iter()
            .position(|m| m.id == Some(id))
            .map(|pos| (pos, MatchedBy::Id)),
        None => legacy_menu_match(structure, change).map(|pos| (pos, MatchedBy::LegacyKey)),
    };

    if change.link.is_some() || change.image.is_some() || change.old_text.is_some() {
        tracing::debug!(index, "Ignoring offering-only fields on menu change");
    }

    match found {
        Some((pos, matched_by)) => update_menu(structure, index, pos, matched_by, change),
        None => insert_menu(structure, index, change),
    }
}

fn legacy_menu_match(structure: &Structure, change: &Change) -> Option<usize> {
    let title = change.menu.as_deref()?;
    structure.menus.iter().position(|m| m.menu == title)
}

fn update_menu(
    structure: &mut Structure,
    index: usize,
    pos: usize,
    matched_by: MatchedBy,
    change: &Change,
) -> Result<ChangeOutcome, SyncError> {
    let mut references_updated = 0;

    if let Some(title) = change.menu.as_deref()
        && title != structure.menus[pos].menu
    {
        ensure_title_free(structure, index, title, Some(pos))?;
        let old = std::mem::replace(&mut structure.menus[pos].menu, title.to_owned());
        references_updated = rename_references(structure, &old, title);
        tracing::info!(from = %old, to = %title, references_updated, "Menu renamed");
    }

    if let Some(parent) = change.parent.as_deref() {
        set_parent(structure, index, pos, parent)?;
    }

    let node = &mut structure.menus[pos];
    if let Some(text) = &change.text {
        node.text = Some(text.clone());
    }
    if let Some(description) = &change.description {
        node.description = Some(description.clone());
    }

    Ok(ChangeOutcome {
        kind: ChangeKind::Menu,
        id: node.id,
        action: Action::Updated,
        matched_by: Some(matched_by),
        references_updated,
    })
}

fn insert_menu(
    structure: &mut Structure,
    index: usize,
    change: &Change,
) -> Result<ChangeOutcome, SyncError> {
    let title = change
        .menu
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(SyncError::MissingField {
            index,
            kind: ChangeKind::Menu,
            field: "menu",
        })?;
    ensure_title_free(structure, index, title, None)?;

    let parent = change
        .parent
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    match parent {
        Some(parent) => {
            if resolve_index(structure, parent).is_none() {
                return Err(SyncError::UnknownParent {
                    index,
                    parent: parent.to_owned(),
                });
            }
        }
        None => {
            if let Some(root) = structure.menus.iter().find(|m| m.parent_ref().is_none()) {
                return Err(SyncError::SecondRoot {
                    index,
                    menu: title.to_owned(),
                    root: root.menu.clone(),
                });
            }
        }
    }

    let id = match change.id {
        Some(id) => id,
        None => next_id(structure.menus.iter().map(|m| m.id), index, ChangeKind::Menu)?,
    };
    structure.menus.push(MenuNode {
        id: Some(id),
        menu: title.to_owned(),
        parent: parent.map(ToOwned::to_owned),
        text: change.text.clone(),
        description: change.description.clone(),
        extra: toml::Table::new(),
    });

    Ok(ChangeOutcome {
        kind: ChangeKind::Menu,
        id: Some(id),
        action: Action::Inserted,
        matched_by: None,
        references_updated: 0,
    })
}

fn apply_offering(
    structure: &mut Structure,
    index: usize,
    change: &Change,
) -> Result<ChangeOutcome, SyncError> {
    let found = match change.id {
        Some(id) => structure
            .offerings
            .iter()
            .position(|o| o.id == Some(id))
            .map(|pos| (pos, MatchedBy::Id)),
        None => legacy_offering_match(structure, change).map(|pos| (pos, MatchedBy::LegacyKey)),
    };

    if change.parent.is_some() || change.description.is_some() {
        tracing::debug!(index, "Ignoring menu-only fields on offering change");
    }

    if let Some(menu) = change.menu.as_deref()
        && structure.resolve_menu(menu).is_none()
    {
        return Err(SyncError::UnknownMenu {
            index,
            menu: menu.to_owned(),
        });
    }

    let Some((pos, matched_by)) = found else {
        return insert_offering(structure, index, change);
    };

    let offering = &mut structure.offerings[pos];
    if let Some(menu) = &change.menu {
        offering.menu.clone_from(menu);
    }
    if let Some(text) = &change.text {
        offering.text = Some(text.clone());
    }
    if let Some(link) = &change.link {
        offering.link = Some(link.clone());
    }
    if let Some(image) = &change.image {
        offering.image = Some(image.clone());
    }

    Ok(ChangeOutcome {
        kind: ChangeKind::Offering,
        id: offering.id,
        action: Action::Updated,
        matched_by: Some(matched_by),
        references_updated: 0,
    })
}

/// Legacy offering key: owning menu plus the text it had before the edit.
fn legacy_offering_match(structure: &Structure, change: &Change) -> Option<usize> {
    let menu = change.menu.as_deref()?;
    let old_text = change.old_text.as_deref()?;
    structure
        .offerings
        .iter()
        .position(|o| o.menu == menu && o.text.as_deref() == Some(old_text))
}

fn insert_offering(
    structure: &mut Structure,
    index: usize,
    change: &Change,
) -> Result<ChangeOutcome, SyncError> {
    let menu = change.menu.clone().ok_or(SyncError::MissingField {
        index,
        kind: ChangeKind::Offering,
        field: "menu",
    })?;

    let id = match change.id {
        Some(id) => id,
        None => next_id(
            structure.offerings.iter().map(|o| o.id),
            index,
            ChangeKind::Offering,
        )?,
    };
    structure.offerings.push(OfferingItem {
        id: Some(id),
        menu,
        text: change.text.clone(),
        link: change.link.clone(),
        image: change.image.clone(),
        extra: toml::Table::new(),
    });

    Ok(ChangeOutcome {
        kind: ChangeKind::Offering,
        id: Some(id),
        action: Action::Inserted,
        matched_by: None,
        references_updated: 0,
    })
}

/// One past the highest id in the collection, or 1 when there is none.
fn next_id(
    ids: impl Iterator<Item = Option<u64>>,
    index: usize,
    kind: ChangeKind,
) -> Result<u64, SyncError> {
    match ids.flatten().max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or(SyncError::IdExhausted { index, kind }),
    }
}

fn resolve_index(structure: &Structure, reference: &str) -> Option<usize> {
    structure
        .menus
        .iter()
        .position(|m| m.menu == reference)
        .or_else(|| structure.menus.iter().position(|m| m.is_named_by(reference)))
}

fn ensure_title_free(
    structure: &Structure,
    index: usize,
    title: &str,
    except: Option<usize>,
) -> Result<(), SyncError> {
    let taken = structure
        .menus
        .iter()
        .enumerate()
        .any(|(i, m)| Some(i) != except && m.menu == title);
    if taken {
        return Err(SyncError::DuplicateTitle {
            index,
            title: title.to_owned(),
        });
    }
    Ok(())
}

fn set_parent(
    structure: &mut Structure,
    index: usize,
    pos: usize,
    parent: &str,
) -> Result<(), SyncError> {
    let parent = parent.trim();
    let menu = structure.menus[pos].menu.clone();

    if parent.is_empty() {
        // Clearing the parent is only a no-op for the current root.
        if structure.menus[pos].parent_ref().is_none() {
            return Ok(());
        }
        let root = structure
            .menus
            .iter()
            .find(|m| m.parent_ref().is_none())
            .map_or_else(String::new, |m| m.menu.clone());
        return Err(SyncError::SecondRoot { index, menu, root });
    }

    let Some(target) = resolve_index(structure, parent) else {
        return Err(SyncError::UnknownParent {
            index,
            parent: parent.to_owned(),
        });
    };
    if is_ancestor_or_self(structure, pos, target) {
        return Err(SyncError::Cycle {
            index,
            menu,
            parent: parent.to_owned(),
        });
    }

    structure.menus[pos].parent = Some(parent.to_owned());
    Ok(())
}

/// Whether `candidate` appears on the parent chain starting at `start`.
///
/// The walk is bounded by the number of menus; a chain that doesn't end
/// within that bound already loops and counts as a hit.
fn is_ancestor_or_self(structure: &Structure, candidate: usize, start: usize) -> bool {
    let mut current = Some(start);
    for _ in 0..=structure.menus.len() {
        let Some(i) = current else {
            return false;
        };
        if i == candidate {
            return true;
        }
        current = structure.menus[i]
            .parent_ref()
            .and_then(|p| resolve_index(structure, p));
    }
    true
}

/// Point title-based references at a renamed menu. Id-based references
/// stay valid on their own.
fn rename_references(structure: &mut Structure, old: &str, new: &str) -> usize {
    let mut count = 0;
    for node in &mut structure.menus {
        if node.parent_ref() == Some(old) {
            node.parent = Some(new.to_owned());
            count += 1;
        }
    }
    for offering in &mut structure.offerings {
        if offering.menu == old {
            new.clone_into(&mut offering.menu);
            count += 1;
        }
    }
    count
}

/// Applies change batches to a shared store.
///
/// Each batch is one load-apply-save transaction under the store's
/// transaction lock, so batches from any synchronizer sharing the store
/// never interleave.
pub struct Synchronizer {
    store: Arc<dyn StructureStore>,
}

impl Synchronizer {
    /// Create a synchronizer over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn StructureStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn StructureStore> {
        &self.store
    }

    /// Apply a batch and persist the result.
    ///
    /// Nothing is written unless every change applies; a failed save leaves
    /// the previously persisted document in place.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if a change is invalid or the store fails.
    pub fn apply(&self, changes: &[Change]) -> Result<SyncReport, SyncError> {
        let _guard = self
            .store
            .transaction_lock()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let current = self.store.load()?;
        let (updated, report) = apply_changes(&current, changes)?;

        if report.outcomes.is_empty() {
            return Ok(report);
        }

        self.store.save(&updated)?;
        tracing::info!(
            location = %self.store.location(),
            inserted = report.inserted(),
            updated = report.updated(),
            "Structure changes saved"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockStore;
    use crate::store::Format;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    static_assertions::assert_impl_all!(Synchronizer: Send, Sync);

    fn home_local() -> Structure {
        Structure {
            menus: vec![
                MenuNode::new(Some(1), "Home", None),
                MenuNode::new(Some(2), "Local", Some("Home")),
            ],
            ..Structure::default()
        }
    }

    fn with_offerings() -> Structure {
        let mut structure = home_local();
        structure.offerings = vec![
            OfferingItem {
                id: Some(1),
                menu: "Local".to_owned(),
                text: Some("Climbing wall".to_owned()),
                link: Some("https://example.com/wall".to_owned()),
                image: Some("kcw".to_owned()),
                extra: toml::Table::new(),
            },
            OfferingItem {
                id: Some(4),
                menu: "Local".to_owned(),
                text: Some("Tapestry".to_owned()),
                link: None,
                image: Some("qtm".to_owned()),
                extra: toml::Table::new(),
            },
        ];
        structure
    }

    #[test]
    fn test_update_by_id_changes_only_named_field() {
        let base = home_local();
        let changes = [Change::new(ChangeKind::Menu).with_id(2).with_text("Updated")];

        let (updated, report) = apply_changes(&base, &changes).unwrap();

        assert_eq!(updated.menus.len(), 2);
        assert_eq!(updated.menus[0], base.menus[0]);
        assert_eq!(updated.menus[1].text.as_deref(), Some("Updated"));
        assert_eq!(updated.menus[1].parent.as_deref(), Some("Home"));
        assert_eq!(report.updated(), 1);
        assert_eq!(report.inserted(), 0);
        assert_eq!(report.outcomes[0].matched_by, Some(MatchedBy::Id));
    }

    #[test]
    fn test_update_survives_round_trip_untouched() {
        let mut base = with_offerings();
        base.menus[1].description = Some("Recommended".to_owned());
        base.menus[1]
            .extra
            .insert("icon".to_owned(), toml::Value::String("pin".to_owned()));
        let changes = [Change::new(ChangeKind::Menu).with_id(2).with_text("Updated")];

        let (updated, _) = apply_changes(&base, &changes).unwrap();
        let encoded = Format::Toml.encode(&updated).unwrap();
        let decoded = Format::Toml.decode(&encoded, Path::new("s.toml")).unwrap();

        let mut expected = base.clone();
        expected.menus[1].text = Some("Updated".to_owned());
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_inserts_allocate_increasing_ids() {
        let base = with_offerings();
        let changes: Vec<_> = ["A", "B", "C"]
            .iter()
            .map(|t| {
                Change::new(ChangeKind::Offering)
                    .with_menu("Local")
                    .with_text(*t)
            })
            .collect();

        let (updated, report) = apply_changes(&base, &changes).unwrap();

        let ids: Vec<_> = report.outcomes.iter().map(|o| o.id.unwrap()).collect();
        assert_eq!(ids, vec![5, 6, 7]);
        assert_eq!(updated.offerings.len(), 5);
        assert_eq!(report.inserted(), 3);
    }

    #[test]
    fn test_insert_into_empty_collection_starts_at_one() {
        let base = home_local();
        let changes = [Change::new(ChangeKind::Offering)
            .with_menu("Home")
            .with_text("Welcome")];

        let (updated, _) = apply_changes(&base, &changes).unwrap();

        assert_eq!(updated.offerings[0].id, Some(1));
    }

    #[test]
    fn test_insert_after_max_id_rejects_batch() {
        let base = home_local();
        let changes = [
            Change::new(ChangeKind::Offering)
                .with_id(u64::MAX)
                .with_menu("Local")
                .with_text("Last"),
            Change::new(ChangeKind::Offering)
                .with_menu("Local")
                .with_text("One too many"),
        ];

        let err = apply_changes(&base, &changes).unwrap_err();

        assert!(matches!(
            err,
            SyncError::IdExhausted {
                index: 1,
                kind: ChangeKind::Offering
            }
        ));
        assert_eq!(err.to_string(), "change #1: no offering id left to allocate");
    }

    #[test]
    fn test_insert_writes_only_supplied_fields() {
        let base = home_local();
        let changes = [Change::new(ChangeKind::Menu)
            .with_menu("Walks")
            .with_parent("Local")];

        let (updated, _) = apply_changes(&base, &changes).unwrap();

        let node = &updated.menus[2];
        assert_eq!(node.id, Some(3));
        assert_eq!(node.text, None);
        assert_eq!(node.description, None);
        let encoded = Format::Toml.encode(&updated).unwrap();
        assert!(!encoded.contains("text"));
    }

    #[test]
    fn test_later_change_targets_earlier_insert() {
        let base = home_local();
        let changes = [
            Change::new(ChangeKind::Menu)
                .with_menu("Walks")
                .with_parent("Local"),
            Change::new(ChangeKind::Menu).with_id(3).with_text("Good walks"),
            Change::new(ChangeKind::Offering)
                .with_menu("Walks")
                .with_text("Castle trail"),
        ];

        let (updated, report) = apply_changes(&base, &changes).unwrap();

        assert_eq!(updated.menus[2].text.as_deref(), Some("Good walks"));
        assert_eq!(updated.offerings[0].menu, "Walks");
        assert_eq!(report.inserted(), 2);
        assert_eq!(report.updated(), 1);
    }

    #[test]
    fn test_legacy_menu_match_by_title() {
        let base = home_local();
        let changes = [Change::new(ChangeKind::Menu)
            .with_menu("Local")
            .with_text("Nearby")];

        let (updated, report) = apply_changes(&base, &changes).unwrap();

        assert_eq!(updated.menus.len(), 2);
        assert_eq!(updated.menus[1].text.as_deref(), Some("Nearby"));
        assert_eq!(report.outcomes[0].matched_by, Some(MatchedBy::LegacyKey));
    }

    #[test]
    fn test_id_miss_does_not_fall_back_to_title() {
        let base = home_local();
        let changes = [Change::new(ChangeKind::Menu)
            .with_id(99)
            .with_menu("Local")
            .with_text("x")];

        let err = apply_changes(&base, &changes).unwrap_err();

        assert!(matches!(err, SyncError::DuplicateTitle { .. }));
    }

    #[test]
    fn test_legacy_offering_match_by_menu_and_old_text() {
        let base = with_offerings();
        let changes = [Change::new(ChangeKind::Offering)
            .with_menu("Local")
            .with_old_text("Tapestry")
            .with_text("Quaker Tapestry")];

        let (updated, report) = apply_changes(&base, &changes).unwrap();

        assert_eq!(updated.offerings.len(), 2);
        assert_eq!(updated.offerings[1].text.as_deref(), Some("Quaker Tapestry"));
        assert_eq!(updated.offerings[1].image.as_deref(), Some("qtm"));
        assert_eq!(updated.offerings[0], base.offerings[0]);
        assert_eq!(report.outcomes[0].matched_by, Some(MatchedBy::LegacyKey));
    }

    #[test]
    fn test_offering_without_id_or_old_text_inserts() {
        let base = with_offerings();
        let changes = [Change::new(ChangeKind::Offering)
            .with_menu("Local")
            .with_text("Tapestry")];

        let (updated, report) = apply_changes(&base, &changes).unwrap();

        assert_eq!(updated.offerings.len(), 3);
        assert_eq!(report.outcomes[0].action, Action::Inserted);
    }

    #[test]
    fn test_offering_update_by_id() {
        let base = with_offerings();
        let changes = [Change::new(ChangeKind::Offering)
            .with_id(4)
            .with_link("https://www.quaker-tapestry.co.uk/")
            .with_image("tapestry")];

        let (updated, _) = apply_changes(&base, &changes).unwrap();

        let offering = &updated.offerings[1];
        assert_eq!(offering.link.as_deref(), Some("https://www.quaker-tapestry.co.uk/"));
        assert_eq!(offering.image.as_deref(), Some("tapestry"));
        assert_eq!(offering.text.as_deref(), Some("Tapestry"));
    }

    #[test]
    fn test_insert_menu_requires_title() {
        let base = home_local();
        let changes = [Change::new(ChangeKind::Menu).with_parent("Home")];

        let err = apply_changes(&base, &changes).unwrap_err();

        assert!(matches!(
            err,
            SyncError::MissingField {
                index: 0,
                field: "menu",
                ..
            }
        ));
    }

    #[test]
    fn test_insert_offering_requires_menu() {
        let base = home_local();
        let changes = [Change::new(ChangeKind::Offering).with_text("Orphan")];

        let err = apply_changes(&base, &changes).unwrap_err();

        assert!(matches!(
            err,
            SyncError::MissingField {
                kind: ChangeKind::Offering,
                ..
            }
        ));
    }

    #[test]
    fn test_offering_for_unknown_menu_rejected() {
        let base = home_local();
        let changes = [Change::new(ChangeKind::Offering)
            .with_menu("Nowhere")
            .with_text("x")];

        let err = apply_changes(&base, &changes).unwrap_err();

        assert!(matches!(err, SyncError::UnknownMenu { .. }));
    }

    #[test]
    fn test_insert_with_unknown_parent_rejected() {
        let base = home_local();
        let changes = [Change::new(ChangeKind::Menu)
            .with_menu("Walks")
            .with_parent("Nowhere")];

        let err = apply_changes(&base, &changes).unwrap_err();

        assert!(matches!(err, SyncError::UnknownParent { .. }));
    }

    #[test]
    fn test_insert_second_root_rejected() {
        let base = home_local();
        let changes = [Change::new(ChangeKind::Menu).with_menu("Another")];

        let err = apply_changes(&base, &changes).unwrap_err();

        assert!(matches!(err, SyncError::SecondRoot { .. }));
        assert!(err.to_string().contains("'Home' is already the root"));
    }

    #[test]
    fn test_first_root_insert_allowed() {
        let base = Structure::default();
        let changes = [Change::new(ChangeKind::Menu).with_menu("Home").with_parent("")];

        let (updated, _) = apply_changes(&base, &changes).unwrap();

        assert_eq!(updated.menus[0].id, Some(1));
        assert_eq!(updated.menus[0].parent, None);
    }

    #[test]
    fn test_reparent_under_descendant_is_cycle() {
        let mut base = home_local();
        base.menus
            .push(MenuNode::new(Some(3), "Eating Out", Some("Local")));
        let changes = [Change::new(ChangeKind::Menu)
            .with_id(2)
            .with_parent("Eating Out")];

        let err = apply_changes(&base, &changes).unwrap_err();

        assert!(matches!(err, SyncError::Cycle { .. }));
    }

    #[test]
    fn test_reparent_by_id_reference() {
        let mut base = home_local();
        base.menus
            .push(MenuNode::new(Some(3), "Eating Out", Some("Home")));
        let changes = [Change::new(ChangeKind::Menu).with_id(3).with_parent("2")];

        let (updated, _) = apply_changes(&base, &changes).unwrap();

        assert_eq!(updated.menus[2].parent.as_deref(), Some("2"));
    }

    #[test]
    fn test_rename_updates_title_references() {
        let mut base = with_offerings();
        base.menus
            .push(MenuNode::new(Some(3), "Eating Out", Some("Local")));
        let changes = [Change::new(ChangeKind::Menu).with_id(2).with_menu("Nearby")];

        let (updated, report) = apply_changes(&base, &changes).unwrap();

        assert_eq!(updated.menus[1].menu, "Nearby");
        assert_eq!(updated.menus[2].parent.as_deref(), Some("Nearby"));
        assert!(updated.offerings.iter().all(|o| o.menu == "Nearby"));
        assert_eq!(report.outcomes[0].references_updated, 3);
    }

    #[test]
    fn test_rename_to_existing_title_rejected() {
        let base = home_local();
        let changes = [Change::new(ChangeKind::Menu).with_id(2).with_menu("Home")];

        assert!(matches!(
            apply_changes(&base, &changes),
            Err(SyncError::DuplicateTitle { .. })
        ));
    }

    #[test]
    fn test_failed_batch_leaves_base_untouched() {
        let base = home_local();
        let changes = [
            Change::new(ChangeKind::Menu).with_id(2).with_text("Updated"),
            Change::new(ChangeKind::Offering).with_text("no menu"),
        ];

        assert!(apply_changes(&base, &changes).is_err());
        assert_eq!(base, home_local());
    }

    #[test]
    fn test_change_deserializes_editor_payload() {
        let json = r#"[
            {"type": "menu", "id": "2", "text": "Updated"},
            {"type": "offering", "menu": "Local", "old_text": "A", "text": "B"}
        ]"#;
        let changes: Vec<Change> = serde_json::from_str(json).unwrap();

        assert_eq!(
            changes[0],
            Change::new(ChangeKind::Menu).with_id(2).with_text("Updated")
        );
        assert_eq!(changes[1].old_text.as_deref(), Some("A"));
    }

    #[test]
    fn test_change_rejects_unknown_type() {
        let result: Result<Change, _> = serde_json::from_str(r#"{"type": "page"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_changes_reports_offending_item() {
        let items: Vec<serde_json::Value> = serde_json::from_str(
            r#"[{"type": "menu", "id": 1}, {"type": "page", "id": 2}]"#,
        )
        .unwrap();

        let err = parse_changes(&items).unwrap_err();

        assert!(matches!(err, SyncError::UnknownKind { index: 1, ref kind } if kind == "page"));
    }

    #[test]
    fn test_parse_changes_missing_type_and_bad_id() {
        let missing: Vec<serde_json::Value> =
            serde_json::from_str(r#"[{"id": 1}]"#).unwrap();
        let bad_id: Vec<serde_json::Value> =
            serde_json::from_str(r#"[{"type": "menu", "id": "x"}]"#).unwrap();

        assert!(matches!(
            parse_changes(&missing),
            Err(SyncError::Malformed { index: 0, .. })
        ));
        assert!(matches!(
            parse_changes(&bad_id),
            Err(SyncError::Malformed { index: 0, .. })
        ));
    }

    #[test]
    fn test_synchronizer_persists_batch() {
        let store = Arc::new(MockStore::new().with_structure(home_local()));
        let sync = Synchronizer::new(Arc::clone(&store) as Arc<dyn StructureStore>);

        let report = sync
            .apply(&[Change::new(ChangeKind::Menu).with_id(2).with_text("Updated")])
            .unwrap();

        assert_eq!(report.updated(), 1);
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.snapshot().menus[1].text.as_deref(), Some("Updated"));
    }

    #[test]
    fn test_synchronizer_save_failure_keeps_store() {
        let store = Arc::new(MockStore::new().with_structure(home_local()));
        store.fail_saves(true);
        let sync = Synchronizer::new(Arc::clone(&store) as Arc<dyn StructureStore>);

        let err = sync
            .apply(&[Change::new(ChangeKind::Menu).with_id(2).with_text("Updated")])
            .unwrap_err();

        assert!(matches!(err, SyncError::Store(ref e) if e.is_write_failure()));
        assert_eq!(store.snapshot(), home_local());
    }

    #[test]
    fn test_synchronizer_invalid_change_skips_save() {
        let store = Arc::new(MockStore::new().with_structure(home_local()));
        let sync = Synchronizer::new(Arc::clone(&store) as Arc<dyn StructureStore>);

        let result = sync.apply(&[
            Change::new(ChangeKind::Menu).with_id(2).with_text("Updated"),
            Change::new(ChangeKind::Menu).with_menu("Second root"),
        ]);

        assert!(result.is_err());
        assert_eq!(store.save_count(), 0);
        assert_eq!(store.snapshot(), home_local());
    }

    #[test]
    fn test_synchronizers_sharing_store_keep_every_batch() {
        let store = Arc::new(MockStore::new().with_structure(home_local()));
        let first = Synchronizer::new(Arc::clone(&store) as Arc<dyn StructureStore>);
        let second = Synchronizer::new(Arc::clone(&store) as Arc<dyn StructureStore>);

        std::thread::scope(|s| {
            for (sync, prefix) in [(&first, "a"), (&second, "b")] {
                s.spawn(move || {
                    for i in 0..25 {
                        sync.apply(&[Change::new(ChangeKind::Offering)
                            .with_menu("Local")
                            .with_text(format!("{prefix}{i}"))])
                            .unwrap();
                    }
                });
            }
        });

        let saved = store.snapshot();
        let mut ids: Vec<_> = saved.offerings.iter().filter_map(|o| o.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(saved.offerings.len(), 50);
        assert_eq!(ids, (1..=50).collect::<Vec<u64>>());
    }

    #[test]
    fn test_synchronizer_empty_batch_skips_save() {
        let store = Arc::new(MockStore::new().with_structure(home_local()));
        let sync = Synchronizer::new(Arc::clone(&store) as Arc<dyn StructureStore>);

        let report = sync.apply(&[]).unwrap();

        assert!(report.outcomes.is_empty());
        assert_eq!(store.save_count(), 0);
    }
}
