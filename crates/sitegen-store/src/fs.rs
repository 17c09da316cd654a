//! File-backed structure store.
//!
//! Saves are atomic: the encoded document is written to a temporary file in
//! the same directory, synced, then renamed over the target. Readers see
//! either the old document or the new one, never a partial write.

use std::fs::Permissions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tempfile::NamedTempFile;

use crate::model::Structure;
use crate::store::{Format, StoreError, StructureStore};

/// Structure document stored as a single TOML or JSON file.
///
/// Share one instance (behind an `Arc`) per document; concurrent saves
/// through that instance are serialized by an internal write lock.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    format: Format,
    write_lock: Mutex<()>,
    transaction_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store for the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedFormat`] if the extension has no codec.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let format = Format::from_path(&path)?;
        Ok(Self {
            path,
            format,
            write_lock: Mutex::new(()),
            transaction_lock: Mutex::new(()),
        })
    }

    /// Document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Document format.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }
}

impl StructureStore for FileStore {
    fn load(&self) -> Result<Structure, StoreError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let structure = self.format.decode(&content, &self.path)?;
        tracing::debug!(
            path = %self.path.display(),
            menus = structure.menus.len(),
            offerings = structure.offerings.len(),
            "Structure loaded"
        );
        Ok(structure)
    }

    fn save(&self, structure: &Structure) -> Result<(), StoreError> {
        // Encode before touching the filesystem so codec failures never
        // leave anything behind.
        let encoded = self.format.encode(structure)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        write_atomic(&self.path, encoded.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), bytes = encoded.len(), "Structure saved");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn transaction_lock(&self) -> &Mutex<()> {
        &self.transaction_lock
    }
}

/// Write `content` to `path` through a temporary sibling file and rename.
///
/// Creates the parent directory if needed. An existing file keeps its
/// permissions; a new one gets the usual `0644` on Unix.
///
/// # Errors
///
/// Returns the I/O error of whichever step failed. The temporary file is
/// removed on failure and `path` keeps its previous content.
pub fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    if let Some(permissions) = target_permissions(path) {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Permissions the written file should end up with.
fn target_permissions(path: &Path) -> Option<Permissions> {
    match std::fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => new_file_permissions(),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MenuNode;
    use tempfile::TempDir;

    fn sample() -> Structure {
        Structure {
            menus: vec![
                MenuNode::new(Some(1), "Home", None),
                MenuNode::new(Some(2), "Local", Some("Home")),
            ],
            ..Structure::default()
        }
    }

    #[test]
    fn test_save_then_load_toml() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("site_structure.toml")).unwrap();

        store.save(&sample()).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_save_then_load_json() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("structure.json")).unwrap();

        store.save(&sample()).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, sample());
        assert_eq!(store.format(), Format::Json);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("data/nested/site.toml")).unwrap();

        store.save(&sample()).unwrap();

        assert!(tmp.path().join("data/nested/site.toml").exists());
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("site.toml")).unwrap();

        store.save(&sample()).unwrap();
        store.save(&sample()).unwrap();

        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("missing.toml")).unwrap();

        let err = store.load().unwrap_err();

        assert!(matches!(err, StoreError::Read { .. }));
        assert!(err.to_string().starts_with("Failed to read"));
    }

    #[test]
    fn test_failed_write_is_write_error_and_leaves_target() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("blocked.toml");
        // A non-empty directory squatting on the target makes the rename fail.
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();
        let store = FileStore::new(&target).unwrap();

        let err = store.save(&sample()).unwrap_err();

        assert!(matches!(err, StoreError::Write { .. }));
        assert!(err.is_write_failure());
        assert!(err.to_string().starts_with("Failed to write"));
        assert_eq!(std::fs::read_to_string(target.join("keep")).unwrap(), "x");
        let leftovers = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site.toml");
        std::fs::write(&path, "").unwrap();
        std::fs::set_permissions(&path, Permissions::from_mode(0o640)).unwrap();
        let store = FileStore::new(&path).unwrap();

        store.save(&sample()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("menu.html");

        write_atomic(&path, b"<ul></ul>").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_new_rejects_unknown_extension() {
        assert!(matches!(
            FileStore::new("structure.yaml"),
            Err(StoreError::UnsupportedFormat(_))
        ));
    }
}
