//! Image uploads.
//!
//! Uploaded files are checked against an extension allow-list and stored
//! under a sanitized name. Rejected uploads never touch the filesystem.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sitegen_store::write_atomic;

/// Runs of characters that may not appear in a stored file name.
static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

/// Error returned when an upload is rejected or can't be stored.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// No file part, or a file part without a name.
    #[error("no file uploaded")]
    MissingFile,
    /// The extension is not on the allow-list.
    #[error("file type not allowed: '{name}' (allowed: {})", .allowed.join(", "))]
    NotAllowed {
        /// Name as uploaded.
        name: String,
        /// Configured allow-list.
        allowed: Vec<String>,
    },
    /// Nothing usable is left of the name after sanitizing.
    #[error("invalid file name '{0}'")]
    InvalidName(String),
    /// The accepted file could not be written.
    #[error("Failed to store upload {}: {source}", path.display())]
    Write {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    /// Whether the upload was refused for its content (as opposed to a
    /// storage failure).
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Write { .. })
    }
}

/// Upload destination with an extension allow-list.
#[derive(Clone, Debug)]
pub struct UploadStore {
    dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl UploadStore {
    /// Create a store writing into `dir`.
    ///
    /// Extensions are compared case-insensitively and without the dot.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, allowed_extensions: &[String]) -> Self {
        Self {
            dir: dir.into(),
            allowed_extensions: allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Upload directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate an upload and return the name it would be stored under.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::MissingFile`], [`UploadError::InvalidName`]
    /// or [`UploadError::NotAllowed`].
    pub fn check(&self, filename: Option<&str>) -> Result<String, UploadError> {
        let original = filename
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(UploadError::MissingFile)?;

        let name = sanitize_filename(original)
            .ok_or_else(|| UploadError::InvalidName(original.to_owned()))?;

        let allowed = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.allowed_extensions.contains(&ext));
        if !allowed {
            return Err(UploadError::NotAllowed {
                name: original.to_owned(),
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(name)
    }

    /// Store an upload and return the stored file name.
    ///
    /// A file with the same name is replaced atomically.
    ///
    /// # Errors
    ///
    /// Returns a rejection from [`check`](Self::check) or
    /// [`UploadError::Write`] if writing fails.
    pub fn store(&self, filename: Option<&str>, content: &[u8]) -> Result<String, UploadError> {
        let name = match self.check(filename) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(filename = ?filename, error = %e, "Upload rejected");
                return Err(e);
            }
        };

        let path = self.dir.join(&name);
        write_atomic(&path, content).map_err(|source| UploadError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::info!(name = %name, bytes = content.len(), "Upload stored");
        Ok(name)
    }
}

/// Reduce an uploaded name to a safe single path segment.
///
/// Directory components are dropped, unsafe character runs become `_` and
/// leading dots are removed. Returns `None` if nothing usable remains.
fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = UNSAFE_CHARS_RE.replace_all(base, "_");
    let trimmed = cleaned.trim_matches('_');
    let visible = trimmed.trim_start_matches('.');
    // ".png" is an extension without a name, ".hidden.png" is not.
    let extension_only = visible.len() != trimmed.len() && !visible.contains('.');
    if visible.is_empty() || extension_only {
        return None;
    }
    Some(visible.to_owned())
}
