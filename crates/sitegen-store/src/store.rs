//! Store trait, document formats and error types.
//!
//! Provides the core [`StructureStore`] trait for loading and persisting the
//! structure document, along with [`StoreError`] which keeps read-side and
//! write-side failures apart.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::model::Structure;

/// Error returned by structure stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The document could not be read.
    #[error("Failed to read structure from {}: {source}", path.display())]
    Read {
        /// Document location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document was read but is not valid for its format.
    #[error("Failed to parse structure from {}: {message}", path.display())]
    Parse {
        /// Document location.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// The structure could not be encoded; nothing was written.
    #[error("Failed to serialize structure: {0}")]
    Serialize(String),
    /// The encoded document could not be written; the previous document is intact.
    #[error("Failed to write structure to {}: {source}", path.display())]
    Write {
        /// Document location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// No codec is available for the document's extension.
    #[error("No structure codec for {} (expected .toml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),
}

impl StoreError {
    /// Whether this error happened while writing (as opposed to reading).
    #[must_use]
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::Serialize(_) | Self::Write { .. })
    }
}

/// Serialization format of a structure document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// `site_structure.toml` with `[[menus]]` / `[[offerings]]` tables.
    Toml,
    /// JSON object with `menus` / `offerings` arrays.
    Json,
}

impl Format {
    /// Pick the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(StoreError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Decode a document.
    ///
    /// `path` is only used for error context.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Parse`] if the content is malformed.
    pub fn decode(self, content: &str, path: &Path) -> Result<Structure, StoreError> {
        let parse_err = |message: String| StoreError::Parse {
            path: path.to_path_buf(),
            message,
        };
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
            Self::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        }
    }

    /// Encode a structure.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialize`] if the structure cannot be represented.
    pub fn encode(self, structure: &Structure) -> Result<String, StoreError> {
        match self {
            Self::Toml => {
                toml::to_string(structure).map_err(|e| StoreError::Serialize(e.to_string()))
            }
            Self::Json => serde_json::to_string_pretty(structure)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| StoreError::Serialize(e.to_string())),
        }
    }
}

/// Persistence for the structure document.
///
/// The store is the single source of truth; everything else (tree, paths,
/// menus, scaffold files) is recomputed from what [`load`](Self::load)
/// returns.
pub trait StructureStore: Send + Sync {
    /// Load the full structure.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the document can't be read or parsed.
    fn load(&self) -> Result<Structure, StoreError>;

    /// Replace the persisted structure.
    ///
    /// Implementations must leave the previous document readable and intact
    /// if this fails.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if encoding or writing fails.
    fn save(&self, structure: &Structure) -> Result<(), StoreError>;

    /// Human-readable location, used in logs.
    fn location(&self) -> String;

    /// Lock held across a whole load-modify-save transaction.
    ///
    /// Every writer sharing this handle takes the same lock, so concurrent
    /// transactions never lose each other's updates.
    fn transaction_lock(&self) -> &Mutex<()>;
}
