//! Editor read/write contract.
//!
//! The editor is transport-independent: callers hand it request bodies and
//! get back an [`EditorResponse`] carrying an HTTP-style status and a JSON
//! body, ready for whatever serving layer sits in front.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use sitegen_site::{MenuTree, NavItem};
use sitegen_store::{StoreError, StructureStore, SyncReport, Synchronizer, parse_changes};

use crate::error::EditorError;
use crate::upload::UploadStore;

/// Body of a save request.
#[derive(Debug, Deserialize)]
struct SaveRequest {
    changes: Vec<Value>,
}

/// Status plus JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// JSON body.
    pub body: Value,
}

impl EditorResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(err: &EditorError) -> Self {
        Self {
            status: err.status_code(),
            body: err.to_body(),
        }
    }
}

impl From<Result<Value, EditorError>> for EditorResponse {
    fn from(result: Result<Value, EditorError>) -> Self {
        match result {
            Ok(body) => Self::ok(body),
            Err(err) => {
                if err.status_code() >= 500 {
                    tracing::error!(error = %err, "Editor request failed");
                } else {
                    tracing::warn!(error = %err, "Editor request rejected");
                }
                Self::error(&err)
            }
        }
    }
}

/// Structure editor over a shared store.
pub struct Editor {
    sync: Synchronizer,
    uploads: UploadStore,
}

impl Editor {
    /// Create an editor persisting to `store` and saving uploads to `uploads`.
    #[must_use]
    pub fn new(store: Arc<dyn StructureStore>, uploads: UploadStore) -> Self {
        Self {
            sync: Synchronizer::new(store),
            uploads,
        }
    }

    /// Full structure as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Store`] if the structure can't be loaded.
    pub fn load(&self) -> Result<Value, EditorError> {
        let structure = self.sync.store().load()?;
        let mut value = serde_json::to_value(&structure)
            .map_err(|e| EditorError::Store(StoreError::Serialize(e.to_string())))?;
        // Editor clients always get both collections.
        if let Some(doc) = value.as_object_mut() {
            doc.entry("offerings").or_insert_with(|| json!([]));
        }
        Ok(value)
    }

    /// Navigation tree of the current structure.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Store`] if loading fails, or
    /// [`EditorError::Site`] if the structure isn't a valid tree.
    pub fn navigation(&self) -> Result<Vec<NavItem>, EditorError> {
        let structure = self.sync.store().load()?;
        Ok(MenuTree::build(&structure)?.nav_items())
    }

    /// Apply a `{"changes": [...]}` request body.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidRequest`] for a malformed body,
    /// [`EditorError::Sync`] for a rejected change and
    /// [`EditorError::Store`] if persisting fails.
    pub fn save(&self, body: &[u8]) -> Result<SyncReport, EditorError> {
        let request: SaveRequest =
            serde_json::from_slice(body).map_err(|e| EditorError::InvalidRequest(e.to_string()))?;
        let changes = parse_changes(&request.changes)?;
        Ok(self.sync.apply(&changes)?)
    }

    /// Store an uploaded image and return its stored file name.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Upload`] if the upload is rejected or can't be
    /// written.
    pub fn upload(&self, filename: Option<&str>, content: &[u8]) -> Result<String, EditorError> {
        Ok(self.uploads.store(filename, content)?)
    }

    /// Read endpoint: the full structure.
    #[must_use]
    pub fn handle_load(&self) -> EditorResponse {
        self.load().into()
    }

    /// Write endpoint: `{"status": "ok", ...}` or `{"error": ...}`.
    #[must_use]
    pub fn handle_save(&self, body: &[u8]) -> EditorResponse {
        self.save(body)
            .map(|report| {
                json!({
                    "status": "ok",
                    "inserted": report.inserted(),
                    "updated": report.updated(),
                    "changes": report.outcomes,
                })
            })
            .into()
    }

    /// Upload endpoint: `{"status": "ok", "filename": ...}` or `{"error": ...}`.
    #[must_use]
    pub fn handle_upload(&self, filename: Option<&str>, content: &[u8]) -> EditorResponse {
        self.upload(filename, content)
            .map(|name| json!({ "status": "ok", "filename": name }))
            .into()
    }
}
