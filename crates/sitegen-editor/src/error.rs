//! Editor error type and its response mapping.

use serde_json::{Value, json};
use sitegen_site::SiteError;
use sitegen_store::{StoreError, SyncError};

use crate::upload::UploadError;

/// Error returned by editor operations.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The request body is not a valid editor request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// A change in the batch was rejected.
    #[error("{0}")]
    Sync(SyncError),
    /// The structure could not be loaded or persisted.
    #[error("{0}")]
    Store(#[from] StoreError),
    /// The persisted structure doesn't form a valid menu tree.
    #[error("{0}")]
    Site(#[from] SiteError),
    /// An upload was rejected or could not be stored.
    #[error("{0}")]
    Upload(#[from] UploadError),
}

impl From<SyncError> for EditorError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Store(e) => Self::Store(e),
            other => Self::Sync(other),
        }
    }
}

impl EditorError {
    /// HTTP-style status: 400 for bad input, 500 for server-side failures.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) | Self::Sync(_) => 400,
            Self::Upload(e) if e.is_rejection() => 400,
            Self::Store(_) | Self::Site(_) | Self::Upload(_) => 500,
        }
    }

    /// JSON error body.
    #[must_use]
    pub fn to_body(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}
