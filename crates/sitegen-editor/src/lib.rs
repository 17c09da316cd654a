//! Structure editor contract for sitegen.
//!
//! This crate provides the transport-independent side of the site editor:
//! - [`Editor::handle_load`]: full structure as JSON
//! - [`Editor::handle_save`]: apply a `{"changes": [...]}` batch
//! - [`Editor::handle_upload`]: store an image under the uploads directory
//!
//! Each returns an [`EditorResponse`] with an HTTP-style status (400 for bad
//! input, 500 for persistence failures) so any server can expose it.

mod editor;
mod error;
mod upload;

pub use editor::{Editor, EditorResponse};
pub use error::EditorError;
pub use upload::{UploadError, UploadStore};
