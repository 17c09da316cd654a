//! CLI error types.

use sitegen_config::ConfigError;
use sitegen_editor::EditorError;
use sitegen_site::SiteError;
use sitegen_store::StoreError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Site(#[from] SiteError),

    #[error("{0}")]
    Editor(#[from] EditorError),

    #[error("{0}")]
    Validation(String),
}
