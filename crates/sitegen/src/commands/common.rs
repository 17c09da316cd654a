//! Arguments shared by every command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use sitegen_config::{CliSettings, Config};
use sitegen_store::{FileStore, Structure, StructureStore};

use crate::error::CliError;

/// Config file and structure document location.
#[derive(Args)]
pub(crate) struct SourceArgs {
    /// Path to configuration file (default: auto-discover sitegen.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Structure document (overrides config).
    #[arg(short, long, env = "SITEGEN_STRUCTURE")]
    pub structure: Option<PathBuf>,
}

impl SourceArgs {
    /// Load configuration, folding `settings` over the file values.
    pub(crate) fn load_config(&self, mut settings: CliSettings) -> Result<Config, CliError> {
        settings.structure_path.clone_from(&self.structure);
        let config = Config::load(self.config.as_deref(), Some(&settings))?;
        tracing::debug!(
            config = ?config.config_path,
            structure = %config.structure_resolved.path.display(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

/// Store for the configured structure document.
pub(crate) fn open_store(config: &Config) -> Result<Arc<FileStore>, CliError> {
    Ok(Arc::new(FileStore::new(&config.structure_resolved.path)?))
}

/// Load the configured structure document.
pub(crate) fn load_structure(config: &Config) -> Result<Structure, CliError> {
    Ok(open_store(config)?.load()?)
}
