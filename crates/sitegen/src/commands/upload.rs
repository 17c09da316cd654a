//! `sitegen upload` command implementation.

use std::path::PathBuf;

use clap::Args;
use sitegen_config::CliSettings;
use sitegen_editor::UploadStore;

use super::common::SourceArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the upload command.
#[derive(Args)]
pub(crate) struct UploadArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Image file to store.
    file: PathBuf,

    /// Stored name (default: the file's own name).
    #[arg(long)]
    name: Option<String>,
}

impl UploadArgs {
    /// Execute the upload command.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read, its type isn't allowed,
    /// or it can't be written to the uploads directory.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = self.source.load_config(CliSettings::default())?;
        let uploads = UploadStore::new(
            &config.uploads_resolved.dir,
            &config.uploads_resolved.allowed_extensions,
        );

        let name = self.name.or_else(|| {
            self.file
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_owned)
        });
        uploads
            .check(name.as_deref())
            .map_err(sitegen_editor::EditorError::from)?;

        let content = std::fs::read(&self.file)?;
        let stored = uploads
            .store(name.as_deref(), &content)
            .map_err(sitegen_editor::EditorError::from)?;

        Output::new().success(&format!(
            "Stored {}",
            uploads.dir().join(stored).display()
        ));
        Ok(())
    }
}
