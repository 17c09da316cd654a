//! `sitegen apply` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use sitegen_config::CliSettings;
use sitegen_editor::{Editor, UploadStore};
use sitegen_store::StructureStore;

use super::common::{SourceArgs, open_store};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the apply command.
#[derive(Args)]
pub(crate) struct ApplyArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// JSON file holding `{"changes": [...]}`.
    changes: PathBuf,
}

impl ApplyArgs {
    /// Execute the apply command.
    ///
    /// The batch is all-or-nothing: a rejected change leaves the structure
    /// document untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the changes file can't be read, a change is
    /// rejected, or the structure can't be saved.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load_config(CliSettings::default())?;
        let body = std::fs::read(&self.changes)?;

        let store = open_store(&config)?;
        let uploads = UploadStore::new(
            &config.uploads_resolved.dir,
            &config.uploads_resolved.allowed_extensions,
        );
        let editor = Editor::new(store as Arc<dyn StructureStore>, uploads);
        let report = editor.save(&body)?;

        for outcome in &report.outcomes {
            let json = serde_json::to_string(outcome)
                .map_err(|e| CliError::Validation(format!("failed to encode outcome: {e}")))?;
            output.data(&json);
        }
        output.success(&format!(
            "Applied {} changes ({} inserted, {} updated)",
            report.outcomes.len(),
            report.inserted(),
            report.updated()
        ));
        Ok(())
    }
}
