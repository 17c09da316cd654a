//! `sitegen export` command implementation.

use std::path::PathBuf;

use clap::Args;
use sitegen_config::CliSettings;
use sitegen_store::{FileStore, Format, StructureStore};

use super::common::{SourceArgs, load_structure};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the export command.
#[derive(Args)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Destination file (overrides `export.json_path`).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    /// Execute the export command.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination isn't a `.json` file, or if the
    /// structure can't be loaded or written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = self.source.load_config(CliSettings::default())?;
        let destination = self
            .output
            .unwrap_or_else(|| config.export_resolved.json_path.clone());

        let target = FileStore::new(&destination)?;
        if target.format() != Format::Json {
            return Err(CliError::Validation(format!(
                "export destination must be a .json file: {}",
                destination.display()
            )));
        }

        let structure = load_structure(&config)?;
        target.save(&structure)?;

        Output::new().success(&format!(
            "Exported {} menus and {} offerings to {}",
            structure.menus.len(),
            structure.offerings.len(),
            destination.display()
        ));
        Ok(())
    }
}
