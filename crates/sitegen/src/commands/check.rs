//! `sitegen check` command implementation.

use clap::Args;
use sitegen_config::CliSettings;
use sitegen_site::MenuTree;
use sitegen_store::check_integrity;

use super::common::{SourceArgs, load_structure};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    source: SourceArgs,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// Integrity warnings are reported but don't fail the check.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure can't be loaded or isn't a valid
    /// menu tree.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load_config(CliSettings::default())?;
        let structure = load_structure(&config)?;

        let tree = MenuTree::build(&structure)?;
        let warnings = check_integrity(&structure);

        for warning in &warnings {
            output.warning(&format!("Warning: {warning}"));
        }
        let summary = format!(
            "{}: {} menus, {} offerings, {} warnings",
            config.structure_resolved.path.display(),
            tree.len(),
            structure.offerings.len(),
            warnings.len()
        );
        if warnings.is_empty() {
            output.success(&summary);
        } else {
            output.info(&summary);
        }
        Ok(())
    }
}
