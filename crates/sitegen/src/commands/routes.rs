//! `sitegen routes` command implementation.

use clap::Args;
use sitegen_config::CliSettings;
use sitegen_site::{MenuTree, RouteTable};

use super::common::{SourceArgs, load_structure};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the routes command.
#[derive(Args)]
pub(crate) struct RoutesArgs {
    #[command(flatten)]
    source: SourceArgs,
}

impl RoutesArgs {
    /// Execute the routes command.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure can't be loaded or isn't a tree.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = self.source.load_config(CliSettings::default())?;
        let tree = MenuTree::build(&load_structure(&config)?)?;
        let routes = RouteTable::from_tree(&tree);

        let json = serde_json::to_string_pretty(&routes)
            .map_err(|e| CliError::Validation(format!("failed to encode routes: {e}")))?;
        Output::new().data(&json);
        Ok(())
    }
}
