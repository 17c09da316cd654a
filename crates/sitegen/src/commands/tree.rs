//! `sitegen tree` command implementation.

use clap::Args;
use sitegen_config::CliSettings;
use sitegen_site::MenuTree;

use super::common::{SourceArgs, load_structure};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tree command.
#[derive(Args)]
pub(crate) struct TreeArgs {
    #[command(flatten)]
    source: SourceArgs,
}

impl TreeArgs {
    /// Execute the tree command.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure can't be loaded or isn't a tree.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = self.source.load_config(CliSettings::default())?;
        let tree = MenuTree::build(&load_structure(&config)?)?;

        let output = Output::new();
        for line in format_levels(&tree) {
            output.data(&line);
        }
        Ok(())
    }
}

/// One `parent: child, child` line per level, root level first.
fn format_levels(tree: &MenuTree) -> Vec<String> {
    tree.by_parent()
        .into_iter()
        .map(|(key, children)| {
            let titles: Vec<&str> = children.iter().map(|n| n.menu.as_str()).collect();
            format!("{key}: {}", titles.join(", "))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sitegen_store::MenuNode;

    #[test]
    fn test_format_levels() {
        let tree = MenuTree::from_nodes(vec![
            MenuNode::new(Some(1), "Home", None),
            MenuNode::new(Some(2), "Local", Some("Home")),
            MenuNode::new(Some(3), "Kendal", Some("Local")),
            MenuNode::new(Some(4), "About", Some("Home")),
        ])
        .unwrap();

        assert_eq!(
            format_levels(&tree),
            vec![
                "<root>: Home".to_owned(),
                "Home: Local, About".to_owned(),
                "Local: Kendal".to_owned(),
            ]
        );
    }
}
