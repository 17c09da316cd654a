//! `sitegen build` command implementation.

use std::time::Instant;

use clap::Args;
use sitegen_config::{BuildConfig, CliSettings};
use sitegen_site::{BuildOptions, LinkMode, ScaffoldOutcome, build_site};

use super::common::{SourceArgs, load_structure};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Menu link style: `anchor` or `navigable` (overrides config).
    #[arg(long)]
    link_mode: Option<sitegen_config::LinkMode>,

    /// Scaffold pages in parallel (overrides config).
    #[arg(long)]
    parallel: Option<bool>,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the structure is invalid, or
    /// a file can't be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load_config(CliSettings {
            link_mode: self.link_mode,
            parallel: self.parallel,
            ..CliSettings::default()
        })?;

        let structure = load_structure(&config)?;
        let options = build_options(&config.build_resolved);

        output.info(&format!(
            "Building site from {}",
            config.structure_resolved.path.display()
        ));
        let start = Instant::now();
        let report = build_site(&structure, &options)?;

        if report.home.outcome == ScaffoldOutcome::Created {
            output.info(&format!("  created {}", report.home.path.display()));
        }
        for entry in &report.pages.entries {
            if entry.outcome == ScaffoldOutcome::Created {
                output.info(&format!("  created {}", entry.path.display()));
            }
        }
        for warning in &report.warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        output.success(&format!(
            "Built {} menus and {} offerings in {:.2?} ({} pages created, {} kept)",
            report.menus,
            report.offerings,
            start.elapsed(),
            report.pages.created(),
            report.pages.skipped(),
        ));
        Ok(())
    }
}

/// Translate resolved build config into site build options.
fn build_options(build: &BuildConfig) -> BuildOptions {
    BuildOptions {
        pages_dir: build.pages_dir.clone(),
        partials_dir: build.partials_dir.clone(),
        base_layout: build.base_layout.clone(),
        link_mode: link_mode(build.link_mode),
        image_dir: build.image_dir.clone(),
        image_extension: build.image_extension.clone(),
        parallel: build.parallel,
    }
}

fn link_mode(mode: sitegen_config::LinkMode) -> LinkMode {
    match mode {
        sitegen_config::LinkMode::Anchor => LinkMode::Anchor,
        sitegen_config::LinkMode::Navigable => LinkMode::Navigable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_build_options_from_config() {
        let build = BuildConfig {
            templates_dir: PathBuf::from("/site/templates"),
            pages_dir: PathBuf::from("/site/templates"),
            partials_dir: PathBuf::from("/site/templates/_partials/_generated"),
            base_layout: "_partials/_base.html".to_owned(),
            link_mode: sitegen_config::LinkMode::Navigable,
            image_dir: "img".to_owned(),
            image_extension: "webp".to_owned(),
            parallel: true,
        };

        let options = build_options(&build);

        assert_eq!(options.pages_dir, PathBuf::from("/site/templates"));
        assert_eq!(
            options.partials_dir,
            PathBuf::from("/site/templates/_partials/_generated")
        );
        assert_eq!(options.link_mode, LinkMode::Navigable);
        assert_eq!(options.image_dir, "img");
        assert_eq!(options.image_extension, "webp");
        assert!(options.parallel);
    }

    #[test]
    fn test_link_mode_default_is_anchor() {
        assert_eq!(
            link_mode(sitegen_config::LinkMode::default()),
            LinkMode::Anchor
        );
    }
}
