//! Page scaffolding.
//!
//! Ensures every menu has a page template, creating missing ones with an
//! exclusive create so authored pages are never overwritten. Running the
//! scaffolder on an already scaffolded tree creates nothing.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::SiteError;
use crate::html::escape_html;
use crate::tree::MenuTree;

/// What happened to one page file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaffoldOutcome {
    /// The file was missing and has been created.
    Created,
    /// The file already existed and was left untouched.
    Skipped,
}

/// Scaffold result for one menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScaffoldEntry {
    /// Menu title.
    pub menu: String,
    /// Page file.
    pub path: PathBuf,
    /// Create or skip.
    pub outcome: ScaffoldOutcome,
}

/// Per-menu scaffold results in pre-order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScaffoldReport {
    /// One entry per scaffolded menu.
    pub entries: Vec<ScaffoldEntry>,
}

impl ScaffoldReport {
    /// Number of created files.
    #[must_use]
    pub fn created(&self) -> usize {
        self.count(ScaffoldOutcome::Created)
    }

    /// Number of existing files left alone.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(ScaffoldOutcome::Skipped)
    }

    fn count(&self, outcome: ScaffoldOutcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }
}

/// Page scaffolder over a built tree.
#[derive(Debug)]
pub struct Scaffolder<'a> {
    tree: &'a MenuTree,
    pages_dir: PathBuf,
    base_layout: String,
    parallel: bool,
}

impl<'a> Scaffolder<'a> {
    /// Create a sequential scaffolder writing under `pages_dir`.
    #[must_use]
    pub fn new(
        tree: &'a MenuTree,
        pages_dir: impl Into<PathBuf>,
        base_layout: impl Into<String>,
    ) -> Self {
        Self {
            tree,
            pages_dir: pages_dir.into(),
            base_layout: base_layout.into(),
            parallel: false,
        }
    }

    /// Spread page writes over the rayon pool.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Template content for a page titled `title`.
    #[must_use]
    pub fn page_content(&self, title: &str) -> String {
        format!(
            "{{% extends \"{}\" %}}\n{{% block title %}}{}{{% endblock %}}\n",
            self.base_layout,
            escape_html(title)
        )
    }

    /// Ensure a page exists for every non-root menu.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Io`] for any failure other than the file
    /// already existing.
    pub fn run(&self) -> Result<ScaffoldReport, SiteError> {
        let targets: Vec<usize> = self
            .tree
            .preorder()
            .into_iter()
            .filter(|&idx| idx != self.tree.root())
            .collect();

        let results: Vec<Result<ScaffoldEntry, SiteError>> = if self.parallel {
            targets.par_iter().map(|&idx| self.ensure(idx)).collect()
        } else {
            targets.iter().map(|&idx| self.ensure(idx)).collect()
        };
        let entries = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        let report = ScaffoldReport { entries };

        tracing::info!(
            created = report.created(),
            skipped = report.skipped(),
            parallel = self.parallel,
            "Pages scaffolded"
        );
        Ok(report)
    }

    /// Ensure the root page (`home.html`) exists.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Io`] if the page can't be created.
    pub fn ensure_home(&self) -> Result<ScaffoldEntry, SiteError> {
        self.ensure(self.tree.root())
    }

    fn ensure(&self, idx: usize) -> Result<ScaffoldEntry, SiteError> {
        let menu = &self.tree.node(idx).menu;
        let path = self.tree.page_file(&self.pages_dir, idx);
        let outcome = create_if_absent(&path, &self.page_content(menu))?;
        tracing::debug!(menu = %menu, path = %path.display(), ?outcome, "Page checked");
        Ok(ScaffoldEntry {
            menu: menu.clone(),
            path,
            outcome,
        })
    }
}

/// Create `path` with `content` unless it already exists.
fn create_if_absent(path: &Path, content: &str) -> Result<ScaffoldOutcome, SiteError> {
    let io_err = |source| SiteError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(ScaffoldOutcome::Skipped),
        Err(e) => return Err(io_err(e)),
    };
    write_or_remove(path, file, content.as_bytes()).map_err(io_err)?;
    Ok(ScaffoldOutcome::Created)
}

/// Fill a freshly created `path`, removing it again if the write fails so
/// the next run recreates it instead of skipping a truncated page.
fn write_or_remove(path: &Path, mut file: impl Write, content: &[u8]) -> std::io::Result<()> {
    if let Err(e) = file.write_all(content).and_then(|()| file.flush()) {
        drop(file);
        if let Err(remove_err) = std::fs::remove_file(path) {
            tracing::warn!(
                path = %path.display(),
                error = %remove_err,
                "Failed to remove partially written page"
            );
        }
        return Err(e);
    }
    Ok(())
}
