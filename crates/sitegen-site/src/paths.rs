//! Route paths and page file locations derived from the tree.
//!
//! The root contributes no segment: it resolves to `/`, and its children
//! sit directly below it (`/local`, `/local/eating_out`).

use std::path::{Path, PathBuf};

use crate::tree::MenuTree;

/// File name of the root page template.
pub const HOME_TEMPLATE: &str = "home.html";

/// Slug a direct child of the root can't use: its page would be
/// [`HOME_TEMPLATE`].
pub(crate) const HOME_SLUG: &str = "home";

impl MenuTree {
    /// Slugs from below the root down to `idx`, inclusive.
    ///
    /// Empty for the root.
    #[must_use]
    pub fn segments(&self, idx: usize) -> Vec<&str> {
        if idx == self.root() {
            return Vec::new();
        }
        let mut segments: Vec<&str> = self
            .ancestors(idx)
            .into_iter()
            .filter(|&a| a != self.root())
            .map(|a| self.slug(a))
            .collect();
        segments.push(self.slug(idx));
        segments
    }

    /// Canonical route path of `idx`, e.g. `/local/eating_out`.
    #[must_use]
    pub fn path_of(&self, idx: usize) -> String {
        format!("/{}", self.segments(idx).join("/"))
    }

    /// Page template of `idx`, relative to the pages directory.
    ///
    /// Ancestor slugs become directories: `local/eating_out.html`. The root
    /// maps to [`HOME_TEMPLATE`].
    #[must_use]
    pub fn template_of(&self, idx: usize) -> PathBuf {
        let segments = self.segments(idx);
        let Some((last, dirs)) = segments.split_last() else {
            return PathBuf::from(HOME_TEMPLATE);
        };
        let mut path: PathBuf = dirs.iter().collect();
        path.push(format!("{last}.html"));
        path
    }

    /// Absolute page file of `idx` under `pages_dir`.
    #[must_use]
    pub fn page_file(&self, pages_dir: &Path, idx: usize) -> PathBuf {
        pages_dir.join(self.template_of(idx))
    }
}
