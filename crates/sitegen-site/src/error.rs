//! Site error type.

use std::path::PathBuf;

/// Error returned while building the menu tree or writing site files.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// No menu is free of a parent.
    #[error("Structure has no root menu (every menu has a parent)")]
    NoRoot,
    /// More than one menu is free of a parent.
    #[error("Structure has more than one root menu: {}", .0.join(", "))]
    MultipleRoots(Vec<String>),
    /// A parent reference names no known menu.
    #[error("Menu '{menu}' references unknown parent '{parent}'")]
    UnresolvedParent {
        /// Menu holding the reference.
        menu: String,
        /// The unresolved reference.
        parent: String,
    },
    /// Two menus share a title.
    #[error("Menu title '{0}' is used more than once")]
    DuplicateKey(String),
    /// Two menus share an id.
    #[error("Menu id {0} is used more than once")]
    DuplicateId(u64),
    /// A menu's parent chain never reaches the root.
    #[error("Menu '{0}' is not reachable from the root (parent cycle)")]
    Unreachable(String),
    /// Two siblings normalize to the same slug.
    #[error("Menus '{first}' and '{second}' under '{parent}' share the slug '{slug}'")]
    SlugCollision {
        /// Title of the common parent.
        parent: String,
        /// The shared slug.
        slug: String,
        /// First sibling in declaration order.
        first: String,
        /// Second sibling in declaration order.
        second: String,
    },
    /// A direct child of the root would share the root page template.
    #[error("Menu '{menu}' under the root uses the slug '{slug}' reserved for the root page")]
    ReservedSlug {
        /// Menu title.
        menu: String,
        /// The reserved slug.
        slug: String,
    },
    /// A menu title yields a slug that can't be used as a path segment.
    #[error("Menu '{menu}' yields unusable slug '{slug}'")]
    InvalidSlug {
        /// Menu title.
        menu: String,
        /// The offending slug.
        slug: String,
    },
    /// A site file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        /// Target file or directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl SiteError {
    /// Whether the error comes from the structure itself rather than I/O.
    ///
    /// Structural errors are detected before anything is written.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}
