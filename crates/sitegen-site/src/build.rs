//! Full site build: validate, scaffold pages, write generated partials.

use std::path::PathBuf;

use sitegen_store::{IntegrityWarning, Structure, check_integrity, write_atomic};

use crate::error::SiteError;
use crate::menu::{LinkMode, MenuRenderer};
use crate::offerings::OfferingsRenderer;
use crate::scaffold::{ScaffoldEntry, ScaffoldReport, Scaffolder};
use crate::tree::MenuTree;

/// File name of the generated menu partial.
pub const MENU_PARTIAL: &str = "menu_content.html";

/// File name of the generated offerings partial.
pub const OFFERINGS_PARTIAL: &str = "offerings_content.html";

/// Build settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Root of the page templates.
    pub pages_dir: PathBuf,
    /// Directory receiving the generated partials.
    pub partials_dir: PathBuf,
    /// Layout every page extends.
    pub base_layout: String,
    /// Menu link style.
    pub link_mode: LinkMode,
    /// Image directory referenced from offering cards.
    pub image_dir: String,
    /// Image file extension, without the dot.
    pub image_extension: String,
    /// Scaffold pages in parallel.
    pub parallel: bool,
}

impl BuildOptions {
    /// Defaults rooted at `templates_dir`.
    #[must_use]
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        let templates_dir = templates_dir.into();
        Self {
            partials_dir: templates_dir.join("_partials").join("_generated"),
            pages_dir: templates_dir,
            base_layout: "_partials/_base.html".to_owned(),
            link_mode: LinkMode::default(),
            image_dir: "images".to_owned(),
            image_extension: "png".to_owned(),
            parallel: false,
        }
    }
}

/// What a build did.
#[derive(Clone, Debug)]
pub struct BuildReport {
    /// Number of menus in the tree.
    pub menus: usize,
    /// Number of offerings in the structure.
    pub offerings: usize,
    /// Root page result.
    pub home: ScaffoldEntry,
    /// Per-menu page results.
    pub pages: ScaffoldReport,
    /// Partials written, menu first.
    pub partials: Vec<PathBuf>,
    /// Tolerated inconsistencies found in the structure.
    pub warnings: Vec<IntegrityWarning>,
}

/// Build the site for `structure`.
///
/// The tree is validated and all markup rendered before anything touches
/// the filesystem, so a structural error leaves the site as it was.
/// Partials are regenerated on every build; pages are only ever created.
///
/// # Errors
///
/// Returns a structural [`SiteError`] for an invalid structure, or
/// [`SiteError::Io`] if writing fails.
pub fn build_site(structure: &Structure, options: &BuildOptions) -> Result<BuildReport, SiteError> {
    let tree = MenuTree::build(structure)?;

    let menu_html = MenuRenderer::new(&tree)
        .with_link_mode(options.link_mode)
        .render();
    let offerings_html = OfferingsRenderer::new(&tree, &structure.offerings)
        .with_images(options.image_dir.as_str(), options.image_extension.as_str())
        .render();
    let warnings = check_integrity(structure);

    let scaffolder = Scaffolder::new(&tree, &options.pages_dir, options.base_layout.as_str())
        .with_parallel(options.parallel);
    let home = scaffolder.ensure_home()?;
    let pages = scaffolder.run()?;

    let mut partials = Vec::with_capacity(2);
    for (name, content) in [(MENU_PARTIAL, menu_html), (OFFERINGS_PARTIAL, offerings_html)] {
        let path = options.partials_dir.join(name);
        write_atomic(&path, content.as_bytes()).map_err(|source| SiteError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Partial written");
        partials.push(path);
    }

    tracing::info!(
        menus = tree.len(),
        offerings = structure.offerings.len(),
        created = pages.created(),
        skipped = pages.skipped(),
        warnings = warnings.len(),
        "Site built"
    );

    Ok(BuildReport {
        menus: tree.len(),
        offerings: structure.offerings.len(),
        home,
        pages,
        partials,
        warnings,
    })
}
