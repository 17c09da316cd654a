//! Menu tree, routes, navigation markup and page scaffolding for sitegen.
//!
//! This crate provides:
//! - [`MenuTree`]: validated hierarchy built from the flat structure list
//! - Path resolution ([`MenuTree::path_of`]) and a data-driven [`RouteTable`]
//! - [`MenuRenderer`] and [`OfferingsRenderer`] for the generated partials
//! - [`Scaffolder`] creating missing page templates without overwriting
//! - [`build_site`] tying it all together
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use sitegen_site::{BuildOptions, build_site};
//! use sitegen_store::{FileStore, StructureStore};
//!
//! let structure = FileStore::new("site_structure.toml")?.load()?;
//! let report = build_site(&structure, &BuildOptions::new("templates"))?;
//! println!("{} pages created", report.pages.created());
//! # Ok(())
//! # }
//! ```

mod build;
mod error;
mod html;
mod menu;
mod offerings;
mod paths;
mod routes;
mod scaffold;
mod slug;
mod tree;

pub use build::{BuildOptions, BuildReport, MENU_PARTIAL, OFFERINGS_PARTIAL, build_site};
pub use error::SiteError;
pub use html::escape_html;
pub use menu::{LinkMode, MenuRenderer};
pub use offerings::OfferingsRenderer;
pub use paths::HOME_TEMPLATE;
pub use routes::{Route, RouteTable};
pub use scaffold::{ScaffoldEntry, ScaffoldOutcome, ScaffoldReport, Scaffolder};
pub use slug::slugify;
pub use tree::{MenuTree, NavItem, ParentKey};
