//! Data-driven route table.
//!
//! Serving layers look routes up here instead of having per-page handlers
//! generated for them.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::tree::MenuTree;

/// One servable page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Route path with leading slash.
    pub path: String,
    /// Page title.
    pub title: String,
    /// Template path relative to the pages directory, `/`-separated.
    pub template: String,
    /// Menu id, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// All routes of a site, in pre-order.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: Vec<Route>,
    #[serde(skip)]
    path_index: HashMap<String, usize>,
}

impl RouteTable {
    /// Derive the table from a tree.
    #[must_use]
    pub fn from_tree(tree: &MenuTree) -> Self {
        let routes: Vec<Route> = tree
            .preorder()
            .into_iter()
            .map(|idx| Route {
                path: tree.path_of(idx),
                title: tree.node(idx).menu.clone(),
                template: template_string(&tree.template_of(idx)),
                id: tree.node(idx).id,
            })
            .collect();
        let path_index = routes
            .iter()
            .enumerate()
            .map(|(i, route)| (route.path.clone(), i))
            .collect();
        Self { routes, path_index }
    }

    /// Route for a request path; a trailing slash is ignored.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Route> {
        let trimmed = path.trim_end_matches('/');
        let key = if trimmed.is_empty() { "/" } else { trimmed };
        self.path_index.get(key).map(|&i| &self.routes[i])
    }

    /// Routes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Templates are addressed with `/` regardless of platform.
fn template_string(path: &Path) -> String {
    path.iter()
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
