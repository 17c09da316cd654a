//! Menu tree built from the flat structure list.
//!
//! # Architecture
//!
//! Menus are stored in a flat `Vec<MenuNode>` in declaration order, with
//! parent/children relationships tracked by indices. This provides:
//! - O(1) lookups by title or id via `HashMap` indexes
//! - insertion-ordered children per node
//! - O(d) ancestor walks where d is the node depth
//!
//! Building validates the structure: exactly one root, every parent
//! resolvable, unique titles and ids, every node reachable from the root,
//! no two siblings sharing a slug, and no first-level menu taking the root
//! page slug. A tree that exists is always valid.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use sitegen_store::{MenuNode, Structure};

use crate::error::SiteError;
use crate::paths::HOME_SLUG;
use crate::slug::{is_usable, slugify};

/// Key of one level in the parent → children mapping.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParentKey {
    /// The top level, holding the root menu. Absent, empty and null
    /// parent references all land here.
    Root,
    /// Children of the menu with this title.
    Node(String),
}

impl fmt::Display for ParentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("<root>"),
            Self::Node(title) => f.write_str(title),
        }
    }
}

/// Navigation item with children, for editor front-ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavItem {
    /// Display title.
    pub title: String,
    /// Route path with leading slash.
    pub path: String,
    /// Slug of the title.
    pub slug: String,
    /// Menu id, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Child navigation items.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

/// Validated menu hierarchy.
#[derive(Debug)]
pub struct MenuTree {
    nodes: Vec<MenuNode>,
    slugs: Vec<String>,
    children: Vec<Vec<usize>>,
    parents: Vec<Option<usize>>,
    root: usize,
    title_index: HashMap<String, usize>,
    id_index: HashMap<u64, usize>,
}

impl MenuTree {
    /// Build and validate the tree from the structure's menus.
    ///
    /// # Errors
    ///
    /// Returns a structural [`SiteError`] describing the first problem found.
    pub fn build(structure: &Structure) -> Result<Self, SiteError> {
        Self::from_nodes(structure.menus.clone())
    }

    /// Build and validate the tree from menus in declaration order.
    ///
    /// # Errors
    ///
    /// Returns a structural [`SiteError`] describing the first problem found.
    pub fn from_nodes(nodes: Vec<MenuNode>) -> Result<Self, SiteError> {
        let mut title_index = HashMap::with_capacity(nodes.len());
        let mut id_index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if title_index.insert(node.menu.clone(), i).is_some() {
                return Err(SiteError::DuplicateKey(node.menu.clone()));
            }
            if let Some(id) = node.id
                && id_index.insert(id, i).is_some()
            {
                return Err(SiteError::DuplicateId(id));
            }
        }

        let resolve = |reference: &str| {
            title_index.get(reference).copied().or_else(|| {
                reference
                    .parse::<u64>()
                    .ok()
                    .and_then(|id| id_index.get(&id).copied())
            })
        };

        let mut parents = Vec::with_capacity(nodes.len());
        let mut roots = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            match node.parent_ref() {
                None => {
                    roots.push(i);
                    parents.push(None);
                }
                Some(reference) => {
                    let parent = resolve(reference).ok_or_else(|| SiteError::UnresolvedParent {
                        menu: node.menu.clone(),
                        parent: reference.to_owned(),
                    })?;
                    parents.push(Some(parent));
                }
            }
        }

        let root = match roots.as_slice() {
            [] => return Err(SiteError::NoRoot),
            [root] => *root,
            many => {
                return Err(SiteError::MultipleRoots(
                    many.iter().map(|&i| nodes[i].menu.clone()).collect(),
                ));
            }
        };

        let mut children = vec![Vec::new(); nodes.len()];
        for (i, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                children[*p].push(i);
            }
        }

        let mut reached = vec![false; nodes.len()];
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            reached[i] = true;
            stack.extend(children[i].iter().copied().filter(|&c| !reached[c]));
        }
        if let Some(i) = reached.iter().position(|r| !r) {
            return Err(SiteError::Unreachable(nodes[i].menu.clone()));
        }

        let slugs: Vec<String> = nodes.iter().map(|n| slugify(&n.menu)).collect();
        for (i, slug) in slugs.iter().enumerate() {
            if i != root && !is_usable(slug) {
                return Err(SiteError::InvalidSlug {
                    menu: nodes[i].menu.clone(),
                    slug: slug.clone(),
                });
            }
        }
        if let Some(&kid) = children[root].iter().find(|&&k| slugs[k] == HOME_SLUG) {
            return Err(SiteError::ReservedSlug {
                menu: nodes[kid].menu.clone(),
                slug: slugs[kid].clone(),
            });
        }
        for (parent, kids) in children.iter().enumerate() {
            let mut seen: HashMap<&str, usize> = HashMap::with_capacity(kids.len());
            for &kid in kids {
                if let Some(&first) = seen.get(slugs[kid].as_str()) {
                    return Err(SiteError::SlugCollision {
                        parent: nodes[parent].menu.clone(),
                        slug: slugs[kid].clone(),
                        first: nodes[first].menu.clone(),
                        second: nodes[kid].menu.clone(),
                    });
                }
                seen.insert(slugs[kid].as_str(), kid);
            }
        }

        tracing::debug!(menus = nodes.len(), root = %nodes[root].menu, "Menu tree built");

        Ok(Self {
            nodes,
            slugs,
            children,
            parents,
            root,
            title_index,
            id_index,
        })
    }

    /// Number of menus.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a valid tree has a root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the root menu.
    #[must_use]
    pub fn root(&self) -> usize {
        self.root
    }

    /// Menu at `idx`.
    #[must_use]
    pub fn node(&self, idx: usize) -> &MenuNode {
        &self.nodes[idx]
    }

    /// Slug of the menu at `idx`.
    #[must_use]
    pub fn slug(&self, idx: usize) -> &str {
        &self.slugs[idx]
    }

    /// Child indices of `idx`, in declaration order.
    #[must_use]
    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    /// Parent index of `idx`; `None` for the root.
    #[must_use]
    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.parents[idx]
    }

    /// Find a menu by title, falling back to its id.
    #[must_use]
    pub fn find(&self, reference: &str) -> Option<usize> {
        self.title_index.get(reference).copied().or_else(|| {
            reference
                .parse::<u64>()
                .ok()
                .and_then(|id| self.id_index.get(&id).copied())
        })
    }

    /// Every menu index in pre-order from the root.
    #[must_use]
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(self.children[i].iter().rev());
        }
        order
    }

    /// Ancestors of `idx`, root first, excluding `idx` itself.
    #[must_use]
    pub fn ancestors(&self, idx: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = self.parents[idx];
        while let Some(i) = current {
            chain.push(i);
            current = self.parents[i];
        }
        chain.reverse();
        chain
    }

    /// Depth of `idx`; the root is at depth 0.
    #[must_use]
    pub fn depth(&self, idx: usize) -> usize {
        self.ancestors(idx).len()
    }

    /// Menus under `key`, in declaration order.
    #[must_use]
    pub fn children_of(&self, key: &ParentKey) -> Vec<&MenuNode> {
        match key {
            ParentKey::Root => vec![&self.nodes[self.root]],
            ParentKey::Node(title) => self
                .title_index
                .get(title)
                .map(|&i| self.children[i].iter().map(|&c| &self.nodes[c]).collect())
                .unwrap_or_default(),
        }
    }

    /// The full parent → children mapping, in pre-order of the parents.
    ///
    /// Leaf menus have no entry.
    #[must_use]
    pub fn by_parent(&self) -> Vec<(ParentKey, Vec<&MenuNode>)> {
        let mut levels = vec![(ParentKey::Root, self.children_of(&ParentKey::Root))];
        levels.extend(
            self.preorder()
                .into_iter()
                .filter(|&i| !self.children[i].is_empty())
                .map(|i| {
                    let kids = self.children[i].iter().map(|&c| &self.nodes[c]).collect();
                    (ParentKey::Node(self.nodes[i].menu.clone()), kids)
                }),
        );
        levels
    }

    /// Navigation items for the root's children, built bottom-up.
    #[must_use]
    pub fn nav_items(&self) -> Vec<NavItem> {
        let mut built: Vec<Option<NavItem>> = vec![None; self.nodes.len()];
        for i in self.preorder().into_iter().rev() {
            let children = self.children[i]
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            built[i] = Some(NavItem {
                title: self.nodes[i].menu.clone(),
                path: self.path_of(i),
                slug: self.slugs[i].clone(),
                id: self.nodes[i].id,
                children,
            });
        }
        built[self.root]
            .take()
            .map(|root| root.children)
            .unwrap_or_default()
    }
}
