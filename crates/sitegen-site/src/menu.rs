//! Navigation menu markup.
//!
//! Renders nested `<ul>`/`<li>` lists from the root's children downward,
//! two spaces of indent per level:
//!
//! ```text
//! <ul>
//!   <li><a href="#local">Local</a>
//!   <ul>
//!     <li><a href="#eating_out">Eating Out</a>
//!     </li>
//!   </ul>
//!   </li>
//! </ul>
//! ```

use std::fmt::Write;

use crate::html::escape_html;
use crate::tree::MenuTree;

const INDENT: usize = 2;

/// How menu entries link to their pages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkMode {
    /// `href="#<slug>"`, for single-page layouts.
    #[default]
    Anchor,
    /// `href="<route path>"`.
    Navigable,
}

/// Menu markup renderer over a built tree.
#[derive(Debug)]
pub struct MenuRenderer<'a> {
    tree: &'a MenuTree,
    link_mode: LinkMode,
    active: Option<usize>,
}

enum Step {
    Item { idx: usize, indent: usize },
    CloseList { indent: usize },
    CloseItem { indent: usize },
}

impl<'a> MenuRenderer<'a> {
    /// Create a renderer with anchor links and no active entry.
    #[must_use]
    pub fn new(tree: &'a MenuTree) -> Self {
        Self {
            tree,
            link_mode: LinkMode::default(),
            active: None,
        }
    }

    /// Set the link mode.
    #[must_use]
    pub fn with_link_mode(mut self, link_mode: LinkMode) -> Self {
        self.link_mode = link_mode;
        self
    }

    /// Mark the entry named by `reference` (title or id) as active.
    ///
    /// Unknown references leave every entry unmarked.
    #[must_use]
    pub fn with_active(mut self, reference: &str) -> Self {
        self.active = self.tree.find(reference);
        if self.active.is_none() {
            tracing::debug!(reference, "Active menu not found, rendering without marker");
        }
        self
    }

    fn href(&self, idx: usize) -> String {
        match self.link_mode {
            LinkMode::Anchor => format!("#{}", self.tree.slug(idx)),
            LinkMode::Navigable => self.tree.path_of(idx),
        }
    }

    /// Render the menu.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("<ul>\n");
        let mut stack: Vec<Step> = self
            .tree
            .children(self.tree.root())
            .iter()
            .rev()
            .map(|&idx| Step::Item {
                idx,
                indent: INDENT,
            })
            .collect();

        while let Some(step) = stack.pop() {
            match step {
                Step::Item { idx, indent } => {
                    let class = if self.active == Some(idx) {
                        r#" class="active""#
                    } else {
                        ""
                    };
                    let _ = writeln!(
                        out,
                        r#"{:indent$}<li{class}><a href="{}">{}</a>"#,
                        "",
                        escape_html(&self.href(idx)),
                        escape_html(&self.tree.node(idx).menu),
                    );

                    stack.push(Step::CloseItem { indent });
                    let children = self.tree.children(idx);
                    if !children.is_empty() {
                        let _ = writeln!(out, "{:indent$}<ul>", "");
                        stack.push(Step::CloseList { indent });
                        stack.extend(children.iter().rev().map(|&c| Step::Item {
                            idx: c,
                            indent: indent + INDENT,
                        }));
                    }
                }
                Step::CloseList { indent } => {
                    let _ = writeln!(out, "{:indent$}</ul>", "");
                }
                Step::CloseItem { indent } => {
                    let _ = writeln!(out, "{:indent$}</li>", "");
                }
            }
        }

        out.push_str("</ul>\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sitegen_store::MenuNode;

    fn tree() -> MenuTree {
        MenuTree::from_nodes(vec![
            MenuNode::new(Some(1), "Home", None),
            MenuNode::new(Some(2), "What's On", Some("Home")),
            MenuNode::new(Some(3), "Local", Some("Home")),
            MenuNode::new(Some(4), "Eating Out", Some("Local")),
        ])
        .unwrap()
    }

    #[test]
    fn test_render_anchor_links() {
        let tree = tree();

        let html = MenuRenderer::new(&tree).render();

        assert_eq!(
            html,
            r##"<ul>
  <li><a href="#whats_on">What&#x27;s On</a>
  </li>
  <li><a href="#local">Local</a>
  <ul>
    <li><a href="#eating_out">Eating Out</a>
    </li>
  </ul>
  </li>
</ul>
"##
        );
    }

    #[test]
    fn test_render_navigable_links_with_active() {
        let tree = tree();

        let html = MenuRenderer::new(&tree)
            .with_link_mode(LinkMode::Navigable)
            .with_active("4")
            .render();

        assert!(html.contains(r#"<li><a href="/whats_on">What&#x27;s On</a>"#));
        assert!(html.contains(
            r#"    <li class="active"><a href="/local/eating_out">Eating Out</a>"#
        ));
        assert_eq!(html.matches("class=\"active\"").count(), 1);
    }

    #[test]
    fn test_unknown_active_marks_nothing() {
        let tree = tree();

        let html = MenuRenderer::new(&tree).with_active("Nowhere").render();

        assert!(!html.contains("active"));
    }

    #[test]
    fn test_root_only_renders_empty_list() {
        let tree = MenuTree::from_nodes(vec![MenuNode::new(Some(1), "Home", None)]).unwrap();

        assert_eq!(MenuRenderer::new(&tree).render(), "<ul>\n</ul>\n");
    }

    #[test]
    fn test_render_is_deterministic() {
        let tree = tree();
        let renderer = MenuRenderer::new(&tree).with_active("Local");

        assert_eq!(renderer.render(), renderer.render());
    }

    #[test]
    fn test_title_is_escaped() {
        let tree = MenuTree::from_nodes(vec![
            MenuNode::new(Some(1), "Home", None),
            MenuNode::new(Some(2), "Fish & <Chips>", Some("Home")),
        ])
        .unwrap();

        let html = MenuRenderer::new(&tree).render();

        assert!(html.contains(">Fish &amp; &lt;Chips&gt;</a>"));
        assert!(html.contains(r##"href="#fish_&amp;_&lt;chips&gt;""##));
        assert!(!html.contains("<Chips>"));
    }
}
