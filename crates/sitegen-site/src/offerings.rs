//! Offerings partial: one category card per menu followed by its offering
//! cards.

use std::fmt::Write;

use sitegen_store::OfferingItem;

use crate::html::escape_html;
use crate::tree::MenuTree;

/// Renderer for the offerings partial.
#[derive(Debug)]
pub struct OfferingsRenderer<'a> {
    tree: &'a MenuTree,
    offerings: &'a [OfferingItem],
    image_dir: String,
    image_extension: String,
}

impl<'a> OfferingsRenderer<'a> {
    /// Create a renderer with `images/<name>.png` image paths.
    #[must_use]
    pub fn new(tree: &'a MenuTree, offerings: &'a [OfferingItem]) -> Self {
        Self {
            tree,
            offerings,
            image_dir: "images".to_owned(),
            image_extension: "png".to_owned(),
        }
    }

    /// Set the image directory and extension used for offering images.
    #[must_use]
    pub fn with_images(mut self, dir: impl Into<String>, extension: impl Into<String>) -> Self {
        self.image_dir = dir.into();
        self.image_extension = extension.into();
        self
    }

    fn image_src(&self, image: &str) -> String {
        let dir = self.image_dir.trim_end_matches('/');
        if dir.is_empty() {
            format!("{image}.{}", self.image_extension)
        } else {
            format!("{dir}/{image}.{}", self.image_extension)
        }
    }

    /// Render the partial.
    ///
    /// Menus appear in declaration order. Offerings whose menu doesn't
    /// resolve are left out and logged.
    #[must_use]
    pub fn render(&self) -> String {
        let mut owned: Vec<Vec<&OfferingItem>> = vec![Vec::new(); self.tree.len()];
        for (index, offering) in self.offerings.iter().enumerate() {
            match self.tree.find(&offering.menu) {
                Some(idx) => owned[idx].push(offering),
                None => tracing::warn!(
                    index,
                    menu = %offering.menu,
                    "Skipping offering with unknown menu"
                ),
            }
        }

        let mut out = String::new();
        for (idx, items) in owned.iter().enumerate() {
            let node = self.tree.node(idx);
            let blurb = node
                .description
                .as_deref()
                .or(node.text.as_deref())
                .unwrap_or_default();
            let _ = writeln!(
                out,
                r#"<div class="category-card" data-category="{}">"#,
                escape_html(self.tree.slug(idx))
            );
            let _ = writeln!(out, "  <h2>{}</h2>", escape_html(&node.menu));
            let _ = writeln!(out, "  <p>{}</p>", escape_html(blurb));
            out.push_str("</div>\n");

            for offering in items {
                self.render_offering(&mut out, offering);
            }
        }
        out
    }

    fn render_offering(&self, out: &mut String, offering: &OfferingItem) {
        let text = escape_html(offering.text.as_deref().unwrap_or_default());
        out.push_str("<div class=\"offering-card\">\n");
        let _ = writeln!(
            out,
            r#"  <a href="{}" target="_blank">"#,
            escape_html(offering.link.as_deref().unwrap_or_default())
        );
        if let Some(image) = offering.image.as_deref().filter(|i| !i.is_empty()) {
            let _ = writeln!(
                out,
                r#"    <img src="{}" alt="{text}">"#,
                escape_html(&self.image_src(image))
            );
        }
        let _ = writeln!(out, "    <p>{text}</p>");
        out.push_str("  </a>\n");
        out.push_str("</div>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sitegen_store::MenuNode;

    fn offering(menu: &str, text: &str, image: Option<&str>, link: &str) -> OfferingItem {
        OfferingItem {
            menu: menu.to_owned(),
            text: Some(text.to_owned()),
            image: image.map(ToOwned::to_owned),
            link: Some(link.to_owned()),
            ..OfferingItem::default()
        }
    }

    fn tree() -> MenuTree {
        let mut home = MenuNode::new(Some(1), "Home", None);
        home.text = Some("Welcome".to_owned());
        let mut walks = MenuNode::new(Some(2), "Local Walks", Some("Home"));
        walks.description = Some("Good walks".to_owned());
        walks.text = Some("ignored when a description exists".to_owned());
        MenuTree::from_nodes(vec![home, walks]).unwrap()
    }

    #[test]
    fn test_render_category_and_offering_cards() {
        let tree = tree();
        let offerings = vec![offering(
            "Local Walks",
            "Castle trail",
            Some("kendalcastle"),
            "https://example.com/castle",
        )];

        let html = OfferingsRenderer::new(&tree, &offerings).render();

        assert_eq!(
            html,
            r#"<div class="category-card" data-category="home">
  <h2>Home</h2>
  <p>Welcome</p>
</div>
<div class="category-card" data-category="local_walks">
  <h2>Local Walks</h2>
  <p>Good walks</p>
</div>
<div class="offering-card">
  <a href="https://example.com/castle" target="_blank">
    <img src="images/kendalcastle.png" alt="Castle trail">
    <p>Castle trail</p>
  </a>
</div>
"#
        );
    }

    #[test]
    fn test_offering_menu_by_id_and_custom_images() {
        let tree = tree();
        let offerings = vec![offering("2", "Fell walk", Some("fell"), "https://x")];

        let html = OfferingsRenderer::new(&tree, &offerings)
            .with_images("/static/img/", "jpg")
            .render();

        assert!(html.contains(r#"<img src="/static/img/fell.jpg" alt="Fell walk">"#));
    }

    #[test]
    fn test_dangling_offering_skipped() {
        let tree = tree();
        let offerings = vec![offering("Gone", "Orphan", None, "https://x")];

        let html = OfferingsRenderer::new(&tree, &offerings).render();

        assert!(!html.contains("Orphan"));
        assert_eq!(html.matches("category-card").count(), 2);
    }

    #[test]
    fn test_offering_without_image_has_no_img() {
        let tree = tree();
        let offerings = vec![offering("Home", "Say hello", None, "mailto:x@example.com")];

        let html = OfferingsRenderer::new(&tree, &offerings).render();

        assert!(html.contains("<p>Say hello</p>"));
        assert!(!html.contains("<img"));
    }
}
