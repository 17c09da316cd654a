//! Structure document data model.
//!
//! A structure document has two ordered sections: `menus` (navigation
//! entries forming a tree through `parent` references) and `offerings`
//! (leaf cards attached to a menu). Fields the model doesn't know about are
//! kept in `extra` so a load/save cycle never drops data.

use serde::{Deserialize, Deserializer, Serialize};

/// Navigation entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuNode {
    /// Stable numeric identifier.
    #[serde(
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<u64>,
    /// Display title, also the historical join key.
    #[serde(default)]
    pub menu: String,
    /// Title (or id) of the parent entry. Absent or empty for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Introductory text shown on the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Longer description used on category cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unrecognised fields, written back untouched.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl MenuNode {
    /// Create a node with a title and optional parent reference.
    #[must_use]
    pub fn new(id: Option<u64>, menu: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            id,
            menu: menu.into(),
            parent: parent.map(ToOwned::to_owned),
            ..Self::default()
        }
    }

    /// Parent reference with empty values normalized away.
    #[must_use]
    pub fn parent_ref(&self) -> Option<&str> {
        self.parent
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Whether `reference` names this node by title or by id.
    #[must_use]
    pub fn is_named_by(&self, reference: &str) -> bool {
        self.menu == reference
            || self
                .id
                .is_some_and(|id| reference.parse::<u64>().is_ok_and(|r| r == id))
    }
}

/// Leaf content card attached to a menu.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferingItem {
    /// Stable numeric identifier.
    #[serde(
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<u64>,
    /// Title (or id) of the owning menu.
    #[serde(default)]
    pub menu: String,
    /// Card text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// External link URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Logical image name; the extension is appended at render time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Unrecognised fields, written back untouched.
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// The persisted site structure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Navigation entries in declaration order.
    #[serde(default)]
    pub menus: Vec<MenuNode>,
    /// Offering cards in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offerings: Vec<OfferingItem>,
    /// Unrecognised top-level keys, written back untouched.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Structure {
    /// Find a menu by numeric id.
    #[must_use]
    pub fn menu_by_id(&self, id: u64) -> Option<&MenuNode> {
        self.menus.iter().find(|m| m.id == Some(id))
    }

    /// Find a menu by title or id reference.
    #[must_use]
    pub fn resolve_menu(&self, reference: &str) -> Option<&MenuNode> {
        self.menus
            .iter()
            .find(|m| m.menu == reference)
            .or_else(|| self.menus.iter().find(|m| m.is_named_by(reference)))
    }

    /// Offerings owned by `node`, in declaration order.
    pub fn offerings_for<'a>(
        &'a self,
        node: &'a MenuNode,
    ) -> impl Iterator<Item = &'a OfferingItem> + 'a {
        self.offerings
            .iter()
            .filter(move |o| node.is_named_by(&o.menu))
    }
}

/// Accept ids written either as integers or as numeric strings.
///
/// Browser form data round-trips everything as strings, so `"7"` and `7`
/// are treated alike.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(n)) => Ok(Some(n)),
        Some(RawId::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawId::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid id '{s}'"))),
    }
}
