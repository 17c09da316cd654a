//! Read-time integrity checks.
//!
//! These findings are tolerated when reading: the site still builds, but
//! operators should see them. Structural problems that make the menu tree
//! unbuildable are reported by the tree builder instead.

use std::collections::HashSet;
use std::fmt;

use crate::model::Structure;

/// A tolerated inconsistency in the structure document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntegrityWarning {
    /// An offering references a menu that doesn't exist.
    DanglingOffering {
        /// Position in the `offerings` list.
        index: usize,
        /// Offering id, if any.
        id: Option<u64>,
        /// The unresolved menu reference.
        menu: String,
    },
    /// Two offerings share an id.
    DuplicateOfferingId(u64),
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingOffering { index, id, menu } => {
                write!(f, "offering #{index}")?;
                if let Some(id) = id {
                    write!(f, " (id {id})")?;
                }
                write!(f, " references unknown menu '{menu}'")
            }
            Self::DuplicateOfferingId(id) => write!(f, "offering id {id} is used more than once"),
        }
    }
}

/// Collect integrity warnings in document order.
#[must_use]
pub fn check_integrity(structure: &Structure) -> Vec<IntegrityWarning> {
    let mut warnings = Vec::new();

    for (index, offering) in structure.offerings.iter().enumerate() {
        if structure.resolve_menu(&offering.menu).is_none() {
            warnings.push(IntegrityWarning::DanglingOffering {
                index,
                id: offering.id,
                menu: offering.menu.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for id in structure.offerings.iter().filter_map(|o| o.id) {
        if !seen.insert(id) && reported.insert(id) {
            warnings.push(IntegrityWarning::DuplicateOfferingId(id));
        }
    }

    for warning in &warnings {
        tracing::warn!("Integrity: {warning}");
    }

    warnings
}
