use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission level of a grant or a requested operation. Edit implies view;
/// view never implies edit.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Level {
    View,
    Edit,
}

impl Level {
    pub fn satisfies(self, required: Level) -> bool {
        self >= required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::View => "view",
            Level::Edit => "edit",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "view" => Some(Level::View),
            "edit" => Some(Level::Edit),
            _ => None,
        }
    }
}

/// A node anywhere in the catalog hierarchy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ResourceRef {
    Collection(Uuid),
    Category(Uuid),
    Product(Uuid),
    Order(Uuid),
}

impl ResourceRef {
    pub fn id(&self) -> Uuid {
        match self {
            ResourceRef::Collection(id)
            | ResourceRef::Category(id)
            | ResourceRef::Product(id)
            | ResourceRef::Order(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResourceRef::Collection(_) => "collection",
            ResourceRef::Category(_) => "category",
            ResourceRef::Product(_) => "product",
            ResourceRef::Order(_) => "order",
        }
    }

    /// Catalog nodes participate in public browsing; orders never do.
    pub fn is_catalog_node(&self) -> bool {
        !matches!(self, ResourceRef::Order(_))
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_satisfies_view_but_not_vice_versa() {
        assert!(Level::Edit.satisfies(Level::View));
        assert!(Level::Edit.satisfies(Level::Edit));
        assert!(Level::View.satisfies(Level::View));
        assert!(!Level::View.satisfies(Level::Edit));
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!(Level::from_str("VIEW"), Some(Level::View));
        assert_eq!(Level::from_str("edit"), Some(Level::Edit));
        assert_eq!(Level::from_str("manage"), None);
    }

    #[test]
    fn orders_are_not_catalog_nodes() {
        let id = Uuid::new_v4();
        assert!(ResourceRef::Collection(id).is_catalog_node());
        assert!(ResourceRef::Product(id).is_catalog_node());
        assert!(!ResourceRef::Order(id).is_catalog_node());
    }
}
