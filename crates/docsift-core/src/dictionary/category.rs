use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entity::EntityType;
use crate::measure::MeasureKind;

/// Index of a category in load order. Lower ids were loaded first and win
/// every final tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u32);

impl CategoryId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a category's matches mean to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryKind {
    Entity {
        entity_type: EntityType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtype: Option<String>,
    },
    Measurement {
        measure: MeasureKind,
    },
    Predicate {
        relation: String,
    },
    Keyword,
}

impl CategoryKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Entity { .. } => "entity",
            Self::Measurement { .. } => "measurement",
            Self::Predicate { .. } => "predicate",
            Self::Keyword => "keyword",
        }
    }

    #[must_use]
    pub fn entity_type(&self) -> Option<EntityType> {
        match self {
            Self::Entity { entity_type, .. } => Some(*entity_type),
            _ => None,
        }
    }

    #[must_use]
    pub fn subtype(&self) -> Option<&str> {
        match self {
            Self::Entity { subtype, .. } => subtype.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn measure(&self) -> Option<MeasureKind> {
        match self {
            Self::Measurement { measure } => Some(*measure),
            _ => None,
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity {
                entity_type,
                subtype: Some(subtype),
            } => write!(f, "entity({entity_type}/{subtype})"),
            Self::Entity { entity_type, .. } => write!(f, "entity({entity_type})"),
            Self::Measurement { measure } => write!(f, "measurement({measure})"),
            Self::Predicate { relation } => write!(f, "predicate({relation})"),
            Self::Keyword => f.write_str("keyword"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: Arc<str>,
    pub kind: CategoryKind,
    pub weight: f64,
    pub domain: Option<String>,
    pub document_type: Option<String>,
}

impl Category {
    #[must_use]
    pub fn is_scored(&self) -> bool {
        self.domain.is_some() || self.document_type.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Exact,
    Regex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternEntry {
    pub text: String,
    pub category: CategoryId,
    pub weight: f64,
    pub source_kind: SourceKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub categories: usize,
    pub exact_entries: usize,
    pub regex_entries: usize,
}

/// The frozen pattern arena every matcher and consumer indexes into.
///
/// Built only by [`DictionaryLoader`](super::DictionaryLoader); there is no
/// way to insert into a table after loading.
#[derive(Debug, Clone)]
pub struct PatternTable {
    categories: Vec<Category>,
    entries: Vec<PatternEntry>,
}

impl PatternTable {
    pub(super) fn new(categories: Vec<Category>, entries: Vec<PatternEntry>) -> Self {
        Self {
            categories,
            entries,
        }
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    #[must_use]
    pub fn category(&self, id: CategoryId) -> &Category {
        &self.categories[id.index()]
    }

    #[must_use]
    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| &*c.name == name)
    }

    pub fn entries_of(&self, kind: SourceKind) -> impl Iterator<Item = &PatternEntry> {
        self.entries.iter().filter(move |e| e.source_kind == kind)
    }

    #[must_use]
    pub fn stats(&self) -> TableStats {
        let exact_entries = self.entries_of(SourceKind::Exact).count();
        TableStats {
            categories: self.categories.len(),
            exact_entries,
            regex_entries: self.entries.len() - exact_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_kind_deserializes_flat() {
        let kind: CategoryKind =
            serde_json::from_str(r#"{"kind":"entity","entity_type":"ORG","subtype":"unicorn"}"#)
                .unwrap();
        assert_eq!(kind.entity_type(), Some(EntityType::Organization));
        assert_eq!(kind.subtype(), Some("unicorn"));

        let kind: CategoryKind =
            serde_json::from_str(r#"{"kind":"measurement","measure":"mass"}"#).unwrap();
        assert_eq!(kind.measure(), Some(MeasureKind::Mass));
    }

    #[test]
    fn test_category_kind_display() {
        let kind = CategoryKind::Predicate {
            relation: "acquisition".into(),
        };
        assert_eq!(kind.to_string(), "predicate(acquisition)");
        assert_eq!(CategoryKind::Keyword.label(), "keyword");
    }
}
