use serde::{Deserialize, Serialize};

use super::category::CategoryKind;

pub const DICTIONARY_VERSION: u32 = 1;
pub const MIN_WEIGHT: f64 = 1.0;
pub const MAX_WEIGHT: f64 = 4.0;

const fn default_weight() -> f64 {
    MIN_WEIGHT
}

/// On-disk dictionary layout. One file may define any number of categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryFile {
    pub version: u32,
    #[serde(default)]
    pub categories: Vec<CategorySpec>,
}

impl DictionaryFile {
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: DICTIONARY_VERSION,
            categories: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: CategorySpec) -> Self {
        self.categories.push(category);
        self
    }
}

impl Default for DictionaryFile {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: CategoryKind,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<TermSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<TermSpec>,
}

impl CategorySpec {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: CategoryKind, weight: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            weight,
            domain: None,
            document_type: None,
            terms: Vec::new(),
            patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    #[must_use]
    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms
            .extend(terms.into_iter().map(|t| TermSpec::Plain(t.into())));
        self
    }

    #[must_use]
    pub fn with_weighted_term(mut self, text: impl Into<String>, weight: f64) -> Self {
        self.terms.push(TermSpec::Weighted {
            text: text.into(),
            weight,
        });
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(TermSpec::Plain(pattern.into()));
        self
    }

    #[must_use]
    pub fn with_weighted_pattern(mut self, pattern: impl Into<String>, weight: f64) -> Self {
        self.patterns.push(TermSpec::Weighted {
            text: pattern.into(),
            weight,
        });
        self
    }
}

/// A term or pattern, optionally carrying its own weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermSpec {
    Plain(String),
    Weighted { text: String, weight: f64 },
}

impl TermSpec {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Weighted { text, .. } => text,
        }
    }

    #[must_use]
    pub fn weight_or(&self, fallback: f64) -> f64 {
        match self {
            Self::Plain(_) => fallback,
            Self::Weighted { weight, .. } => *weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    #[test]
    fn test_parse_dictionary_file() {
        let json = r#"{
            "version": 1,
            "categories": [
                {
                    "name": "org.unicorn",
                    "kind": "entity",
                    "entity_type": "ORG",
                    "subtype": "unicorn",
                    "weight": 3.0,
                    "domain": "finance",
                    "terms": ["Stripe", {"text": "SpaceX", "weight": 3.5}]
                },
                {
                    "name": "contract.terms",
                    "kind": "keyword",
                    "document_type": "contract",
                    "terms": ["hereinafter"]
                }
            ]
        }"#;

        let file: DictionaryFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.categories.len(), 2);

        let unicorn = &file.categories[0];
        assert_eq!(unicorn.kind.entity_type(), Some(EntityType::Organization));
        assert_eq!(unicorn.domain.as_deref(), Some("finance"));
        assert_eq!(unicorn.terms[0].weight_or(unicorn.weight), 3.0);
        assert_eq!(unicorn.terms[1].weight_or(unicorn.weight), 3.5);

        let keywords = &file.categories[1];
        assert_eq!(keywords.kind, CategoryKind::Keyword);
        assert_eq!(keywords.weight, MIN_WEIGHT);
    }

    #[test]
    fn test_builder_matches_parsed_form() {
        let built = DictionaryFile::new().with_category(
            CategorySpec::new("legal", CategoryKind::Keyword, 2.0)
                .with_document_type("contract")
                .with_terms(["whereas"]),
        );
        let json = serde_json::to_string(&built).unwrap();
        let parsed: DictionaryFile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, built);
    }
}
