use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dictionary::PatternTable;
use crate::entity::EntityType;
use crate::matcher::{Match, MatchSource};

/// Document-local entity identifier, rendered as `E1`, `E2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for EntityId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .strip_prefix('E')
            .and_then(|n| n.parse().ok())
            .map(Self)
            .ok_or_else(|| format!("invalid entity id: {value}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Category names that contributed mentions, sorted.
    pub categories: BTreeSet<String>,
    pub subtypes: BTreeSet<String>,
    pub sources: BTreeSet<MatchSource>,
    pub mention_count: usize,
    pub first_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// First-seen surface form, whitespace-collapsed.
    pub name: String,
    pub normalized_form: String,
    /// Distinct surface forms other than `name`.
    pub aliases: BTreeSet<String>,
    /// In document order.
    pub mentions: Vec<Match>,
    pub confidence: f64,
    pub metadata: EntityMetadata,
}

/// Confidence lookup: subtype first, then entity type, then `default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    pub by_subtype: BTreeMap<String, f64>,
    pub by_type: BTreeMap<EntityType, f64>,
    pub default: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        let by_subtype = [
            ("unicorn", 0.95),
            ("fortune500", 0.9),
            ("standard", 0.85),
            ("dated", 0.9),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let by_type = [
            (EntityType::Person, 0.8),
            (EntityType::Organization, 0.85),
            (EntityType::Gpe, 0.9),
            (EntityType::Location, 0.8),
            (EntityType::Event, 0.7),
            (EntityType::Product, 0.7),
            (EntityType::Date, 0.95),
            (EntityType::Identifier, 0.9),
        ]
        .into_iter()
        .collect();

        Self {
            by_subtype,
            by_type,
            default: 0.5,
        }
    }
}

impl ConfidencePolicy {
    #[must_use]
    pub fn lookup(&self, entity_type: EntityType, subtype: Option<&str>) -> f64 {
        subtype
            .and_then(|s| self.by_subtype.get(s))
            .or_else(|| self.by_type.get(&entity_type))
            .copied()
            .unwrap_or(self.default)
    }

    /// Every confidence must lie in `[0, 1]`. Returns the first offender.
    pub fn check(&self) -> Result<(), ConfidenceError> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);

        if !in_range(self.default) {
            return Err(ConfidenceError::Default(self.default));
        }
        if let Some((subtype, &value)) = self.by_subtype.iter().find(|(_, v)| !in_range(**v)) {
            return Err(ConfidenceError::Subtype {
                subtype: subtype.clone(),
                value,
            });
        }
        if let Some((&entity_type, &value)) = self.by_type.iter().find(|(_, v)| !in_range(**v)) {
            return Err(ConfidenceError::Type { entity_type, value });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfidenceError {
    #[error("Default confidence {0} is outside 0..=1")]
    Default(f64),

    #[error("Confidence {value} for subtype {subtype:?} is outside 0..=1")]
    Subtype { subtype: String, value: f64 },

    #[error("Confidence {value} for type {entity_type} is outside 0..=1")]
    Type { entity_type: EntityType, value: f64 },
}

/// Normalization key: trimmed, whitespace-collapsed, lowercased.
#[must_use]
pub fn normalize_form(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct Canonicalizer<'a> {
    table: &'a PatternTable,
    policy: &'a ConfidencePolicy,
}

impl<'a> Canonicalizer<'a> {
    #[must_use]
    pub fn new(table: &'a PatternTable, policy: &'a ConfidencePolicy) -> Self {
        Self { table, policy }
    }

    /// Groups entity mentions by `(type, normalized form)`. Non-entity
    /// matches are ignored. IDs follow first-mention order.
    #[must_use]
    pub fn canonicalize(&self, matches: &[Match]) -> Vec<CanonicalEntity> {
        let mut mentions: Vec<&Match> = matches.iter().collect();
        mentions.sort_by_key(|m| (m.span, m.category));

        let mut entities: Vec<CanonicalEntity> = Vec::new();
        let mut index: HashMap<(EntityType, String), usize> = HashMap::new();

        for mention in mentions {
            let category = self.table.category(mention.category);
            let Some(entity_type) = category.kind.entity_type() else {
                continue;
            };
            let subtype = category.kind.subtype();
            let normalized_form = normalize_form(&mention.text);
            if normalized_form.is_empty() {
                continue;
            }
            let confidence = self.policy.lookup(entity_type, subtype);

            let slot = *index
                .entry((entity_type, normalized_form.clone()))
                .or_insert_with(|| {
                    let id = EntityId(u32::try_from(entities.len() + 1).unwrap_or(u32::MAX));
                    entities.push(CanonicalEntity {
                        id,
                        entity_type,
                        name: collapse_whitespace(&mention.text),
                        normalized_form,
                        aliases: BTreeSet::new(),
                        mentions: Vec::new(),
                        confidence,
                        metadata: EntityMetadata {
                            first_offset: mention.span.start,
                            ..EntityMetadata::default()
                        },
                    });
                    entities.len() - 1
                });

            let entity = &mut entities[slot];
            let surface = collapse_whitespace(&mention.text);
            if surface != entity.name {
                entity.aliases.insert(surface);
            }
            entity.confidence = entity.confidence.max(confidence);
            entity.metadata.categories.insert(category.name.to_string());
            if let Some(subtype) = subtype {
                entity.metadata.subtypes.insert(subtype.to_string());
            }
            entity.metadata.sources.insert(mention.source);
            entity.metadata.mention_count += 1;
            entity.mentions.push(mention.clone());
        }

        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{CategoryKind, CategorySpec, DictionaryFile, DictionaryLoader};
    use crate::matcher::{fuse, ExactMatcher, Matcher};

    fn entity(name: &str, entity_type: EntityType, subtype: Option<&str>) -> CategorySpec {
        CategorySpec::new(
            name,
            CategoryKind::Entity {
                entity_type,
                subtype: subtype.map(String::from),
            },
            2.0,
        )
    }

    fn table() -> PatternTable {
        DictionaryLoader::new()
            .with_builtin_patterns(false)
            .with_inline(
                "test",
                DictionaryFile::new()
                    .with_category(
                        entity("org.unicorn", EntityType::Organization, Some("unicorn"))
                            .with_terms(["Stripe", "STRIPE"]),
                    )
                    .with_category(
                        entity("org.any", EntityType::Organization, None)
                            .with_terms(["stripe", "Acme Corp", "Acme  Corp"]),
                    )
                    .with_category(
                        entity("person", EntityType::Person, None).with_terms(["Jordan"]),
                    )
                    .with_category(
                        entity("gpe", EntityType::Gpe, None).with_terms(["Jordan", "Paris"]),
                    )
                    .with_category(
                        CategorySpec::new("kw", CategoryKind::Keyword, 1.0)
                            .with_domain("finance")
                            .with_terms(["revenue"]),
                    ),
            )
            .load()
            .unwrap()
    }

    fn run(text: &str) -> Vec<CanonicalEntity> {
        let table = table();
        let matches = fuse(ExactMatcher::build(&table, true).unwrap().scan(text)).accepted;
        let policy = ConfidencePolicy::default();
        Canonicalizer::new(&table, &policy).canonicalize(&matches)
    }

    #[test]
    fn test_groups_case_variants() {
        let entities = run("Stripe grew revenue. stripe and STRIPE again.");

        assert_eq!(entities.len(), 1);
        let stripe = &entities[0];
        assert_eq!(stripe.id, EntityId(1));
        assert_eq!(stripe.name, "Stripe");
        assert_eq!(stripe.normalized_form, "stripe");
        assert_eq!(
            stripe.aliases,
            ["STRIPE", "stripe"]
                .into_iter()
                .map(String::from)
                .collect::<BTreeSet<String>>()
        );
        assert_eq!(stripe.metadata.mention_count, 3);
        assert_eq!(stripe.metadata.first_offset, 0);
        // unicorn subtype outranks the plain ORG default
        assert_eq!(stripe.confidence, 0.95);
        assert!(stripe.metadata.subtypes.contains("unicorn"));
    }

    #[test]
    fn test_whitespace_collapsed_in_key() {
        let entities = run("Acme  Corp then Acme Corp");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "Acme Corp");
        assert!(entities[0].aliases.is_empty());
        assert_eq!(entities[0].mentions.len(), 2);
    }

    #[test]
    fn test_type_is_part_of_key() {
        let table = table();
        let jordan_gpe = table.category_by_name("gpe").unwrap().id;
        let jordan_person = table.category_by_name("person").unwrap().id;
        let matches = vec![
            Match::new(
                crate::Span::new(0, 6),
                "Jordan",
                jordan_person,
                table.category(jordan_person).name.clone(),
                MatchSource::Exact,
                2.0,
            ),
            Match::new(
                crate::Span::new(20, 26),
                "Jordan",
                jordan_gpe,
                table.category(jordan_gpe).name.clone(),
                MatchSource::Exact,
                2.0,
            ),
        ];
        let policy = ConfidencePolicy::default();
        let entities = Canonicalizer::new(&table, &policy).canonicalize(&matches);

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].entity_type, EntityType::Person);
        assert_eq!(entities[1].entity_type, EntityType::Gpe);
        assert_eq!(entities[1].id.to_string(), "E2");
    }

    #[test]
    fn test_ids_follow_first_mention() {
        let entities = run("Paris office, then Stripe, then Paris again");
        let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Paris", "Stripe"]);
        assert_eq!(entities[0].id, EntityId(1));
        assert_eq!(entities[1].id, EntityId(2));
    }

    #[test]
    fn test_idempotent_on_own_mentions() {
        let table = table();
        let policy = ConfidencePolicy::default();
        let canonicalizer = Canonicalizer::new(&table, &policy);
        let matches = fuse(
            ExactMatcher::build(&table, true)
                .unwrap()
                .scan("Stripe, Paris, stripe, Acme Corp, Paris"),
        )
        .accepted;

        let first = canonicalizer.canonicalize(&matches);
        let mentions: Vec<Match> = first.iter().flat_map(|e| e.mentions.clone()).collect();
        let second = canonicalizer.canonicalize(&mentions);

        assert_eq!(first, second);
    }

    #[test]
    fn test_keywords_ignored() {
        assert!(run("revenue revenue").is_empty());
    }

    #[test]
    fn test_policy_lookup_order() {
        let policy = ConfidencePolicy::default();
        assert_eq!(policy.lookup(EntityType::Organization, Some("unicorn")), 0.95);
        assert_eq!(policy.lookup(EntityType::Organization, Some("unknown")), 0.85);
        assert_eq!(policy.lookup(EntityType::Date, None), 0.95);

        let sparse = ConfidencePolicy {
            by_subtype: BTreeMap::new(),
            by_type: BTreeMap::new(),
            default: 0.4,
        };
        assert_eq!(sparse.lookup(EntityType::Person, None), 0.4);
        assert!(policy.check().is_ok());
    }

    #[test]
    fn test_policy_check_names_offender() {
        let policy = ConfidencePolicy::default();
        assert_eq!(
            ConfidencePolicy { default: 1.5, ..policy.clone() }.check(),
            Err(ConfidenceError::Default(1.5))
        );

        let mut by_subtype = policy.by_subtype.clone();
        by_subtype.insert("shell".into(), -0.1);
        assert_eq!(
            ConfidencePolicy { by_subtype, ..policy.clone() }.check(),
            Err(ConfidenceError::Subtype {
                subtype: "shell".into(),
                value: -0.1
            })
        );

        let mut by_type = policy.by_type.clone();
        by_type.insert(EntityType::Person, f64::NAN);
        let err = ConfidencePolicy { by_type, ..policy }.check().unwrap_err();
        assert!(matches!(
            err,
            ConfidenceError::Type { entity_type: EntityType::Person, value } if value.is_nan()
        ));
    }

    #[test]
    fn test_entity_id_serde() {
        let json = serde_json::to_string(&EntityId(7)).unwrap();
        assert_eq!(json, "\"E7\"");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntityId(7));
        assert!(serde_json::from_str::<EntityId>("\"X7\"").is_err());
    }
}
