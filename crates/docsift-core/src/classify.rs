use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dictionary::PatternTable;
use crate::matcher::Match;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagScore {
    pub name: String,
    /// Share of the list's total weight, 0-100, rounded to two decimals.
    pub percentage: f64,
    pub accumulated_weight: f64,
    pub hit_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub domains: Vec<TagScore>,
    pub document_types: Vec<TagScore>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub primary_domain: Option<String>,
    pub primary_document_type: Option<String>,
    pub deep_extraction: bool,
}

impl Classification {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.document_types.is_empty()
    }

    /// Deep extraction is enabled when the top domain's percentage strictly
    /// exceeds `threshold`. The threshold is configuration, not scoring.
    #[must_use]
    pub fn route(&self, threshold: f64) -> RoutingDecision {
        let top = self.domains.first();
        RoutingDecision {
            primary_domain: top.map(|s| s.name.clone()),
            primary_document_type: self.document_types.first().map(|s| s.name.clone()),
            deep_extraction: top.is_some_and(|s| s.percentage > threshold),
        }
    }
}

pub struct ClassificationScorer<'a> {
    table: &'a PatternTable,
}

impl<'a> ClassificationScorer<'a> {
    #[must_use]
    pub fn new(table: &'a PatternTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn score(&self, matches: &[Match]) -> Classification {
        let mut domains = Tally::default();
        let mut document_types = Tally::default();

        for m in matches {
            let category = self.table.category(m.category);
            if let Some(domain) = &category.domain {
                domains.add(domain, m.weight);
            }
            if let Some(document_type) = &category.document_type {
                document_types.add(document_type, m.weight);
            }
        }

        Classification {
            domains: domains.ranked(),
            document_types: document_types.ranked(),
        }
    }
}

#[derive(Default)]
struct Tally {
    scores: HashMap<String, (f64, usize)>,
}

impl Tally {
    fn add(&mut self, tag: &str, weight: f64) {
        let entry = self.scores.entry(tag.to_string()).or_insert((0.0, 0));
        entry.0 += weight;
        entry.1 += 1;
    }

    fn ranked(self) -> Vec<TagScore> {
        let total: f64 = {
            let mut weights: Vec<f64> = self.scores.values().map(|(w, _)| *w).collect();
            // Summation order must not depend on hash iteration order.
            weights.sort_by(f64::total_cmp);
            weights.iter().sum()
        };

        let mut scores: Vec<TagScore> = self
            .scores
            .into_iter()
            .map(|(name, (accumulated_weight, hit_count))| TagScore {
                percentage: percentage(accumulated_weight, total),
                name,
                accumulated_weight,
                hit_count,
            })
            .collect();

        scores.sort_by(rank);
        scores
    }
}

fn percentage(weight: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    (weight / total * 10_000.0).round() / 100.0
}

fn rank(a: &TagScore, b: &TagScore) -> Ordering {
    b.accumulated_weight
        .total_cmp(&a.accumulated_weight)
        .then_with(|| b.hit_count.cmp(&a.hit_count))
        .then_with(|| a.name.cmp(&b.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{CategoryKind, CategorySpec, DictionaryFile, DictionaryLoader};
    use crate::matcher::{ExactMatcher, Matcher};

    fn table() -> PatternTable {
        DictionaryLoader::new()
            .with_builtin_patterns(false)
            .with_inline(
                "test",
                DictionaryFile::new()
                    .with_category(
                        CategorySpec::new("finance", CategoryKind::Keyword, 2.0)
                            .with_domain("finance")
                            .with_terms(["revenue", "dividend"]),
                    )
                    .with_category(
                        CategorySpec::new("legal", CategoryKind::Keyword, 1.0)
                            .with_domain("legal")
                            .with_document_type("contract")
                            .with_terms(["hereinafter", "indemnify"]),
                    )
                    .with_category(
                        CategorySpec::new("health", CategoryKind::Keyword, 2.0)
                            .with_domain("health")
                            .with_terms(["patient"]),
                    ),
            )
            .load()
            .unwrap()
    }

    fn classify(text: &str) -> Classification {
        let table = table();
        let matches = ExactMatcher::build(&table, true).unwrap().scan(text);
        ClassificationScorer::new(&table).score(&matches)
    }

    #[test]
    fn test_scores_ranked_by_weight() {
        let result = classify("revenue and dividend; hereinafter we indemnify the patient");

        let names: Vec<&str> = result.domains.iter().map(|s| s.name.as_str()).collect();
        // legal and health tie on weight; legal has more hits.
        assert_eq!(names, vec!["finance", "legal", "health"]);

        let finance = &result.domains[0];
        assert_eq!(finance.accumulated_weight, 4.0);
        assert_eq!(finance.hit_count, 2);
        assert_eq!(finance.percentage, 50.0);

        assert_eq!(result.document_types.len(), 1);
        assert_eq!(result.document_types[0].name, "contract");
        assert_eq!(result.document_types[0].percentage, 100.0);
    }

    #[test]
    fn test_ties_break_on_hits_then_name() {
        // health: one hit at 2.0, legal: two hits at 1.0 each.
        let result = classify("patient hereinafter indemnify");
        let names: Vec<&str> = result.domains.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["legal", "health"]);

        let mut a = TagScore {
            name: "beta".into(),
            percentage: 50.0,
            accumulated_weight: 2.0,
            hit_count: 1,
        };
        let b = TagScore {
            name: "alpha".into(),
            ..a.clone()
        };
        assert_eq!(rank(&a, &b), Ordering::Greater);
        a.hit_count = 2;
        assert_eq!(rank(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_no_tagged_matches() {
        let result = classify("nothing relevant here");
        assert!(result.is_empty());
        assert_eq!(result.route(10.0), RoutingDecision::default());
    }

    #[test]
    fn test_routing_threshold() {
        let result = classify("revenue dividend patient");
        // finance 4.0 of 6.0 = 66.67%
        assert_eq!(result.domains[0].percentage, 66.67);

        let routed = result.route(60.0);
        assert_eq!(routed.primary_domain.as_deref(), Some("finance"));
        assert!(routed.deep_extraction);

        assert!(!result.route(70.0).deep_extraction);
    }

    #[test]
    fn test_percentages_sum_to_about_100() {
        let result = classify("revenue patient hereinafter indemnify dividend revenue");
        let sum: f64 = result.domains.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 0.05);
    }
}
