use std::sync::Arc;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use super::{Match, MatchSource, Matcher, Span};
use crate::dictionary::{CategoryId, PatternTable, SourceKind};
use crate::entity::EntityType;

#[derive(Debug, Error)]
#[error("Failed to compile pattern {pattern:?} in category {category}: {source}")]
pub struct PatternCompileError {
    pub category: String,
    pub pattern: String,
    pub source: regex::Error,
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%B %d, %Y", "%d %B %Y"];

struct CompiledPattern {
    regex: Regex,
    category: CategoryId,
    category_name: Arc<str>,
    weight: f64,
    dates: bool,
}

/// Regex matcher over every `regex` entry of a pattern table, in load order.
pub struct FlexibleMatcher {
    patterns: Vec<CompiledPattern>,
}

impl FlexibleMatcher {
    /// Compiles every regex entry. A single failure aborts the whole build:
    /// silently skipping a pattern would change classification results.
    pub fn compile(table: &PatternTable) -> Result<Self, PatternCompileError> {
        let mut patterns = Vec::new();

        for entry in table.entries_of(SourceKind::Regex) {
            let category = table.category(entry.category);
            let regex = Regex::new(&entry.text).map_err(|source| PatternCompileError {
                category: category.name.to_string(),
                pattern: entry.text.clone(),
                source,
            })?;

            patterns.push(CompiledPattern {
                regex,
                category: entry.category,
                category_name: Arc::clone(&category.name),
                weight: entry.weight,
                dates: category.kind.entity_type() == Some(EntityType::Date),
            });
        }

        tracing::info!(patterns = patterns.len(), "Compiled flexible patterns");

        Ok(Self { patterns })
    }

    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

impl Matcher for FlexibleMatcher {
    fn scan(&self, text: &str) -> Vec<Match> {
        let mut matches = Vec::new();

        for pattern in &self.patterns {
            for found in pattern.regex.find_iter(text) {
                if found.is_empty() {
                    continue;
                }

                if pattern.dates && !is_calendar_date(found.as_str()) {
                    tracing::trace!(
                        text = found.as_str(),
                        category = &*pattern.category_name,
                        "Discarding invalid date"
                    );
                    continue;
                }

                matches.push(Match::new(
                    Span::new(found.start(), found.end()),
                    found.as_str(),
                    pattern.category,
                    Arc::clone(&pattern.category_name),
                    MatchSource::Flexible,
                    pattern.weight,
                ));
            }
        }

        matches
    }
}

fn is_calendar_date(raw: &str) -> bool {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    DATE_FORMATS
        .iter()
        .any(|format| NaiveDate::parse_from_str(&collapsed, format).is_ok())
}
