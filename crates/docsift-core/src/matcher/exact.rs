use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use aho_corasick::{AhoCorasick, MatchKind};

use super::{Match, MatchSource, Matcher, Span};
use crate::dictionary::{CategoryId, PatternTable, SourceKind};

/// The entry that wins for one distinct literal.
struct Target {
    category: CategoryId,
    category_name: Arc<str>,
    weight: f64,
    bounded_start: bool,
    bounded_end: bool,
}

impl Target {
    fn outranks(&self, other: &Self) -> bool {
        match self.weight.total_cmp(&other.weight) {
            std::cmp::Ordering::Equal => self.category < other.category,
            ord => ord.is_gt(),
        }
    }
}

/// Case-sensitive literal matcher over every exact entry of a pattern table.
///
/// Literals shared by several categories are collapsed to a single automaton
/// pattern whose target is the highest-weight, earliest-loaded entry.
///
/// With word boundaries on, a literal that starts or ends with a word
/// character must not touch another word character on that side. Scripts
/// written without spaces between words (Han, kana, Thai and similar) never
/// count as word characters, so "微软" still matches inside "微软公司".
pub struct ExactMatcher {
    automaton: Option<AhoCorasick>,
    targets: Vec<Target>,
    word_boundaries: bool,
}

impl ExactMatcher {
    pub fn build(table: &PatternTable, word_boundaries: bool) -> Result<Self, aho_corasick::BuildError> {
        let mut literals: Vec<&str> = Vec::new();
        let mut targets: Vec<Target> = Vec::new();
        let mut by_text: HashMap<&str, usize> = HashMap::new();

        for entry in table.entries_of(SourceKind::Exact) {
            let category = table.category(entry.category);
            let target = Target {
                category: entry.category,
                category_name: Arc::clone(&category.name),
                weight: entry.weight,
                bounded_start: entry.text.chars().next().is_some_and(is_word_char),
                bounded_end: entry.text.chars().next_back().is_some_and(is_word_char),
            };

            match by_text.get(entry.text.as_str()) {
                Some(&idx) => {
                    if target.outranks(&targets[idx]) {
                        targets[idx] = target;
                    }
                }
                None => {
                    by_text.insert(&entry.text, literals.len());
                    literals.push(&entry.text);
                    targets.push(target);
                }
            }
        }

        let automaton = if literals.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::Standard)
                    .build(&literals)?,
            )
        };

        tracing::info!(patterns = literals.len(), "Built exact-match automaton");

        Ok(Self {
            automaton,
            targets,
            word_boundaries,
        })
    }

    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.targets.len()
    }

    fn at_boundaries(&self, text: &str, start: usize, end: usize, target: &Target) -> bool {
        if !self.word_boundaries {
            return true;
        }

        let before = !target.bounded_start
            || text[..start].chars().next_back().is_none_or(|c| !is_word_char(c));
        let after =
            !target.bounded_end || text[end..].chars().next().is_none_or(|c| !is_word_char(c));

        before && after
    }
}

impl Matcher for ExactMatcher {
    /// Reports at most one match per end offset: the longest literal ending
    /// there, then the heavier one, then the earlier category. Output is
    /// ordered by end offset.
    fn scan(&self, text: &str) -> Vec<Match> {
        let Some(automaton) = &self.automaton else {
            return Vec::new();
        };

        let mut best: BTreeMap<usize, (usize, usize)> = BTreeMap::new();

        for hit in automaton.find_overlapping_iter(text) {
            let idx = hit.pattern().as_usize();
            if !self.at_boundaries(text, hit.start(), hit.end(), &self.targets[idx]) {
                continue;
            }

            match best.entry(hit.end()) {
                Entry::Vacant(slot) => {
                    slot.insert((hit.start(), idx));
                }
                Entry::Occupied(mut slot) => {
                    let (start, current) = *slot.get();
                    let longer = hit.start() < start;
                    let same_length = hit.start() == start;
                    if longer || (same_length && self.targets[idx].outranks(&self.targets[current]))
                    {
                        slot.insert((hit.start(), idx));
                    }
                }
            }
        }

        best.into_iter()
            .map(|(end, (start, idx))| {
                let target = &self.targets[idx];
                Match::new(
                    Span::new(start, end),
                    &text[start..end],
                    target.category,
                    Arc::clone(&target.category_name),
                    MatchSource::Exact,
                    target.weight,
                )
            })
            .collect()
    }
}

fn is_word_char(c: char) -> bool {
    (c.is_alphanumeric() || c == '_') && !is_unspaced_script(c)
}

fn is_unspaced_script(c: char) -> bool {
    matches!(
        c,
        '\u{0E00}'..='\u{0EFF}'     // Thai, Lao
            | '\u{1000}'..='\u{109F}' // Myanmar
            | '\u{1780}'..='\u{17FF}' // Khmer
            | '\u{3040}'..='\u{30FF}' // Hiragana, Katakana
            | '\u{31F0}'..='\u{31FF}'
            | '\u{3400}'..='\u{4DBF}' // CJK ideographs
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{FF66}'..='\u{FF9F}'
            | '\u{20000}'..='\u{2FA1F}'
    )
}
