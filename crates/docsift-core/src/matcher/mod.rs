mod exact;
mod flexible;
mod fusion;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dictionary::CategoryId;

pub use exact::ExactMatcher;
pub use flexible::{FlexibleMatcher, PatternCompileError};
pub use fusion::{fuse, Discarded, FusionOutcome};

/// Half-open byte range `[start, end)` into the original document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start < end, "empty or inverted span {start}..{end}");
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    #[must_use]
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Which engine produced a match. `Exact` sorts first, which makes it the
/// last-resort winner when everything else about two matches is equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Exact,
    Flexible,
}

impl MatchSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Flexible => "flexible",
        }
    }
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub span: Span,
    pub text: String,
    pub category: CategoryId,
    pub category_name: Arc<str>,
    pub source: MatchSource,
    pub weight: f64,
}

impl Match {
    #[must_use]
    pub fn new(
        span: Span,
        text: impl Into<String>,
        category: CategoryId,
        category_name: Arc<str>,
        source: MatchSource,
        weight: f64,
    ) -> Self {
        Self {
            span,
            text: text.into(),
            category,
            category_name,
            source,
            weight,
        }
    }
}

/// A compiled, immutable matching engine. Implementations are shared across
/// worker threads, so `scan` takes `&self` only.
pub trait Matcher: Send + Sync {
    fn scan(&self, text: &str) -> Vec<Match>;
}
