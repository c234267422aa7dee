use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::annotate::annotate;
use crate::canonical::{CanonicalEntity, Canonicalizer};
use crate::classify::{ClassificationScorer, RoutingDecision, TagScore};
use crate::config::EngineConfig;
use crate::dictionary::{CategoryKind, DictionaryLoader, DictionarySource, PatternTable};
use crate::error::Result;
use crate::matcher::{fuse, ExactMatcher, FlexibleMatcher, Match, Matcher, Span};
use crate::measure::{MeasurementNormalizer, MeasurementValue};

/// Per-document problem that did not stop processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    EmptyInput,
    UnitConversion {
        raw_text: String,
        span: Span,
        reason: String,
    },
    MarkerCollision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateHit {
    pub relation: String,
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub exact_matches: usize,
    pub flexible_matches: usize,
    pub accepted: usize,
    pub discarded: usize,
    pub dropped_measurements: usize,
}

impl ProcessStats {
    pub fn add(&mut self, other: &Self) {
        self.exact_matches += other.exact_matches;
        self.flexible_matches += other.flexible_matches;
        self.accepted += other.accepted;
        self.discarded += other.discarded;
        self.dropped_measurements += other.dropped_measurements;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub domain_scores: Vec<TagScore>,
    pub document_type_scores: Vec<TagScore>,
    pub routing: RoutingDecision,
    pub entities: Vec<CanonicalEntity>,
    pub measurements: Vec<MeasurementValue>,
    pub predicates: Vec<PredicateHit>,
    pub annotated_text: String,
    pub warnings: Vec<Warning>,
    pub stats: ProcessStats,
}

impl DocumentResult {
    fn empty(text: &str) -> Self {
        Self {
            annotated_text: text.to_string(),
            warnings: vec![Warning::EmptyInput],
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchResult {
    /// One result per input, in input order.
    pub documents: Vec<DocumentResult>,
    pub stats: ProcessStats,
    pub with_warnings: usize,
}

impl BatchResult {
    pub fn add_document(&mut self, document: DocumentResult) {
        self.stats.add(&document.stats);
        if !document.warnings.is_empty() {
            self.with_warnings += 1;
        }
        self.documents.push(document);
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.documents.len()
    }
}

/// Frozen matching state shared by every document. `Send + Sync`; no locks.
pub struct Engine {
    table: PatternTable,
    exact: ExactMatcher,
    flexible: FlexibleMatcher,
    config: EngineConfig,
}

impl Engine {
    /// Compiles the automaton and regex set over `table`.
    pub fn build(table: PatternTable, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let exact = ExactMatcher::build(&table, config.word_boundaries)?;
        let flexible = FlexibleMatcher::compile(&table)?;

        let stats = table.stats();
        tracing::info!(
            categories = stats.categories,
            exact = stats.exact_entries,
            regex = stats.regex_entries,
            "Engine ready"
        );

        Ok(Self {
            table,
            exact,
            flexible,
            config,
        })
    }

    /// Loads `sources` (plus the built-in set when enabled) and builds.
    pub fn from_sources(
        sources: impl IntoIterator<Item = DictionarySource>,
        config: EngineConfig,
    ) -> Result<Self> {
        let loader = sources
            .into_iter()
            .fold(DictionaryLoader::new(), DictionaryLoader::with_source)
            .with_builtin_patterns(config.builtin_patterns);
        let table = loader.load()?;
        Self::build(table, config)
    }

    #[must_use]
    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn process(&self, text: &str) -> DocumentResult {
        if text.trim().is_empty() {
            tracing::debug!(bytes = text.len(), "Empty document");
            return DocumentResult::empty(text);
        }

        let (exact, flexible) = rayon::join(|| self.exact.scan(text), || self.flexible.scan(text));
        let mut stats = ProcessStats {
            exact_matches: exact.len(),
            flexible_matches: flexible.len(),
            ..ProcessStats::default()
        };

        let mut candidates = exact;
        candidates.extend(flexible);
        let fused = fuse(candidates);
        stats.accepted = fused.accepted.len();
        stats.discarded = fused.discarded.len();
        let accepted = &fused.accepted;

        let scorer = ClassificationScorer::new(&self.table);
        let canonicalizer = Canonicalizer::new(&self.table, &self.config.confidence);
        let normalizer = MeasurementNormalizer::new(&self.table);

        let (classification, ((entities, annotation), normalized)) = rayon::join(
            || scorer.score(accepted),
            || {
                rayon::join(
                    || {
                        let entities = canonicalizer.canonicalize(accepted);
                        let annotation = annotate(text, &entities);
                        (entities, annotation)
                    },
                    || normalizer.normalize(accepted),
                )
            },
        );

        stats.dropped_measurements = normalized.dropped.len();

        let mut warnings: Vec<Warning> = normalized
            .dropped
            .into_iter()
            .map(|d| Warning::UnitConversion {
                raw_text: d.raw_text,
                span: d.span,
                reason: d.error.to_string(),
            })
            .collect();
        if annotation.collision {
            warnings.push(Warning::MarkerCollision);
        }

        tracing::debug!(
            bytes = text.len(),
            exact = stats.exact_matches,
            flexible = stats.flexible_matches,
            accepted = stats.accepted,
            discarded = stats.discarded,
            entities = entities.len(),
            measurements = normalized.measurements.len(),
            "Processed document"
        );

        DocumentResult {
            routing: classification.route(self.config.routing_threshold),
            domain_scores: classification.domains,
            document_type_scores: classification.document_types,
            entities,
            measurements: normalized.measurements,
            predicates: self.predicates(accepted),
            annotated_text: annotation.text,
            warnings,
            stats,
        }
    }

    /// Processes documents in parallel. A bad document never aborts the
    /// batch; its problems surface as warnings.
    pub fn process_batch<S>(&self, texts: &[S]) -> BatchResult
    where
        S: AsRef<str> + Sync,
    {
        let documents: Vec<DocumentResult> =
            texts.par_iter().map(|t| self.process(t.as_ref())).collect();

        let mut batch = BatchResult::default();
        for document in documents {
            batch.add_document(document);
        }

        tracing::info!(
            documents = batch.total(),
            with_warnings = batch.with_warnings,
            accepted = batch.stats.accepted,
            "Batch complete"
        );

        batch
    }

    fn predicates(&self, accepted: &[Match]) -> Vec<PredicateHit> {
        accepted
            .iter()
            .filter_map(|m| match &self.table.category(m.category).kind {
                CategoryKind::Predicate { relation } => Some(PredicateHit {
                    relation: relation.clone(),
                    text: m.text.clone(),
                    span: m.span,
                }),
                _ => None,
            })
            .collect()
    }
}
