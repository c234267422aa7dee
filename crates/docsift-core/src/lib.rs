#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]

pub mod annotate;
pub mod canonical;
pub mod classify;
pub mod config;
pub mod dictionary;
pub mod entity;
pub mod error;
pub mod matcher;
pub mod measure;
pub mod pipeline;

pub use annotate::{annotate, strip_markers, Annotation};
pub use canonical::{
    CanonicalEntity, Canonicalizer, ConfidenceError, ConfidencePolicy, EntityId, EntityMetadata,
};
pub use classify::{Classification, ClassificationScorer, RoutingDecision, TagScore};
pub use config::EngineConfig;
pub use dictionary::{
    Category, CategoryId, CategoryKind, CategorySpec, DictionaryFile, DictionaryLoader,
    DictionarySource, LoadError, PatternEntry, PatternTable, SourceKind, TableStats, TermSpec,
};
pub use entity::EntityType;
pub use error::{Error, Result};
pub use matcher::{
    fuse, Discarded, ExactMatcher, FlexibleMatcher, FusionOutcome, Match, MatchSource, Matcher,
    PatternCompileError, Span,
};
pub use measure::{
    CanonicalUnit, MeasureKind, MeasurementNormalizer, MeasurementValue, NormalizationOutput,
    Quantity, UnitConversionError,
};
pub use pipeline::{BatchResult, DocumentResult, Engine, PredicateHit, ProcessStats, Warning};
