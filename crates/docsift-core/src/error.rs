use thiserror::Error;

use crate::canonical::ConfidenceError;
use crate::dictionary::LoadError;
use crate::matcher::PatternCompileError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    PatternCompile(#[from] PatternCompileError),

    #[error("Failed to build exact-match automaton: {0}")]
    Automaton(#[from] aho_corasick::BuildError),

    #[error("Invalid entity type: {0}")]
    InvalidEntityType(String),

    #[error("Invalid measurement kind: {0}")]
    InvalidMeasureKind(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid confidence policy: {0}")]
    Confidence(#[from] ConfidenceError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
