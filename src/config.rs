use std::path::Path;

use anyhow::{Context, Result};
use docsift_core::EngineConfig;

/// Config file (or defaults) with `DOCSIFT_*` environment overrides on top.
pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    config
        .apply_env()
        .context("Invalid DOCSIFT_* environment override")?;

    tracing::debug!(
        routing_threshold = config.routing_threshold,
        word_boundaries = config.word_boundaries,
        builtin_patterns = config.builtin_patterns,
        "Loaded configuration"
    );

    Ok(config)
}
