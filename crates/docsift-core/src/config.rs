use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::canonical::ConfidencePolicy;
use crate::error::{Error, Result};

pub const ENV_ROUTING_THRESHOLD: &str = "DOCSIFT_ROUTING_THRESHOLD";
pub const ENV_WORD_BOUNDARIES: &str = "DOCSIFT_WORD_BOUNDARIES";
pub const ENV_BUILTIN_PATTERNS: &str = "DOCSIFT_BUILTIN_PATTERNS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Top-domain percentage above which deep extraction is requested.
    pub routing_threshold: f64,
    pub word_boundaries: bool,
    pub builtin_patterns: bool,
    pub confidence: ConfidencePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            routing_threshold: 40.0,
            word_boundaries: true,
            builtin_patterns: true,
            confidence: ConfidencePolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Reads a JSON config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlays `DOCSIFT_*` environment variables onto this config.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = var(ENV_ROUTING_THRESHOLD) {
            self.routing_threshold = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{ENV_ROUTING_THRESHOLD} is not a number: {raw:?}"))
            })?;
        }
        if let Some(raw) = var(ENV_WORD_BOUNDARIES) {
            self.word_boundaries = parse_flag(ENV_WORD_BOUNDARIES, &raw)?;
        }
        if let Some(raw) = var(ENV_BUILTIN_PATTERNS) {
            self.builtin_patterns = parse_flag(ENV_BUILTIN_PATTERNS, &raw)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.routing_threshold) {
            return Err(Error::Config(format!(
                "routing_threshold must be within 0..=100, got {}",
                self.routing_threshold
            )));
        }
        self.confidence.check()?;
        Ok(())
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    let value = raw.trim();
    if value == "1" || value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value == "0" || value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Error::Config(format!("{key} must be true/false/1/0, got {raw:?}")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;
    use crate::canonical::ConfidenceError;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.routing_threshold, 40.0);
        assert!(config.word_boundaries);
        assert!(config.builtin_patterns);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EngineConfig::default();
        config
            .apply_vars(vars(&[
                (ENV_ROUTING_THRESHOLD, "55.5"),
                (ENV_WORD_BOUNDARIES, "false"),
                (ENV_BUILTIN_PATTERNS, "0"),
            ]))
            .unwrap();

        assert_eq!(config.routing_threshold, 55.5);
        assert!(!config.word_boundaries);
        assert!(!config.builtin_patterns);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = EngineConfig::default();
        assert!(config
            .apply_vars(vars(&[(ENV_WORD_BOUNDARIES, "maybe")]))
            .is_err());
        assert!(config
            .apply_vars(vars(&[(ENV_ROUTING_THRESHOLD, "150")]))
            .is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "routing_threshold": 25, "confidence": {{ "by_type": {{ "ORG": 0.6 }} }} }}"#
        )
        .unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.routing_threshold, 25.0);
        assert!(config.word_boundaries);
        assert_eq!(
            config.confidence.lookup(crate::EntityType::Organization, None),
            0.6
        );
        // by_type was replaced wholesale, so PERSON falls to the default.
        assert_eq!(config.confidence.lookup(crate::EntityType::Person, None), 0.5);
    }

    #[test]
    fn test_file_rejects_bad_confidence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "confidence": {{ "default": 2.0 }} }}"#).unwrap();
        assert!(matches!(
            EngineConfig::from_file(file.path()),
            Err(Error::Confidence(ConfidenceError::Default(_)))
        ));
    }
}
