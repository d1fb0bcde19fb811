//! # Engine Configuration
//!
//! Thresholds and batch sizing for detection, validation listing and
//! coverage. Every field has a default, so an empty YAML document is a
//! valid configuration.
//!
//! ```yaml
//! similarity_threshold: 0.75
//! auto_validate_threshold: 0.95
//! top_n: 10
//! checkpoint_every: 50
//! pending_limit: 50
//! coverage_min_similarity: 0.75
//! coverage_bidirectional: false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for the mapping engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Candidates below this similarity are never turned into mappings.
    pub similarity_threshold: f64,
    /// Mappings at or above this similarity are created approved.
    pub auto_validate_threshold: f64,
    /// Neighbours requested per requirement.
    pub top_n: usize,
    /// Successful batch items between checkpoints.
    pub checkpoint_every: usize,
    /// Default page size for the pending review queue.
    pub pending_limit: usize,
    /// Approved mappings below this similarity do not carry coverage.
    pub coverage_min_similarity: f64,
    /// Let an answered target carry coverage back to the source side of a
    /// mapping. Off: coverage only flows from source to target.
    pub coverage_bidirectional: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.75,
            auto_validate_threshold: 0.95,
            top_n: 10,
            checkpoint_every: 50,
            pending_limit: 50,
            coverage_min_similarity: 0.75,
            coverage_bidirectional: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |name: &str, v: f64| -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {v}")))
            }
        };
        unit("similarity_threshold", self.similarity_threshold)?;
        unit("auto_validate_threshold", self.auto_validate_threshold)?;
        unit("coverage_min_similarity", self.coverage_min_similarity)?;

        if self.auto_validate_threshold < self.similarity_threshold {
            return Err(ConfigError::Invalid(format!(
                "auto_validate_threshold ({}) is below similarity_threshold ({})",
                self.auto_validate_threshold, self.similarity_threshold
            )));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be positive".into()));
        }
        if self.checkpoint_every == 0 {
            return Err(ConfigError::Invalid("checkpoint_every must be positive".into()));
        }
        Ok(())
    }
}
