//! Top-level pipeline configuration, loadable from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigValidator};
use super::{ParallelPolicy, RepetitionConfig, ZoneConfig};

/// Everything the conversion pipeline can be tuned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rasterization resolution.
    pub dpi: u32,
    /// OCR language code passed to the recognizer.
    pub language: String,
    /// Repetition-bar detector parameters.
    pub repetition: RepetitionConfig,
    /// Zone detector parameters.
    pub zones: ZoneConfig,
    /// Page-level parallelism.
    pub parallel: ParallelPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            language: "por".to_string(),
            repetition: RepetitionConfig::default(),
            zones: ZoneConfig::default(),
            parallel: ParallelPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from a YAML file and validates it.
    ///
    /// Missing keys take their default values.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    /// Parses and validates a YAML configuration document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl ConfigValidator for PipelineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_range("dpi", self.dpi as f64, 50.0, 1200.0)?;
        if self.language.trim().is_empty() {
            return Err(ConfigError::invalid("language", "must not be empty"));
        }
        self.repetition.validate()?;
        self.zones.validate()
    }
}
