//! Dataset configuration: generator settings, policy, and the captioner tree.
//!
//! Every section defaults, so the smallest useful file is a `[captioner]`
//! table naming a sentence component.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::captioner::Mode;
use crate::captioner::config::SentenceConfig;
use crate::driver::CaptionGenerator;
use crate::error::{CaptionError, CaptionResult, ConfigError, ConfigResult};
use crate::policy::{Tolerances, Vocabulary, validate_rate};
use crate::world::sample::{WorldSampler, WorldSamplerConfig};

/// Batch generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub mode: Mode,
    /// Probability that an example is labelled correct.
    pub correct_ratio: f64,
    pub seed: u64,
    pub count: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Train,
            correct_ratio: 0.5,
            seed: 0,
            count: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub generator: GeneratorConfig,
    pub tolerances: Tolerances,
    pub vocabulary: Vocabulary,
    pub world: WorldSamplerConfig,
    pub captioner: SentenceConfig,
}

impl DatasetConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&source, &path.display().to_string())?;
        tracing::debug!(path = %path.display(), component = config.captioner.component(), "loaded dataset config");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        Self::parse(source, "(inline)")
    }

    fn parse(source: &str, origin: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse {
            path: origin.into(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as TOML.
    pub fn save(&self, path: &Path) -> CaptionResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| CaptionError::Serialization {
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|source| CaptionError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Check policy values that do not need the captioner tree built.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_rate("generator", "correct_ratio", self.generator.correct_ratio)?;
        self.tolerances.validate()?;
        self.vocabulary.validate()?;
        self.world.validate()
    }

    /// Build the caption generator and the world sampler.
    pub fn build(&self) -> ConfigResult<(CaptionGenerator, WorldSampler)> {
        let captioner = self.captioner.build(&self.vocabulary)?;
        let sampler = WorldSampler::new(self.world.clone(), self.vocabulary.clone())?;
        Ok((CaptionGenerator::new(captioner, self.tolerances), sampler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_a_default_config() {
        let config = DatasetConfig::from_toml_str("").unwrap();
        assert_eq!(config, DatasetConfig::default());
        assert!(config.build().is_ok());
    }

    #[test]
    fn sections_override_defaults() {
        let config = DatasetConfig::from_toml_str(
            r#"
            [generator]
            mode = "test"
            correct_ratio = 0.25
            count = 3

            [tolerances]
            min_axis_distance = 0.05

            [captioner]
            component = "quantifier"
            "#,
        )
        .unwrap();
        assert_eq!(config.generator.mode, Mode::Test);
        assert_eq!(config.generator.count, 3);
        assert_eq!(config.tolerances.min_axis_distance, 0.05);
        assert_eq!(config.tolerances.min_quantifier, Tolerances::default().min_quantifier);
        assert_eq!(config.captioner.component(), "quantifier");
    }

    #[test]
    fn bad_ratio_rejected() {
        let result = DatasetConfig::from_toml_str("[generator]\ncorrect_ratio = 2.0\n");
        assert!(matches!(result, Err(ConfigError::InvalidRate { .. })));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = DatasetConfig::from_toml_str("[captioner\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
