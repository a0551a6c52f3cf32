//! Bundled dataset presets.
//!
//! Three presets are compiled into the binary: `existential`,
//! `quantification`, and `logical`. Each is a complete [`DatasetConfig`]
//! in TOML.

use crate::config::DatasetConfig;
use crate::error::{ConfigError, ConfigResult};

const EXISTENTIAL_TOML: &str = include_str!("../data/presets/existential.toml");
const QUANTIFICATION_TOML: &str = include_str!("../data/presets/quantification.toml");
const LOGICAL_TOML: &str = include_str!("../data/presets/logical.toml");

const PRESETS: [(&str, &str); 3] = [
    ("existential", EXISTENTIAL_TOML),
    ("quantification", QUANTIFICATION_TOML),
    ("logical", LOGICAL_TOML),
];

/// Names of the bundled presets.
pub fn names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}

/// Raw TOML of a bundled preset.
pub fn source(name: &str) -> ConfigResult<&'static str> {
    PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, toml)| *toml)
        .ok_or_else(|| ConfigError::UnknownPreset { name: name.into() })
}

/// Parse and validate a bundled preset.
pub fn load(name: &str) -> ConfigResult<DatasetConfig> {
    let toml = source(name)?;
    DatasetConfig::from_toml_str(toml).map_err(|e| match e {
        ConfigError::Parse { message, .. } => ConfigError::Parse {
            path: format!("preset:{name}"),
            message,
        },
        other => other,
    })
}

/// Every preset that parses, skipping (and logging) any that do not.
pub fn all() -> Vec<(&'static str, DatasetConfig)> {
    names()
        .filter_map(|name| match load(name) {
            Ok(config) => Some((name, config)),
            Err(e) => {
                tracing::warn!(preset = name, "Failed to parse bundled preset: {e}");
                None
            }
        })
        .collect()
}
