//! Rich diagnostic error types for the caption engine.
//!
//! Caption generation itself never fails with an error: infeasible samples
//! surface as `None`/`false` and are retried by the enclosing loop. The
//! errors here cover the configuration surface (loading, parsing and
//! validating captioner trees) and the I/O done by the command-line driver.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the caption engine.
#[derive(Debug, Error, Diagnostic)]
pub enum CaptionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(captions::io),
        help("Check that the path exists, is writable, and that the disk is not full.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(captions::serde),
        help("A generated example could not be encoded as JSON. This is a bug; please report it.")
    )]
    Serialization { message: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    #[diagnostic(
        code(captions::config::read),
        help("Check that the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(captions::config::parse),
        help(
            "The TOML is malformed or a captioner component has the wrong shape. \
             Every captioner table needs a `component` key naming its grammar \
             production, e.g. `component = \"existential\"`."
        )
    )]
    Parse { path: String, message: String },

    #[error("invalid distribution for {component}: {message}")]
    #[diagnostic(
        code(captions::config::distribution),
        help(
            "Weights must be non-negative, finite, not all zero, and have exactly \
             one entry per alternative."
        )
    )]
    InvalidDistribution { component: String, message: String },

    #[error("rate {name} = {value} for {component} is outside [0, 1]")]
    #[diagnostic(
        code(captions::config::rate),
        help("Rates are probabilities; use a value between 0.0 and 1.0 inclusive.")
    )]
    InvalidRate {
        component: String,
        name: String,
        value: f64,
    },

    #[error("{component} has an empty {what} set")]
    #[diagnostic(
        code(captions::config::empty),
        help("List at least one allowed value, or remove the component from the tree.")
    )]
    EmptyValueSet { component: String, what: String },

    #[error("{component}: {message}")]
    #[diagnostic(
        code(captions::config::invalid),
        help("Fix the offending captioner parameter and re-run `shape-captions validate`.")
    )]
    Invalid { component: String, message: String },

    #[error("unknown preset \"{name}\"")]
    #[diagnostic(
        code(captions::config::unknown_preset),
        help("Run `shape-captions presets` to list the bundled captioner presets.")
    )]
    UnknownPreset { name: String },
}

/// Result type for caption engine operations.
pub type CaptionResult<T> = std::result::Result<T, CaptionError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert_into_caption_error() {
        let err: CaptionError = ConfigError::UnknownPreset {
            name: "nope".into(),
        }
        .into();
        assert!(matches!(err, CaptionError::Config(ConfigError::UnknownPreset { .. })));
        assert_eq!(err.to_string(), "unknown preset \"nope\"");
    }

    #[test]
    fn diagnostics_carry_codes() {
        let err = ConfigError::InvalidRate {
            component: "existential".into(),
            name: "logical_tautology_rate".into(),
            value: 1.5,
        };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("captions::config::rate"));
    }
}
