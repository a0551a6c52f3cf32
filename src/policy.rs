//! Shared policy: tolerances, retry budgets, felicity rates, vocabulary.
//!
//! Everything in here is read-only configuration. It is constructed once per
//! dataset definition and shared by every generation thread.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::world::{ColorName, ShapeKind, Texture};

/// Top-level attempts per caption request before the driver gives up on a world.
pub const MAX_ATTEMPTS: usize = 10;

/// Attempts at each composition level when sampling or constructing a node.
pub const MAX_SAMPLE_ATTEMPTS: usize = 10;

/// Worlds tried per example by the batch driver before an example is dropped.
pub const MAX_WORLD_ATTEMPTS: usize = 20;

// ---------------------------------------------------------------------------
// Tolerances
// ---------------------------------------------------------------------------

/// Minimum separations below which a continuous comparison is undetermined.
///
/// Differences inside a tolerance band make the affected entity ambiguous
/// rather than agreeing or disagreeing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Minimum center difference along an axis for left/right/above/below.
    pub min_axis_distance: f64,
    /// Minimum area difference for bigger/smaller.
    pub min_area_difference: f64,
    /// Minimum shade difference for darker/lighter.
    pub min_shade_difference: f64,
    /// Minimum distance difference for closer/farther.
    pub min_distance_difference: f64,
    /// Overlap ratio that must be exceeded for in-front/behind.
    pub min_overlap: f64,
    /// Distance from a fractional quantity beyond which equality is definitely false.
    pub min_quantifier: f64,
    /// Distance from a fractional quantity within which equality is definitely true.
    pub ratio_epsilon: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            min_axis_distance: 0.1,
            min_area_difference: 0.01,
            min_shade_difference: 0.2,
            min_distance_difference: 0.1,
            min_overlap: 0.0,
            min_quantifier: 0.1,
            ratio_epsilon: 0.01,
        }
    }
}

impl Tolerances {
    pub fn validate(&self) -> ConfigResult<()> {
        let fields = [
            ("min_axis_distance", self.min_axis_distance),
            ("min_area_difference", self.min_area_difference),
            ("min_shade_difference", self.min_shade_difference),
            ("min_distance_difference", self.min_distance_difference),
            ("min_overlap", self.min_overlap),
            ("min_quantifier", self.min_quantifier),
            ("ratio_epsilon", self.ratio_epsilon),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    component: "tolerances".into(),
                    message: format!("{name} must be a non-negative number, got {value}"),
                });
            }
        }
        if self.ratio_epsilon > self.min_quantifier {
            return Err(ConfigError::Invalid {
                component: "tolerances".into(),
                message: "ratio_epsilon must not exceed min_quantifier".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Felicity
// ---------------------------------------------------------------------------

/// Informativeness controls carried by every captioner.
///
/// Each rate is the probability that the corresponding kind of
/// uninformative construction is *allowed* for one sampled caption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Felicity {
    pub pragmatical_redundancy_rate: f64,
    pub pragmatical_tautology_rate: f64,
    pub logical_redundancy_rate: f64,
    pub logical_tautology_rate: f64,
    pub logical_contradiction_rate: f64,
}

impl Default for Felicity {
    fn default() -> Self {
        Self {
            pragmatical_redundancy_rate: 1.0,
            pragmatical_tautology_rate: 0.0,
            logical_redundancy_rate: 0.0,
            logical_tautology_rate: 0.0,
            logical_contradiction_rate: 0.0,
        }
    }
}

impl Felicity {
    /// Everything allowed. Useful for tests that want deterministic construction.
    pub fn permissive() -> Self {
        Self {
            pragmatical_redundancy_rate: 1.0,
            pragmatical_tautology_rate: 1.0,
            logical_redundancy_rate: 1.0,
            logical_tautology_rate: 1.0,
            logical_contradiction_rate: 1.0,
        }
    }

    pub fn validate(&self, component: &str) -> ConfigResult<()> {
        let rates = [
            ("pragmatical_redundancy_rate", self.pragmatical_redundancy_rate),
            ("pragmatical_tautology_rate", self.pragmatical_tautology_rate),
            ("logical_redundancy_rate", self.logical_redundancy_rate),
            ("logical_tautology_rate", self.logical_tautology_rate),
            ("logical_contradiction_rate", self.logical_contradiction_rate),
        ];
        for (name, value) in rates {
            validate_rate(component, name, value)?;
        }
        Ok(())
    }

    /// Draw the per-caption permissions.
    pub fn draw(&self, rng: &mut dyn RngCore) -> FelicityDraw {
        FelicityDraw {
            pragmatical_redundancy: rng.gen_bool(self.pragmatical_redundancy_rate),
            pragmatical_tautology: rng.gen_bool(self.pragmatical_tautology_rate),
            logical_redundancy: rng.gen_bool(self.logical_redundancy_rate),
            logical_tautology: rng.gen_bool(self.logical_tautology_rate),
            logical_contradiction: rng.gen_bool(self.logical_contradiction_rate),
        }
    }
}

/// Permissions drawn from [`Felicity`] for one sampled caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FelicityDraw {
    pub pragmatical_redundancy: bool,
    pub pragmatical_tautology: bool,
    pub logical_redundancy: bool,
    pub logical_tautology: bool,
    pub logical_contradiction: bool,
}

impl FelicityDraw {
    pub fn permissive() -> Self {
        Self {
            pragmatical_redundancy: true,
            pragmatical_tautology: true,
            logical_redundancy: true,
            logical_tautology: true,
            logical_contradiction: true,
        }
    }
}

/// Check that a probability lies in `[0, 1]`.
pub fn validate_rate(component: &str, name: &str, value: f64) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidRate {
            component: component.into(),
            name: name.into(),
            value,
        });
    }
    Ok(())
}

/// Check a categorical weight vector against the number of alternatives.
pub fn validate_distribution(component: &str, weights: &[f64], expected: usize) -> ConfigResult<()> {
    if weights.len() != expected {
        return Err(ConfigError::InvalidDistribution {
            component: component.into(),
            message: format!("expected {expected} weights, got {}", weights.len()),
        });
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ConfigError::InvalidDistribution {
            component: component.into(),
            message: "weights must be finite and non-negative".into(),
        });
    }
    if weights.iter().all(|w| *w == 0.0) {
        return Err(ConfigError::InvalidDistribution {
            component: component.into(),
            message: "at least one weight must be positive".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Allowed attribute values for captions and sampled worlds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub shapes: Vec<ShapeKind>,
    pub colors: Vec<ColorName>,
    pub textures: Vec<Texture>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            shapes: ShapeKind::ALL.to_vec(),
            colors: ColorName::ENTITY_COLORS.to_vec(),
            textures: vec![Texture::Solid],
        }
    }
}

impl Vocabulary {
    pub fn validate(&self) -> ConfigResult<()> {
        let sets = [
            ("shape", self.shapes.is_empty()),
            ("color", self.colors.is_empty()),
            ("texture", self.textures.is_empty()),
        ];
        for (what, empty) in sets {
            if empty {
                return Err(ConfigError::EmptyValueSet {
                    component: "vocabulary".into(),
                    what: what.into(),
                });
            }
        }
        Ok(())
    }
}
