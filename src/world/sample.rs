//! Random world sampling for the batch driver and tests.
//!
//! This is a uniform scatter with bounded overlap rejection, enough to feed
//! the caption engine with varied scenes. Worlds produced by a dedicated
//! placement engine can be passed to the generator just the same.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::policy::Vocabulary;

use super::{BoundingBox, Color, ColorName, Extent, Point, Shape, World};

/// Placement attempts per entity before the sampler stops adding entities.
const MAX_PLACEMENT_ATTEMPTS: usize = 50;

/// Parameters of the random scatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSamplerConfig {
    /// Rendered size in pixels (carried through to the world, not used here).
    pub size: u32,
    pub min_entities: usize,
    pub max_entities: usize,
    /// Extent bounds in world units.
    pub min_extent: f64,
    pub max_extent: f64,
    /// Largest overlap ratio accepted between any two entities.
    pub max_overlap: f64,
    /// Whether shapes may be rotated.
    pub rotation: bool,
}

impl Default for WorldSamplerConfig {
    fn default() -> Self {
        Self {
            size: 64,
            min_entities: 3,
            max_entities: 8,
            min_extent: 0.1,
            max_extent: 0.25,
            max_overlap: 0.25,
            rotation: true,
        }
    }
}

impl WorldSamplerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |message: &str| {
            Err(ConfigError::Invalid {
                component: "world".into(),
                message: message.into(),
            })
        };
        if self.min_entities == 0 || self.min_entities > self.max_entities {
            return invalid("need 1 <= min_entities <= max_entities");
        }
        if !(self.min_extent > 0.0 && self.min_extent <= self.max_extent && self.max_extent < 1.0) {
            return invalid("need 0 < min_extent <= max_extent < 1");
        }
        if !(0.0..=1.0).contains(&self.max_overlap) {
            return invalid("max_overlap must lie in [0, 1]");
        }
        Ok(())
    }
}

/// Samples worlds from a vocabulary.
#[derive(Debug, Clone)]
pub struct WorldSampler {
    config: WorldSamplerConfig,
    vocabulary: Vocabulary,
}

impl WorldSampler {
    pub fn new(config: WorldSamplerConfig, vocabulary: Vocabulary) -> ConfigResult<Self> {
        config.validate()?;
        vocabulary.validate()?;
        Ok(Self { config, vocabulary })
    }

    pub fn config(&self) -> &WorldSamplerConfig {
        &self.config
    }

    /// Sample one world. Returns `None` when fewer than `min_entities` could
    /// be placed within the overlap budget.
    pub fn sample(&self, rng: &mut dyn RngCore) -> Option<World> {
        let target = rng.gen_range(self.config.min_entities..=self.config.max_entities);
        let mut builder = World::builder(self.config.size, Color::new(ColorName::Black, 0.0));

        for _ in 0..target {
            let mut placed = false;
            for _ in 0..MAX_PLACEMENT_ATTEMPTS {
                let kind = *self.vocabulary.shapes.choose(rng)?;
                let width = rng.gen_range(self.config.min_extent..=self.config.max_extent);
                let height = if kind.is_regular() {
                    width
                } else {
                    width * rng.gen_range(0.5..=0.8)
                };
                let extent = Extent::new(width, height);
                let rotation = if self.config.rotation {
                    rng.gen_range(0.0..std::f64::consts::TAU)
                } else {
                    0.0
                };
                let margin = 0.5 * width.max(height);
                let center = Point::new(
                    rng.gen_range(margin..=1.0 - margin),
                    rng.gen_range(margin..=1.0 - margin),
                );
                let color = Color::new(*self.vocabulary.colors.choose(rng)?, rng.gen_range(-1.0..=1.0));
                let texture = *self.vocabulary.textures.choose(rng)?;

                // Candidates are checked on bounding boxes only, so rejected
                // placements never touch the overlap caches of placed entities.
                let bounding_box = BoundingBox::around(center, extent, rotation);
                if !bounding_box.within_unit() {
                    continue;
                }
                let crowded = builder
                    .entities()
                    .iter()
                    .any(|other| bounding_box.overlap_ratio(&other.bounding_box) > self.config.max_overlap);
                if crowded {
                    continue;
                }
                builder.add(Shape::new(kind, extent), color, texture, center, rotation);
                placed = true;
                break;
            }
            if !placed {
                break;
            }
        }

        if builder.len() < self.config.min_entities {
            tracing::trace!(placed = builder.len(), "world sample below minimum entity count");
            return None;
        }
        Some(builder.build())
    }
}
