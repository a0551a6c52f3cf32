//! Caption generation driver.
//!
//! [`CaptionGenerator::generate_caption`] runs the top-level attempt loop
//! for one world. [`CaptionGenerator::generate_batch`] fans examples out
//! over the rayon pool; every example draws from its own `StdRng` seeded
//! from `(seed, index)`, so a batch is reproducible regardless of how the
//! pool schedules it.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::caption::{Agreement, Caption, Evaluate};
use crate::captioner::{BoxedCaptioner, Mode, Sample, retry};
use crate::policy::{MAX_ATTEMPTS, MAX_WORLD_ATTEMPTS, Tolerances};
use crate::predication::Predication;
use crate::world::World;
use crate::world::sample::WorldSampler;

/// A caption together with the choices that produced it.
#[derive(Debug, Clone)]
pub struct GeneratedCaption {
    pub caption: Caption,
    pub sample: Sample,
    /// Agreement of the caption with the world it was generated for.
    pub agreement: Agreement,
}

/// One dataset record.
#[derive(Debug, Clone, Serialize)]
pub struct Example {
    pub world: World,
    pub caption: Value,
    pub captioner: Value,
    pub correct: bool,
    pub agreement: Agreement,
}

/// Shared, read-only generation state: the captioner tree and the
/// tolerance policy every predication is built with.
pub struct CaptionGenerator {
    captioner: BoxedCaptioner<Caption>,
    tolerances: Tolerances,
}

impl CaptionGenerator {
    pub fn new(captioner: BoxedCaptioner<Caption>, tolerances: Tolerances) -> Self {
        Self { captioner, tolerances }
    }

    pub fn captioner(&self) -> &BoxedCaptioner<Caption> {
        &self.captioner
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// Generate a caption for `world` whose truth value is `correct`.
    ///
    /// Returns `None` once [`MAX_ATTEMPTS`] attempts fail; the caller is
    /// expected to try another world.
    pub fn generate_caption(
        &self,
        world: &World,
        correct: bool,
        mode: Mode,
        rng: &mut dyn RngCore,
    ) -> Option<GeneratedCaption> {
        let target = Agreement::from_bool(correct);
        let predication = Predication::with_tolerances(world, self.tolerances);
        let generated = retry(MAX_ATTEMPTS, |attempt| {
            let Some(sample) = self.captioner.sample_values(mode, correct, &predication, rng) else {
                tracing::trace!(attempt, "no sample");
                return None;
            };
            let Some(mut caption) = self.captioner.caption(&sample, &mut predication.copy(), world, rng) else {
                tracing::trace!(attempt, component = self.captioner.name(), "caption rejected");
                return None;
            };
            if !correct && !self.captioner.incorrect(&sample, &mut caption, &predication, world, rng) {
                tracing::trace!(attempt, "no incorrect variant");
                return None;
            }
            let agreement = caption.evaluate_on(&predication.reset());
            if agreement != target {
                tracing::trace!(attempt, %agreement, %target, "verification failed");
                return None;
            }
            Some(GeneratedCaption {
                caption,
                sample,
                agreement,
            })
        });
        if generated.is_none() {
            tracing::debug!(correct, %mode, entities = world.len(), "caption attempts exhausted");
        }
        generated
    }

    /// Model export of a generated caption's sampled choices.
    pub fn model(&self, generated: &GeneratedCaption) -> Value {
        self.captioner.model(&generated.sample)
    }

    /// Generate one example, resampling the world when its caption
    /// attempts run out.
    pub fn generate_example(
        &self,
        sampler: &WorldSampler,
        correct: bool,
        mode: Mode,
        rng: &mut dyn RngCore,
    ) -> Option<Example> {
        retry(MAX_WORLD_ATTEMPTS, |_| {
            let world = sampler.sample(rng)?;
            let generated = self.generate_caption(&world, correct, mode, rng)?;
            Some(Example {
                caption: generated.caption.model(),
                captioner: self.model(&generated),
                correct,
                agreement: generated.agreement,
                world,
            })
        })
    }

    /// Generate `count` examples in parallel. Each example is labelled
    /// correct with probability `correct_ratio`. Examples whose world
    /// budget runs out are dropped, so the result may be shorter than
    /// `count`.
    pub fn generate_batch(
        &self,
        sampler: &WorldSampler,
        count: usize,
        seed: u64,
        correct_ratio: f64,
        mode: Mode,
    ) -> Vec<Example> {
        tracing::debug!(count, seed, correct_ratio, %mode, "generating batch");
        let examples: Vec<Example> = (0..count)
            .into_par_iter()
            .filter_map(|index| {
                let mut rng = example_rng(seed, index);
                let correct = rng.gen_bool(correct_ratio);
                self.generate_example(sampler, correct, mode, &mut rng)
            })
            .collect();
        tracing::debug!(requested = count, generated = examples.len(), "batch finished");
        examples
    }
}

/// Per-example generator, independent of thread scheduling.
pub fn example_rng(seed: u64, index: usize) -> StdRng {
    let mixed = seed ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(mixed)
}
