//! Weighted alternation between sibling captioners of the same output.

use std::fmt;

use rand::RngCore;
use serde_json::Value;

use crate::caption::Evaluate;
use crate::policy::MAX_SAMPLE_ATTEMPTS;
use crate::predication::Predication;
use crate::world::World;

use super::{BoxedCaptioner, Captioner, Choice, Mode, Sample, composite_model, retry, sample_incorrect_mode};

/// Picks one captioner per attempt and delegates every operation to it.
///
/// A mode-specific distribution, when present, replaces the default one
/// for samples drawn in that mode.
pub struct CaptionerMixer<T> {
    captioners: Vec<BoxedCaptioner<T>>,
    distribution: Vec<f64>,
    train_distribution: Option<Vec<f64>>,
    validation_distribution: Option<Vec<f64>>,
    test_distribution: Option<Vec<f64>>,
}

impl<T: Evaluate + Clone + fmt::Debug + 'static> CaptionerMixer<T> {
    /// Uniform mixer over `captioners`.
    pub fn new(captioners: Vec<BoxedCaptioner<T>>) -> Self {
        let distribution = vec![1.0; captioners.len()];
        Self {
            captioners,
            distribution,
            train_distribution: None,
            validation_distribution: None,
            test_distribution: None,
        }
    }

    pub fn with_distribution(mut self, distribution: Vec<f64>) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_mode_distribution(mut self, mode: Mode, distribution: Vec<f64>) -> Self {
        match mode {
            Mode::Train => self.train_distribution = Some(distribution),
            Mode::Validation => self.validation_distribution = Some(distribution),
            Mode::Test => self.test_distribution = Some(distribution),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.captioners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captioners.is_empty()
    }

    fn distribution(&self, mode: Mode) -> &[f64] {
        let specific = match mode {
            Mode::Train => self.train_distribution.as_deref(),
            Mode::Validation => self.validation_distribution.as_deref(),
            Mode::Test => self.test_distribution.as_deref(),
        };
        specific.unwrap_or(&self.distribution)
    }

    fn chosen(&self, sample: &Sample) -> &BoxedCaptioner<T> {
        let Choice::Mixer { index } = sample.choice else {
            panic!("mixer given a {:?} sample", sample.choice);
        };
        &self.captioners[index]
    }
}

impl<T: Evaluate + Clone + fmt::Debug + 'static> Captioner for CaptionerMixer<T> {
    type Output = T;

    fn name(&self) -> &'static str {
        "mixer"
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        retry(MAX_SAMPLE_ATTEMPTS, |_| {
            let possible: Vec<bool> = self
                .captioners
                .iter()
                .map(|captioner| correct || captioner.incorrect_possible())
                .collect();
            let index = sample_incorrect_mode(self.distribution(mode), &possible, rng)?;
            let chosen = self.captioners[index].sample_values(mode, correct, predication, rng)?;
            Some(
                Sample::new(mode, correct, chosen.felicity, Choice::Mixer { index })
                    .with_incorrect_mode(chosen.incorrect_mode)
                    .with_child(chosen),
            )
        })
    }

    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<T> {
        self.chosen(sample).caption(sample.child(0), predication, world, rng)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut T,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&T) -> bool,
    ) -> bool {
        self.chosen(sample)
            .incorrect_with(sample.child(0), caption, predication, world, rng, accept)
    }

    fn incorrect_possible(&self) -> bool {
        self.captioners.iter().any(|captioner| captioner.incorrect_possible())
    }

    fn model(&self, sample: &Sample) -> Value {
        composite_model(self, sample, vec![self.chosen(sample).model(sample.child(0))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::{AttributeType, EntityType};
    use crate::captioner::tests::rng;
    use crate::captioner::{EmptyTypeCaptioner, RegularTypeCaptioner};
    use crate::policy::Vocabulary;
    use crate::world::tests::world;
    use crate::world::{ColorName, ShapeKind};

    fn mixer() -> CaptionerMixer<EntityType> {
        CaptionerMixer::new(vec![
            Box::new(EmptyTypeCaptioner::new()),
            Box::new(RegularTypeCaptioner::new(
                vec![AttributeType::Shape, AttributeType::Color],
                Vocabulary::default(),
            )),
        ])
    }

    fn scene() -> World {
        world(&[
            (ShapeKind::Square, ColorName::Red, 0.2, 0.2),
            (ShapeKind::Circle, ColorName::Blue, 0.8, 0.8),
        ])
    }

    #[test]
    fn incorrect_samples_skip_impossible_captioners() {
        let w = scene();
        let p = Predication::new(&w);
        let mixer = mixer();
        let mut rng = rng(3);
        for _ in 0..20 {
            let sample = mixer.sample_values(Mode::Train, false, &p, &mut rng).unwrap();
            assert_eq!(sample.choice, Choice::Mixer { index: 1 });
        }
    }

    #[test]
    fn mode_distribution_overrides_default() {
        let w = scene();
        let p = Predication::new(&w);
        let mixer = mixer().with_mode_distribution(Mode::Test, vec![1.0, 0.0]);
        let mut rng = rng(4);
        for _ in 0..20 {
            let sample = mixer.sample_values(Mode::Test, true, &p, &mut rng).unwrap();
            assert_eq!(sample.choice, Choice::Mixer { index: 0 });
        }
        let picked_regular = (0..50).any(|_| {
            mixer.sample_values(Mode::Train, true, &p, &mut rng).unwrap().choice == Choice::Mixer { index: 1 }
        });
        assert!(picked_regular);
    }

    #[test]
    fn delegates_caption_and_model() {
        let w = scene();
        let p = Predication::new(&w);
        let mixer = mixer().with_distribution(vec![0.0, 1.0]);
        let mut rng = rng(5);
        let sample = mixer.sample_values(Mode::Train, true, &p, &mut rng).unwrap();
        let mut narrowed = p.copy();
        if let Some(caption) = mixer.caption(&sample, &mut narrowed, &w, &mut rng) {
            assert!(!caption.is_empty());
        }
        let model = mixer.model(&sample);
        assert_eq!(model["component"], "mixer");
        assert_eq!(model["children"][0]["component"], "regular-type");
    }

    #[test]
    fn all_zero_weights_sample_nothing() {
        let w = scene();
        let mixer = mixer().with_distribution(vec![0.0, 0.0]);
        assert!(mixer.sample_values(Mode::Train, true, &Predication::new(&w), &mut rng(1)).is_none());
    }
}
