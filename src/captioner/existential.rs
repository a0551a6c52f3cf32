//! Existential captioner: "there is a red square", "a circle is left of a
//! triangle".

use rand::RngCore;
use serde_json::Value;

use crate::caption::{Agreement, EntityType, Evaluate, Existential, Relation};
use crate::policy::{Felicity, MAX_SAMPLE_ATTEMPTS};
use crate::predication::Predication;
use crate::world::World;

use super::{BoxedCaptioner, Captioner, Choice, Mode, Sample, composite_model, retry, sample_incorrect_mode};

/// Incorrect mode: make the restrictor incorrect.
pub const INCORRECT_RESTRICTOR: usize = 0;
/// Incorrect mode: make the body incorrect.
pub const INCORRECT_BODY: usize = 1;

/// Builds the body against the inherited predication, then a restrictor
/// describing one of the entities the body holds for.
pub struct ExistentialCaptioner {
    restrictor: BoxedCaptioner<EntityType>,
    body: BoxedCaptioner<Relation>,
    incorrect_distribution: [f64; 2],
    felicity: Felicity,
}

impl ExistentialCaptioner {
    pub fn new(restrictor: BoxedCaptioner<EntityType>, body: BoxedCaptioner<Relation>) -> Self {
        Self {
            restrictor,
            body,
            incorrect_distribution: [1.0, 1.0],
            felicity: Felicity::default(),
        }
    }

    pub fn with_incorrect_distribution(mut self, distribution: [f64; 2]) -> Self {
        self.incorrect_distribution = distribution;
        self
    }

    pub fn with_felicity(mut self, felicity: Felicity) -> Self {
        self.felicity = felicity;
        self
    }

    /// Reject existentials whose body adds nothing beyond the restrictor
    /// or restates it, unless the draw allows it.
    fn felicitous(&self, existential: &Existential, predication: &Predication, sample: &Sample) -> bool {
        if !sample.felicity.logical_redundancy {
            let restated = existential
                .body
                .asserted_type()
                .is_some_and(|asserted| existential.restrictor.entails(&asserted));
            if restated {
                return false;
            }
        }
        if !sample.felicity.pragmatical_tautology {
            let mut restricted = predication.copy();
            existential.restrictor.apply_to_predication(&mut restricted);
            let mut both = restricted.copy();
            existential.body.apply_to_predication(&mut both);
            if both.equals(&restricted) {
                return false;
            }
        }
        true
    }
}

impl Captioner for ExistentialCaptioner {
    type Output = Existential;

    fn name(&self) -> &'static str {
        "existential"
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        retry(MAX_SAMPLE_ATTEMPTS, |_| {
            let incorrect_mode = if correct {
                None
            } else {
                let possible = [self.restrictor.incorrect_possible(), self.body.incorrect_possible()];
                Some(sample_incorrect_mode(&self.incorrect_distribution, &possible, rng)?)
            };
            let restrictor = self.restrictor.sample_values(
                mode,
                incorrect_mode != Some(INCORRECT_RESTRICTOR),
                predication,
                rng,
            )?;
            let body = self
                .body
                .sample_values(mode, incorrect_mode != Some(INCORRECT_BODY), predication, rng)?;
            Some(
                Sample::new(mode, correct, self.felicity.draw(rng), Choice::None)
                    .with_incorrect_mode(incorrect_mode)
                    .with_child(restrictor)
                    .with_child(body),
            )
        })
    }

    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<Existential> {
        let mut narrowed = predication.copy();
        let body = self.body.caption(sample.child(1), &mut narrowed, world, rng)?;
        let restrictor = self.restrictor.caption(sample.child(0), &mut narrowed, world, rng)?;

        let existential = Existential::new(restrictor, body);
        if !self.felicitous(&existential, predication, sample) {
            return None;
        }
        if existential.evaluate_on(predication) != Agreement::True {
            return None;
        }
        existential.apply_to_predication(predication);
        Some(existential)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut Existential,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&Existential) -> bool,
    ) -> bool {
        let template = caption.clone();
        match sample.incorrect_mode {
            Some(INCORRECT_RESTRICTOR) => {
                let mut body_narrowed = predication.copy();
                caption.body.apply_to_predication(&mut body_narrowed);
                self.restrictor.incorrect_with(
                    sample.child(0),
                    &mut caption.restrictor,
                    &body_narrowed,
                    world,
                    rng,
                    &mut |restrictor: &EntityType| {
                        let mut candidate = template.clone();
                        candidate.restrictor = restrictor.clone();
                        accept(&candidate)
                    },
                )
            }
            Some(INCORRECT_BODY) => self.body.incorrect_with(
                sample.child(1),
                &mut caption.body,
                predication,
                world,
                rng,
                &mut |body: &Relation| {
                    let mut candidate = template.clone();
                    candidate.body = body.clone();
                    accept(&candidate)
                },
            ),
            other => panic!("existential captioner has no incorrect mode {other:?}"),
        }
    }

    fn incorrect_possible(&self) -> bool {
        self.restrictor.incorrect_possible() || self.body.incorrect_possible()
    }

    fn model(&self, sample: &Sample) -> Value {
        composite_model(
            self,
            sample,
            vec![
                self.restrictor.model(sample.child(0)),
                self.body.model(sample.child(1)),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::{Attribute, AttributeType};
    use crate::captioner::tests::rng;
    use crate::captioner::{AttributeCaptioner, AttributeRelationCaptioner, RegularTypeCaptioner, retry};
    use crate::policy::Vocabulary;
    use crate::world::tests::world;
    use crate::world::{ColorName, ShapeKind};

    fn captioner() -> ExistentialCaptioner {
        let restrictor = RegularTypeCaptioner::new(vec![AttributeType::Shape], Vocabulary::default())
            .with_existing_attribute_rate(0.0);
        let body = AttributeRelationCaptioner::new(Box::new(
            AttributeCaptioner::new(vec![AttributeType::Color], Vocabulary::default())
                .with_existing_attribute_rate(0.0),
        ));
        ExistentialCaptioner::new(Box::new(restrictor), Box::new(body))
    }

    fn scene() -> World {
        world(&[
            (ShapeKind::Square, ColorName::Red, 0.2, 0.2),
            (ShapeKind::Circle, ColorName::Blue, 0.5, 0.5),
            (ShapeKind::Square, ColorName::Blue, 0.8, 0.8),
        ])
    }

    fn generate(captioner: &ExistentialCaptioner, w: &World, correct: bool, seed: u64) -> Option<Existential> {
        let mut rng = rng(seed);
        let p = Predication::new(w);
        retry(20, |_| {
            let sample = captioner.sample_values(Mode::Train, correct, &p, &mut rng)?;
            let mut caption = captioner.caption(&sample, &mut p.copy(), w, &mut rng)?;
            if !correct && !captioner.incorrect(&sample, &mut caption, &p, w, &mut rng) {
                return None;
            }
            Some(caption)
        })
    }

    #[test]
    fn correct_existentials_are_true() {
        let w = scene();
        let captioner = captioner();
        for seed in 0..10 {
            let caption = generate(&captioner, &w, true, seed).expect("scene admits existentials");
            assert_eq!(caption.evaluate(&w), Agreement::True);
        }
    }

    #[test]
    fn incorrect_existentials_are_false() {
        let w = scene();
        let captioner = captioner();
        for seed in 0..10 {
            let caption = generate(&captioner, &w, false, seed).expect("scene admits false existentials");
            assert_eq!(caption.evaluate(&w), Agreement::False);
        }
    }

    #[test]
    fn caption_narrows_and_records_subpredications() {
        let w = scene();
        let captioner = captioner();
        let mut rng = rng(5);
        let p = Predication::new(&w);
        let (caption, narrowed) = retry(20, |_| {
            let sample = captioner.sample_values(Mode::Train, true, &p, &mut rng)?;
            let mut narrowed = p.copy();
            let caption = captioner.caption(&sample, &mut narrowed, &w, &mut rng)?;
            Some((caption, narrowed))
        })
        .unwrap();
        assert_eq!(narrowed.num_sub_predications(), 2);
        assert!(narrowed.num_agreeing() > 0);
        for entity in narrowed.agreeing() {
            assert!(caption.restrictor.contains(&Attribute::Shape(entity.shape.kind)));
        }
    }

    #[test]
    fn restated_body_is_infelicitous() {
        let w = scene();
        let captioner = captioner();
        let existential = Existential::new(
            EntityType::new(vec![Attribute::Color(ColorName::Red)]),
            Relation::attribute(Attribute::Color(ColorName::Red)),
        );
        let sample = Sample::new(Mode::Train, true, Default::default(), Choice::None);
        assert!(!captioner.felicitous(&existential, &Predication::new(&w), &sample));
    }
}
