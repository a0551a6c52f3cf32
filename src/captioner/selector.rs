//! Selector captioner: "the left one of the two squares", "the circle
//! closest to the red cross".

use rand::RngCore;
use rand::seq::SliceRandom;

use crate::caption::{Agreement, Direction, EntityType, Evaluate, Selector, SelectorType};
use crate::policy::{Felicity, MAX_SAMPLE_ATTEMPTS};
use crate::predication::Predication;
use crate::world::World;

use super::{BoxedCaptioner, Captioner, Choice, Mode, Sample, composite_model, retry, sample_incorrect_mode};

/// Incorrect mode: flip the selector direction.
pub const INCORRECT_DIRECTION: usize = 0;
/// Incorrect mode: make the scope type incorrect.
pub const INCORRECT_SCOPE: usize = 1;

/// Builds a selector over a scope type, and for proximity selectors over a
/// reference selector built by a nested captioner.
pub struct SelectorCaptioner {
    selectors: Vec<SelectorType>,
    scope: BoxedCaptioner<EntityType>,
    reference: Option<Box<SelectorCaptioner>>,
    incorrect_distribution: [f64; 2],
    felicity: Felicity,
}

impl SelectorCaptioner {
    pub fn new(selectors: Vec<SelectorType>, scope: BoxedCaptioner<EntityType>) -> Self {
        Self {
            selectors,
            scope,
            reference: None,
            incorrect_distribution: [1.0, 1.0],
            felicity: Felicity::default(),
        }
    }

    pub fn with_reference(mut self, reference: SelectorCaptioner) -> Self {
        self.reference = Some(Box::new(reference));
        self
    }

    pub fn with_incorrect_distribution(mut self, distribution: [f64; 2]) -> Self {
        self.incorrect_distribution = distribution;
        self
    }

    pub fn with_felicity(mut self, felicity: Felicity) -> Self {
        self.felicity = felicity;
        self
    }

    fn usable(&self, predtype: SelectorType) -> bool {
        !predtype.needs_reference() || self.reference.is_some()
    }

    fn directions(predtype: SelectorType) -> &'static [Direction] {
        if predtype == SelectorType::Unique {
            &[Direction::Plus]
        } else {
            &Direction::BOTH
        }
    }
}

impl Captioner for SelectorCaptioner {
    type Output = Selector;

    fn name(&self) -> &'static str {
        "selector"
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        retry(MAX_SAMPLE_ATTEMPTS, |_| {
            let usable: Vec<SelectorType> = self
                .selectors
                .iter()
                .copied()
                .filter(|predtype| self.usable(*predtype))
                .filter(|predtype| correct || *predtype != SelectorType::Unique || self.scope.incorrect_possible())
                .collect();
            let predtype = *usable.choose(rng)?;

            let incorrect_mode = if correct {
                None
            } else {
                let possible = [predtype != SelectorType::Unique, self.scope.incorrect_possible()];
                Some(sample_incorrect_mode(&self.incorrect_distribution, &possible, rng)?)
            };

            let fresh = predication.reset();
            let scope_correct = incorrect_mode != Some(INCORRECT_SCOPE);
            let mut sample = Sample::new(mode, correct, self.felicity.draw(rng), Choice::Selector { predtype })
                .with_incorrect_mode(incorrect_mode)
                .with_child(self.scope.sample_values(mode, scope_correct, &fresh, rng)?);
            if predtype.needs_reference() {
                let reference = self.reference.as_ref()?;
                sample = sample.with_child(reference.sample_values(mode, true, &fresh, rng)?);
            }
            Some(sample)
        })
    }

    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<Selector> {
        let Choice::Selector { predtype } = sample.choice else {
            panic!("selector captioner given a {:?} sample", sample.choice);
        };

        let mut scope_predication = predication.reset();
        let scope = self.scope.caption(sample.child(0), &mut scope_predication, world, rng)?;
        if scope_predication.num_agreeing() < predtype.min_scope() {
            return None;
        }
        let reference = if predtype.needs_reference() {
            let mut reference_predication = predication.reset();
            let captioner = self.reference.as_ref()?;
            Some(captioner.caption(sample.child(1), &mut reference_predication, world, rng)?)
        } else {
            None
        };

        let mut directions = Self::directions(predtype).to_vec();
        directions.shuffle(rng);
        let selector = directions.into_iter().find_map(|direction| {
            let mut selector = Selector::new(predtype, direction, scope.clone());
            if let Some(reference) = &reference {
                selector = selector.with_reference(reference.clone());
            }
            let mut narrowed = predication.copy();
            selector.apply_to_predication(&mut narrowed);
            let informative = sample.felicity.logical_tautology || !narrowed.equals(predication);
            (selector.agreement(&narrowed) == Agreement::True && informative).then_some(selector)
        })?;
        selector.apply_to_predication(predication);
        Some(selector)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut Selector,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&Selector) -> bool,
    ) -> bool {
        match sample.incorrect_mode {
            Some(INCORRECT_SCOPE) => {
                let template = caption.clone();
                let fresh = predication.reset();
                self.scope.incorrect_with(
                    sample.child(0),
                    &mut caption.scope,
                    &fresh,
                    world,
                    rng,
                    &mut |scope: &EntityType| {
                        let mut candidate = template.clone();
                        candidate.scope = scope.clone();
                        accept(&candidate)
                    },
                )
            }
            _ => {
                if caption.predtype == SelectorType::Unique {
                    return false;
                }
                let mut candidate = caption.clone();
                candidate.value = candidate.value.flip();
                if accept(&candidate) {
                    *caption = candidate;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn incorrect_possible(&self) -> bool {
        self.selectors.iter().any(|predtype| *predtype != SelectorType::Unique && self.usable(*predtype))
            || self.scope.incorrect_possible()
    }

    fn model(&self, sample: &Sample) -> serde_json::Value {
        let mut children = vec![self.scope.model(sample.child(0))];
        if let (Some(reference), Some(child)) = (&self.reference, sample.children.get(1)) {
            children.push(reference.model(child));
        }
        composite_model(self, sample, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::{Attribute, AttributeType};
    use crate::captioner::tests::rng;
    use crate::captioner::types::{EmptyTypeCaptioner, RegularTypeCaptioner};
    use crate::policy::Vocabulary;
    use crate::world::tests::world;
    use crate::world::{ColorName, ShapeKind};

    fn two_squares() -> World {
        world(&[
            (ShapeKind::Square, ColorName::Red, 0.2, 0.5),
            (ShapeKind::Circle, ColorName::Blue, 0.5, 0.5),
            (ShapeKind::Square, ColorName::Blue, 0.8, 0.5),
        ])
    }

    fn shape_scope() -> BoxedCaptioner<EntityType> {
        Box::new(
            RegularTypeCaptioner::new(vec![AttributeType::Shape], Vocabulary::default())
                .with_felicity(Felicity::permissive()),
        )
    }

    #[test]
    fn x_two_selector_picks_an_extreme_square() {
        let w = two_squares();
        let captioner = SelectorCaptioner::new(vec![SelectorType::XTwo], shape_scope());
        let mut rng = rng(3);
        let p = Predication::new(&w);
        let selector = crate::captioner::retry(20, |_| {
            let sample = captioner.sample_values(Mode::Train, true, &p, &mut rng)?;
            captioner.caption(&sample, &mut p.copy(), &w, &mut rng)
        })
        .expect("two squares admit an x-two selector");
        assert_eq!(selector.scope, EntityType::new(vec![Attribute::Shape(ShapeKind::Square)]));
        assert_eq!(selector.evaluate_on(&p), Agreement::True);
    }

    #[test]
    fn flipped_selector_picks_the_other_entity() {
        let w = two_squares();
        let p = Predication::new(&w);
        let captioner = SelectorCaptioner::new(vec![SelectorType::XTwo], shape_scope());
        let mut rng = rng(9);
        let sample = Sample::new(
            Mode::Train,
            false,
            crate::policy::FelicityDraw::default(),
            Choice::Selector { predtype: SelectorType::XTwo },
        )
        .with_incorrect_mode(Some(INCORRECT_DIRECTION));
        let mut selector = Selector::new(
            SelectorType::XTwo,
            Direction::Minus,
            EntityType::new(vec![Attribute::Shape(ShapeKind::Square)]),
        );
        let mut left = p.copy();
        selector.apply_to_predication(&mut left);
        assert!(captioner.incorrect_with(&sample, &mut selector, &p, &w, &mut rng, &mut |candidate| {
            let mut right = p.copy();
            candidate.apply_to_predication(&mut right);
            right.disjoint(&left)
        }));
        assert_eq!(selector.value, Direction::Plus);
    }

    #[test]
    fn unique_selector_over_empty_scope_cannot_be_incorrect() {
        let captioner = SelectorCaptioner::new(vec![SelectorType::Unique], Box::new(EmptyTypeCaptioner::new()));
        assert!(!captioner.incorrect_possible());
        let w = two_squares();
        let mut rng = rng(1);
        assert!(captioner.sample_values(Mode::Train, false, &Predication::new(&w), &mut rng).is_none());
    }

    #[test]
    fn proximity_needs_a_reference_captioner() {
        let w = two_squares();
        let captioner = SelectorCaptioner::new(vec![SelectorType::ProximityMax], shape_scope());
        let mut rng = rng(2);
        assert!(captioner.sample_values(Mode::Train, true, &Predication::new(&w), &mut rng).is_none());
    }
}
