//! Quantifier captioners: "most squares are red", "exactly two of the
//! three circles are blue", "more squares than circles are left of a cross".

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::caption::{
    Agreement, ComparativeQuantifier, EntityType, Evaluate, Interval, NumberBound, Quantifier, QuantifierRange,
    QuantifierType, Relation,
};
use crate::policy::{Felicity, MAX_SAMPLE_ATTEMPTS};
use crate::predication::Predication;
use crate::world::World;

use super::{
    BoxedCaptioner, Captioner, Choice, Mode, Sample, accept_first, composite_model, retry, sample_incorrect_mode,
};

/// One configured quantifier: comparison, counting mode and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantifierSpec {
    pub qtype: QuantifierType,
    pub qrange: QuantifierRange,
    pub quantity: f64,
}

impl QuantifierSpec {
    pub fn new(qtype: QuantifierType, qrange: QuantifierRange, quantity: f64) -> Self {
        Self { qtype, qrange, quantity }
    }

    fn of_quantifier(quantifier: &Quantifier) -> Self {
        Self::new(quantifier.qtype, quantifier.qrange, quantifier.quantity)
    }

    fn of_comparative(quantifier: &ComparativeQuantifier) -> Self {
        Self::new(quantifier.qtype, quantifier.qrange, quantifier.quantity)
    }
}

/// Specs differing from `current` only in their range, shuffled.
fn range_alternatives(specs: &[QuantifierSpec], current: QuantifierSpec, rng: &mut dyn RngCore) -> Vec<QuantifierSpec> {
    let mut alternatives: Vec<QuantifierSpec> = specs
        .iter()
        .copied()
        .filter(|spec| {
            spec.qtype == current.qtype && spec.quantity == current.quantity && spec.qrange != current.qrange
        })
        .collect();
    alternatives.shuffle(rng);
    alternatives
}

/// Specs differing from `current` only in their quantity, closest first.
fn quantity_alternatives(specs: &[QuantifierSpec], current: QuantifierSpec) -> Vec<QuantifierSpec> {
    let mut alternatives: Vec<QuantifierSpec> = specs
        .iter()
        .copied()
        .filter(|spec| {
            spec.qtype == current.qtype && spec.qrange == current.qrange && spec.quantity != current.quantity
        })
        .collect();
    alternatives.sort_by(|a, b| {
        let da = (a.quantity - current.quantity).abs();
        let db = (b.quantity - current.quantity).abs();
        da.total_cmp(&db)
    });
    alternatives
}

fn has_range_alternative(specs: &[QuantifierSpec], current: QuantifierSpec) -> bool {
    specs.iter().any(|spec| {
        spec.qtype == current.qtype && spec.quantity == current.quantity && spec.qrange != current.qrange
    })
}

fn has_quantity_alternative(specs: &[QuantifierSpec], current: QuantifierSpec) -> bool {
    specs.iter().any(|spec| {
        spec.qtype == current.qtype && spec.qrange == current.qrange && spec.quantity != current.quantity
    })
}

/// Whether a spec is decided by the restrictor size alone: true (or
/// false) whatever number of restrictor entities the body holds for.
fn decided_by_restrictor(spec: QuantifierSpec, restrictor: Interval, predication: &Predication) -> Option<Agreement> {
    if !restrictor.is_point() {
        return None;
    }
    let probe = Quantifier::new(
        spec.qtype,
        spec.qrange,
        spec.quantity,
        EntityType::empty(),
        Relation::entity_type(EntityType::empty()),
    );
    let size = restrictor.lower as u32;
    let mut outcomes =
        (0..=size).map(|count| probe.agreement_for(restrictor, Interval::point(f64::from(count)), predication));
    let first = outcomes.next()?;
    (first.is_known() && outcomes.all(|outcome| outcome == first)).then_some(first)
}

fn felicitous(spec: QuantifierSpec, restrictor: Interval, predication: &Predication, sample: &Sample) -> bool {
    match decided_by_restrictor(spec, restrictor, predication) {
        Some(Agreement::True) => sample.felicity.logical_tautology,
        Some(Agreement::False) => sample.felicity.logical_contradiction,
        _ => true,
    }
}

/// Incorrect modes of [`QuantifierCaptioner`].
pub mod quantifier_incorrect {
    pub const RESTRICTOR: usize = 0;
    pub const BODY: usize = 1;
    pub const RANGE: usize = 2;
    pub const QUANTITY: usize = 3;
}

// ---------------------------------------------------------------------------
// Quantifier
// ---------------------------------------------------------------------------

/// Builds a quantifier over a restrictor type and a body relation.
pub struct QuantifierCaptioner {
    restrictor: BoxedCaptioner<EntityType>,
    body: BoxedCaptioner<Relation>,
    quantifiers: Vec<QuantifierSpec>,
    incorrect_distribution: [f64; 4],
    felicity: Felicity,
}

impl QuantifierCaptioner {
    pub fn new(
        restrictor: BoxedCaptioner<EntityType>,
        body: BoxedCaptioner<Relation>,
        quantifiers: Vec<QuantifierSpec>,
    ) -> Self {
        Self {
            restrictor,
            body,
            quantifiers,
            incorrect_distribution: [1.0, 1.0, 1.0, 1.0],
            felicity: Felicity::default(),
        }
    }

    pub fn with_incorrect_distribution(mut self, distribution: [f64; 4]) -> Self {
        self.incorrect_distribution = distribution;
        self
    }

    pub fn with_felicity(mut self, felicity: Felicity) -> Self {
        self.felicity = felicity;
        self
    }

    pub fn quantifiers(&self) -> &[QuantifierSpec] {
        &self.quantifiers
    }

    fn possible_modes(&self, spec: QuantifierSpec) -> [bool; 4] {
        [
            self.restrictor.incorrect_possible(),
            self.body.incorrect_possible(),
            has_range_alternative(&self.quantifiers, spec),
            has_quantity_alternative(&self.quantifiers, spec),
        ]
    }
}

impl Captioner for QuantifierCaptioner {
    type Output = Quantifier;

    fn name(&self) -> &'static str {
        "quantifier"
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        retry(MAX_SAMPLE_ATTEMPTS, |_| {
            let candidates: Vec<QuantifierSpec> = self
                .quantifiers
                .iter()
                .copied()
                .filter(|spec| correct || self.possible_modes(*spec).iter().any(|possible| *possible))
                .collect();
            let spec = *candidates.choose(rng)?;
            let incorrect_mode = if correct {
                None
            } else {
                Some(sample_incorrect_mode(&self.incorrect_distribution, &self.possible_modes(spec), rng)?)
            };
            let anchored = rng.gen_bool(0.5);
            let restrictor = self.restrictor.sample_values(
                mode,
                incorrect_mode != Some(quantifier_incorrect::RESTRICTOR),
                predication,
                rng,
            )?;
            let body = self
                .body
                .sample_values(mode, incorrect_mode != Some(quantifier_incorrect::BODY), predication, rng)?;
            Some(
                Sample::new(mode, correct, self.felicity.draw(rng), Choice::Quantifier { spec, anchored })
                    .with_incorrect_mode(incorrect_mode)
                    .with_child(restrictor)
                    .with_child(body),
            )
        })
    }

    /// The outer predication is not narrowed: quantified statements only
    /// read their own sub-predications.
    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<Quantifier> {
        let Choice::Quantifier { spec, anchored } = sample.choice else {
            panic!("quantifier captioner given a {:?} sample", sample.choice);
        };
        let mut body_narrowed = predication.copy();
        let body = self.body.caption(sample.child(1), &mut body_narrowed, world, rng)?;
        let mut restrictor_base = if anchored { body_narrowed } else { predication.copy() };
        let restrictor = self
            .restrictor
            .caption(sample.child(0), &mut restrictor_base, world, rng)?;

        let quantifier = Quantifier::new(spec.qtype, spec.qrange, spec.quantity, restrictor, body);
        let mut applied = predication.copy();
        quantifier.apply_to_predication(&mut applied);
        let (restrictor_count, _) = Quantifier::counts(&applied);
        if !felicitous(spec, restrictor_count, predication, sample) {
            return None;
        }
        (quantifier.agreement(&applied) == Agreement::True).then_some(quantifier)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut Quantifier,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&Quantifier) -> bool,
    ) -> bool {
        let template = caption.clone();
        let spec = QuantifierSpec::of_quantifier(caption);
        match sample.incorrect_mode {
            Some(quantifier_incorrect::RESTRICTOR) => {
                let mut base = predication.copy();
                if matches!(sample.choice, Choice::Quantifier { anchored: true, .. }) {
                    caption.body.apply_to_predication(&mut base);
                }
                self.restrictor.incorrect_with(
                    sample.child(0),
                    &mut caption.restrictor,
                    &base,
                    world,
                    rng,
                    &mut |restrictor: &EntityType| {
                        let mut candidate = template.clone();
                        candidate.restrictor = restrictor.clone();
                        accept(&candidate)
                    },
                )
            }
            Some(quantifier_incorrect::BODY) => self.body.incorrect_with(
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
            Some(quantifier_incorrect::RANGE) => {
                let candidates = range_alternatives(&self.quantifiers, spec, rng).into_iter().map(|alt| {
                    let mut candidate = template.clone();
                    candidate.qrange = alt.qrange;
                    candidate
                });
                accept_first(caption, candidates, accept)
            }
            Some(quantifier_incorrect::QUANTITY) => {
                let candidates = quantity_alternatives(&self.quantifiers, spec).into_iter().map(|alt| {
                    let mut candidate = template.clone();
                    candidate.quantity = alt.quantity;
                    candidate
                });
                accept_first(caption, candidates, accept)
            }
            other => panic!("quantifier captioner has no incorrect mode {other:?}"),
        }
    }

    fn incorrect_possible(&self) -> bool {
        self.quantifiers
            .iter()
            .any(|spec| self.possible_modes(*spec).iter().any(|possible| *possible))
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

// ---------------------------------------------------------------------------
// Number bound
// ---------------------------------------------------------------------------

/// Incorrect mode: state a wrong restrictor count.
pub const INCORRECT_BOUND: usize = 0;
/// Incorrect mode: make the wrapped quantifier incorrect.
pub const INCORRECT_QUANTIFIER: usize = 1;

/// States the exact restrictor count in front of a quantifier.
pub struct NumberBoundCaptioner {
    quantifier: QuantifierCaptioner,
    incorrect_distribution: [f64; 2],
    felicity: Felicity,
}

impl NumberBoundCaptioner {
    pub fn new(quantifier: QuantifierCaptioner) -> Self {
        Self {
            quantifier,
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
}

impl Captioner for NumberBoundCaptioner {
    type Output = NumberBound;

    fn name(&self) -> &'static str {
        "number-bound"
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
                let possible = [true, self.quantifier.incorrect_possible()];
                Some(sample_incorrect_mode(&self.incorrect_distribution, &possible, rng)?)
            };
            let quantifier = self.quantifier.sample_values(
                mode,
                incorrect_mode != Some(INCORRECT_QUANTIFIER),
                predication,
                rng,
            )?;
            Some(
                Sample::new(mode, correct, self.felicity.draw(rng), Choice::None)
                    .with_incorrect_mode(incorrect_mode)
                    .with_child(quantifier),
            )
        })
    }

    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<NumberBound> {
        let quantifier = self.quantifier.caption(sample.child(0), predication, world, rng)?;
        let mut applied = predication.copy();
        quantifier.apply_to_predication(&mut applied);
        let (restrictor, _) = Quantifier::counts(&applied);
        if !restrictor.is_point() {
            return None;
        }
        let bound = NumberBound::new(restrictor.lower as u32, quantifier);
        (bound.agreement(&applied) == Agreement::True).then_some(bound)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut NumberBound,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&NumberBound) -> bool,
    ) -> bool {
        let template = caption.clone();
        match sample.incorrect_mode {
            Some(INCORRECT_BOUND) => {
                let limit = u32::try_from(predication.num_entities()).unwrap_or(u32::MAX);
                let bound = caption.bound;
                let candidates = (1..=limit)
                    .flat_map(|offset| [bound.checked_sub(offset), bound.checked_add(offset)])
                    .flatten()
                    .filter(|candidate| *candidate <= limit)
                    .map(|candidate| NumberBound::new(candidate, template.quantifier.clone()));
                accept_first(caption, candidates, accept)
            }
            Some(INCORRECT_QUANTIFIER) => self.quantifier.incorrect_with(
                sample.child(0),
                &mut caption.quantifier,
                predication,
                world,
                rng,
                &mut |quantifier: &Quantifier| {
                    let mut candidate = template.clone();
                    candidate.quantifier = quantifier.clone();
                    accept(&candidate)
                },
            ),
            other => panic!("number bound captioner has no incorrect mode {other:?}"),
        }
    }

    fn incorrect_possible(&self) -> bool {
        true
    }

    fn model(&self, sample: &Sample) -> Value {
        composite_model(self, sample, vec![self.quantifier.model(sample.child(0))])
    }
}

// ---------------------------------------------------------------------------
// Comparative quantifier
// ---------------------------------------------------------------------------

/// Incorrect modes of [`ComparativeQuantifierCaptioner`].
pub mod comparative_incorrect {
    pub const RESTRICTOR: usize = 0;
    pub const COMPARISON: usize = 1;
    pub const BODY: usize = 2;
    pub const RANGE: usize = 3;
    pub const QUANTITY: usize = 4;
}

/// Compares how the body distributes over two different types.
pub struct ComparativeQuantifierCaptioner {
    restrictor: BoxedCaptioner<EntityType>,
    comparison: BoxedCaptioner<EntityType>,
    body: BoxedCaptioner<Relation>,
    quantifiers: Vec<QuantifierSpec>,
    incorrect_distribution: [f64; 5],
    felicity: Felicity,
}

impl ComparativeQuantifierCaptioner {
    pub fn new(
        restrictor: BoxedCaptioner<EntityType>,
        comparison: BoxedCaptioner<EntityType>,
        body: BoxedCaptioner<Relation>,
        quantifiers: Vec<QuantifierSpec>,
    ) -> Self {
        Self {
            restrictor,
            comparison,
            body,
            quantifiers,
            incorrect_distribution: [1.0, 1.0, 1.0, 1.0, 1.0],
            felicity: Felicity::default(),
        }
    }

    pub fn with_incorrect_distribution(mut self, distribution: [f64; 5]) -> Self {
        self.incorrect_distribution = distribution;
        self
    }

    pub fn with_felicity(mut self, felicity: Felicity) -> Self {
        self.felicity = felicity;
        self
    }

    fn possible_modes(&self, spec: QuantifierSpec) -> [bool; 5] {
        [
            self.restrictor.incorrect_possible(),
            self.comparison.incorrect_possible(),
            self.body.incorrect_possible(),
            has_range_alternative(&self.quantifiers, spec),
            has_quantity_alternative(&self.quantifiers, spec),
        ]
    }
}

impl Captioner for ComparativeQuantifierCaptioner {
    type Output = ComparativeQuantifier;

    fn name(&self) -> &'static str {
        "comparative-quantifier"
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        retry(MAX_SAMPLE_ATTEMPTS, |_| {
            use comparative_incorrect as modes;

            let candidates: Vec<QuantifierSpec> = self
                .quantifiers
                .iter()
                .copied()
                .filter(|spec| correct || self.possible_modes(*spec).iter().any(|possible| *possible))
                .collect();
            let spec = *candidates.choose(rng)?;
            let incorrect_mode = if correct {
                None
            } else {
                Some(sample_incorrect_mode(&self.incorrect_distribution, &self.possible_modes(spec), rng)?)
            };
            let anchored = rng.gen_bool(0.5);
            let restrictor =
                self.restrictor
                    .sample_values(mode, incorrect_mode != Some(modes::RESTRICTOR), predication, rng)?;
            let comparison =
                self.comparison
                    .sample_values(mode, incorrect_mode != Some(modes::COMPARISON), predication, rng)?;
            let body = self
                .body
                .sample_values(mode, incorrect_mode != Some(modes::BODY), predication, rng)?;
            Some(
                Sample::new(mode, correct, self.felicity.draw(rng), Choice::Quantifier { spec, anchored })
                    .with_incorrect_mode(incorrect_mode)
                    .with_child(restrictor)
                    .with_child(comparison)
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
    ) -> Option<ComparativeQuantifier> {
        let Choice::Quantifier { spec, anchored } = sample.choice else {
            panic!("comparative quantifier captioner given a {:?} sample", sample.choice);
        };
        let mut body_narrowed = predication.copy();
        let body = self.body.caption(sample.child(2), &mut body_narrowed, world, rng)?;
        let mut restrictor_base = if anchored { body_narrowed } else { predication.copy() };
        let restrictor = self
            .restrictor
            .caption(sample.child(0), &mut restrictor_base, world, rng)?;
        let comparison = self
            .comparison
            .caption(sample.child(1), &mut predication.copy(), world, rng)?;
        if restrictor == comparison {
            return None;
        }

        let quantifier = ComparativeQuantifier {
            qtype: spec.qtype,
            qrange: spec.qrange,
            quantity: spec.quantity,
            restrictor,
            comparison,
            body,
        };
        (quantifier.evaluate_on(predication) == Agreement::True).then_some(quantifier)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut ComparativeQuantifier,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&ComparativeQuantifier) -> bool,
    ) -> bool {
        use comparative_incorrect as modes;

        let template = caption.clone();
        let spec = QuantifierSpec::of_comparative(caption);
        match sample.incorrect_mode {
            Some(modes::RESTRICTOR) => {
                let mut base = predication.copy();
                if matches!(sample.choice, Choice::Quantifier { anchored: true, .. }) {
                    caption.body.apply_to_predication(&mut base);
                }
                self.restrictor.incorrect_with(
                    sample.child(0),
                    &mut caption.restrictor,
                    &base,
                    world,
                    rng,
                    &mut |restrictor: &EntityType| {
                        let mut candidate = template.clone();
                        candidate.restrictor = restrictor.clone();
                        candidate.restrictor != candidate.comparison && accept(&candidate)
                    },
                )
            }
            Some(modes::COMPARISON) => self.comparison.incorrect_with(
                sample.child(1),
                &mut caption.comparison,
                predication,
                world,
                rng,
                &mut |comparison: &EntityType| {
                    let mut candidate = template.clone();
                    candidate.comparison = comparison.clone();
                    candidate.restrictor != candidate.comparison && accept(&candidate)
                },
            ),
            Some(modes::BODY) => self.body.incorrect_with(
                sample.child(2),
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
            Some(modes::RANGE) => {
                let candidates = range_alternatives(&self.quantifiers, spec, rng).into_iter().map(|alt| {
                    let mut candidate = template.clone();
                    candidate.qrange = alt.qrange;
                    candidate
                });
                accept_first(caption, candidates, accept)
            }
            Some(modes::QUANTITY) => {
                let candidates = quantity_alternatives(&self.quantifiers, spec).into_iter().map(|alt| {
                    let mut candidate = template.clone();
                    candidate.quantity = alt.quantity;
                    candidate
                });
                accept_first(caption, candidates, accept)
            }
            other => panic!("comparative quantifier captioner has no incorrect mode {other:?}"),
        }
    }

    fn incorrect_possible(&self) -> bool {
        self.quantifiers
            .iter()
            .any(|spec| self.possible_modes(*spec).iter().any(|possible| *possible))
    }

    fn model(&self, sample: &Sample) -> Value {
        composite_model(
            self,
            sample,
            vec![
                self.restrictor.model(sample.child(0)),
                self.comparison.model(sample.child(1)),
                self.body.model(sample.child(2)),
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
    use crate::policy::{FelicityDraw, Vocabulary};
    use crate::world::tests::world;
    use crate::world::{ColorName, ShapeKind};

    fn scene() -> World {
        world(&[
            (ShapeKind::Square, ColorName::Red, 0.1, 0.1),
            (ShapeKind::Square, ColorName::Red, 0.4, 0.1),
            (ShapeKind::Square, ColorName::Blue, 0.7, 0.1),
            (ShapeKind::Circle, ColorName::Blue, 0.1, 0.7),
            (ShapeKind::Circle, ColorName::Green, 0.5, 0.7),
        ])
    }

    fn shapes() -> BoxedCaptioner<EntityType> {
        Box::new(
            RegularTypeCaptioner::new(vec![AttributeType::Shape], Vocabulary::default())
                .with_existing_attribute_rate(0.0),
        )
    }

    fn colors() -> BoxedCaptioner<Relation> {
        Box::new(AttributeRelationCaptioner::new(Box::new(
            AttributeCaptioner::new(vec![AttributeType::Color], Vocabulary::default())
                .with_existing_attribute_rate(0.0),
        )))
    }

    fn specs() -> Vec<QuantifierSpec> {
        use QuantifierRange::*;
        vec![
            QuantifierSpec::new(QuantifierType::Count, Geq, 1.0),
            QuantifierSpec::new(QuantifierType::Count, Geq, 2.0),
            QuantifierSpec::new(QuantifierType::Count, Eq, 2.0),
            QuantifierSpec::new(QuantifierType::Count, Eq, -1.0),
            QuantifierSpec::new(QuantifierType::Ratio, Gt, 0.5),
            QuantifierSpec::new(QuantifierType::Ratio, Lt, 0.5),
            QuantifierSpec::new(QuantifierType::Ratio, Eq, 0.0),
        ]
    }

    fn run<C: Captioner>(captioner: &C, w: &World, correct: bool, seed: u64) -> Option<C::Output> {
        let mut rng = rng(seed);
        let p = Predication::new(w);
        retry(50, |_| {
            let sample = captioner.sample_values(Mode::Train, correct, &p, &mut rng)?;
            let mut caption = captioner.caption(&sample, &mut p.copy(), w, &mut rng)?;
            if !correct && !captioner.incorrect(&sample, &mut caption, &p, w, &mut rng) {
                return None;
            }
            Some(caption)
        })
    }

    #[test]
    fn quantifiers_round_trip() {
        let w = scene();
        let captioner = QuantifierCaptioner::new(shapes(), colors(), specs());
        for seed in 0..8 {
            let correct = seed % 2 == 0;
            let caption = run(&captioner, &w, correct, seed).expect("scene admits quantified captions");
            assert_eq!(caption.evaluate(&w), Agreement::from_bool(correct), "{caption:?}");
        }
    }

    #[test]
    fn caption_does_not_narrow_outer_predication() {
        let w = scene();
        let captioner = QuantifierCaptioner::new(shapes(), colors(), specs());
        let mut rng = rng(31);
        let p = Predication::new(&w);
        let mut outer = p.copy();
        retry(50, |_| {
            let sample = captioner.sample_values(Mode::Train, true, &p, &mut rng)?;
            captioner.caption(&sample, &mut outer, &w, &mut rng)
        })
        .unwrap();
        assert!(outer.equals(&p));
        assert_eq!(outer.num_sub_predications(), 0);
    }

    #[test]
    fn quantity_alternatives_are_closest_first() {
        use QuantifierRange::Eq;
        let specs = vec![
            QuantifierSpec::new(QuantifierType::Count, Eq, 1.0),
            QuantifierSpec::new(QuantifierType::Count, Eq, 4.0),
            QuantifierSpec::new(QuantifierType::Count, Eq, 2.0),
            QuantifierSpec::new(QuantifierType::Ratio, Eq, 2.5),
        ];
        let current = QuantifierSpec::new(QuantifierType::Count, Eq, 3.0);
        let quantities: Vec<f64> = quantity_alternatives(&specs, current)
            .into_iter()
            .map(|spec| spec.quantity)
            .collect();
        assert_eq!(quantities, vec![4.0, 2.0, 1.0]);
    }

    #[test]
    fn trivial_specs_are_infelicitous() {
        let w = scene();
        let p = Predication::new(&w);
        let sample = Sample::new(Mode::Train, true, FelicityDraw::default(), Choice::None);
        let three = Interval::point(3.0);
        let at_least_zero = QuantifierSpec::new(QuantifierType::Count, QuantifierRange::Geq, 0.0);
        let more_than_three = QuantifierSpec::new(QuantifierType::Count, QuantifierRange::Gt, 3.0);
        let at_least_two = QuantifierSpec::new(QuantifierType::Count, QuantifierRange::Geq, 2.0);
        assert!(!felicitous(at_least_zero, three, &p, &sample));
        assert!(!felicitous(more_than_three, three, &p, &sample));
        assert!(felicitous(at_least_two, three, &p, &sample));
    }

    #[test]
    fn number_bound_states_restrictor_count() {
        let w = scene();
        let captioner = NumberBoundCaptioner::new(QuantifierCaptioner::new(shapes(), colors(), specs()));
        for seed in 0..6 {
            let correct = seed % 2 == 1;
            let caption = run(&captioner, &w, correct, seed).expect("scene admits number bounds");
            assert_eq!(caption.evaluate(&w), Agreement::from_bool(correct), "{caption:?}");
            if correct {
                let squares = EntityType::new(vec![Attribute::Shape(ShapeKind::Square)]);
                let expected = if caption.quantifier.restrictor == squares { 3 } else { 2 };
                assert_eq!(caption.bound, expected);
            }
        }
    }

    #[test]
    fn comparative_quantifiers_round_trip() {
        let w = scene();
        let captioner = ComparativeQuantifierCaptioner::new(
            shapes(),
            shapes(),
            colors(),
            vec![
                QuantifierSpec::new(QuantifierType::Count, QuantifierRange::Gt, 0.0),
                QuantifierSpec::new(QuantifierType::Count, QuantifierRange::Lt, 0.0),
                QuantifierSpec::new(QuantifierType::Count, QuantifierRange::Eq, 0.0),
            ],
        );
        for seed in 0..6 {
            let correct = seed % 2 == 0;
            let caption = run(&captioner, &w, correct, seed).expect("scene admits comparisons");
            assert_ne!(caption.restrictor, caption.comparison);
            assert_eq!(caption.evaluate(&w), Agreement::from_bool(correct), "{caption:?}");
        }
    }
}
