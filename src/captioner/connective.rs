//! Connective captioner: two clauses joined by a logical connective.
//!
//! Each clause is built correct and then, where the chosen combination
//! asks for it, made incorrect on its own. A correct proposition picks a
//! *base* combination of clause truth values that makes the connective
//! true; an incorrect one starts from a true base and flips the clauses
//! that differ in the *target* combination.
//!
//! | connective  | correct bases          | incorrect base -> target        |
//! |-------------|------------------------|---------------------------------|
//! | and         | TT                     | TT -> TF, FT, FF                |
//! | or          | TT, TF, FT             | TT -> FF                        |
//! | xor         | TF, FT                 | TF -> FF, FT -> FF              |
//! | if-then     | TT, FT, FF             | TT -> TF                        |
//! | iff         | TT, FF                 | TT -> TF, FT                    |

use rand::RngCore;
use serde_json::Value;

use crate::caption::{Agreement, Caption, Evaluate, Proposition, PropositionType};
use crate::policy::{Felicity, MAX_SAMPLE_ATTEMPTS};
use crate::predication::Predication;
use crate::world::World;

use super::{BoxedCaptioner, Captioner, Choice, Mode, Sample, composite_model, retry, sample_incorrect_mode};

type Combination = [bool; 2];

const T: bool = true;
const F: bool = false;

pub(crate) fn correct_bases(proptype: PropositionType) -> &'static [Combination] {
    match proptype {
        PropositionType::Conjunction => &[[T, T]],
        PropositionType::Disjunction => &[[T, T], [T, F], [F, T]],
        PropositionType::ExclusiveDisjunction => &[[T, F], [F, T]],
        PropositionType::Implication => &[[T, T], [F, T], [F, F]],
        PropositionType::Equivalence => &[[T, T], [F, F]],
    }
}

pub(crate) fn incorrect_transitions(proptype: PropositionType) -> &'static [(Combination, Combination)] {
    match proptype {
        PropositionType::Conjunction => &[([T, T], [T, F]), ([T, T], [F, T]), ([T, T], [F, F])],
        PropositionType::Disjunction => &[([T, T], [F, F])],
        PropositionType::ExclusiveDisjunction => &[([T, F], [F, F]), ([F, T], [F, F])],
        PropositionType::Implication => &[([T, T], [T, F])],
        PropositionType::Equivalence => &[([T, T], [T, F]), ([T, T], [F, T])],
    }
}

fn as_agreements(combination: Combination) -> Vec<Agreement> {
    combination.iter().map(|value| Agreement::from_bool(*value)).collect()
}

/// Joins two sentence clauses by a connective.
pub struct ConnectiveCaptioner {
    proptype: PropositionType,
    clauses: [BoxedCaptioner<Caption>; 2],
    nested: bool,
    correct_distribution: Vec<f64>,
    incorrect_distribution: Vec<f64>,
    felicity: Felicity,
}

impl ConnectiveCaptioner {
    pub fn new(proptype: PropositionType, first: BoxedCaptioner<Caption>, second: BoxedCaptioner<Caption>) -> Self {
        Self {
            proptype,
            clauses: [first, second],
            nested: false,
            correct_distribution: vec![1.0; correct_bases(proptype).len()],
            incorrect_distribution: vec![1.0; incorrect_transitions(proptype).len()],
            felicity: Felicity::default(),
        }
    }

    /// Build the second clause about the entities the first one describes.
    pub fn nested(mut self, nested: bool) -> Self {
        self.nested = nested;
        self
    }

    /// Weights over the correct clause combinations, in table order.
    pub fn with_correct_distribution(mut self, distribution: Vec<f64>) -> Self {
        self.correct_distribution = distribution;
        self
    }

    /// Weights over the incorrect transitions, in table order.
    pub fn with_incorrect_distribution(mut self, distribution: Vec<f64>) -> Self {
        self.incorrect_distribution = distribution;
        self
    }

    pub fn with_felicity(mut self, felicity: Felicity) -> Self {
        self.felicity = felicity;
        self
    }

    /// Whether every clause that has to turn false can be made incorrect.
    fn reachable(&self, base: Combination, target: Combination) -> bool {
        (0..2).all(|index| base[index] == target[index] || self.clauses[index].incorrect_possible())
    }

    /// Flip clause `index` of `working`, judging candidates by `accept`.
    fn flip(
        &self,
        index: usize,
        sample: &Sample,
        working: &mut Proposition,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&Proposition) -> bool,
    ) -> bool {
        let template = working.clone();
        self.clauses[index].incorrect_with(
            sample.child(index),
            &mut working.clauses[index],
            predication,
            world,
            rng,
            &mut |clause: &Caption| {
                if clause.evaluate_on(predication) != Agreement::False {
                    return false;
                }
                let mut candidate = template.clone();
                candidate.clauses[index] = clause.clone();
                accept(&candidate)
            },
        )
    }
}

impl Captioner for ConnectiveCaptioner {
    type Output = Proposition;

    fn name(&self) -> &'static str {
        self.proptype.name()
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        retry(MAX_SAMPLE_ATTEMPTS, |_| {
            let (base, target) = if correct {
                let bases = correct_bases(self.proptype);
                let possible: Vec<bool> = bases.iter().map(|base| self.reachable([T, T], *base)).collect();
                let base = bases[sample_incorrect_mode(&self.correct_distribution, &possible, rng)?];
                (base, base)
            } else {
                let transitions = incorrect_transitions(self.proptype);
                let possible: Vec<bool> = transitions
                    .iter()
                    .map(|(base, target)| self.reachable([T, T], *base) && self.reachable(*base, *target))
                    .collect();
                transitions[sample_incorrect_mode(&self.incorrect_distribution, &possible, rng)?]
            };

            let mut sample = Sample::new(mode, correct, self.felicity.draw(rng), Choice::Connective { base, target });
            for (index, captioner) in self.clauses.iter().enumerate() {
                sample = sample.with_child(captioner.sample_values(mode, target[index], predication, rng)?);
            }
            Some(sample)
        })
    }

    /// Clauses are evaluated on their own sub-predications, so the outer
    /// predication is not narrowed.
    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<Proposition> {
        let Choice::Connective { base, .. } = sample.choice else {
            panic!("connective captioner given a {:?} sample", sample.choice);
        };

        let mut clauses = Vec::with_capacity(2);
        let mut narrowed = predication.copy();
        for (index, captioner) in self.clauses.iter().enumerate() {
            // A nested clause describes the first clause's witnesses, but the
            // other candidates stay ambiguous so it is not trivially true of them.
            let mut clause_predication = if self.nested && index > 0 {
                predication.focus(&narrowed)
            } else {
                predication.copy()
            };
            let mut clause = captioner.caption(sample.child(index), &mut clause_predication, world, rng)?;
            if !base[index] && !captioner.incorrect(sample.child(index), &mut clause, predication, world, rng) {
                return None;
            }
            narrowed = clause_predication;
            clauses.push(clause);
        }
        if !sample.felicity.logical_redundancy && clauses[0] == clauses[1] {
            return None;
        }

        let proposition = Proposition::new(self.proptype, clauses);
        let mut applied = predication.copy();
        proposition.apply_to_predication(&mut applied);
        let consistent = proposition.clause_agreements(&applied) == as_agreements(base)
            && proposition.agreement(&applied) == Agreement::True;
        consistent.then_some(proposition)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut Proposition,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&Proposition) -> bool,
    ) -> bool {
        let Choice::Connective { base, target } = sample.choice else {
            panic!("connective captioner given a {:?} sample", sample.choice);
        };
        let flips: Vec<usize> = (0..2).filter(|index| base[*index] != target[*index]).collect();
        let mut working = caption.clone();
        let flipped = match flips.as_slice() {
            [only] => self.flip(*only, sample, &mut working, predication, world, rng, accept),
            [first, second] => {
                self.flip(*first, sample, &mut working, predication, world, rng, &mut |_: &Proposition| true)
                    && self.flip(*second, sample, &mut working, predication, world, rng, accept)
            }
            _ => panic!("connective sample {base:?} -> {target:?} flips no clause"),
        };
        if flipped {
            *caption = working;
        }
        flipped
    }

    fn incorrect_possible(&self) -> bool {
        incorrect_transitions(self.proptype)
            .iter()
            .any(|(base, target)| self.reachable([T, T], *base) && self.reachable(*base, *target))
    }

    fn model(&self, sample: &Sample) -> Value {
        let children = self
            .clauses
            .iter()
            .zip(&sample.children)
            .map(|(captioner, child)| captioner.model(child))
            .collect();
        composite_model(self, sample, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::AttributeType;
    use crate::captioner::tests::rng;
    use crate::captioner::{
        AsCaption, AttributeCaptioner, AttributeRelationCaptioner, ExistentialCaptioner, RegularTypeCaptioner, retry,
    };
    use crate::policy::Vocabulary;
    use crate::world::tests::world;
    use crate::world::{ColorName, ShapeKind};

    fn existential() -> BoxedCaptioner<Caption> {
        let restrictor = RegularTypeCaptioner::new(vec![AttributeType::Shape], Vocabulary::default())
            .with_existing_attribute_rate(0.0);
        let body = AttributeRelationCaptioner::new(Box::new(
            AttributeCaptioner::new(vec![AttributeType::Color], Vocabulary::default())
                .with_existing_attribute_rate(0.0),
        ));
        Box::new(AsCaption::new(Box::new(ExistentialCaptioner::new(
            Box::new(restrictor),
            Box::new(body),
        ))))
    }

    fn scene() -> World {
        world(&[
            (ShapeKind::Square, ColorName::Red, 0.2, 0.2),
            (ShapeKind::Circle, ColorName::Blue, 0.5, 0.5),
            (ShapeKind::Triangle, ColorName::Green, 0.8, 0.8),
            (ShapeKind::Square, ColorName::Blue, 0.2, 0.8),
        ])
    }

    fn generate(captioner: &ConnectiveCaptioner, w: &World, correct: bool, seed: u64) -> Option<Proposition> {
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
    fn every_connective_round_trips() {
        let w = scene();
        for proptype in PropositionType::ALL {
            let captioner = ConnectiveCaptioner::new(proptype, existential(), existential());
            for (seed, correct) in [(1, true), (2, false), (3, true), (4, false)] {
                let caption = generate(&captioner, &w, correct, seed)
                    .unwrap_or_else(|| panic!("{proptype} failed for correct={correct}"));
                assert_eq!(caption.evaluate(&w), Agreement::from_bool(correct), "{proptype}: {caption:?}");
            }
        }
    }

    #[test]
    fn nested_clauses_round_trip() {
        let w = scene();
        let captioner = ConnectiveCaptioner::new(PropositionType::Implication, existential(), existential()).nested(true);
        for seed in 0..4 {
            let correct = seed % 2 == 0;
            let caption = generate(&captioner, &w, correct, seed).expect("nested implication");
            assert_eq!(caption.evaluate(&w), Agreement::from_bool(correct));
        }
    }

    #[test]
    fn tables_agree_with_connective_semantics() {
        for proptype in PropositionType::ALL {
            for base in correct_bases(proptype) {
                assert_eq!(proptype.combine(&as_agreements(*base)), Agreement::True, "{proptype} {base:?}");
            }
            for (base, target) in incorrect_transitions(proptype) {
                assert_eq!(proptype.combine(&as_agreements(*base)), Agreement::True, "{proptype} {base:?}");
                assert_eq!(proptype.combine(&as_agreements(*target)), Agreement::False, "{proptype} {target:?}");
                assert!(base.iter().zip(target).all(|(b, t)| *b || !*t), "only true clauses flip");
            }
        }
    }

    #[test]
    fn model_lists_both_clauses() {
        let w = scene();
        let captioner = ConnectiveCaptioner::new(PropositionType::Conjunction, existential(), existential());
        let mut rng = rng(9);
        let sample = captioner
            .sample_values(Mode::Validation, true, &Predication::new(&w), &mut rng)
            .unwrap();
        let model = captioner.model(&sample);
        assert_eq!(model["component"], "conjunction");
        assert_eq!(model["children"].as_array().map(Vec::len), Some(2));
        assert_eq!(model["mode"], "validation");
    }
}
