//! Relation captioners: "is red", "is a square", "is left of a circle",
//! "is closer to the cross than the blue square".

use std::marker::PhantomData;

use rand::RngCore;
use rand::seq::SliceRandom;
use serde_json::Value;

use crate::caption::{
    Agreement, Attribute, Direction, EntityType, Evaluate, Reference, Relation, RelationType, Selector,
};
use crate::policy::{Felicity, MAX_SAMPLE_ATTEMPTS};
use crate::predication::Predication;
use crate::world::World;

use super::{
    BoxedCaptioner, Captioner, Choice, Mode, ReferenceKind, Sample, composite_model, retry, sample_incorrect_mode,
};

/// Incorrect mode: flip the relation direction.
pub const INCORRECT_DIRECTION: usize = 0;
/// Incorrect mode: make the reference incorrect.
pub const INCORRECT_REFERENCE: usize = 1;
/// Incorrect mode: make the comparison selector incorrect.
pub const INCORRECT_COMPARISON: usize = 2;

// ---------------------------------------------------------------------------
// Spatial and attribute-comparison relations
// ---------------------------------------------------------------------------

/// Builds a binary or ternary relation to a reference built by a nested
/// captioner.
pub struct RelationCaptioner {
    relations: Vec<RelationType>,
    reference: BoxedCaptioner<Reference>,
    comparison: Option<BoxedCaptioner<Selector>>,
    incorrect_distribution: [f64; 3],
    felicity: Felicity,
}

impl RelationCaptioner {
    /// # Panics
    ///
    /// Panics if a membership relation type is listed; those are built by
    /// [`AttributeRelationCaptioner`] and [`TypeRelationCaptioner`].
    pub fn new(relations: Vec<RelationType>, reference: BoxedCaptioner<Reference>) -> Self {
        assert!(
            relations.iter().all(|predtype| !predtype.is_membership()),
            "membership relations have dedicated captioners"
        );
        Self {
            relations,
            reference,
            comparison: None,
            incorrect_distribution: [1.0, 1.0, 1.0],
            felicity: Felicity::default(),
        }
    }

    pub fn with_comparison(mut self, comparison: BoxedCaptioner<Selector>) -> Self {
        self.comparison = Some(comparison);
        self
    }

    pub fn with_incorrect_distribution(mut self, distribution: [f64; 3]) -> Self {
        self.incorrect_distribution = distribution;
        self
    }

    pub fn with_felicity(mut self, felicity: Felicity) -> Self {
        self.felicity = felicity;
        self
    }

    fn usable(&self, predtype: RelationType) -> bool {
        !predtype.is_ternary() || self.comparison.is_some()
    }

    fn comparison_possible(&self) -> bool {
        self.comparison.as_ref().is_some_and(|c| c.incorrect_possible())
    }
}

impl Captioner for RelationCaptioner {
    type Output = Relation;

    fn name(&self) -> &'static str {
        "relation"
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        retry(MAX_SAMPLE_ATTEMPTS, |_| {
            let usable: Vec<RelationType> = self
                .relations
                .iter()
                .copied()
                .filter(|predtype| self.usable(*predtype))
                .collect();
            let predtype = *usable.choose(rng)?;

            let incorrect_mode = if correct {
                None
            } else {
                let possible = [
                    true,
                    self.reference.incorrect_possible(),
                    predtype.is_ternary() && self.comparison_possible(),
                ];
                Some(sample_incorrect_mode(&self.incorrect_distribution, &possible, rng)?)
            };

            let fresh = predication.reset();
            let reference_correct = incorrect_mode != Some(INCORRECT_REFERENCE);
            let mut sample = Sample::new(mode, correct, self.felicity.draw(rng), Choice::Relation { predtype })
                .with_incorrect_mode(incorrect_mode)
                .with_child(self.reference.sample_values(mode, reference_correct, &fresh, rng)?);
            if predtype.is_ternary() {
                let comparison = self.comparison.as_ref()?;
                let comparison_correct = incorrect_mode != Some(INCORRECT_COMPARISON);
                sample = sample.with_child(comparison.sample_values(mode, comparison_correct, &fresh, rng)?);
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
    ) -> Option<Relation> {
        let Choice::Relation { predtype } = sample.choice else {
            panic!("relation captioner given a {:?} sample", sample.choice);
        };

        let mut reference_predication = predication.reset();
        let reference = self
            .reference
            .caption(sample.child(0), &mut reference_predication, world, rng)?;
        let comparison = if predtype.is_ternary() {
            let mut comparison_predication = predication.reset();
            let captioner = self.comparison.as_ref()?;
            Some(captioner.caption(sample.child(1), &mut comparison_predication, world, rng)?)
        } else {
            None
        };

        let mut directions = Direction::BOTH.to_vec();
        directions.shuffle(rng);
        let relation = directions.into_iter().find_map(|direction| {
            let mut relation = Relation::new(predtype, direction, reference.clone());
            if let Some(comparison) = &comparison {
                relation = relation.with_comparison(comparison.clone());
            }
            let mut narrowed = predication.copy();
            relation.apply_to_predication(&mut narrowed);
            let informative = sample.felicity.logical_tautology || !narrowed.equals(predication);
            (relation.agreement(&narrowed) == Agreement::True && informative).then_some(relation)
        })?;
        relation.apply_to_predication(predication);
        Some(relation)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut Relation,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&Relation) -> bool,
    ) -> bool {
        let template = caption.clone();
        let fresh = predication.reset();
        match sample.incorrect_mode {
            Some(INCORRECT_REFERENCE) => self.reference.incorrect_with(
                sample.child(0),
                &mut caption.reference,
                &fresh,
                world,
                rng,
                &mut |reference: &Reference| {
                    let mut candidate = template.clone();
                    candidate.reference = reference.clone();
                    accept(&candidate)
                },
            ),
            Some(INCORRECT_COMPARISON) => {
                let (Some(captioner), Some(comparison)) = (&self.comparison, caption.comparison.as_mut()) else {
                    return false;
                };
                captioner.incorrect_with(
                    sample.child(1),
                    comparison,
                    &fresh,
                    world,
                    rng,
                    &mut |comparison: &Selector| {
                        let mut candidate = template.clone();
                        candidate.comparison = Some(comparison.clone());
                        accept(&candidate)
                    },
                )
            }
            _ => {
                let mut candidate = template;
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
        self.relations.iter().any(|predtype| self.usable(*predtype))
    }

    fn model(&self, sample: &Sample) -> Value {
        let mut children = vec![self.reference.model(sample.child(0))];
        if let (Some(comparison), Some(child)) = (&self.comparison, sample.children.get(1)) {
            children.push(comparison.model(child));
        }
        composite_model(self, sample, children)
    }
}

// ---------------------------------------------------------------------------
// Membership relations
// ---------------------------------------------------------------------------

/// Nodes a membership relation can assert of an entity.
pub trait MembershipKind: ReferenceKind {
    const PREDTYPE: RelationType;
}

impl MembershipKind for Attribute {
    const PREDTYPE: RelationType = RelationType::Attribute;
}

impl MembershipKind for EntityType {
    const PREDTYPE: RelationType = RelationType::Type;
}

/// Asserts an attribute or type of the entity: "is red", "is a square".
pub struct MembershipRelationCaptioner<T: MembershipKind> {
    inner: BoxedCaptioner<T>,
    _kind: PhantomData<fn() -> T>,
}

/// "is <attribute>".
pub type AttributeRelationCaptioner = MembershipRelationCaptioner<Attribute>;
/// "is a <type>".
pub type TypeRelationCaptioner = MembershipRelationCaptioner<EntityType>;

impl<T: MembershipKind> MembershipRelationCaptioner<T> {
    pub fn new(inner: BoxedCaptioner<T>) -> Self {
        Self {
            inner,
            _kind: PhantomData,
        }
    }
}

impl<T: MembershipKind> Captioner for MembershipRelationCaptioner<T> {
    type Output = Relation;

    fn name(&self) -> &'static str {
        match T::PREDTYPE {
            RelationType::Attribute => "attribute-relation",
            _ => "type-relation",
        }
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        let inner = self.inner.sample_values(mode, correct, predication, rng)?;
        Some(
            Sample::new(mode, correct, inner.felicity, Choice::Relation { predtype: T::PREDTYPE })
                .with_incorrect_mode((!correct).then_some(INCORRECT_REFERENCE))
                .with_child(inner),
        )
    }

    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<Relation> {
        let mut scratch = predication.copy();
        let node = self.inner.caption(sample.child(0), &mut scratch, world, rng)?;
        let relation = Relation::new(T::PREDTYPE, Direction::Plus, node.wrap());
        let mut narrowed = predication.copy();
        relation.apply_to_predication(&mut narrowed);
        if relation.agreement(&narrowed) != Agreement::True {
            return None;
        }
        relation.apply_to_predication(predication);
        Some(relation)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut Relation,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&Relation) -> bool,
    ) -> bool {
        let template = caption.clone();
        let node = T::unwrap_mut(&mut caption.reference);
        self.inner
            .incorrect_with(sample.child(0), node, predication, world, rng, &mut |candidate: &T| {
                let mut relation = template.clone();
                relation.reference = candidate.clone().wrap();
                accept(&relation)
            })
    }

    fn incorrect_possible(&self) -> bool {
        self.inner.incorrect_possible()
    }

    fn model(&self, sample: &Sample) -> Value {
        composite_model(self, sample, vec![self.inner.model(sample.child(0))])
    }
}
