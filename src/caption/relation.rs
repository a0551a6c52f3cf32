//! Relations between an entity and a reference set.
//!
//! Binary relations hold existentially over the reference: an entity is
//! "left of a circle" if some agreeing circle provably lies to its right,
//! and provably fails only if every candidate circle provably does not.
//! The reference (and the comparison of ternary relations) is evaluated on
//! a fresh whole-world view, independent of the predication being narrowed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::policy::Tolerances;
use crate::predication::{Predicate, Predication, Refs};
use crate::world::Entity;

use super::Evaluate;
use super::agreement::Agreement;
use super::attribute::{Attribute, Direction, EntityType};
use super::selector::Selector;

/// Relation discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationType {
    /// The entity has the reference attribute.
    Attribute,
    /// The entity is of the reference type.
    Type,
    XRel,
    YRel,
    /// Overlap with drawing order: later entities are in front.
    ZRel,
    SizeRel,
    /// Only comparable between entities of the same color.
    ShadeRel,
    ShapeRel,
    ColorRel,
    TextureRel,
    /// Closer to or farther from the reference than the comparison entity.
    ProximityRel,
}

impl RelationType {
    pub const BINARY: [RelationType; 8] = [
        RelationType::XRel,
        RelationType::YRel,
        RelationType::ZRel,
        RelationType::SizeRel,
        RelationType::ShadeRel,
        RelationType::ShapeRel,
        RelationType::ColorRel,
        RelationType::TextureRel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RelationType::Attribute => "attribute",
            RelationType::Type => "type",
            RelationType::XRel => "x-rel",
            RelationType::YRel => "y-rel",
            RelationType::ZRel => "z-rel",
            RelationType::SizeRel => "size-rel",
            RelationType::ShadeRel => "shade-rel",
            RelationType::ShapeRel => "shape-rel",
            RelationType::ColorRel => "color-rel",
            RelationType::TextureRel => "texture-rel",
            RelationType::ProximityRel => "proximity-rel",
        }
    }

    /// Whether the relation needs a comparison selector.
    pub fn is_ternary(self) -> bool {
        self == RelationType::ProximityRel
    }

    /// Whether the reference is read as a membership test rather than a
    /// set of entities to compare against.
    pub fn is_membership(self) -> bool {
        matches!(self, RelationType::Attribute | RelationType::Type)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a relation relates to.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Attribute(Attribute),
    Type(EntityType),
    Selector(Selector),
}

impl Reference {
    pub fn as_type(&self) -> Option<&EntityType> {
        match self {
            Reference::Type(entity_type) => Some(entity_type),
            _ => None,
        }
    }
}

impl From<Attribute> for Reference {
    fn from(attribute: Attribute) -> Self {
        Reference::Attribute(attribute)
    }
}

impl From<EntityType> for Reference {
    fn from(entity_type: EntityType) -> Self {
        Reference::Type(entity_type)
    }
}

impl From<Selector> for Reference {
    fn from(selector: Selector) -> Self {
        Reference::Selector(selector)
    }
}

impl Evaluate for Reference {
    fn apply_to_predication(&self, predication: &mut Predication) {
        match self {
            Reference::Attribute(attribute) => attribute.apply_to_predication(predication),
            Reference::Type(entity_type) => entity_type.apply_to_predication(predication),
            Reference::Selector(selector) => selector.apply_to_predication(predication),
        }
    }

    fn agreement(&self, predication: &Predication) -> Agreement {
        Agreement::of_predication(predication)
    }

    fn model(&self) -> Value {
        match self {
            Reference::Attribute(attribute) => attribute.model(),
            Reference::Type(entity_type) => entity_type.model(),
            Reference::Selector(selector) => selector.model(),
        }
    }
}

/// Outcome of comparing an entity against one reference entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pairwise {
    Holds,
    Unknown,
    Fails,
}

impl Pairwise {
    fn signed(difference: f64, tolerance: f64) -> Self {
        if difference > tolerance {
            Pairwise::Holds
        } else if difference < -tolerance {
            Pairwise::Fails
        } else {
            Pairwise::Unknown
        }
    }

    fn from_bool(holds: bool) -> Self {
        if holds { Pairwise::Holds } else { Pairwise::Fails }
    }
}

/// A relation caption node.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub predtype: RelationType,
    /// `Plus` asserts the relation, `Minus` its directional or
    /// membership opposite.
    pub value: Direction,
    pub reference: Reference,
    /// Comparison selector of ternary relations.
    pub comparison: Option<Selector>,
}

impl Relation {
    pub fn new(predtype: RelationType, value: Direction, reference: impl Into<Reference>) -> Self {
        Self {
            predtype,
            value,
            reference: reference.into(),
            comparison: None,
        }
    }

    /// "is <attribute>".
    pub fn attribute(attribute: Attribute) -> Self {
        Self::new(RelationType::Attribute, Direction::Plus, attribute)
    }

    /// "is a <type>".
    pub fn entity_type(entity_type: EntityType) -> Self {
        Self::new(RelationType::Type, Direction::Plus, entity_type)
    }

    pub fn with_comparison(mut self, comparison: Selector) -> Self {
        self.comparison = Some(comparison);
        self
    }

    /// The type asserted by a type relation, or the attribute of an
    /// attribute relation as a single-attribute type.
    pub fn asserted_type(&self) -> Option<EntityType> {
        if self.value != Direction::Plus {
            return None;
        }
        match (&self.predtype, &self.reference) {
            (RelationType::Type, Reference::Type(entity_type)) => Some(entity_type.clone()),
            (RelationType::Attribute, Reference::Attribute(attribute)) => {
                Some(EntityType::new(vec![*attribute]))
            }
            _ => None,
        }
    }

    fn tolerance(&self, tolerances: &Tolerances) -> f64 {
        match self.predtype {
            RelationType::XRel | RelationType::YRel => tolerances.min_axis_distance,
            RelationType::SizeRel => tolerances.min_area_difference,
            RelationType::ShadeRel => tolerances.min_shade_difference,
            RelationType::ProximityRel => tolerances.min_distance_difference,
            _ => 0.0,
        }
    }

    /// Binary comparison of `entity` against one reference entity.
    fn compare(&self, entity: &Entity, reference: &Entity, tolerances: &Tolerances) -> Pairwise {
        let sign = self.value.sign();
        let tolerance = self.tolerance(tolerances);
        match self.predtype {
            RelationType::XRel => Pairwise::signed(sign * (entity.center.x - reference.center.x), tolerance),
            RelationType::YRel => Pairwise::signed(sign * (entity.center.y - reference.center.y), tolerance),
            RelationType::SizeRel => Pairwise::signed(sign * (entity.area() - reference.area()), tolerance),
            RelationType::ShadeRel => {
                if entity.color.name != reference.color.name {
                    Pairwise::Fails
                } else {
                    Pairwise::signed(sign * (entity.color.shade - reference.color.shade), tolerance)
                }
            }
            RelationType::ZRel => {
                if entity.overlap(reference) <= tolerances.min_overlap {
                    Pairwise::Fails
                } else {
                    let order = f64::from(entity.id.0) - f64::from(reference.id.0);
                    Pairwise::from_bool(sign * order > 0.0)
                }
            }
            RelationType::ShapeRel => {
                Pairwise::from_bool((entity.shape.kind == reference.shape.kind) == (self.value == Direction::Plus))
            }
            RelationType::ColorRel => {
                Pairwise::from_bool((entity.color.name == reference.color.name) == (self.value == Direction::Plus))
            }
            RelationType::TextureRel => {
                Pairwise::from_bool((entity.texture == reference.texture) == (self.value == Direction::Plus))
            }
            RelationType::Attribute | RelationType::Type | RelationType::ProximityRel => {
                panic!("{} is not a binary relation", self.predtype)
            }
        }
    }

    /// Ternary proximity comparison: `entity` relative to `comparison`,
    /// both measured against `reference`.
    fn compare_proximity(
        &self,
        entity: &Entity,
        reference: &Entity,
        comparison: &Entity,
        tolerances: &Tolerances,
    ) -> Pairwise {
        let difference = entity.distance(reference) - comparison.distance(reference);
        Pairwise::signed(self.value.sign() * difference, self.tolerance(tolerances))
    }
}

impl Predicate for Relation {
    fn pred_agreement(&self, entity: &Entity, predication: &Predication, refs: &Refs<'_>) -> bool {
        let reference = refs.expect_reference();
        let tolerances = predication.tolerances();
        match self.predtype {
            RelationType::Attribute | RelationType::Type => match self.value {
                Direction::Plus => reference.is_agreeing(entity.id),
                Direction::Minus => reference.is_disagreeing(entity.id),
            },
            RelationType::ProximityRel => {
                let comparison = refs.expect_comparison();
                reference
                    .agreeing()
                    .filter(|r| r.id != entity.id)
                    .any(|r| {
                        let mut candidates = comparison
                            .not_disagreeing()
                            .filter(|c| c.id != entity.id && c.id != r.id)
                            .peekable();
                        let has_agreeing = comparison
                            .agreeing()
                            .any(|c| c.id != entity.id && c.id != r.id);
                        has_agreeing
                            && candidates.peek().is_some()
                            && candidates.all(|c| {
                                self.compare_proximity(entity, r, c, tolerances) == Pairwise::Holds
                            })
                    })
            }
            _ => reference
                .agreeing()
                .filter(|r| r.id != entity.id)
                .any(|r| self.compare(entity, r, tolerances) == Pairwise::Holds),
        }
    }

    fn pred_disagreement(&self, entity: &Entity, predication: &Predication, refs: &Refs<'_>) -> bool {
        let reference = refs.expect_reference();
        let tolerances = predication.tolerances();
        match self.predtype {
            RelationType::Attribute | RelationType::Type => match self.value {
                Direction::Plus => reference.is_disagreeing(entity.id),
                Direction::Minus => reference.is_agreeing(entity.id),
            },
            RelationType::ProximityRel => {
                let comparison = refs.expect_comparison();
                reference
                    .not_disagreeing()
                    .filter(|r| r.id != entity.id)
                    .all(|r| {
                        let mut candidates = comparison
                            .not_disagreeing()
                            .filter(|c| c.id != entity.id && c.id != r.id);
                        let refuted = comparison
                            .agreeing()
                            .filter(|c| c.id != entity.id && c.id != r.id)
                            .any(|c| self.compare_proximity(entity, r, c, tolerances) == Pairwise::Fails);
                        refuted || candidates.next().is_none()
                    })
            }
            _ => reference
                .not_disagreeing()
                .filter(|r| r.id != entity.id)
                .all(|r| self.compare(entity, r, tolerances) == Pairwise::Fails),
        }
    }
}

impl Evaluate for Relation {
    /// Evaluates the reference (and comparison) on fresh views, narrows the
    /// predication, then appends the reference and comparison predications
    /// as sub-predications in that order.
    fn apply_to_predication(&self, predication: &mut Predication) {
        assert_eq!(
            self.predtype.is_ternary(),
            self.comparison.is_some(),
            "{} relation with mismatched comparison",
            self.predtype
        );
        let mut reference = predication.reset();
        self.reference.apply_to_predication(&mut reference);
        let comparison = self.comparison.as_ref().map(|selector| {
            let mut comparison = predication.reset();
            selector.apply_to_predication(&mut comparison);
            comparison
        });

        let refs = Refs {
            scope: None,
            reference: Some(&reference),
            comparison: comparison.as_ref(),
        };
        predication.apply(self, &refs);

        predication.attach(reference);
        if let Some(comparison) = comparison {
            predication.attach(comparison);
        }
    }

    fn agreement(&self, predication: &Predication) -> Agreement {
        Agreement::of_predication(predication)
    }

    fn model(&self) -> Value {
        let mut model = json!({
            "component": "relation",
            "predtype": self.predtype.name(),
            "value": i8::from(self.value),
            "reference": self.reference.model(),
        });
        if let Some(comparison) = &self.comparison {
            model["comparison"] = comparison.model();
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::selector::SelectorType;
    use crate::world::tests::world;
    use crate::world::{ColorName, EntityId, ShapeKind};

    fn ids(list: &[EntityId]) -> Vec<u32> {
        list.iter().map(|id| id.0).collect()
    }

    fn circle() -> EntityType {
        EntityType::new(vec![Attribute::Shape(ShapeKind::Circle)])
    }

    #[test]
    fn left_of_is_existential_over_reference() {
        let w = world(&[
            (ShapeKind::Square, ColorName::Red, 0.1, 0.5),
            (ShapeKind::Circle, ColorName::Blue, 0.5, 0.5),
            (ShapeKind::Square, ColorName::Blue, 0.9, 0.5),
        ]);
        let mut p = Predication::new(&w);
        let left_of_circle = Relation::new(RelationType::XRel, Direction::Minus, circle());
        left_of_circle.apply_to_predication(&mut p);
        assert_eq!(ids(p.agreeing_ids()), vec![0]);
        // The circle itself has no other circle to compare against.
        assert_eq!(ids(p.disagreeing_ids()), vec![1, 2]);
        assert_eq!(p.num_sub_predications(), 1);
        assert_eq!(ids(p.get_sub_predication(0).agreeing_ids()), vec![1]);
        p.check_invariants();
    }

    #[test]
    fn axis_tolerance_leaves_near_entities_ambiguous() {
        let w = world(&[
            (ShapeKind::Square, ColorName::Red, 0.45, 0.2),
            (ShapeKind::Circle, ColorName::Blue, 0.5, 0.8),
        ]);
        let mut p = Predication::new(&w);
        Relation::new(RelationType::XRel, Direction::Minus, circle()).apply_to_predication(&mut p);
        assert_eq!(ids(p.ambiguous_ids()), vec![0]);
        assert_eq!(
            Relation::new(RelationType::XRel, Direction::Minus, circle()).agreement(&p),
            Agreement::Unknown
        );
    }

    #[test]
    fn attribute_relation_is_membership() {
        let w = world(&[
            (ShapeKind::Square, ColorName::Red, 0.1, 0.5),
            (ShapeKind::Circle, ColorName::Blue, 0.5, 0.5),
        ]);
        let mut p = Predication::new(&w);
        Relation::attribute(Attribute::Color(ColorName::Blue)).apply_to_predication(&mut p);
        assert_eq!(ids(p.agreeing_ids()), vec![1]);
        assert_eq!(ids(p.disagreeing_ids()), vec![0]);

        let mut negated = Predication::new(&w);
        Relation::new(RelationType::Attribute, Direction::Minus, Attribute::Color(ColorName::Blue))
            .apply_to_predication(&mut negated);
        assert_eq!(ids(negated.agreeing_ids()), vec![0]);
    }

    #[test]
    fn same_shape_relation_excludes_self() {
        let w = world(&[
            (ShapeKind::Square, ColorName::Red, 0.1, 0.5),
            (ShapeKind::Square, ColorName::Blue, 0.5, 0.5),
            (ShapeKind::Circle, ColorName::Blue, 0.9, 0.5),
        ]);
        let mut p = Predication::new(&w);
        let same_shape_as_red = Relation::new(
            RelationType::ShapeRel,
            Direction::Plus,
            EntityType::new(vec![Attribute::Color(ColorName::Red)]),
        );
        same_shape_as_red.apply_to_predication(&mut p);
        assert_eq!(ids(p.agreeing_ids()), vec![1]);
        assert_eq!(ids(p.disagreeing_ids()), vec![0, 2]);
    }

    #[test]
    fn shade_comparison_requires_same_color() {
        let w = world(&[
            (ShapeKind::Square, ColorName::Red, 0.1, 0.5),
            (ShapeKind::Circle, ColorName::Blue, 0.9, 0.5),
        ]);
        let mut p = Predication::new(&w);
        Relation::new(RelationType::ShadeRel, Direction::Plus, circle()).apply_to_predication(&mut p);
        assert_eq!(p.num_agreeing(), 0);
        assert_eq!(p.num_disagreeing(), 2);
    }

    #[test]
    fn in_front_uses_overlap_and_drawing_order() {
        let w = world(&[
            (ShapeKind::Circle, ColorName::Blue, 0.50, 0.5),
            (ShapeKind::Square, ColorName::Red, 0.55, 0.5),
            (ShapeKind::Square, ColorName::Green, 0.9, 0.9),
        ]);
        let mut p = Predication::new(&w);
        Relation::new(RelationType::ZRel, Direction::Plus, circle()).apply_to_predication(&mut p);
        // Entity 1 overlaps the circle and is drawn after it.
        assert_eq!(ids(p.agreeing_ids()), vec![1]);
        assert_eq!(ids(p.disagreeing_ids()), vec![0, 2]);
    }

    #[test]
    fn proximity_compares_against_selected_entity() {
        let w = world(&[
            (ShapeKind::Circle, ColorName::Blue, 0.5, 0.5),
            (ShapeKind::Square, ColorName::Red, 0.6, 0.5),
            (ShapeKind::Triangle, ColorName::Green, 0.9, 0.5),
        ]);
        let comparison = Selector::new(
            SelectorType::Unique,
            Direction::Plus,
            EntityType::new(vec![Attribute::Shape(ShapeKind::Triangle)]),
        );
        let closer = Relation::new(RelationType::ProximityRel, Direction::Minus, circle())
            .with_comparison(comparison);
        let mut p = Predication::new(&w);
        closer.apply_to_predication(&mut p);
        assert!(p.is_agreeing(EntityId(1)));
        assert!(p.is_disagreeing(EntityId(0)));
        assert_eq!(p.num_sub_predications(), 2);
        p.check_invariants();
    }

    #[test]
    #[should_panic(expected = "mismatched comparison")]
    fn ternary_relation_without_comparison_panics() {
        let w = world(&[(ShapeKind::Circle, ColorName::Blue, 0.5, 0.5)]);
        let mut p = Predication::new(&w);
        Relation::new(RelationType::ProximityRel, Direction::Minus, circle()).apply_to_predication(&mut p);
    }

    #[test]
    fn model_nests_reference() {
        let model = Relation::new(RelationType::YRel, Direction::Plus, circle()).model();
        assert_eq!(model["component"], "relation");
        assert_eq!(model["predtype"], "y-rel");
        assert_eq!(model["value"], 1);
        assert_eq!(model["reference"]["component"], "entity-type");
    }
}
