//! Attributes and entity types.
//!
//! An [`Attribute`] is a single entity-level test: a discrete equality
//! (shape, color, texture) or an extremal comparison ("leftmost",
//! "biggest") against the other candidates of the predication being
//! narrowed. An [`EntityType`] is an ordered conjunction of attributes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::policy::Tolerances;
use crate::predication::{Predicate, Predication, Refs};
use crate::world::{ColorName, Entity, ShapeKind, Texture};

use super::Evaluate;
use super::agreement::Agreement;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Signed direction of a comparative or extremal predicate.
///
/// Serialized as `-1` / `1`. For axis comparisons `Minus` is towards the
/// origin (left, above), for sizes and shades it is smaller and darker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Direction {
    Minus,
    Plus,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Minus, Direction::Plus];

    pub fn sign(self) -> f64 {
        match self {
            Direction::Minus => -1.0,
            Direction::Plus => 1.0,
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Direction::Minus => Direction::Plus,
            Direction::Plus => Direction::Minus,
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> i8 {
        match direction {
            Direction::Minus => -1,
            Direction::Plus => 1,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Direction::Minus),
            1 => Ok(Direction::Plus),
            other => Err(format!("direction must be -1 or 1, got {other}")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i8::from(*self))
    }
}

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// Attribute discriminant, used by captioner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeType {
    Shape,
    Color,
    Texture,
    XMax,
    YMax,
    SizeMax,
    ShadeMax,
}

impl AttributeType {
    pub const ALL: [AttributeType; 7] = [
        AttributeType::Shape,
        AttributeType::Color,
        AttributeType::Texture,
        AttributeType::XMax,
        AttributeType::YMax,
        AttributeType::SizeMax,
        AttributeType::ShadeMax,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AttributeType::Shape => "shape",
            AttributeType::Color => "color",
            AttributeType::Texture => "texture",
            AttributeType::XMax => "x-max",
            AttributeType::YMax => "y-max",
            AttributeType::SizeMax => "size-max",
            AttributeType::ShadeMax => "shade-max",
        }
    }

    pub fn is_extremal(self) -> bool {
        matches!(
            self,
            AttributeType::XMax | AttributeType::YMax | AttributeType::SizeMax | AttributeType::ShadeMax
        )
    }

    /// The attribute of this type an entity actually has, for discrete types.
    pub fn of_entity(self, entity: &Entity) -> Option<Attribute> {
        match self {
            AttributeType::Shape => Some(Attribute::Shape(entity.shape.kind)),
            AttributeType::Color => Some(Attribute::Color(entity.color.name)),
            AttributeType::Texture => Some(Attribute::Texture(entity.texture)),
            _ => None,
        }
    }

    /// Extremal attribute of this type in `direction`.
    pub fn extremal(self, direction: Direction) -> Option<Attribute> {
        match self {
            AttributeType::XMax => Some(Attribute::XMax(direction)),
            AttributeType::YMax => Some(Attribute::YMax(direction)),
            AttributeType::SizeMax => Some(Attribute::SizeMax(direction)),
            AttributeType::ShadeMax => Some(Attribute::ShadeMax(direction)),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single entity-level test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "predtype", content = "value", rename_all = "kebab-case")]
pub enum Attribute {
    Shape(ShapeKind),
    Color(ColorName),
    Texture(Texture),
    XMax(Direction),
    YMax(Direction),
    SizeMax(Direction),
    ShadeMax(Direction),
}

impl Attribute {
    pub fn predtype(&self) -> AttributeType {
        match self {
            Attribute::Shape(_) => AttributeType::Shape,
            Attribute::Color(_) => AttributeType::Color,
            Attribute::Texture(_) => AttributeType::Texture,
            Attribute::XMax(_) => AttributeType::XMax,
            Attribute::YMax(_) => AttributeType::YMax,
            Attribute::SizeMax(_) => AttributeType::SizeMax,
            Attribute::ShadeMax(_) => AttributeType::ShadeMax,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match *self {
            Attribute::XMax(d) | Attribute::YMax(d) | Attribute::SizeMax(d) | Attribute::ShadeMax(d) => {
                Some(d)
            }
            _ => None,
        }
    }

    /// Same attribute with the direction flipped; discrete attributes are
    /// returned unchanged.
    pub fn flipped(&self) -> Attribute {
        match self.direction() {
            Some(direction) => self
                .predtype()
                .extremal(direction.flip())
                .unwrap_or(*self),
            None => *self,
        }
    }

    /// The value an extremal attribute compares, or `None` for discrete ones.
    fn extremal_value(&self, entity: &Entity) -> Option<f64> {
        match self {
            Attribute::XMax(_) => Some(entity.center.x),
            Attribute::YMax(_) => Some(entity.center.y),
            Attribute::SizeMax(_) => Some(entity.area()),
            Attribute::ShadeMax(_) => Some(entity.color.shade),
            _ => None,
        }
    }

    fn tolerance(&self, tolerances: &Tolerances) -> f64 {
        match self {
            Attribute::XMax(_) | Attribute::YMax(_) => tolerances.min_axis_distance,
            Attribute::SizeMax(_) => tolerances.min_area_difference,
            Attribute::ShadeMax(_) => tolerances.min_shade_difference,
            _ => 0.0,
        }
    }

    /// Leaf value for model export.
    fn value_model(&self) -> Value {
        match *self {
            Attribute::Shape(shape) => json!(shape.name()),
            Attribute::Color(color) => json!(color.name()),
            Attribute::Texture(texture) => json!(texture.name()),
            Attribute::XMax(d) | Attribute::YMax(d) | Attribute::SizeMax(d) | Attribute::ShadeMax(d) => {
                json!(i8::from(d))
            }
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.predtype(), self.value_model())
    }
}

impl Predicate for Attribute {
    fn pred_agreement(&self, entity: &Entity, predication: &Predication, _refs: &Refs<'_>) -> bool {
        match *self {
            Attribute::Shape(shape) => entity.shape.kind == shape,
            Attribute::Color(color) => entity.color.name == color,
            Attribute::Texture(texture) => entity.texture == texture,
            _ => {
                let (Some(value), Some(direction)) = (self.extremal_value(entity), self.direction())
                else {
                    return false;
                };
                let tolerance = self.tolerance(predication.tolerances());
                predication
                    .not_disagreeing()
                    .filter(|other| other.id != entity.id)
                    .all(|other| {
                        let other_value = self.extremal_value(other).unwrap_or(value);
                        direction.sign() * (value - other_value) > tolerance
                    })
            }
        }
    }

    fn pred_disagreement(&self, entity: &Entity, predication: &Predication, _refs: &Refs<'_>) -> bool {
        match *self {
            Attribute::Shape(shape) => entity.shape.kind != shape,
            Attribute::Color(color) => entity.color.name != color,
            Attribute::Texture(texture) => entity.texture != texture,
            _ => {
                let (Some(value), Some(direction)) = (self.extremal_value(entity), self.direction())
                else {
                    return false;
                };
                let tolerance = self.tolerance(predication.tolerances());
                predication
                    .agreeing()
                    .filter(|other| other.id != entity.id)
                    .any(|other| {
                        let other_value = self.extremal_value(other).unwrap_or(value);
                        direction.sign() * (other_value - value) > tolerance
                    })
            }
        }
    }
}

impl Evaluate for Attribute {
    fn apply_to_predication(&self, predication: &mut Predication) {
        predication.apply(self, &Refs::none());
    }

    fn agreement(&self, predication: &Predication) -> Agreement {
        Agreement::of_predication(predication)
    }

    fn model(&self) -> Value {
        json!({
            "component": "attribute",
            "predtype": self.predtype().name(),
            "value": self.value_model(),
        })
    }
}

// ---------------------------------------------------------------------------
// Entity type
// ---------------------------------------------------------------------------

/// Ordered conjunction of attributes. The empty type matches every entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType {
    attributes: Vec<Attribute>,
}

impl EntityType {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn contains(&self, attribute: &Attribute) -> bool {
        self.attributes.contains(attribute)
    }

    /// The attribute of the given type, if present.
    pub fn get(&self, predtype: AttributeType) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.predtype() == predtype)
    }

    /// Append an attribute.
    pub fn push(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Replace the attribute at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn replace(&mut self, index: usize, attribute: Attribute) {
        self.attributes[index] = attribute;
    }

    /// Whether every attribute of `other` is also an attribute of `self`,
    /// i.e. being of this type entails being of `other`.
    pub fn entails(&self, other: &EntityType) -> bool {
        other.attributes.iter().all(|a| self.contains(a))
    }
}

impl From<Vec<Attribute>> for EntityType {
    fn from(attributes: Vec<Attribute>) -> Self {
        Self::new(attributes)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attributes.is_empty() {
            return f.write_str("shape");
        }
        for (index, attribute) in self.attributes.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{attribute}")?;
        }
        Ok(())
    }
}

impl Predicate for EntityType {
    fn pred_agreement(&self, entity: &Entity, predication: &Predication, refs: &Refs<'_>) -> bool {
        self.attributes
            .iter()
            .all(|a| a.pred_agreement(entity, predication, refs))
    }

    fn pred_disagreement(&self, entity: &Entity, predication: &Predication, refs: &Refs<'_>) -> bool {
        self.attributes
            .iter()
            .any(|a| a.pred_disagreement(entity, predication, refs))
    }
}

impl Evaluate for EntityType {
    fn apply_to_predication(&self, predication: &mut Predication) {
        predication.apply(self, &Refs::none());
    }

    fn agreement(&self, predication: &Predication) -> Agreement {
        Agreement::of_predication(predication)
    }

    fn model(&self) -> Value {
        json!({
            "component": "entity-type",
            "value": self.attributes.iter().map(Evaluate::model).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::world;
    use crate::world::{EntityId, World};

    fn scene() -> World {
        world(&[
            (ShapeKind::Square, ColorName::Red, 0.1, 0.5),
            (ShapeKind::Circle, ColorName::Blue, 0.5, 0.5),
            (ShapeKind::Square, ColorName::Blue, 0.9, 0.5),
        ])
    }

    fn ids(list: &[EntityId]) -> Vec<u32> {
        list.iter().map(|id| id.0).collect()
    }

    #[test]
    fn type_is_a_conjunction() {
        let w = scene();
        let p = Predication::new(&w);
        let red_square = EntityType::new(vec![
            Attribute::Shape(ShapeKind::Square),
            Attribute::Color(ColorName::Red),
        ]);
        for entity in w.entities() {
            let expected = entity.shape.kind == ShapeKind::Square && entity.color.name == ColorName::Red;
            assert_eq!(red_square.pred_agreement(entity, &p, &Refs::none()), expected);
            assert_eq!(red_square.pred_disagreement(entity, &p, &Refs::none()), !expected);
        }
    }

    #[test]
    fn discrete_attribute_narrows_predication() {
        let w = scene();
        let mut p = Predication::new(&w);
        Attribute::Color(ColorName::Blue).apply_to_predication(&mut p);
        assert_eq!(ids(p.agreeing_ids()), vec![1, 2]);
        assert_eq!(ids(p.disagreeing_ids()), vec![0]);
        assert_eq!(Attribute::Color(ColorName::Blue).agreement(&p), Agreement::True);
    }

    #[test]
    fn missing_value_disagrees_everywhere() {
        let w = scene();
        let attribute = Attribute::Color(ColorName::Green);
        assert_eq!(attribute.evaluate_on(&Predication::new(&w)), Agreement::False);
    }

    #[test]
    fn extremal_compares_against_remaining_candidates() {
        let w = scene();
        let mut p = Predication::new(&w);
        Attribute::Shape(ShapeKind::Square).apply_to_predication(&mut p);
        // Among the squares, entity 0 is leftmost and entity 2 rightmost.
        let mut leftmost = p.copy();
        Attribute::XMax(Direction::Minus).apply_to_predication(&mut leftmost);
        assert_eq!(ids(leftmost.agreeing_ids()), vec![0]);
        assert_eq!(ids(leftmost.disagreeing_ids()), vec![1, 2]);
    }

    #[test]
    fn extremal_within_tolerance_is_ambiguous() {
        let w = world(&[
            (ShapeKind::Square, ColorName::Red, 0.50, 0.5),
            (ShapeKind::Square, ColorName::Red, 0.55, 0.5),
        ]);
        let mut p = Predication::new(&w);
        Attribute::XMax(Direction::Plus).apply_to_predication(&mut p);
        assert_eq!(p.num_agreeing(), 0);
        assert_eq!(p.num_ambiguous(), 2);
        assert_eq!(Attribute::XMax(Direction::Plus).agreement(&p), Agreement::Unknown);
    }

    #[test]
    fn entailment_is_attribute_inclusion() {
        let square = EntityType::new(vec![Attribute::Shape(ShapeKind::Square)]);
        let red_square = EntityType::new(vec![
            Attribute::Color(ColorName::Red),
            Attribute::Shape(ShapeKind::Square),
        ]);
        assert!(red_square.entails(&square));
        assert!(!square.entails(&red_square));
        assert!(square.entails(&EntityType::empty()));
    }

    #[test]
    fn flipping_only_touches_extremals() {
        assert_eq!(Attribute::XMax(Direction::Minus).flipped(), Attribute::XMax(Direction::Plus));
        assert_eq!(
            Attribute::Shape(ShapeKind::Circle).flipped(),
            Attribute::Shape(ShapeKind::Circle)
        );
    }

    #[test]
    fn model_carries_component_and_values() {
        let model = EntityType::new(vec![
            Attribute::Color(ColorName::Red),
            Attribute::SizeMax(Direction::Minus),
        ])
        .model();
        assert_eq!(model["component"], "entity-type");
        assert_eq!(model["value"][0]["predtype"], "color");
        assert_eq!(model["value"][0]["value"], "red");
        assert_eq!(model["value"][1]["value"], -1);
    }

    #[test]
    fn direction_serializes_as_sign() {
        assert_eq!(serde_json::to_string(&Direction::Minus).unwrap(), "-1");
        let parsed: Attribute = serde_json::from_str(r#"{"predtype":"x-max","value":1}"#).unwrap();
        assert_eq!(parsed, Attribute::XMax(Direction::Plus));
    }
}
