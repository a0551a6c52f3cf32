//! Caption AST and its ternary evaluator.
//!
//! Every node narrows a [`Predication`] with `apply_to_predication` and
//! reads its truth off the narrowed state with `agreement`. Nodes that
//! evaluate nested clauses append sub-predications in a fixed order and
//! read them back by position.
//!
//! [`Caption`] is the closed sum of all node kinds; it dispatches the
//! evaluator to the concrete node.

pub mod agreement;
pub mod attribute;
pub mod existential;
pub mod interval;
pub mod proposition;
pub mod quantifier;
pub mod relation;
pub mod selector;

use serde_json::Value;

use crate::predication::Predication;
use crate::world::World;

pub use agreement::Agreement;
pub use attribute::{Attribute, AttributeType, Direction, EntityType};
pub use existential::Existential;
pub use interval::{Interval, QuantifierRange, QuantifierType};
pub use proposition::{Proposition, PropositionType};
pub use quantifier::{ComparativeQuantifier, NumberBound, Quantifier};
pub use relation::{Reference, Relation, RelationType};
pub use selector::{Selector, SelectorType};

/// Ternary evaluation of a caption node against a predication.
pub trait Evaluate {
    /// Narrow `predication` (and append sub-predications) per the node's
    /// semantics.
    fn apply_to_predication(&self, predication: &mut Predication);

    /// Truth value read off a predication this node was applied to.
    fn agreement(&self, predication: &Predication) -> Agreement;

    /// Serializable export for the surface realizer: every node carries a
    /// `component` tag plus its discriminants and children.
    fn model(&self) -> Value;

    /// Apply to a childless copy of `predication` and read the agreement.
    fn evaluate_on(&self, predication: &Predication) -> Agreement {
        let mut applied = predication.copy();
        self.apply_to_predication(&mut applied);
        self.agreement(&applied)
    }

    /// Evaluate against a whole world with default tolerances.
    fn evaluate(&self, world: &World) -> Agreement {
        self.evaluate_on(&Predication::new(world))
    }
}

/// Any caption node.
#[derive(Debug, Clone, PartialEq)]
pub enum Caption {
    Attribute(Attribute),
    EntityType(EntityType),
    Relation(Relation),
    Selector(Selector),
    Existential(Existential),
    Quantifier(Quantifier),
    NumberBound(NumberBound),
    ComparativeQuantifier(ComparativeQuantifier),
    Proposition(Proposition),
}

impl Caption {
    /// Component tag of the node.
    pub fn component(&self) -> &'static str {
        match self {
            Caption::Attribute(_) => "attribute",
            Caption::EntityType(_) => "entity-type",
            Caption::Relation(_) => "relation",
            Caption::Selector(_) => "selector",
            Caption::Existential(_) => "existential",
            Caption::Quantifier(_) => "quantifier",
            Caption::NumberBound(_) => "number-bound",
            Caption::ComparativeQuantifier(_) => "comparative-quantifier",
            Caption::Proposition(_) => "proposition",
        }
    }

    fn node(&self) -> &dyn Evaluate {
        match self {
            Caption::Attribute(node) => node,
            Caption::EntityType(node) => node,
            Caption::Relation(node) => node,
            Caption::Selector(node) => node,
            Caption::Existential(node) => node,
            Caption::Quantifier(node) => node,
            Caption::NumberBound(node) => node,
            Caption::ComparativeQuantifier(node) => node,
            Caption::Proposition(node) => node,
        }
    }
}

impl Evaluate for Caption {
    fn apply_to_predication(&self, predication: &mut Predication) {
        self.node().apply_to_predication(predication);
    }

    fn agreement(&self, predication: &Predication) -> Agreement {
        self.node().agreement(predication)
    }

    fn model(&self) -> Value {
        self.node().model()
    }
}

macro_rules! caption_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Caption {
                fn from(node: $variant) -> Self {
                    Caption::$variant(node)
                }
            }
        )*
    };
}

caption_from!(
    Attribute,
    EntityType,
    Relation,
    Selector,
    Existential,
    Quantifier,
    NumberBound,
    ComparativeQuantifier,
    Proposition,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::world;
    use crate::world::{ColorName, ShapeKind};

    fn square_blue() -> Existential {
        Existential::new(
            EntityType::new(vec![Attribute::Shape(ShapeKind::Square)]),
            Relation::attribute(Attribute::Color(ColorName::Blue)),
        )
    }

    #[test]
    fn blue_square_scenario() {
        let yes = world(&[
            (ShapeKind::Square, ColorName::Red, 0.2, 0.2),
            (ShapeKind::Circle, ColorName::Blue, 0.5, 0.5),
            (ShapeKind::Square, ColorName::Blue, 0.8, 0.8),
        ]);
        let no = world(&[
            (ShapeKind::Square, ColorName::Red, 0.2, 0.2),
            (ShapeKind::Circle, ColorName::Blue, 0.5, 0.5),
            (ShapeKind::Square, ColorName::Red, 0.8, 0.8),
        ]);
        let caption = Caption::from(square_blue());
        assert_eq!(caption.evaluate(&yes), Agreement::True);
        assert_eq!(caption.evaluate(&no), Agreement::False);
    }

    #[test]
    fn caption_dispatch_matches_node() {
        let w = world(&[(ShapeKind::Square, ColorName::Blue, 0.5, 0.5)]);
        let node = square_blue();
        let caption = Caption::from(node.clone());
        assert_eq!(caption.component(), "existential");
        assert_eq!(caption.model(), node.model());
        assert_eq!(caption.evaluate(&w), node.evaluate(&w));
    }
}
