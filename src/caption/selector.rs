//! Selectors: definite descriptions picking entities out of a scope.
//!
//! "The red square", "the left one of the two circles", "the biggest
//! triangle", "the square closest to the circle". The scope type (and the
//! proximity reference) are evaluated on fresh whole-world views; the
//! presupposition of the description (uniqueness, exactly two, at least
//! two) is part of the selector's truth conditions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::policy::Tolerances;
use crate::predication::{Predicate, Predication, Refs};
use crate::world::{Entity, EntityId};

use super::Evaluate;
use super::agreement::Agreement;
use super::attribute::{Direction, EntityType};

/// Selector discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorType {
    Unique,
    XTwo,
    YTwo,
    SizeTwo,
    ShadeTwo,
    XMax,
    YMax,
    SizeMax,
    ShadeMax,
    ProximityTwo,
    ProximityMax,
}

impl SelectorType {
    pub const ALL: [SelectorType; 11] = [
        SelectorType::Unique,
        SelectorType::XTwo,
        SelectorType::YTwo,
        SelectorType::SizeTwo,
        SelectorType::ShadeTwo,
        SelectorType::XMax,
        SelectorType::YMax,
        SelectorType::SizeMax,
        SelectorType::ShadeMax,
        SelectorType::ProximityTwo,
        SelectorType::ProximityMax,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SelectorType::Unique => "unique",
            SelectorType::XTwo => "x-two",
            SelectorType::YTwo => "y-two",
            SelectorType::SizeTwo => "size-two",
            SelectorType::ShadeTwo => "shade-two",
            SelectorType::XMax => "x-max",
            SelectorType::YMax => "y-max",
            SelectorType::SizeMax => "size-max",
            SelectorType::ShadeMax => "shade-max",
            SelectorType::ProximityTwo => "proximity-two",
            SelectorType::ProximityMax => "proximity-max",
        }
    }

    /// Whether the selector needs a reference selector.
    pub fn needs_reference(self) -> bool {
        matches!(self, SelectorType::ProximityTwo | SelectorType::ProximityMax)
    }

    /// "the X one of the two" selectors.
    pub fn is_two(self) -> bool {
        matches!(
            self,
            SelectorType::XTwo
                | SelectorType::YTwo
                | SelectorType::SizeTwo
                | SelectorType::ShadeTwo
                | SelectorType::ProximityTwo
        )
    }

    /// Number of scope entities the description presupposes at least.
    pub fn min_scope(self) -> usize {
        if self == SelectorType::Unique { 1 } else { 2 }
    }
}

impl fmt::Display for SelectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A selector caption node.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub predtype: SelectorType,
    /// Direction of comparative selectors; ignored by `unique`.
    pub value: Direction,
    pub scope: EntityType,
    /// Reference of proximity selectors.
    pub reference: Option<Box<Selector>>,
}

impl Selector {
    pub fn new(predtype: SelectorType, value: Direction, scope: EntityType) -> Self {
        Self {
            predtype,
            value,
            scope,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: Selector) -> Self {
        self.reference = Some(Box::new(reference));
        self
    }

    fn tolerance(&self, tolerances: &Tolerances) -> f64 {
        match self.predtype {
            SelectorType::XTwo | SelectorType::YTwo | SelectorType::XMax | SelectorType::YMax => {
                tolerances.min_axis_distance
            }
            SelectorType::SizeTwo | SelectorType::SizeMax => tolerances.min_area_difference,
            SelectorType::ShadeTwo | SelectorType::ShadeMax => tolerances.min_shade_difference,
            SelectorType::ProximityTwo | SelectorType::ProximityMax => tolerances.min_distance_difference,
            SelectorType::Unique => 0.0,
        }
    }

    /// The compared value; `anchor` is the proximity reference entity.
    fn measure(&self, entity: &Entity, anchor: Option<&Entity>) -> f64 {
        match self.predtype {
            SelectorType::XTwo | SelectorType::XMax => entity.center.x,
            SelectorType::YTwo | SelectorType::YMax => entity.center.y,
            SelectorType::SizeTwo | SelectorType::SizeMax => entity.area(),
            SelectorType::ShadeTwo | SelectorType::ShadeMax => entity.color.shade,
            SelectorType::ProximityTwo | SelectorType::ProximityMax => {
                anchor.map_or(0.0, |anchor| entity.distance(anchor))
            }
            SelectorType::Unique => 0.0,
        }
    }

    /// The proximity anchor: certain once exactly one reference entity
    /// agrees and none is ambiguous.
    fn anchor<'p>(&self, refs: &Refs<'p>) -> Anchor<'p> {
        let reference = refs.expect_reference();
        if reference.num_agreeing() > 1 || reference.num_not_disagreeing() == 0 {
            return Anchor::Failed;
        }
        if reference.num_not_disagreeing() == 1 {
            if let Some(anchor) = reference.agreeing().next() {
                return Anchor::Entity(anchor);
            }
        }
        Anchor::Unresolved
    }

    fn candidates<'p>(scope: &'p Predication, excluded: Option<EntityId>) -> Candidates<'p> {
        let keep = |e: &&'p Entity| Some(e.id) != excluded;
        Candidates {
            agreeing: scope.agreeing().filter(keep).collect(),
            not_disagreeing: scope.not_disagreeing().filter(keep).collect(),
        }
    }

    fn comparative_agreement(
        &self,
        entity: &Entity,
        candidates: &Candidates<'_>,
        anchor: Option<&Entity>,
        tol: f64,
    ) -> bool {
        let enough = if self.predtype.is_two() {
            candidates.agreeing.len() == 2 && candidates.not_disagreeing.len() == 2
        } else {
            candidates.agreeing.len() >= 2
        };
        let sign = self.value.sign();
        let value = self.measure(entity, anchor);
        enough
            && candidates.agreeing.iter().any(|c| c.id == entity.id)
            && candidates
                .not_disagreeing
                .iter()
                .filter(|c| c.id != entity.id)
                .all(|c| sign * (value - self.measure(c, anchor)) > tol)
    }

    fn comparative_disagreement(
        &self,
        entity: &Entity,
        candidates: &Candidates<'_>,
        anchor: Option<&Entity>,
        tol: f64,
    ) -> bool {
        let member = candidates.not_disagreeing.iter().any(|c| c.id == entity.id);
        let presupposition_fails = if self.predtype.is_two() {
            candidates.agreeing.len() > 2 || candidates.not_disagreeing.len() < 2
        } else {
            candidates.not_disagreeing.len() < 2
        };
        let sign = self.value.sign();
        let value = self.measure(entity, anchor);
        !member
            || presupposition_fails
            || candidates
                .agreeing
                .iter()
                .filter(|c| c.id != entity.id)
                .any(|c| sign * (self.measure(c, anchor) - value) > tol)
    }
}

enum Anchor<'p> {
    Failed,
    Unresolved,
    Entity(&'p Entity),
}

struct Candidates<'p> {
    agreeing: Vec<&'p Entity>,
    not_disagreeing: Vec<&'p Entity>,
}

impl Predicate for Selector {
    fn pred_agreement(&self, entity: &Entity, predication: &Predication, refs: &Refs<'_>) -> bool {
        let scope = refs.expect_scope();
        let tolerance = self.tolerance(predication.tolerances());
        match self.predtype {
            SelectorType::Unique => scope.is_agreeing(entity.id) && scope.num_not_disagreeing() == 1,
            SelectorType::ProximityTwo | SelectorType::ProximityMax => match self.anchor(refs) {
                Anchor::Entity(anchor) if anchor.id != entity.id => {
                    let candidates = Self::candidates(scope, Some(anchor.id));
                    self.comparative_agreement(entity, &candidates, Some(anchor), tolerance)
                }
                _ => false,
            },
            _ => {
                let candidates = Self::candidates(scope, None);
                self.comparative_agreement(entity, &candidates, None, tolerance)
            }
        }
    }

    fn pred_disagreement(&self, entity: &Entity, predication: &Predication, refs: &Refs<'_>) -> bool {
        let scope = refs.expect_scope();
        let tolerance = self.tolerance(predication.tolerances());
        match self.predtype {
            SelectorType::Unique => scope.is_disagreeing(entity.id) || scope.num_agreeing() > 1,
            SelectorType::ProximityTwo | SelectorType::ProximityMax => match self.anchor(refs) {
                Anchor::Failed => true,
                Anchor::Entity(anchor) if anchor.id == entity.id => true,
                Anchor::Entity(anchor) => {
                    let candidates = Self::candidates(scope, Some(anchor.id));
                    self.comparative_disagreement(entity, &candidates, Some(anchor), tolerance)
                }
                Anchor::Unresolved => scope.is_disagreeing(entity.id),
            },
            _ => {
                let candidates = Self::candidates(scope, None);
                self.comparative_disagreement(entity, &candidates, None, tolerance)
            }
        }
    }
}

impl Evaluate for Selector {
    /// Appends the scope predication, then the reference predication of
    /// proximity selectors.
    fn apply_to_predication(&self, predication: &mut Predication) {
        assert_eq!(
            self.predtype.needs_reference(),
            self.reference.is_some(),
            "{} selector with mismatched reference",
            self.predtype
        );
        let mut scope = predication.reset();
        self.scope.apply_to_predication(&mut scope);
        let reference = self.reference.as_ref().map(|selector| {
            let mut reference = predication.reset();
            selector.apply_to_predication(&mut reference);
            reference
        });

        let refs = Refs {
            scope: Some(&scope),
            reference: reference.as_ref(),
            comparison: None,
        };
        predication.apply(self, &refs);

        predication.attach(scope);
        if let Some(reference) = reference {
            predication.attach(reference);
        }
    }

    fn agreement(&self, predication: &Predication) -> Agreement {
        Agreement::of_predication(predication)
    }

    fn model(&self) -> Value {
        let mut model = json!({
            "component": "selector",
            "predtype": self.predtype.name(),
            "value": i8::from(self.value),
            "scope": self.scope.model(),
        });
        if let Some(reference) = &self.reference {
            model["reference"] = reference.model();
        }
        model
    }
}
