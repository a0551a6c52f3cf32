//! Logical combinations of captions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::predication::Predication;

use super::agreement::Agreement;
use super::{Caption, Evaluate};

/// Connective discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropositionType {
    Conjunction,
    Disjunction,
    ExclusiveDisjunction,
    Implication,
    Equivalence,
}

impl PropositionType {
    pub const ALL: [PropositionType; 5] = [
        PropositionType::Conjunction,
        PropositionType::Disjunction,
        PropositionType::ExclusiveDisjunction,
        PropositionType::Implication,
        PropositionType::Equivalence,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PropositionType::Conjunction => "conjunction",
            PropositionType::Disjunction => "disjunction",
            PropositionType::ExclusiveDisjunction => "exclusive-disjunction",
            PropositionType::Implication => "implication",
            PropositionType::Equivalence => "equivalence",
        }
    }

    /// Three-valued truth of the connective over clause agreements.
    ///
    /// # Panics
    ///
    /// Panics if an implication is given anything but two clauses.
    pub fn combine(self, clauses: &[Agreement]) -> Agreement {
        match self {
            PropositionType::Conjunction => clauses.iter().copied().min().unwrap_or(Agreement::True),
            PropositionType::Disjunction => clauses.iter().copied().max().unwrap_or(Agreement::False),
            PropositionType::ExclusiveDisjunction => {
                Agreement::from_bool(clauses.iter().filter(|a| a.is_true()).count() == 1)
            }
            PropositionType::Implication => {
                let [antecedent, consequent] = clauses else {
                    panic!("implication needs exactly two clauses, got {}", clauses.len());
                };
                (-*antecedent).max(*consequent)
            }
            PropositionType::Equivalence => {
                let all_true = clauses.iter().copied().min().unwrap_or(Agreement::True);
                let all_false = clauses.iter().map(|a| -*a).min().unwrap_or(Agreement::True);
                all_true.max(all_false)
            }
        }
    }
}

impl fmt::Display for PropositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A connective over clauses, each evaluated on its own sub-predication.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposition {
    pub proptype: PropositionType,
    pub clauses: Vec<Caption>,
}

impl Proposition {
    pub fn new(proptype: PropositionType, clauses: Vec<Caption>) -> Self {
        Self { proptype, clauses }
    }

    /// Clause agreements of an applied predication.
    pub fn clause_agreements(&self, predication: &Predication) -> Vec<Agreement> {
        self.clauses
            .iter()
            .enumerate()
            .map(|(index, clause)| clause.agreement(predication.get_sub_predication(index)))
            .collect()
    }
}

impl Evaluate for Proposition {
    /// Appends one sub-predication per clause, in clause order. The outer
    /// predication is not narrowed.
    fn apply_to_predication(&self, predication: &mut Predication) {
        assert_eq!(
            predication.num_sub_predications(),
            0,
            "proposition applied to a predication that already has sub-predications"
        );
        for clause in &self.clauses {
            let child = predication.sub_predication(false);
            clause.apply_to_predication(child);
        }
    }

    fn agreement(&self, predication: &Predication) -> Agreement {
        self.proptype.combine(&self.clause_agreements(predication))
    }

    fn model(&self) -> Value {
        json!({
            "component": "proposition",
            "proptype": self.proptype.name(),
            "clauses": self.clauses.iter().map(Evaluate::model).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::attribute::{Attribute, EntityType};
    use crate::caption::existential::Existential;
    use crate::caption::relation::Relation;
    use crate::world::tests::world;
    use crate::world::{ColorName, ShapeKind, World};

    use crate::caption::agreement::Agreement::{False as F, True as T, Unknown as U};

    #[test]
    fn conjunction_and_disjunction() {
        assert_eq!(PropositionType::Conjunction.combine(&[T, U]), U);
        assert_eq!(PropositionType::Conjunction.combine(&[T, F]), F);
        assert_eq!(PropositionType::Disjunction.combine(&[F, U]), U);
        assert_eq!(PropositionType::Disjunction.combine(&[F, T]), T);
    }

    #[test]
    fn exclusive_disjunction() {
        assert_eq!(PropositionType::ExclusiveDisjunction.combine(&[T, F]), T);
        assert_eq!(PropositionType::ExclusiveDisjunction.combine(&[T, T]), F);
        assert_eq!(PropositionType::ExclusiveDisjunction.combine(&[F, F]), F);
        assert_eq!(PropositionType::ExclusiveDisjunction.combine(&[T, U]), T);
        assert_eq!(PropositionType::ExclusiveDisjunction.combine(&[U, U]), F);
    }

    #[test]
    fn implication_is_not_a_or_b() {
        let imp = PropositionType::Implication;
        assert_eq!(imp.combine(&[T, T]), T);
        assert_eq!(imp.combine(&[T, F]), F);
        assert_eq!(imp.combine(&[F, F]), T);
        assert_eq!(imp.combine(&[F, T]), T);
        assert_eq!(imp.combine(&[U, T]), T);
        assert_eq!(imp.combine(&[T, U]), U);
    }

    #[test]
    fn equivalence() {
        let eq = PropositionType::Equivalence;
        assert_eq!(eq.combine(&[T, T]), T);
        assert_eq!(eq.combine(&[F, F]), T);
        assert_eq!(eq.combine(&[T, F]), F);
        assert_eq!(eq.combine(&[U, T]), U);
    }

    fn scene() -> World {
        world(&[
            (ShapeKind::Square, ColorName::Red, 0.2, 0.2),
            (ShapeKind::Circle, ColorName::Blue, 0.8, 0.8),
        ])
    }

    fn exists(shape: ShapeKind, color: ColorName) -> Caption {
        Existential::new(
            EntityType::new(vec![Attribute::Shape(shape)]),
            Relation::attribute(Attribute::Color(color)),
        )
        .into()
    }

    #[test]
    fn clauses_evaluate_independently() {
        let p = Predication::new(&scene());
        let both = Proposition::new(
            PropositionType::Conjunction,
            vec![
                exists(ShapeKind::Square, ColorName::Red),
                exists(ShapeKind::Circle, ColorName::Blue),
            ],
        );
        assert_eq!(both.evaluate_on(&p), T);

        let mut applied = p.copy();
        both.apply_to_predication(&mut applied);
        assert_eq!(applied.num_sub_predications(), 2);
        assert!(applied.is_unconstrained());
        assert_eq!(both.clause_agreements(&applied), vec![T, T]);
    }

    #[test]
    fn false_antecedent_makes_implication_true() {
        let p = Predication::new(&scene());
        let implication = Proposition::new(
            PropositionType::Implication,
            vec![
                exists(ShapeKind::Square, ColorName::Blue),
                exists(ShapeKind::Circle, ColorName::Red),
            ],
        );
        assert_eq!(implication.evaluate_on(&p), T);
    }

    #[test]
    fn model_lists_clauses() {
        let model = Proposition::new(
            PropositionType::ExclusiveDisjunction,
            vec![exists(ShapeKind::Square, ColorName::Red)],
        )
        .model();
        assert_eq!(model["proptype"], "exclusive-disjunction");
        assert_eq!(model["clauses"][0]["component"], "existential");
    }
}
