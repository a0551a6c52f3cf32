//! Quantified captions: "most squares are red", "of the three circles,
//! two are left of a triangle", "more squares than circles are blue".
//!
//! All three nodes append their sub-predications at fixed positions and
//! read them back by position in `agreement`, so they must be applied to a
//! predication that has no sub-predications of its own yet.

use serde_json::{Value, json};

use crate::predication::Predication;

use super::Evaluate;
use super::agreement::Agreement;
use super::attribute::EntityType;
use super::interval::{self, Interval, QuantifierRange, QuantifierType};
use super::relation::Relation;

#[track_caller]
fn assert_unnested(predication: &Predication, component: &str) {
    assert_eq!(
        predication.num_sub_predications(),
        0,
        "{component} applied to a predication that already has sub-predications"
    );
}

// ---------------------------------------------------------------------------
// Quantifier
// ---------------------------------------------------------------------------

/// `<qrange> <quantity> <restrictor> <body>`.
///
/// Sub-predications: restrictor (0), restrictor and body (1). The outer
/// predication is not narrowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantifier {
    pub qtype: QuantifierType,
    pub qrange: QuantifierRange,
    /// Count (negative counts from the end) or fraction.
    pub quantity: f64,
    pub restrictor: EntityType,
    pub body: Relation,
}

impl Quantifier {
    pub fn new(
        qtype: QuantifierType,
        qrange: QuantifierRange,
        quantity: f64,
        restrictor: EntityType,
        body: Relation,
    ) -> Self {
        Self {
            qtype,
            qrange,
            quantity,
            restrictor,
            body,
        }
    }

    /// Restrictor and restrictor-and-body count intervals of an applied
    /// predication.
    pub fn counts(predication: &Predication) -> (Interval, Interval) {
        (
            Interval::count_of(predication.get_sub_predication(0)),
            Interval::count_of(predication.get_sub_predication(1)),
        )
    }

    /// Agreement for given count intervals.
    pub fn agreement_for(&self, restrictor: Interval, body: Interval, predication: &Predication) -> Agreement {
        let tolerances = predication.tolerances();
        match self.qtype {
            QuantifierType::Count => interval::get_agreement(
                self.qtype,
                self.qrange,
                body,
                interval::target(self.qtype, self.quantity, restrictor),
                tolerances,
            ),
            QuantifierType::Ratio => interval::get_agreement(
                self.qtype,
                self.qrange,
                Interval::ratio(restrictor, body),
                Interval::point(self.quantity),
                tolerances,
            ),
        }
    }
}

impl Evaluate for Quantifier {
    fn apply_to_predication(&self, predication: &mut Predication) {
        assert_unnested(predication, "quantifier");
        let restrictor = predication.sub_predication(false);
        self.restrictor.apply_to_predication(restrictor);
        let body = predication.sub_predication(false);
        self.restrictor.apply_to_predication(body);
        self.body.apply_to_predication(body);
    }

    fn agreement(&self, predication: &Predication) -> Agreement {
        let (restrictor, body) = Self::counts(predication);
        self.agreement_for(restrictor, body, predication)
    }

    fn model(&self) -> Value {
        json!({
            "component": "quantifier",
            "qtype": self.qtype,
            "qrange": self.qrange,
            "quantity": self.quantity,
            "restrictor": self.restrictor.model(),
            "body": self.body.model(),
        })
    }
}

// ---------------------------------------------------------------------------
// Number bound
// ---------------------------------------------------------------------------

/// "Of the `<bound>` `<restrictor>`, `<quantifier>`".
///
/// Shares the quantifier's sub-predications. The caption is false when the
/// bound lies outside the possible restrictor counts, and true only once the
/// agreeing restrictor count equals the bound.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberBound {
    pub bound: u32,
    pub quantifier: Quantifier,
}

impl NumberBound {
    pub fn new(bound: u32, quantifier: Quantifier) -> Self {
        Self { bound, quantifier }
    }
}

impl Evaluate for NumberBound {
    fn apply_to_predication(&self, predication: &mut Predication) {
        self.quantifier.apply_to_predication(predication);
    }

    fn agreement(&self, predication: &Predication) -> Agreement {
        let (restrictor, body) = Quantifier::counts(predication);
        let bound = f64::from(self.bound);
        if bound < restrictor.lower || bound > restrictor.upper {
            return Agreement::False;
        }
        match self.quantifier.agreement_for(restrictor, body, predication) {
            Agreement::True if restrictor.lower == bound => Agreement::True,
            Agreement::True => Agreement::Unknown,
            other => other,
        }
    }

    fn model(&self) -> Value {
        json!({
            "component": "number-bound",
            "bound": self.bound,
            "quantifier": self.quantifier.model(),
        })
    }
}

// ---------------------------------------------------------------------------
// Comparative quantifier
// ---------------------------------------------------------------------------

/// Compares how many (count) or what fraction (ratio) of the restrictor
/// and of the comparison satisfy the body.
///
/// Sub-predications: restrictor (0), comparison (1), restrictor and body
/// (2), comparison and body (3). The compared value is the difference
/// restrictor minus comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparativeQuantifier {
    pub qtype: QuantifierType,
    pub qrange: QuantifierRange,
    pub quantity: f64,
    pub restrictor: EntityType,
    pub comparison: EntityType,
    pub body: Relation,
}

impl ComparativeQuantifier {
    /// The difference interval of an applied predication.
    pub fn difference(&self, predication: &Predication) -> Interval {
        let restrictor = Interval::count_of(predication.get_sub_predication(0));
        let comparison = Interval::count_of(predication.get_sub_predication(1));
        let restrictor_body = Interval::count_of(predication.get_sub_predication(2));
        let comparison_body = Interval::count_of(predication.get_sub_predication(3));
        match self.qtype {
            QuantifierType::Count => restrictor_body.difference(comparison_body),
            QuantifierType::Ratio => Interval::ratio(restrictor, restrictor_body)
                .difference(Interval::ratio(comparison, comparison_body)),
        }
    }
}

impl Evaluate for ComparativeQuantifier {
    fn apply_to_predication(&self, predication: &mut Predication) {
        assert_unnested(predication, "comparative quantifier");
        let restrictor = predication.sub_predication(false);
        self.restrictor.apply_to_predication(restrictor);
        let comparison = predication.sub_predication(false);
        self.comparison.apply_to_predication(comparison);
        let restrictor_body = predication.sub_predication(false);
        self.restrictor.apply_to_predication(restrictor_body);
        self.body.apply_to_predication(restrictor_body);
        let comparison_body = predication.sub_predication(false);
        self.comparison.apply_to_predication(comparison_body);
        self.body.apply_to_predication(comparison_body);
    }

    fn agreement(&self, predication: &Predication) -> Agreement {
        interval::get_agreement(
            self.qtype,
            self.qrange,
            self.difference(predication),
            Interval::point(self.quantity),
            predication.tolerances(),
        )
    }

    fn model(&self) -> Value {
        json!({
            "component": "comparative-quantifier",
            "qtype": self.qtype,
            "qrange": self.qrange,
            "quantity": self.quantity,
            "restrictor": self.restrictor.model(),
            "comparison": self.comparison.model(),
            "body": self.body.model(),
        })
    }
}
