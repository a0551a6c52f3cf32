//! "There is a <restrictor> that <body>".

use serde_json::{Value, json};

use crate::predication::Predication;

use super::Evaluate;
use super::agreement::Agreement;
use super::attribute::EntityType;
use super::relation::Relation;

/// Existential caption node.
#[derive(Debug, Clone, PartialEq)]
pub struct Existential {
    pub restrictor: EntityType,
    pub body: Relation,
}

impl Existential {
    pub fn new(restrictor: EntityType, body: Relation) -> Self {
        Self { restrictor, body }
    }
}

impl Evaluate for Existential {
    /// Appends the restrictor-only and body-only predications, then narrows
    /// the predication itself by the restrictor followed by the body.
    fn apply_to_predication(&self, predication: &mut Predication) {
        let restrictor = predication.sub_predication(false);
        self.restrictor.apply_to_predication(restrictor);
        let body = predication.sub_predication(false);
        self.body.apply_to_predication(body);

        self.restrictor.apply_to_predication(predication);
        self.body.apply_to_predication(predication);
    }

    fn agreement(&self, predication: &Predication) -> Agreement {
        Agreement::of_predication(predication)
    }

    fn model(&self) -> Value {
        json!({
            "component": "existential",
            "restrictor": self.restrictor.model(),
            "body": self.body.model(),
        })
    }
}
