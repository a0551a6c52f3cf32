//! Ternary agreement values.

use std::fmt;
use std::ops::Neg;

use serde::{Deserialize, Serialize};

use crate::predication::Predication;

/// Result of evaluating a caption: definitely false, undetermined, or
/// definitely true.
///
/// Ordered `False < Unknown < True`, so conjunction is `min` and
/// disjunction is `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub enum Agreement {
    False,
    Unknown,
    True,
}

impl Agreement {
    /// Predicate-style agreement of a narrowed predication: true if any
    /// entity still agrees, false if every entity disagrees, else unknown.
    pub fn of_predication(predication: &Predication) -> Self {
        if predication.num_agreeing() > 0 {
            Agreement::True
        } else if predication.num_not_disagreeing() == 0 {
            Agreement::False
        } else {
            Agreement::Unknown
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value { Agreement::True } else { Agreement::False }
    }

    pub fn value(self) -> f64 {
        match self {
            Agreement::False => -1.0,
            Agreement::Unknown => 0.0,
            Agreement::True => 1.0,
        }
    }

    pub fn is_true(self) -> bool {
        self == Agreement::True
    }

    pub fn is_false(self) -> bool {
        self == Agreement::False
    }

    /// Whether the value is definite.
    pub fn is_known(self) -> bool {
        self != Agreement::Unknown
    }
}

impl Neg for Agreement {
    type Output = Agreement;

    fn neg(self) -> Agreement {
        match self {
            Agreement::False => Agreement::True,
            Agreement::Unknown => Agreement::Unknown,
            Agreement::True => Agreement::False,
        }
    }
}

impl From<Agreement> for f64 {
    fn from(agreement: Agreement) -> f64 {
        agreement.value()
    }
}

impl TryFrom<f64> for Agreement {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value == 1.0 {
            Ok(Agreement::True)
        } else if value == 0.0 {
            Ok(Agreement::Unknown)
        } else if value == -1.0 {
            Ok(Agreement::False)
        } else {
            Err(format!("agreement must be -1, 0 or 1, got {value}"))
        }
    }
}

impl fmt::Display for Agreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}
