//! Interval arithmetic for quantified captions.
//!
//! With ambiguous entities around, "how many X are Y" is not a number but a
//! range: at least the agreeing count, at most the not-disagreeing count.
//! Comparisons against a quantity therefore have three outcomes. They are
//! true only when the whole interval lies on the satisfying side, false only
//! when it lies entirely on the failing side, and unknown when it straddles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::policy::Tolerances;
use crate::predication::Predication;

use super::agreement::Agreement;

// ---------------------------------------------------------------------------
// Discriminants
// ---------------------------------------------------------------------------

/// Absolute counts or fractions of the restrictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuantifierType {
    Count,
    Ratio,
}

/// Comparison applied between the counted interval and the quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuantifierRange {
    Lt,
    Leq,
    Eq,
    Neq,
    Geq,
    Gt,
}

impl QuantifierRange {
    pub const ALL: [QuantifierRange; 6] = [
        QuantifierRange::Lt,
        QuantifierRange::Leq,
        QuantifierRange::Eq,
        QuantifierRange::Neq,
        QuantifierRange::Geq,
        QuantifierRange::Gt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            QuantifierRange::Lt => "lt",
            QuantifierRange::Leq => "leq",
            QuantifierRange::Eq => "eq",
            QuantifierRange::Neq => "neq",
            QuantifierRange::Geq => "geq",
            QuantifierRange::Gt => "gt",
        }
    }
}

impl fmt::Display for QuantifierRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Interval
// ---------------------------------------------------------------------------

/// Closed interval `[lower, upper]` of possible values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub fn new(lower: f64, upper: f64) -> Self {
        debug_assert!(lower <= upper, "interval [{lower}, {upper}] is inverted");
        Self { lower, upper }
    }

    pub fn point(value: f64) -> Self {
        Self::new(value, value)
    }

    /// `[agreeing, not-disagreeing]` count of a narrowed predication.
    pub fn count_of(predication: &Predication) -> Self {
        Self::new(
            predication.num_agreeing() as f64,
            predication.num_not_disagreeing() as f64,
        )
    }

    /// Possible fractions of `body` within `restrictor`, where the body
    /// count interval is taken over restrictor-and-body entities.
    ///
    /// An empty restrictor yields `[0, 0]`.
    pub fn ratio(restrictor: Interval, body: Interval) -> Self {
        if restrictor.upper == 0.0 {
            return Self::point(0.0);
        }
        let lower = body.lower / restrictor.upper;
        let denominator = restrictor.lower.max(body.upper);
        let upper = if denominator == 0.0 { 0.0 } else { body.upper / denominator };
        Self::new(lower, upper.max(lower))
    }

    /// Possible values of `self - other`.
    pub fn difference(self, other: Interval) -> Self {
        Self::new(self.lower - other.upper, self.upper - other.lower)
    }

    pub fn is_point(&self) -> bool {
        self.lower == self.upper
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

// ---------------------------------------------------------------------------
// Targets and comparison
// ---------------------------------------------------------------------------

/// Effective target interval of a quantity for a given restrictor count.
///
/// Negative count quantities count from the end of the restrictor:
/// `-1` is "all", `-2` is "all but one". The offset is derived for each
/// restrictor endpoint separately, giving
/// `[quantity + lower + 1, quantity + upper + 1]`.
pub fn target(qtype: QuantifierType, quantity: f64, restrictor: Interval) -> Interval {
    if qtype == QuantifierType::Count && quantity < 0.0 {
        Interval::new(
            (quantity + restrictor.lower + 1.0).max(0.0),
            (quantity + restrictor.upper + 1.0).max(0.0),
        )
    } else {
        Interval::point(quantity)
    }
}

/// Compare `value` against `target` under `qrange`.
///
/// Counts use exact equality for `eq`/`neq`. Ratios are true within
/// `ratio_epsilon` of the target and false only beyond `min_quantifier`.
pub fn get_agreement(
    qtype: QuantifierType,
    qrange: QuantifierRange,
    value: Interval,
    target: Interval,
    tolerances: &Tolerances,
) -> Agreement {
    let (lower, upper) = (value.lower, value.upper);
    let (t_lower, t_upper) = (target.lower, target.upper);
    let decide = |satisfied: bool, failed: bool| {
        debug_assert!(!(satisfied && failed));
        if satisfied {
            Agreement::True
        } else if failed {
            Agreement::False
        } else {
            Agreement::Unknown
        }
    };

    match qrange {
        QuantifierRange::Lt => decide(upper < t_lower, lower >= t_upper),
        QuantifierRange::Leq => decide(upper <= t_lower, lower > t_upper),
        QuantifierRange::Gt => decide(lower > t_upper, upper <= t_lower),
        QuantifierRange::Geq => decide(lower >= t_upper, upper < t_lower),
        QuantifierRange::Eq => equality(qtype, value, target, tolerances),
        QuantifierRange::Neq => -equality(qtype, value, target, tolerances),
    }
}

fn equality(
    qtype: QuantifierType,
    value: Interval,
    target: Interval,
    tolerances: &Tolerances,
) -> Agreement {
    match qtype {
        QuantifierType::Count => {
            if value.is_point() && target.is_point() && value.lower == target.lower {
                Agreement::True
            } else if value.upper < target.lower || value.lower > target.upper {
                Agreement::False
            } else {
                Agreement::Unknown
            }
        }
        QuantifierType::Ratio => {
            let epsilon = tolerances.ratio_epsilon;
            let margin = tolerances.min_quantifier;
            if value.lower >= target.lower - epsilon && value.upper <= target.upper + epsilon {
                Agreement::True
            } else if value.upper <= target.lower - margin || value.lower >= target.upper + margin {
                Agreement::False
            } else {
                Agreement::Unknown
            }
        }
    }
}
