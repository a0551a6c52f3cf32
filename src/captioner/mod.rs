//! Captioners: stochastic construction of captions with a known truth value.
//!
//! A captioner mirrors one grammar production and owns the captioners of
//! its children, forming a read-only policy tree shared by every generation
//! thread. All per-attempt choices live in a [`Sample`] value produced by
//! [`Captioner::sample_values`] and threaded through the later calls:
//!
//! 1. `sample_values` draws the node's parameters top-down (which attribute,
//!    quantifier, incorrect mode) and recurses into the children.
//! 2. `caption` builds a *correct* node bottom-up against the predication
//!    inherited from its ancestors, and narrows that predication.
//! 3. `incorrect` (or `incorrect_with` when a parent judges the result)
//!    mutates a correct node into one that is provably false.
//!
//! Every step may fail with `None`/`false`; the enclosing [`retry`] loop
//! then tries again with fresh random choices.

pub mod attribute;
pub mod config;
pub mod connective;
pub mod existential;
pub mod mixer;
pub mod quantifier;
pub mod relation;
pub mod selector;
pub mod types;

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::caption::{
    Agreement, Attribute, AttributeType, Caption, ComparativeQuantifier, EntityType, Evaluate,
    Existential, NumberBound, Proposition, Quantifier, Reference, RelationType, Selector,
    SelectorType,
};
use crate::policy::FelicityDraw;
use crate::predication::Predication;
use crate::world::World;

pub use attribute::AttributeCaptioner;
pub use connective::ConnectiveCaptioner;
pub use existential::ExistentialCaptioner;
pub use mixer::CaptionerMixer;
pub use quantifier::{
    ComparativeQuantifierCaptioner, NumberBoundCaptioner, QuantifierCaptioner, QuantifierSpec,
};
pub use relation::{AttributeRelationCaptioner, RelationCaptioner, TypeRelationCaptioner};
pub use selector::SelectorCaptioner;
pub use types::{EmptyTypeCaptioner, RegularTypeCaptioner, UniqueTypeCaptioner};

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// Run `attempt` up to `budget` times, returning the first success.
///
/// The attempt index is passed for tracing.
pub fn retry<T>(budget: usize, mut attempt: impl FnMut(usize) -> Option<T>) -> Option<T> {
    (0..budget).find_map(|index| attempt(index))
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Dataset split a caption is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Train,
    Validation,
    Test,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Validation => "validation",
            Mode::Test => "test",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Mode::Train),
            "validation" => Ok(Mode::Validation),
            "test" => Ok(Mode::Test),
            other => Err(format!("unknown mode \"{other}\" (expected train, validation or test)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

/// Parameters chosen by a captioner for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "choice", rename_all = "kebab-case")]
pub enum Choice {
    None,
    Attribute { predtype: AttributeType },
    Type { hypernym: bool },
    Selector { predtype: SelectorType },
    Relation { predtype: RelationType },
    /// `anchored` restrictors describe an entity the body holds for.
    Quantifier { spec: QuantifierSpec, anchored: bool },
    Mixer { index: usize },
    Connective { base: [bool; 2], target: [bool; 2] },
}

/// Per-attempt scratch context: everything a captioner decided in
/// `sample_values`, plus the samples of its children in a fixed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub mode: Mode,
    pub correct: bool,
    /// Which incorrect mutation to apply, when `correct` is false.
    pub incorrect_mode: Option<usize>,
    pub felicity: FelicityDraw,
    pub choice: Choice,
    pub children: Vec<Sample>,
}

impl Sample {
    pub fn new(mode: Mode, correct: bool, felicity: FelicityDraw, choice: Choice) -> Self {
        Self {
            mode,
            correct,
            incorrect_mode: None,
            felicity,
            choice,
            children: Vec::new(),
        }
    }

    pub fn with_incorrect_mode(mut self, incorrect_mode: Option<usize>) -> Self {
        self.incorrect_mode = incorrect_mode;
        self
    }

    pub fn with_child(mut self, child: Sample) -> Self {
        self.children.push(child);
        self
    }

    /// The child sample at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the captioner did not record a child at that position.
    #[track_caller]
    pub fn child(&self, index: usize) -> &Sample {
        match self.children.get(index) {
            Some(child) => child,
            None => panic!(
                "child sample {index} requested but only {} recorded",
                self.children.len()
            ),
        }
    }
}

/// Draw an incorrect mode from `weights`, ignoring modes marked impossible.
///
/// Returns `None` if no possible mode has positive weight.
pub fn sample_incorrect_mode(
    weights: &[f64],
    possible: &[bool],
    rng: &mut dyn RngCore,
) -> Option<usize> {
    let masked: Vec<f64> = weights
        .iter()
        .zip(possible)
        .map(|(weight, possible)| if *possible { *weight } else { 0.0 })
        .collect();
    let distribution = WeightedIndex::new(&masked).ok()?;
    Some(distribution.sample(rng))
}

// ---------------------------------------------------------------------------
// Captioner trait
// ---------------------------------------------------------------------------

/// One grammar production's sampler and mutator.
///
/// Implementations hold policy only; everything chosen for one attempt is
/// carried by the [`Sample`].
pub trait Captioner: Send + Sync {
    type Output: Evaluate + Clone + fmt::Debug;

    /// Component name used in model exports.
    fn name(&self) -> &'static str;

    /// Choose this node's parameters for an attempt against `predication`,
    /// which carries the narrowing inherited from ancestor captioners.
    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample>;

    /// Build a correct node from `sample` and narrow `predication` by it.
    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<Self::Output>;

    /// Try mutations of `caption` until `accept` approves one, then keep
    /// it. `predication` is the state `caption` was built against.
    ///
    /// Returns false, leaving `caption` untouched, if no mutation passes.
    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut Self::Output,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&Self::Output) -> bool,
    ) -> bool;

    /// Mutate `caption` so that it is provably false on `predication`.
    fn incorrect(
        &self,
        sample: &Sample,
        caption: &mut Self::Output,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
    ) -> bool {
        self.incorrect_with(sample, caption, predication, world, rng, &mut |candidate| {
            candidate.evaluate_on(predication) == Agreement::False
        })
    }

    /// Whether this captioner can produce an incorrect caption at all.
    fn incorrect_possible(&self) -> bool;

    /// Serializable snapshot of the sampled parameters.
    fn model(&self, sample: &Sample) -> Value {
        json!({
            "component": self.name(),
            "mode": sample.mode,
            "correct": sample.correct,
            "incorrect_mode": sample.incorrect_mode,
            "choice": sample.choice,
        })
    }
}

/// Captioner producing `T`, boxed for composition.
pub type BoxedCaptioner<T> = Box<dyn Captioner<Output = T>>;

/// Model export of a composite captioner: its own fields plus the models
/// of its children under `children`.
pub(crate) fn composite_model<T: Captioner + ?Sized>(
    captioner: &T,
    sample: &Sample,
    children: Vec<Value>,
) -> Value {
    let mut model = json!({
        "component": captioner.name(),
        "mode": sample.mode,
        "correct": sample.correct,
        "incorrect_mode": sample.incorrect_mode,
        "choice": sample.choice,
    });
    model["children"] = Value::Array(children);
    model
}

// ---------------------------------------------------------------------------
// Node kinds and adaptors
// ---------------------------------------------------------------------------

/// Caption nodes that can be stored in a [`Reference`].
pub trait ReferenceKind: Evaluate + Clone + fmt::Debug + Send + Sync + 'static {
    fn wrap(self) -> Reference;

    /// # Panics
    ///
    /// Panics if `reference` holds another node kind.
    fn unwrap_mut(reference: &mut Reference) -> &mut Self;
}

impl ReferenceKind for Attribute {
    fn wrap(self) -> Reference {
        Reference::Attribute(self)
    }

    fn unwrap_mut(reference: &mut Reference) -> &mut Self {
        match reference {
            Reference::Attribute(node) => node,
            other => panic!("expected an attribute reference, got {other:?}"),
        }
    }
}

impl ReferenceKind for EntityType {
    fn wrap(self) -> Reference {
        Reference::Type(self)
    }

    fn unwrap_mut(reference: &mut Reference) -> &mut Self {
        match reference {
            Reference::Type(node) => node,
            other => panic!("expected a type reference, got {other:?}"),
        }
    }
}

impl ReferenceKind for Selector {
    fn wrap(self) -> Reference {
        Reference::Selector(self)
    }

    fn unwrap_mut(reference: &mut Reference) -> &mut Self {
        match reference {
            Reference::Selector(node) => node,
            other => panic!("expected a selector reference, got {other:?}"),
        }
    }
}

/// Caption nodes that can stand as a sentence.
pub trait CaptionKind: Evaluate + Clone + fmt::Debug + Into<Caption> + Send + Sync + 'static {
    /// # Panics
    ///
    /// Panics if `caption` holds another node kind.
    fn unwrap_mut(caption: &mut Caption) -> &mut Self;
}

macro_rules! caption_kind {
    ($($variant:ident),* $(,)?) => {
        $(
            impl CaptionKind for $variant {
                fn unwrap_mut(caption: &mut Caption) -> &mut Self {
                    match caption {
                        Caption::$variant(node) => node,
                        other => panic!(
                            concat!("expected ", stringify!($variant), " caption, got {}"),
                            other.component()
                        ),
                    }
                }
            }
        )*
    };
}

caption_kind!(Existential, Quantifier, NumberBound, ComparativeQuantifier, Proposition);

/// Adapts a captioner of a reference-capable node into a captioner of
/// [`Reference`]s, so relations can take types or selectors alike.
pub struct AsReference<T: ReferenceKind> {
    inner: BoxedCaptioner<T>,
}

impl<T: ReferenceKind> AsReference<T> {
    pub fn new(inner: BoxedCaptioner<T>) -> Self {
        Self { inner }
    }
}

impl<T: ReferenceKind> Captioner for AsReference<T> {
    type Output = Reference;

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        self.inner.sample_values(mode, correct, predication, rng)
    }

    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<Reference> {
        self.inner
            .caption(sample, predication, world, rng)
            .map(ReferenceKind::wrap)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut Reference,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&Reference) -> bool,
    ) -> bool {
        let node = T::unwrap_mut(caption);
        self.inner
            .incorrect_with(sample, node, predication, world, rng, &mut |candidate: &T| {
                accept(&candidate.clone().wrap())
            })
    }

    fn incorrect_possible(&self) -> bool {
        self.inner.incorrect_possible()
    }

    fn model(&self, sample: &Sample) -> Value {
        self.inner.model(sample)
    }
}

/// Adapts a sentence-level captioner into a captioner of [`Caption`]s, so
/// mixers and connectives can combine different sentence kinds.
pub struct AsCaption<T: CaptionKind> {
    inner: BoxedCaptioner<T>,
}

impl<T: CaptionKind> AsCaption<T> {
    pub fn new(inner: BoxedCaptioner<T>) -> Self {
        Self { inner }
    }
}

impl<T: CaptionKind> Captioner for AsCaption<T> {
    type Output = Caption;

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        self.inner.sample_values(mode, correct, predication, rng)
    }

    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<Caption> {
        self.inner
            .caption(sample, predication, world, rng)
            .map(Into::into)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut Caption,
        predication: &Predication,
        world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&Caption) -> bool,
    ) -> bool {
        let node = T::unwrap_mut(caption);
        self.inner
            .incorrect_with(sample, node, predication, world, rng, &mut |candidate: &T| {
                accept(&candidate.clone().into())
            })
    }

    fn incorrect_possible(&self) -> bool {
        self.inner.incorrect_possible()
    }

    fn model(&self, sample: &Sample) -> Value {
        self.inner.model(sample)
    }
}

/// Keep the first candidate `accept` approves.
pub(crate) fn accept_first<T: Clone>(
    caption: &mut T,
    candidates: impl IntoIterator<Item = T>,
    accept: &mut dyn FnMut(&T) -> bool,
) -> bool {
    for candidate in candidates {
        if accept(&candidate) {
            *caption = candidate;
            return true;
        }
    }
    false
}
