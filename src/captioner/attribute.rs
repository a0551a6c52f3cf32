//! Attribute captioner: "red", "square", "the leftmost".

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::caption::{Agreement, Attribute, AttributeType, Direction, Evaluate};
use crate::policy::{Felicity, FelicityDraw, Vocabulary};
use crate::predication::{Predication, Refs};
use crate::world::{Entity, World};

use super::{Captioner, Choice, Mode, Sample, accept_first};

/// Incorrect mode: replace the value by any other vocabulary value.
pub const INCORRECT_VOCABULARY: usize = 0;
/// Incorrect mode: replace the value by another value present in the world.
pub const INCORRECT_EXISTING: usize = 1;

// ---------------------------------------------------------------------------
// Value helpers shared with the type captioners
// ---------------------------------------------------------------------------

/// Every expressible attribute of a discrete type.
pub(crate) fn vocabulary_values(vocabulary: &Vocabulary, predtype: AttributeType) -> Vec<Attribute> {
    match predtype {
        AttributeType::Shape => vocabulary.shapes.iter().copied().map(Attribute::Shape).collect(),
        AttributeType::Color => vocabulary.colors.iter().copied().map(Attribute::Color).collect(),
        AttributeType::Texture => vocabulary.textures.iter().copied().map(Attribute::Texture).collect(),
        _ => Vec::new(),
    }
}

/// Distinct expressible attributes of a discrete type held by `entities`,
/// in first-seen order.
pub(crate) fn entity_values<'a>(
    entities: impl IntoIterator<Item = &'a Entity>,
    predtype: AttributeType,
    vocabulary: &Vocabulary,
) -> Vec<Attribute> {
    let expressible = vocabulary_values(vocabulary, predtype);
    let mut values = Vec::new();
    for entity in entities {
        if let Some(value) = predtype.of_entity(entity) {
            if expressible.contains(&value) && !values.contains(&value) {
                values.push(value);
            }
        }
    }
    values
}

/// Replacement candidates for `current` under an incorrect mode, shuffled.
pub(crate) fn alternatives(
    current: &Attribute,
    incorrect_mode: usize,
    vocabulary: &Vocabulary,
    predication: &Predication,
    rng: &mut dyn RngCore,
) -> Vec<Attribute> {
    if current.direction().is_some() {
        return vec![current.flipped()];
    }
    let predtype = current.predtype();
    let mut values = match incorrect_mode {
        INCORRECT_EXISTING => entity_values(predication.entities(), predtype, vocabulary),
        _ => vocabulary_values(vocabulary, predtype),
    };
    values.retain(|value| value != current);
    values.shuffle(rng);
    values
}

/// Draw between the vocabulary and existing-value incorrect modes.
pub(crate) fn sample_replacement_mode(existing_attribute_rate: f64, rng: &mut dyn RngCore) -> usize {
    if rng.gen_bool(existing_attribute_rate) {
        INCORRECT_EXISTING
    } else {
        INCORRECT_VOCABULARY
    }
}

// ---------------------------------------------------------------------------
// Captioner
// ---------------------------------------------------------------------------

/// Picks one attribute that holds for some agreeing entity.
#[derive(Debug, Clone)]
pub struct AttributeCaptioner {
    attributes: Vec<AttributeType>,
    vocabulary: Vocabulary,
    existing_attribute_rate: f64,
    felicity: Felicity,
}

impl AttributeCaptioner {
    pub fn new(attributes: Vec<AttributeType>, vocabulary: Vocabulary) -> Self {
        Self {
            attributes,
            vocabulary,
            existing_attribute_rate: 0.5,
            felicity: Felicity::default(),
        }
    }

    pub fn with_existing_attribute_rate(mut self, rate: f64) -> Self {
        self.existing_attribute_rate = rate;
        self
    }

    pub fn with_felicity(mut self, felicity: Felicity) -> Self {
        self.felicity = felicity;
        self
    }

    pub fn attribute_types(&self) -> &[AttributeType] {
        &self.attributes
    }

    fn felicitous(&self, attribute: &Attribute, predication: &Predication, draw: &FelicityDraw) -> bool {
        draw.logical_tautology || !predication.tautological(attribute, &Refs::none())
    }
}

impl Captioner for AttributeCaptioner {
    type Output = Attribute;

    fn name(&self) -> &'static str {
        "attribute"
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        if predication.num_agreeing() == 0 {
            return None;
        }
        let predtype = *self.attributes.choose(rng)?;
        let incorrect_mode = (!correct).then(|| {
            if predtype.is_extremal() {
                INCORRECT_VOCABULARY
            } else {
                sample_replacement_mode(self.existing_attribute_rate, rng)
            }
        });
        let felicity = self.felicity.draw(rng);
        Some(
            Sample::new(mode, correct, felicity, Choice::Attribute { predtype })
                .with_incorrect_mode(incorrect_mode),
        )
    }

    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        _world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<Attribute> {
        let Choice::Attribute { predtype } = sample.choice else {
            panic!("attribute captioner given a {:?} sample", sample.choice);
        };
        let mut candidates = if predtype.is_extremal() {
            Direction::BOTH
                .iter()
                .filter_map(|direction| predtype.extremal(*direction))
                .filter(|attribute| attribute.evaluate_on(predication) == Agreement::True)
                .collect::<Vec<_>>()
        } else {
            entity_values(predication.agreeing(), predtype, &self.vocabulary)
        };
        candidates.shuffle(rng);
        let attribute = candidates
            .into_iter()
            .find(|attribute| self.felicitous(attribute, predication, &sample.felicity))?;
        attribute.apply_to_predication(predication);
        Some(attribute)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut Attribute,
        predication: &Predication,
        _world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&Attribute) -> bool,
    ) -> bool {
        let mode = sample.incorrect_mode.unwrap_or(INCORRECT_VOCABULARY);
        let candidates = alternatives(caption, mode, &self.vocabulary, predication, rng);
        accept_first(caption, candidates, accept)
    }

    fn incorrect_possible(&self) -> bool {
        !self.attributes.is_empty()
    }
}
