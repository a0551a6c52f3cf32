//! Entity type captioners: "red square", "shape", "the striped circle".

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::caption::{Attribute, AttributeType, EntityType, Evaluate};
use crate::policy::{Felicity, FelicityDraw, Vocabulary};
use crate::predication::{Predication, Refs};
use crate::world::{Entity, World};

use super::attribute::{INCORRECT_VOCABULARY, alternatives, entity_values, sample_replacement_mode};
use super::{Captioner, Choice, Mode, Sample};

/// The expressible attributes of `entity` for the given discrete types.
fn describe(entity: &Entity, types: &[AttributeType], vocabulary: &Vocabulary) -> Vec<Attribute> {
    types
        .iter()
        .flat_map(|predtype| entity_values([entity], *predtype, vocabulary))
        .collect()
}

/// Try replacing one attribute of `caption` at a time until `accept`
/// approves. Replacements never duplicate an attribute already present.
fn replace_one(
    caption: &mut EntityType,
    incorrect_mode: usize,
    vocabulary: &Vocabulary,
    predication: &Predication,
    rng: &mut dyn RngCore,
    accept: &mut dyn FnMut(&EntityType) -> bool,
) -> bool {
    let mut positions: Vec<usize> = (0..caption.len()).collect();
    positions.shuffle(rng);
    for index in positions {
        let current = caption.attributes()[index];
        for replacement in alternatives(&current, incorrect_mode, vocabulary, predication, rng) {
            if caption.contains(&replacement) {
                continue;
            }
            let mut candidate = caption.clone();
            candidate.replace(index, replacement);
            if accept(&candidate) {
                *caption = candidate;
                return true;
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Regular type
// ---------------------------------------------------------------------------

/// Describes a random agreeing entity by its attributes, optionally as a
/// hypernym (a random non-empty subset of them).
#[derive(Debug, Clone)]
pub struct RegularTypeCaptioner {
    attributes: Vec<AttributeType>,
    vocabulary: Vocabulary,
    hypernym_rate: f64,
    existing_attribute_rate: f64,
    felicity: Felicity,
}

impl RegularTypeCaptioner {
    pub fn new(attributes: Vec<AttributeType>, vocabulary: Vocabulary) -> Self {
        Self {
            attributes,
            vocabulary,
            hypernym_rate: 0.5,
            existing_attribute_rate: 0.5,
            felicity: Felicity::default(),
        }
    }

    pub fn with_hypernym_rate(mut self, rate: f64) -> Self {
        self.hypernym_rate = rate;
        self
    }

    pub fn with_existing_attribute_rate(mut self, rate: f64) -> Self {
        self.existing_attribute_rate = rate;
        self
    }

    pub fn with_felicity(mut self, felicity: Felicity) -> Self {
        self.felicity = felicity;
        self
    }

    /// Drop attributes the others already imply across the whole world,
    /// unless the draw allows pragmatical redundancy.
    fn prune(&self, attributes: Vec<Attribute>, predication: &Predication, draw: &FelicityDraw) -> Vec<Attribute> {
        let mut kept = attributes;
        if draw.pragmatical_redundancy {
            return kept;
        }
        let world = predication.reset();
        let mut index = 0;
        while index < kept.len() && kept.len() > 1 {
            let mut without = kept.clone();
            without.remove(index);
            if narrowed(&kept, &world).equals(&narrowed(&without, &world)) {
                kept = without;
            } else {
                index += 1;
            }
        }
        kept
    }
}

fn narrowed(attributes: &[Attribute], predication: &Predication) -> Predication {
    let mut narrowed = predication.copy();
    EntityType::new(attributes.to_vec()).apply_to_predication(&mut narrowed);
    narrowed
}

/// Whether the type holds for every entity of the world.
fn holds_everywhere(entity_type: &EntityType, predication: &Predication) -> bool {
    predication.reset().tautological(entity_type, &Refs::none())
}

impl Captioner for RegularTypeCaptioner {
    type Output = EntityType;

    fn name(&self) -> &'static str {
        "regular-type"
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        if predication.num_agreeing() == 0 || self.attributes.is_empty() {
            return None;
        }
        let hypernym = rng.gen_bool(self.hypernym_rate);
        let incorrect_mode = (!correct).then(|| sample_replacement_mode(self.existing_attribute_rate, rng));
        let felicity = self.felicity.draw(rng);
        Some(
            Sample::new(mode, correct, felicity, Choice::Type { hypernym })
                .with_incorrect_mode(incorrect_mode),
        )
    }

    fn caption(
        &self,
        sample: &Sample,
        predication: &mut Predication,
        _world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<EntityType> {
        let Choice::Type { hypernym } = sample.choice else {
            panic!("type captioner given a {:?} sample", sample.choice);
        };
        let target = predication.agreeing().collect::<Vec<_>>().choose(rng).copied()?;
        let mut attributes = describe(target, &self.attributes, &self.vocabulary);
        attributes.shuffle(rng);
        if hypernym && attributes.len() > 1 {
            let keep = rng.gen_range(1..attributes.len());
            attributes.truncate(keep);
        }
        let attributes = self.prune(attributes, predication, &sample.felicity);
        if attributes.is_empty() {
            return None;
        }
        let entity_type = EntityType::new(attributes);
        if !sample.felicity.logical_tautology && holds_everywhere(&entity_type, predication) {
            return None;
        }
        entity_type.apply_to_predication(predication);
        Some(entity_type)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut EntityType,
        predication: &Predication,
        _world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&EntityType) -> bool,
    ) -> bool {
        let mode = sample.incorrect_mode.unwrap_or(INCORRECT_VOCABULARY);
        replace_one(caption, mode, &self.vocabulary, predication, rng, accept)
    }

    fn incorrect_possible(&self) -> bool {
        !self.attributes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Empty type
// ---------------------------------------------------------------------------

/// The attribute-less type "shape". It cannot be made incorrect.
#[derive(Debug, Clone, Default)]
pub struct EmptyTypeCaptioner {
    felicity: Felicity,
}

impl EmptyTypeCaptioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_felicity(mut self, felicity: Felicity) -> Self {
        self.felicity = felicity;
        self
    }
}

impl Captioner for EmptyTypeCaptioner {
    type Output = EntityType;

    fn name(&self) -> &'static str {
        "empty-type"
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        if !correct || predication.num_agreeing() == 0 {
            return None;
        }
        Some(Sample::new(mode, correct, self.felicity.draw(rng), Choice::None))
    }

    fn caption(
        &self,
        _sample: &Sample,
        predication: &mut Predication,
        _world: &World,
        _rng: &mut dyn RngCore,
    ) -> Option<EntityType> {
        (predication.num_agreeing() > 0).then(EntityType::empty)
    }

    fn incorrect_with(
        &self,
        _sample: &Sample,
        _caption: &mut EntityType,
        _predication: &Predication,
        _world: &World,
        _rng: &mut dyn RngCore,
        _accept: &mut dyn FnMut(&EntityType) -> bool,
    ) -> bool {
        false
    }

    fn incorrect_possible(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Unique type
// ---------------------------------------------------------------------------

/// Adds attributes of one agreeing entity until that entity is the only
/// one left not disagreeing.
#[derive(Debug, Clone)]
pub struct UniqueTypeCaptioner {
    attributes: Vec<AttributeType>,
    vocabulary: Vocabulary,
    existing_attribute_rate: f64,
    felicity: Felicity,
}

impl UniqueTypeCaptioner {
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
}

impl Captioner for UniqueTypeCaptioner {
    type Output = EntityType;

    fn name(&self) -> &'static str {
        "unique-type"
    }

    fn sample_values(
        &self,
        mode: Mode,
        correct: bool,
        predication: &Predication,
        rng: &mut dyn RngCore,
    ) -> Option<Sample> {
        if predication.num_agreeing() == 0 || self.attributes.is_empty() {
            return None;
        }
        let incorrect_mode = (!correct).then(|| sample_replacement_mode(self.existing_attribute_rate, rng));
        let felicity = self.felicity.draw(rng);
        Some(
            Sample::new(mode, correct, felicity, Choice::Type { hypernym: false })
                .with_incorrect_mode(incorrect_mode),
        )
    }

    fn caption(
        &self,
        _sample: &Sample,
        predication: &mut Predication,
        _world: &World,
        rng: &mut dyn RngCore,
    ) -> Option<EntityType> {
        let target = predication.agreeing().collect::<Vec<_>>().choose(rng).copied()?;
        let mut attributes = describe(target, &self.attributes, &self.vocabulary);
        attributes.shuffle(rng);

        let mut entity_type = EntityType::empty();
        let mut narrowed = predication.copy();
        for attribute in attributes {
            if narrowed.num_not_disagreeing() == 1 {
                break;
            }
            if narrowed.implies(&attribute, &Refs::none()) {
                continue;
            }
            attribute.apply_to_predication(&mut narrowed);
            entity_type.push(attribute);
        }
        if narrowed.num_not_disagreeing() != 1 || entity_type.is_empty() {
            return None;
        }
        *predication = narrowed;
        Some(entity_type)
    }

    fn incorrect_with(
        &self,
        sample: &Sample,
        caption: &mut EntityType,
        predication: &Predication,
        _world: &World,
        rng: &mut dyn RngCore,
        accept: &mut dyn FnMut(&EntityType) -> bool,
    ) -> bool {
        let mode = sample.incorrect_mode.unwrap_or(INCORRECT_VOCABULARY);
        replace_one(caption, mode, &self.vocabulary, predication, rng, accept)
    }

    fn incorrect_possible(&self) -> bool {
        !self.attributes.is_empty()
    }
}
