//! Declarative captioner trees.
//!
//! Each grammar category has its own internally tagged enum, so a tree
//! that puts a sentence where a type belongs fails to parse instead of
//! failing at generation time:
//!
//! ```toml
//! component = "existential"
//!
//! [restrictor]
//! component = "regular-type"
//! attributes = ["shape", "color"]
//!
//! [body]
//! component = "relation"
//! relations = ["x-rel", "y-rel"]
//! reference = { component = "regular-type" }
//! ```
//!
//! `build` validates every policy value and produces the shared,
//! read-only captioner tree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::caption::{
    AttributeType, Caption, EntityType, Evaluate, PropositionType, QuantifierRange, QuantifierType,
    Reference, Relation, RelationType, Selector, SelectorType,
};
use crate::error::{ConfigError, ConfigResult};
use crate::policy::{Felicity, Vocabulary, validate_distribution, validate_rate};

use super::connective::{correct_bases, incorrect_transitions};
use super::{
    AsCaption, AsReference, AttributeCaptioner, AttributeRelationCaptioner, BoxedCaptioner, CaptionerMixer,
    ComparativeQuantifierCaptioner, ConnectiveCaptioner, EmptyTypeCaptioner, ExistentialCaptioner, Mode,
    NumberBoundCaptioner, QuantifierCaptioner, QuantifierSpec, RegularTypeCaptioner, RelationCaptioner,
    SelectorCaptioner, TypeRelationCaptioner, UniqueTypeCaptioner,
};

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

fn default_rate() -> f64 {
    0.5
}

fn invalid(component: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        component: component.into(),
        message: message.into(),
    }
}

fn non_empty<T>(component: &str, what: &str, values: &[T]) -> ConfigResult<()> {
    if values.is_empty() {
        return Err(ConfigError::EmptyValueSet {
            component: component.into(),
            what: what.into(),
        });
    }
    Ok(())
}

/// Types are conjunctions of discrete attributes only.
fn discrete_attributes(component: &str, attributes: &[AttributeType]) -> ConfigResult<()> {
    non_empty(component, "attribute", attributes)?;
    if let Some(extremal) = attributes.iter().find(|a| a.is_extremal()) {
        return Err(invalid(
            component,
            format!("type attributes must be discrete, got {}", extremal.name()),
        ));
    }
    Ok(())
}

fn validate_quantifiers(component: &str, specs: &[QuantifierSpec], ratio_lower: f64) -> ConfigResult<()> {
    non_empty(component, "quantifier", specs)?;
    for spec in specs {
        let ok = match spec.qtype {
            QuantifierType::Count => spec.quantity.is_finite() && spec.quantity.fract() == 0.0,
            QuantifierType::Ratio => (ratio_lower..=1.0).contains(&spec.quantity),
        };
        if !ok {
            return Err(invalid(
                component,
                format!("quantity {} is not valid for {:?} quantifiers", spec.quantity, spec.qtype),
            ));
        }
    }
    Ok(())
}

/// Weighted choice between sibling captioners of one grammar category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerConfig<C> {
    pub captioners: Vec<C>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_distribution: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_distribution: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_distribution: Option<Vec<f64>>,
}

impl<C> MixerConfig<C> {
    fn build<T>(
        &self,
        component: &str,
        build: impl Fn(&C) -> ConfigResult<BoxedCaptioner<T>>,
    ) -> ConfigResult<BoxedCaptioner<T>>
    where
        T: Evaluate + Clone + fmt::Debug + 'static,
    {
        non_empty(component, "captioner", &self.captioners)?;
        let captioners = self.captioners.iter().map(build).collect::<ConfigResult<Vec<_>>>()?;
        let mut mixer = CaptionerMixer::new(captioners);
        if let Some(distribution) = &self.distribution {
            validate_distribution(component, distribution, mixer.len())?;
            mixer = mixer.with_distribution(distribution.clone());
        }
        let per_mode = [
            (Mode::Train, &self.train_distribution),
            (Mode::Validation, &self.validation_distribution),
            (Mode::Test, &self.test_distribution),
        ];
        for (mode, distribution) in per_mode {
            if let Some(distribution) = distribution {
                validate_distribution(component, distribution, mixer.len())?;
                mixer = mixer.with_mode_distribution(mode, distribution.clone());
            }
        }
        Ok(Box::new(mixer))
    }
}

// ---------------------------------------------------------------------------
// Attributes and types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeConfig {
    pub attributes: Vec<AttributeType>,
    pub existing_attribute_rate: f64,
    pub felicity: Felicity,
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            attributes: vec![AttributeType::Shape, AttributeType::Color],
            existing_attribute_rate: default_rate(),
            felicity: Felicity::default(),
        }
    }
}

impl AttributeConfig {
    pub fn build(&self, vocabulary: &Vocabulary) -> ConfigResult<AttributeCaptioner> {
        non_empty("attribute", "attribute", &self.attributes)?;
        validate_rate("attribute", "existing_attribute_rate", self.existing_attribute_rate)?;
        self.felicity.validate("attribute")?;
        Ok(AttributeCaptioner::new(self.attributes.clone(), vocabulary.clone())
            .with_existing_attribute_rate(self.existing_attribute_rate)
            .with_felicity(self.felicity))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegularTypeConfig {
    pub attributes: Vec<AttributeType>,
    pub hypernym_rate: f64,
    pub existing_attribute_rate: f64,
    pub felicity: Felicity,
}

impl Default for RegularTypeConfig {
    fn default() -> Self {
        Self {
            attributes: vec![AttributeType::Shape, AttributeType::Color],
            hypernym_rate: default_rate(),
            existing_attribute_rate: default_rate(),
            felicity: Felicity::default(),
        }
    }
}

impl RegularTypeConfig {
    pub fn build(&self, vocabulary: &Vocabulary) -> ConfigResult<RegularTypeCaptioner> {
        discrete_attributes("regular-type", &self.attributes)?;
        validate_rate("regular-type", "hypernym_rate", self.hypernym_rate)?;
        validate_rate("regular-type", "existing_attribute_rate", self.existing_attribute_rate)?;
        self.felicity.validate("regular-type")?;
        Ok(RegularTypeCaptioner::new(self.attributes.clone(), vocabulary.clone())
            .with_hypernym_rate(self.hypernym_rate)
            .with_existing_attribute_rate(self.existing_attribute_rate)
            .with_felicity(self.felicity))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmptyTypeConfig {
    pub felicity: Felicity,
}

impl EmptyTypeConfig {
    pub fn build(&self) -> ConfigResult<EmptyTypeCaptioner> {
        self.felicity.validate("empty-type")?;
        Ok(EmptyTypeCaptioner::new().with_felicity(self.felicity))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniqueTypeConfig {
    pub attributes: Vec<AttributeType>,
    pub existing_attribute_rate: f64,
    pub felicity: Felicity,
}

impl Default for UniqueTypeConfig {
    fn default() -> Self {
        Self {
            attributes: vec![AttributeType::Shape, AttributeType::Color],
            existing_attribute_rate: default_rate(),
            felicity: Felicity::default(),
        }
    }
}

impl UniqueTypeConfig {
    pub fn build(&self, vocabulary: &Vocabulary) -> ConfigResult<UniqueTypeCaptioner> {
        discrete_attributes("unique-type", &self.attributes)?;
        validate_rate("unique-type", "existing_attribute_rate", self.existing_attribute_rate)?;
        self.felicity.validate("unique-type")?;
        Ok(UniqueTypeCaptioner::new(self.attributes.clone(), vocabulary.clone())
            .with_existing_attribute_rate(self.existing_attribute_rate)
            .with_felicity(self.felicity))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "kebab-case")]
pub enum TypeConfig {
    RegularType(RegularTypeConfig),
    EmptyType(EmptyTypeConfig),
    UniqueType(UniqueTypeConfig),
    Mixer(MixerConfig<TypeConfig>),
}

impl Default for TypeConfig {
    fn default() -> Self {
        TypeConfig::RegularType(RegularTypeConfig::default())
    }
}

impl TypeConfig {
    pub fn build(&self, vocabulary: &Vocabulary) -> ConfigResult<BoxedCaptioner<EntityType>> {
        match self {
            TypeConfig::RegularType(config) => Ok(Box::new(config.build(vocabulary)?)),
            TypeConfig::EmptyType(config) => Ok(Box::new(config.build()?)),
            TypeConfig::UniqueType(config) => Ok(Box::new(config.build(vocabulary)?)),
            TypeConfig::Mixer(config) => config.build("type mixer", |child| child.build(vocabulary)),
        }
    }
}

// ---------------------------------------------------------------------------
// Selectors and references
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub selectors: Vec<SelectorType>,
    pub scope: TypeConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Box<SelectorConfig>>,
    pub incorrect_distribution: [f64; 2],
    pub felicity: Felicity,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            selectors: SelectorType::ALL
                .into_iter()
                .filter(|selector| !selector.needs_reference())
                .collect(),
            scope: TypeConfig::default(),
            reference: None,
            incorrect_distribution: [1.0, 1.0],
            felicity: Felicity::default(),
        }
    }
}

impl SelectorConfig {
    pub fn build(&self, vocabulary: &Vocabulary) -> ConfigResult<SelectorCaptioner> {
        non_empty("selector", "selector", &self.selectors)?;
        validate_distribution("selector", &self.incorrect_distribution, 2)?;
        self.felicity.validate("selector")?;
        let mut captioner = SelectorCaptioner::new(self.selectors.clone(), self.scope.build(vocabulary)?)
            .with_incorrect_distribution(self.incorrect_distribution)
            .with_felicity(self.felicity);
        match &self.reference {
            Some(reference) => captioner = captioner.with_reference(reference.build(vocabulary)?),
            None if self.selectors.iter().all(|s| s.needs_reference()) => {
                return Err(invalid("selector", "proximity selectors need a reference selector"));
            }
            None => {}
        }
        Ok(captioner)
    }
}

/// Anything a relation can point at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "kebab-case")]
pub enum ReferenceConfig {
    RegularType(RegularTypeConfig),
    EmptyType(EmptyTypeConfig),
    UniqueType(UniqueTypeConfig),
    Selector(SelectorConfig),
    Mixer(MixerConfig<ReferenceConfig>),
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        ReferenceConfig::RegularType(RegularTypeConfig::default())
    }
}

fn type_reference(captioner: BoxedCaptioner<EntityType>) -> BoxedCaptioner<Reference> {
    Box::new(AsReference::new(captioner))
}

impl ReferenceConfig {
    pub fn build(&self, vocabulary: &Vocabulary) -> ConfigResult<BoxedCaptioner<Reference>> {
        match self {
            ReferenceConfig::RegularType(config) => Ok(type_reference(Box::new(config.build(vocabulary)?))),
            ReferenceConfig::EmptyType(config) => Ok(type_reference(Box::new(config.build()?))),
            ReferenceConfig::UniqueType(config) => Ok(type_reference(Box::new(config.build(vocabulary)?))),
            ReferenceConfig::Selector(config) => {
                let selector: BoxedCaptioner<Selector> = Box::new(config.build(vocabulary)?);
                Ok(Box::new(AsReference::new(selector)))
            }
            ReferenceConfig::Mixer(config) => config.build("reference mixer", |child| child.build(vocabulary)),
        }
    }
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationCaptionerConfig {
    pub relations: Vec<RelationType>,
    pub reference: ReferenceConfig,
    /// Required by proximity relations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<SelectorConfig>,
    pub incorrect_distribution: [f64; 3],
    pub felicity: Felicity,
}

impl Default for RelationCaptionerConfig {
    fn default() -> Self {
        Self {
            relations: RelationType::BINARY.to_vec(),
            reference: ReferenceConfig::default(),
            comparison: None,
            incorrect_distribution: [1.0, 1.0, 1.0],
            felicity: Felicity::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeRelationConfig {
    pub types: TypeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "kebab-case")]
pub enum RelationConfig {
    Relation(RelationCaptionerConfig),
    AttributeRelation(AttributeConfig),
    TypeRelation(TypeRelationConfig),
    Mixer(MixerConfig<RelationConfig>),
}

impl Default for RelationConfig {
    fn default() -> Self {
        RelationConfig::AttributeRelation(AttributeConfig::default())
    }
}

impl RelationConfig {
    pub fn build(&self, vocabulary: &Vocabulary) -> ConfigResult<BoxedCaptioner<Relation>> {
        match self {
            RelationConfig::Relation(config) => {
                non_empty("relation", "relation", &config.relations)?;
                if config.relations.iter().any(|r| r.is_membership()) {
                    return Err(invalid(
                        "relation",
                        "use attribute-relation or type-relation for membership relations",
                    ));
                }
                validate_distribution("relation", &config.incorrect_distribution, 3)?;
                config.felicity.validate("relation")?;
                let mut captioner = RelationCaptioner::new(config.relations.clone(), config.reference.build(vocabulary)?)
                    .with_incorrect_distribution(config.incorrect_distribution)
                    .with_felicity(config.felicity);
                match &config.comparison {
                    Some(comparison) => {
                        captioner = captioner.with_comparison(Box::new(comparison.build(vocabulary)?));
                    }
                    None if config.relations.iter().all(|r| r.is_ternary()) => {
                        return Err(invalid("relation", "proximity relations need a comparison selector"));
                    }
                    None => {}
                }
                Ok(Box::new(captioner))
            }
            RelationConfig::AttributeRelation(config) => {
                Ok(Box::new(AttributeRelationCaptioner::new(Box::new(config.build(vocabulary)?))))
            }
            RelationConfig::TypeRelation(config) => {
                Ok(Box::new(TypeRelationCaptioner::new(config.types.build(vocabulary)?)))
            }
            RelationConfig::Mixer(config) => config.build("relation mixer", |child| child.build(vocabulary)),
        }
    }
}

// ---------------------------------------------------------------------------
// Sentences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExistentialConfig {
    pub restrictor: TypeConfig,
    pub body: RelationConfig,
    pub incorrect_distribution: [f64; 2],
    pub felicity: Felicity,
}

impl Default for ExistentialConfig {
    fn default() -> Self {
        Self {
            restrictor: TypeConfig::default(),
            body: RelationConfig::default(),
            incorrect_distribution: [1.0, 1.0],
            felicity: Felicity::default(),
        }
    }
}

/// "no", "at least one", "exactly two", "most", "all", ...
pub fn default_quantifiers() -> Vec<QuantifierSpec> {
    use QuantifierRange::*;
    let mut specs = vec![QuantifierSpec::new(QuantifierType::Count, Eq, 0.0)];
    for count in 1..=3 {
        for range in [Eq, Geq, Lt] {
            specs.push(QuantifierSpec::new(QuantifierType::Count, range, f64::from(count)));
        }
    }
    specs.extend([
        QuantifierSpec::new(QuantifierType::Ratio, Eq, 0.0),
        QuantifierSpec::new(QuantifierType::Ratio, Lt, 0.5),
        QuantifierSpec::new(QuantifierType::Ratio, Eq, 0.5),
        QuantifierSpec::new(QuantifierType::Ratio, Gt, 0.5),
        QuantifierSpec::new(QuantifierType::Ratio, Eq, 1.0),
        QuantifierSpec::new(QuantifierType::Ratio, Neq, 1.0),
    ]);
    specs
}

/// "more ... than", "as many ... as", "fewer ... than", by count and fraction.
pub fn default_comparative_quantifiers() -> Vec<QuantifierSpec> {
    use QuantifierRange::*;
    [QuantifierType::Count, QuantifierType::Ratio]
        .into_iter()
        .flat_map(|qtype| [Gt, Eq, Lt].map(|range| QuantifierSpec::new(qtype, range, 0.0)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantifierConfig {
    pub restrictor: TypeConfig,
    pub body: RelationConfig,
    pub quantifiers: Vec<QuantifierSpec>,
    pub incorrect_distribution: [f64; 4],
    pub felicity: Felicity,
}

impl Default for QuantifierConfig {
    fn default() -> Self {
        Self {
            restrictor: TypeConfig::default(),
            body: RelationConfig::default(),
            quantifiers: default_quantifiers(),
            incorrect_distribution: [1.0; 4],
            felicity: Felicity::default(),
        }
    }
}

impl QuantifierConfig {
    pub fn build(&self, vocabulary: &Vocabulary) -> ConfigResult<QuantifierCaptioner> {
        validate_quantifiers("quantifier", &self.quantifiers, 0.0)?;
        validate_distribution("quantifier", &self.incorrect_distribution, 4)?;
        self.felicity.validate("quantifier")?;
        Ok(QuantifierCaptioner::new(
            self.restrictor.build(vocabulary)?,
            self.body.build(vocabulary)?,
            self.quantifiers.clone(),
        )
        .with_incorrect_distribution(self.incorrect_distribution)
        .with_felicity(self.felicity))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberBoundConfig {
    pub quantifier: QuantifierConfig,
    pub incorrect_distribution: [f64; 2],
    pub felicity: Felicity,
}

impl Default for NumberBoundConfig {
    fn default() -> Self {
        Self {
            quantifier: QuantifierConfig::default(),
            incorrect_distribution: [1.0, 1.0],
            felicity: Felicity::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparativeQuantifierConfig {
    pub restrictor: TypeConfig,
    pub comparison: TypeConfig,
    pub body: RelationConfig,
    pub quantifiers: Vec<QuantifierSpec>,
    pub incorrect_distribution: [f64; 5],
    pub felicity: Felicity,
}

impl Default for ComparativeQuantifierConfig {
    fn default() -> Self {
        Self {
            restrictor: TypeConfig::default(),
            comparison: TypeConfig::default(),
            body: RelationConfig::default(),
            quantifiers: default_comparative_quantifiers(),
            incorrect_distribution: [1.0; 5],
            felicity: Felicity::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectiveConfig {
    pub connective: PropositionType,
    pub first: Box<SentenceConfig>,
    pub second: Box<SentenceConfig>,
    /// Build the second clause about the entities the first one describes.
    pub nested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_distribution: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incorrect_distribution: Option<Vec<f64>>,
    pub felicity: Felicity,
}

impl Default for ConnectiveConfig {
    fn default() -> Self {
        Self {
            connective: PropositionType::Conjunction,
            first: Box::default(),
            second: Box::default(),
            nested: false,
            correct_distribution: None,
            incorrect_distribution: None,
            felicity: Felicity::default(),
        }
    }
}

impl ConnectiveConfig {
    fn build(&self, vocabulary: &Vocabulary) -> ConfigResult<ConnectiveCaptioner> {
        let component = self.connective.name();
        self.felicity.validate(component)?;
        let mut captioner =
            ConnectiveCaptioner::new(self.connective, self.first.build(vocabulary)?, self.second.build(vocabulary)?)
                .nested(self.nested)
                .with_felicity(self.felicity);
        if let Some(distribution) = &self.correct_distribution {
            validate_distribution(component, distribution, correct_bases(self.connective).len())?;
            captioner = captioner.with_correct_distribution(distribution.clone());
        }
        if let Some(distribution) = &self.incorrect_distribution {
            validate_distribution(component, distribution, incorrect_transitions(self.connective).len())?;
            captioner = captioner.with_incorrect_distribution(distribution.clone());
        }
        Ok(captioner)
    }
}

/// Root of a captioner tree: anything that produces a whole caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "kebab-case")]
pub enum SentenceConfig {
    Existential(ExistentialConfig),
    Quantifier(QuantifierConfig),
    NumberBound(NumberBoundConfig),
    ComparativeQuantifier(ComparativeQuantifierConfig),
    Connective(ConnectiveConfig),
    Mixer(MixerConfig<SentenceConfig>),
}

impl Default for SentenceConfig {
    fn default() -> Self {
        SentenceConfig::Existential(ExistentialConfig::default())
    }
}

impl SentenceConfig {
    pub fn component(&self) -> &'static str {
        match self {
            SentenceConfig::Existential(_) => "existential",
            SentenceConfig::Quantifier(_) => "quantifier",
            SentenceConfig::NumberBound(_) => "number-bound",
            SentenceConfig::ComparativeQuantifier(_) => "comparative-quantifier",
            SentenceConfig::Connective(config) => config.connective.name(),
            SentenceConfig::Mixer(_) => "mixer",
        }
    }

    pub fn build(&self, vocabulary: &Vocabulary) -> ConfigResult<BoxedCaptioner<Caption>> {
        vocabulary.validate()?;
        match self {
            SentenceConfig::Existential(config) => {
                validate_distribution("existential", &config.incorrect_distribution, 2)?;
                config.felicity.validate("existential")?;
                let captioner = ExistentialCaptioner::new(
                    config.restrictor.build(vocabulary)?,
                    config.body.build(vocabulary)?,
                )
                .with_incorrect_distribution(config.incorrect_distribution)
                .with_felicity(config.felicity);
                Ok(Box::new(AsCaption::new(Box::new(captioner))))
            }
            SentenceConfig::Quantifier(config) => Ok(Box::new(AsCaption::new(Box::new(config.build(vocabulary)?)))),
            SentenceConfig::NumberBound(config) => {
                validate_distribution("number-bound", &config.incorrect_distribution, 2)?;
                config.felicity.validate("number-bound")?;
                let captioner = NumberBoundCaptioner::new(config.quantifier.build(vocabulary)?)
                    .with_incorrect_distribution(config.incorrect_distribution)
                    .with_felicity(config.felicity);
                Ok(Box::new(AsCaption::new(Box::new(captioner))))
            }
            SentenceConfig::ComparativeQuantifier(config) => {
                validate_quantifiers("comparative-quantifier", &config.quantifiers, -1.0)?;
                validate_distribution("comparative-quantifier", &config.incorrect_distribution, 5)?;
                config.felicity.validate("comparative-quantifier")?;
                let captioner = ComparativeQuantifierCaptioner::new(
                    config.restrictor.build(vocabulary)?,
                    config.comparison.build(vocabulary)?,
                    config.body.build(vocabulary)?,
                    config.quantifiers.clone(),
                )
                .with_incorrect_distribution(config.incorrect_distribution)
                .with_felicity(config.felicity);
                Ok(Box::new(AsCaption::new(Box::new(captioner))))
            }
            SentenceConfig::Connective(config) => Ok(Box::new(AsCaption::new(Box::new(config.build(vocabulary)?)))),
            SentenceConfig::Mixer(config) => config.build("sentence mixer", |child| child.build(vocabulary)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SentenceConfig {
        toml::from_str(source).expect("valid captioner config")
    }

    #[test]
    fn minimal_existential_uses_defaults() {
        let config = parse(r#"component = "existential""#);
        assert_eq!(config, SentenceConfig::default());
        assert!(config.build(&Vocabulary::default()).is_ok());
    }

    #[test]
    fn nested_tree_parses_and_builds() {
        let config = parse(
            r#"
            component = "mixer"
            distribution = [2.0, 1.0]

            [[captioners]]
            component = "existential"
            restrictor = { component = "regular-type", attributes = ["shape"] }
            body = { component = "relation", relations = ["x-rel", "y-rel"], reference = { component = "unique-type" } }

            [[captioners]]
            component = "quantifier"
            restrictor = { component = "empty-type" }
            body = { component = "attribute-relation", attributes = ["color"] }
            "#,
        );
        let SentenceConfig::Mixer(mixer) = &config else {
            panic!("expected a mixer, got {config:?}");
        };
        assert_eq!(mixer.captioners.len(), 2);
        let captioner = config.build(&Vocabulary::default()).unwrap();
        assert_eq!(captioner.name(), "mixer");
    }

    #[test]
    fn type_relation_body_builds() {
        let config = parse(
            r#"
            component = "existential"
            body = { component = "type-relation", types = { component = "unique-type", attributes = ["color"] } }
            "#,
        );
        let SentenceConfig::Existential(existential) = &config else {
            panic!("expected an existential, got {config:?}");
        };
        assert!(matches!(existential.body, RelationConfig::TypeRelation(_)));
        assert_eq!(config.build(&Vocabulary::default()).unwrap().name(), "existential");
    }

    #[test]
    fn type_in_sentence_position_is_a_parse_error() {
        let result: Result<SentenceConfig, _> = toml::from_str(r#"component = "regular-type""#);
        assert!(result.is_err());
    }

    #[test]
    fn extremal_type_attribute_rejected() {
        let config = TypeConfig::RegularType(RegularTypeConfig {
            attributes: vec![AttributeType::XMax],
            ..Default::default()
        });
        assert!(matches!(
            config.build(&Vocabulary::default()),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn mixer_distribution_length_checked() {
        let config = parse(
            r#"
            component = "mixer"
            distribution = [1.0]
            captioners = [{ component = "existential" }, { component = "quantifier" }]
            "#,
        );
        assert!(matches!(
            config.build(&Vocabulary::default()),
            Err(ConfigError::InvalidDistribution { .. })
        ));
    }

    #[test]
    fn proximity_without_comparison_rejected() {
        let config = RelationConfig::Relation(RelationCaptionerConfig {
            relations: vec![RelationType::ProximityRel],
            ..Default::default()
        });
        assert!(config.build(&Vocabulary::default()).is_err());
    }

    #[test]
    fn membership_in_plain_relation_rejected() {
        let config = RelationConfig::Relation(RelationCaptionerConfig {
            relations: vec![RelationType::Attribute],
            ..Default::default()
        });
        assert!(config.build(&Vocabulary::default()).is_err());
    }

    #[test]
    fn fractional_count_rejected() {
        let config = SentenceConfig::Quantifier(QuantifierConfig {
            quantifiers: vec![QuantifierSpec::new(QuantifierType::Count, QuantifierRange::Eq, 1.5)],
            ..Default::default()
        });
        assert!(config.build(&Vocabulary::default()).is_err());
    }

    #[test]
    fn connective_distribution_sized_per_connective() {
        let mut config = ConnectiveConfig {
            connective: PropositionType::Disjunction,
            correct_distribution: Some(vec![1.0, 1.0, 1.0]),
            incorrect_distribution: Some(vec![1.0]),
            ..Default::default()
        };
        assert!(SentenceConfig::Connective(config.clone()).build(&Vocabulary::default()).is_ok());
        config.incorrect_distribution = Some(vec![1.0, 1.0]);
        assert!(SentenceConfig::Connective(config).build(&Vocabulary::default()).is_err());
    }

    #[test]
    fn configs_serialize_back_to_toml() {
        let config = SentenceConfig::Connective(ConnectiveConfig::default());
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("component = \"connective\""));
        let back: SentenceConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
