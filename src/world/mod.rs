//! Immutable world snapshots: the entities a caption talks about.
//!
//! A [`World`] is produced once per generation attempt (by the external
//! world generator, or by [`sample::WorldSampler`] in this crate) and is
//! never mutated afterwards. Entity ids are assigned in insertion order and
//! double as indices into the entity sequence.
//!
//! The only interior mutability is the pairwise overlap cache on each
//! [`Entity`], which is lazily filled and symmetric. It lives in a
//! `DashMap` so worlds can be shared across generation threads.

pub mod entity;
pub mod sample;

use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

pub use entity::{BoundingBox, Entity, Extent, Point};
pub use sample::{WorldSampler, WorldSamplerConfig};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable entity identifier, assigned at world-build time in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Position of the entity in its world's entity sequence.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Discrete attribute values
// ---------------------------------------------------------------------------

/// Shape kinds known to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    Square,
    Rectangle,
    Triangle,
    Pentagon,
    Cross,
    Circle,
    Semicircle,
    Ellipse,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::Square,
        ShapeKind::Rectangle,
        ShapeKind::Triangle,
        ShapeKind::Pentagon,
        ShapeKind::Cross,
        ShapeKind::Circle,
        ShapeKind::Semicircle,
        ShapeKind::Ellipse,
    ];

    /// Fraction of the extent rectangle covered by the shape.
    pub fn area_factor(self) -> f64 {
        match self {
            ShapeKind::Square | ShapeKind::Rectangle => 1.0,
            ShapeKind::Triangle => 0.5,
            ShapeKind::Pentagon => 0.6882,
            ShapeKind::Cross => 5.0 / 9.0,
            ShapeKind::Circle | ShapeKind::Ellipse | ShapeKind::Semicircle => {
                std::f64::consts::FRAC_PI_4
            }
        }
    }

    /// Whether the shape is drawn with equal width and height.
    pub fn is_regular(self) -> bool {
        !matches!(
            self,
            ShapeKind::Rectangle | ShapeKind::Ellipse | ShapeKind::Semicircle
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Square => "square",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Pentagon => "pentagon",
            ShapeKind::Cross => "cross",
            ShapeKind::Circle => "circle",
            ShapeKind::Semicircle => "semicircle",
            ShapeKind::Ellipse => "ellipse",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Color names. Each entity color also carries a continuous shade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorName {
    Black,
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
    Gray,
}

impl ColorName {
    /// Colors usable for entities (black and white are reserved for backgrounds).
    pub const ENTITY_COLORS: [ColorName; 7] = [
        ColorName::Red,
        ColorName::Green,
        ColorName::Blue,
        ColorName::Yellow,
        ColorName::Magenta,
        ColorName::Cyan,
        ColorName::Gray,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorName::Black => "black",
            ColorName::White => "white",
            ColorName::Red => "red",
            ColorName::Green => "green",
            ColorName::Blue => "blue",
            ColorName::Yellow => "yellow",
            ColorName::Magenta => "magenta",
            ColorName::Cyan => "cyan",
            ColorName::Gray => "gray",
        }
    }
}

impl std::fmt::Display for ColorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Surface textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Texture {
    Solid,
    Striped,
    Dotted,
}

impl Texture {
    pub const ALL: [Texture; 3] = [Texture::Solid, Texture::Striped, Texture::Dotted];

    pub fn name(self) -> &'static str {
        match self {
            Texture::Solid => "solid",
            Texture::Striped => "striped",
            Texture::Dotted => "dotted",
        }
    }
}

impl std::fmt::Display for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A shape kind together with its extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub extent: Extent,
}

impl Shape {
    pub fn new(kind: ShapeKind, extent: Extent) -> Self {
        Self { kind, extent }
    }

    /// Area covered by the shape in world units.
    pub fn area(&self) -> f64 {
        self.extent.width * self.extent.height * self.kind.area_factor()
    }
}

/// A named color with a continuous shade in `[-1, 1]` (dark to light).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub name: ColorName,
    pub shade: f64,
}

impl Color {
    pub fn new(name: ColorName, shade: f64) -> Self {
        Self {
            name,
            shade: shade.clamp(-1.0, 1.0),
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// An immutable, ordered collection of entities plus world-level attributes.
///
/// Cloning is cheap: the entity sequence is shared. Predications over the
/// same world hold the same `Arc`, which is how set algebra between them is
/// validated.
#[derive(Debug, Clone)]
pub struct World {
    size: u32,
    background: Color,
    entities: Arc<[Entity]>,
}

impl World {
    /// Start building a world of the given pixel size.
    pub fn builder(size: u32, background: Color) -> WorldBuilder {
        WorldBuilder {
            size,
            background,
            entities: Vec::new(),
        }
    }

    /// Assemble a world from fully constructed entities.
    ///
    /// # Panics
    ///
    /// Panics if the entity ids are not `0..n` in order.
    pub fn from_entities(size: u32, background: Color, entities: Vec<Entity>) -> Self {
        for (index, entity) in entities.iter().enumerate() {
            assert_eq!(
                entity.id.index(),
                index,
                "entity ids must follow insertion order"
            );
        }
        Self {
            size,
            background,
            entities: entities.into(),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// The shared entity sequence, used by predications for identity checks.
    pub fn shared_entities(&self) -> &Arc<[Entity]> {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Serialize for World {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("World", 3)?;
        state.serialize_field("size", &self.size)?;
        state.serialize_field("background", &self.background)?;
        state.serialize_field("entities", &self.entities[..])?;
        state.end()
    }
}

/// Incremental world construction; assigns entity ids in insertion order.
#[derive(Debug)]
pub struct WorldBuilder {
    size: u32,
    background: Color,
    entities: Vec<Entity>,
}

impl WorldBuilder {
    /// Append an entity and return its id.
    pub fn add(
        &mut self,
        shape: Shape,
        color: Color,
        texture: Texture,
        center: Point,
        rotation: f64,
    ) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities
            .push(Entity::new(id, shape, color, texture, center, rotation));
        id
    }

    /// Chainable variant of [`WorldBuilder::add`].
    pub fn entity(
        mut self,
        shape: Shape,
        color: Color,
        texture: Texture,
        center: Point,
        rotation: f64,
    ) -> Self {
        self.add(shape, color, texture, center, rotation);
        self
    }

    /// Entities placed so far, in insertion order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn build(self) -> World {
        World {
            size: self.size,
            background: self.background,
            entities: self.entities.into(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Compact world construction for tests: `(shape, color, x, y)`, unit-ish
    /// extents, solid texture, no rotation.
    pub(crate) fn world(specs: &[(ShapeKind, ColorName, f64, f64)]) -> World {
        let mut builder = World::builder(64, Color::new(ColorName::Black, 0.0));
        for &(kind, color, x, y) in specs {
            builder.add(
                Shape::new(kind, Extent::new(0.1, 0.1)),
                Color::new(color, 0.0),
                Texture::Solid,
                Point::new(x, y),
                0.0,
            );
        }
        builder.build()
    }

    #[test]
    fn builder_assigns_ids_in_order() {
        let w = world(&[
            (ShapeKind::Square, ColorName::Red, 0.2, 0.2),
            (ShapeKind::Circle, ColorName::Blue, 0.5, 0.5),
        ]);
        assert_eq!(w.len(), 2);
        assert_eq!(w.entities()[0].id, EntityId(0));
        assert_eq!(w.entity(EntityId(1)).shape.kind, ShapeKind::Circle);
    }

    #[test]
    #[should_panic(expected = "insertion order")]
    fn from_entities_rejects_out_of_order_ids() {
        let e = Entity::new(
            EntityId(3),
            Shape::new(ShapeKind::Square, Extent::new(0.1, 0.1)),
            Color::new(ColorName::Red, 0.0),
            Texture::Solid,
            Point::new(0.5, 0.5),
            0.0,
        );
        World::from_entities(64, Color::new(ColorName::Black, 0.0), vec![e]);
    }

    #[test]
    fn shape_area_uses_kind_factor() {
        let square = Shape::new(ShapeKind::Square, Extent::new(0.2, 0.2));
        let triangle = Shape::new(ShapeKind::Triangle, Extent::new(0.2, 0.2));
        assert!((square.area() - 0.04).abs() < 1e-12);
        assert!((triangle.area() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn world_serializes_entities() {
        let w = world(&[(ShapeKind::Square, ColorName::Red, 0.2, 0.2)]);
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["size"], 64);
        assert_eq!(json["entities"][0]["shape"]["kind"], "square");
        assert_eq!(json["entities"][0]["color"]["name"], "red");
    }

    #[test]
    fn color_shade_is_clamped() {
        assert_eq!(Color::new(ColorName::Red, 3.0).shade, 1.0);
        assert_eq!(Color::new(ColorName::Red, -3.0).shade, -1.0);
    }
}
