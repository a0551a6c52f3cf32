//! Entities and their geometry.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::{Color, EntityId, Shape, Texture};

/// A point in world coordinates (`[0, 1]` on both axes, y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Unrotated width and height of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Bounding box of an extent rotated by `rotation` radians around `center`.
    pub fn around(center: Point, extent: Extent, rotation: f64) -> Self {
        let (sin, cos) = rotation.sin_cos();
        let half_w = 0.5 * (extent.width * cos.abs() + extent.height * sin.abs());
        let half_h = 0.5 * (extent.width * sin.abs() + extent.height * cos.abs());
        Self {
            min: Point::new(center.x - half_w, center.y - half_h),
            max: Point::new(center.x + half_w, center.y + half_h),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Area of the intersection with `other` (zero when disjoint).
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let w = self.max.x.min(other.max.x) - self.min.x.max(other.min.x);
        let h = self.max.y.min(other.max.y) - self.min.y.max(other.min.y);
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }

    /// Intersection area divided by the smaller of the two box areas.
    pub fn overlap_ratio(&self, other: &BoundingBox) -> f64 {
        let smaller = self.area().min(other.area());
        if smaller <= 0.0 {
            0.0
        } else {
            self.intersection_area(other) / smaller
        }
    }

    /// Whether the box lies within the unit square.
    pub fn within_unit(&self) -> bool {
        self.min.x >= 0.0 && self.min.y >= 0.0 && self.max.x <= 1.0 && self.max.y <= 1.0
    }
}

/// A shape placed in a world.
///
/// Everything except the overlap cache is fixed at construction. The cache is
/// keyed by the other entity's id and filled symmetrically on first use.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub shape: Shape,
    pub color: Color,
    pub texture: Texture,
    pub center: Point,
    pub rotation: f64,
    pub bounding_box: BoundingBox,
    #[serde(skip)]
    overlaps: DashMap<EntityId, f64>,
}

impl Entity {
    pub fn new(
        id: EntityId,
        shape: Shape,
        color: Color,
        texture: Texture,
        center: Point,
        rotation: f64,
    ) -> Self {
        Self {
            id,
            shape,
            color,
            texture,
            center,
            rotation,
            bounding_box: BoundingBox::around(center, shape.extent, rotation),
            overlaps: DashMap::new(),
        }
    }

    pub fn area(&self) -> f64 {
        self.shape.area()
    }

    /// Euclidean distance between the two centers.
    pub fn distance(&self, other: &Entity) -> f64 {
        self.center.distance(&other.center)
    }

    /// Overlap ratio with `other`: bounding-box intersection area divided by
    /// the smaller bounding-box area. Symmetric and memoized on both sides.
    pub fn overlap(&self, other: &Entity) -> f64 {
        if self.id == other.id {
            return 1.0;
        }
        if let Some(cached) = self.overlaps.get(&other.id) {
            return *cached;
        }
        let ratio = self.bounding_box.overlap_ratio(&other.bounding_box);
        self.overlaps.insert(other.id, ratio);
        other.overlaps.insert(self.id, ratio);
        ratio
    }

    /// Number of memoized overlap entries.
    pub fn cached_overlaps(&self) -> usize {
        self.overlaps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{ColorName, ShapeKind};

    fn square(id: u32, x: f64, y: f64, size: f64) -> Entity {
        Entity::new(
            EntityId(id),
            Shape::new(ShapeKind::Square, Extent::new(size, size)),
            Color::new(ColorName::Red, 0.0),
            Texture::Solid,
            Point::new(x, y),
            0.0,
        )
    }

    #[test]
    fn rotated_bounding_box_grows() {
        let straight = BoundingBox::around(Point::new(0.5, 0.5), Extent::new(0.2, 0.2), 0.0);
        let rotated = BoundingBox::around(
            Point::new(0.5, 0.5),
            Extent::new(0.2, 0.2),
            std::f64::consts::FRAC_PI_4,
        );
        assert!((straight.width() - 0.2).abs() < 1e-12);
        assert!(rotated.width() > straight.width());
    }

    #[test]
    fn disjoint_entities_do_not_overlap() {
        let a = square(0, 0.2, 0.2, 0.1);
        let b = square(1, 0.8, 0.8, 0.1);
        assert_eq!(a.overlap(&b), 0.0);
    }

    #[test]
    fn overlap_is_symmetric_and_cached() {
        let a = square(0, 0.5, 0.5, 0.2);
        let b = square(1, 0.55, 0.5, 0.1);
        let ratio = a.overlap(&b);
        assert!((ratio - 1.0).abs() < 1e-9, "small box fully inside: {ratio}");
        assert_eq!(a.cached_overlaps(), 1);
        assert_eq!(b.cached_overlaps(), 1);
        assert_eq!(b.overlap(&a), ratio);
    }

    #[test]
    fn partial_overlap_ratio() {
        let a = square(0, 0.5, 0.5, 0.2);
        let b = square(1, 0.6, 0.5, 0.2);
        assert!((a.overlap(&b) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn distance_between_centers() {
        let a = square(0, 0.0, 0.0, 0.1);
        let b = square(1, 0.3, 0.4, 0.1);
        assert!((a.distance(&b) - 0.5).abs() < 1e-12);
    }
}
