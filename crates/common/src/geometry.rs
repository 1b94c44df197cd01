//! Containment and bounds tests for area shapes.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Errors from shape validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("shape contains a non-finite coordinate")]
    NonFinite,
    #[error("radius must be positive, got {0}")]
    InvalidRadius(f32),
    #[error("box minimum exceeds maximum")]
    InvertedBounds,
    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),
}

/// Axis-aligned rectangle on the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn around(center: Vec2, radius: f32) -> Self {
        Self {
            min: center - Vec2::splat(radius),
            max: center + Vec2::splat(radius),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Area shape variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Infinite-height cylinder around a 2D point.
    Circle { center: Vec2, radius: f32 },
    Sphere { center: Vec3, radius: f32 },
    /// Infinite-height 2D box.
    Rectangle { min: Vec2, max: Vec2 },
    Cuboid { min: Vec3, max: Vec3 },
    /// Polygon prism bounded by `min_z..=max_z`.
    Polygon {
        points: Vec<Vec2>,
        min_z: f32,
        max_z: f32,
    },
}

impl Shape {
    pub fn validate(&self) -> Result<(), ShapeError> {
        match self {
            Shape::Circle { center, radius } => {
                check_finite(&[center.x, center.y, *radius])?;
                check_radius(*radius)
            }
            Shape::Sphere { center, radius } => {
                check_finite(&[center.x, center.y, center.z, *radius])?;
                check_radius(*radius)
            }
            Shape::Rectangle { min, max } => {
                check_finite(&[min.x, min.y, max.x, max.y])?;
                if min.cmpgt(*max).any() {
                    return Err(ShapeError::InvertedBounds);
                }
                Ok(())
            }
            Shape::Cuboid { min, max } => {
                check_finite(&[min.x, min.y, min.z, max.x, max.y, max.z])?;
                if min.cmpgt(*max).any() {
                    return Err(ShapeError::InvertedBounds);
                }
                Ok(())
            }
            Shape::Polygon {
                points,
                min_z,
                max_z,
            } => {
                if points.len() < 3 {
                    return Err(ShapeError::TooFewPoints(points.len()));
                }
                check_finite(&[*min_z, *max_z])?;
                for p in points {
                    check_finite(&[p.x, p.y])?;
                }
                if min_z > max_z {
                    return Err(ShapeError::InvertedBounds);
                }
                Ok(())
            }
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        match self {
            Shape::Circle { center, radius } => {
                point.truncate().distance_squared(*center) <= radius * radius
            }
            Shape::Sphere { center, radius } => point.distance_squared(*center) <= radius * radius,
            Shape::Rectangle { min, max } => Bounds2::new(*min, *max).contains(point.truncate()),
            Shape::Cuboid { min, max } => point.cmpge(*min).all() && point.cmple(*max).all(),
            Shape::Polygon {
                points,
                min_z,
                max_z,
            } => {
                point.z >= *min_z
                    && point.z <= *max_z
                    && point_in_polygon(points, point.truncate())
            }
        }
    }

    /// Horizontal bounds, used for spatial indexing.
    pub fn bounds(&self) -> Bounds2 {
        match self {
            Shape::Circle { center, radius } => Bounds2::around(*center, *radius),
            Shape::Sphere { center, radius } => Bounds2::around(center.truncate(), *radius),
            Shape::Rectangle { min, max } => Bounds2::new(*min, *max),
            Shape::Cuboid { min, max } => Bounds2::new(min.truncate(), max.truncate()),
            Shape::Polygon { points, .. } => {
                let mut min = Vec2::splat(f32::MAX);
                let mut max = Vec2::splat(f32::MIN);
                for p in points {
                    min = min.min(*p);
                    max = max.max(*p);
                }
                Bounds2::new(min, max)
            }
        }
    }

    /// Point the shape is anchored by when attached or moved.
    pub fn reference_point(&self) -> Vec3 {
        match self {
            Shape::Circle { center, .. } => center.extend(0.0),
            Shape::Sphere { center, .. } => *center,
            Shape::Rectangle { min, max } => ((*min + *max) * 0.5).extend(0.0),
            Shape::Cuboid { min, max } => (*min + *max) * 0.5,
            Shape::Polygon { min_z, max_z, .. } => {
                self.bounds().center().extend((min_z + max_z) * 0.5)
            }
        }
    }

    /// Copy of this shape moved by `offset`. Circles and rectangles ignore the Z component.
    pub fn translated(&self, offset: Vec3) -> Shape {
        let flat = offset.truncate();
        match self {
            Shape::Circle { center, radius } => Shape::Circle {
                center: *center + flat,
                radius: *radius,
            },
            Shape::Sphere { center, radius } => Shape::Sphere {
                center: *center + offset,
                radius: *radius,
            },
            Shape::Rectangle { min, max } => Shape::Rectangle {
                min: *min + flat,
                max: *max + flat,
            },
            Shape::Cuboid { min, max } => Shape::Cuboid {
                min: *min + offset,
                max: *max + offset,
            },
            Shape::Polygon {
                points,
                min_z,
                max_z,
            } => Shape::Polygon {
                points: points.iter().map(|p| *p + flat).collect(),
                min_z: min_z + offset.z,
                max_z: max_z + offset.z,
            },
        }
    }

    /// Copy of this shape moved so its reference point lands on `target`.
    pub fn placed_at(&self, target: Vec3) -> Shape {
        self.translated(target - self.reference_point())
    }
}

fn check_finite(values: &[f32]) -> Result<(), ShapeError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ShapeError::NonFinite)
    }
}

fn check_radius(radius: f32) -> Result<(), ShapeError> {
    if radius > 0.0 {
        Ok(())
    } else {
        Err(ShapeError::InvalidRadius(radius))
    }
}

/// Even-odd ray casting test.
fn point_in_polygon(points: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
