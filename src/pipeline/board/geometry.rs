//! Plane geometry for pointer gestures and drop-zone collision.

use crate::pipeline::domain::StageKey;

/// Point in board coordinates (pixels).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Returns the offset from `origin` to `self`.
    #[must_use]
    pub const fn delta_from(self, origin: Self) -> Self {
        Self::new(self.x - origin.x, self.y - origin.y)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the centre point.
    #[must_use]
    pub const fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Returns the rectangle moved by `delta`.
    #[must_use]
    pub const fn translated(&self, delta: Point) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }
}

/// Registered drop target: one stage column.
#[derive(Debug, Clone, PartialEq)]
pub struct DropZone {
    /// Stage the column represents.
    pub stage: StageKey,
    /// Column bounds.
    pub bounds: Rect,
}

/// Returns the zone whose centre is closest to the centre of `dragged`.
///
/// Ties go to the zone registered first. An empty zone list has no target.
#[must_use]
pub fn closest_center<'a>(dragged: &Rect, zones: &'a [DropZone]) -> Option<&'a DropZone> {
    let center = dragged.center();
    zones
        .iter()
        .map(|zone| (zone, zone.bounds.center().distance_to(center)))
        .fold(None, |best: Option<(&DropZone, f64)>, (zone, distance)| match best {
            Some((_, best_distance)) if best_distance <= distance => best,
            _ => Some((zone, distance)),
        })
        .map(|(zone, _)| zone)
}
