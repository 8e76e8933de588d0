//! Player-drawn play area and its optional reference pin.
use serde::{Deserialize, Serialize};

use crate::geo::{Extent, Point};

/// Shape of the drawn boundary, in projected coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum BoundaryShape {
    /// Circle with a radius in projected units.
    Circle { center: Point, radius: f64 },
    Box { extent: Extent },
    /// Closed ring; the closing vertex may be omitted.
    Polygon { ring: Vec<Point> },
}

/// The area a round is played in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRegion {
    pub shape: BoundaryShape,
    #[serde(default)]
    pub pin: Option<Point>,
}

impl BoundaryRegion {
    #[must_use]
    pub const fn circle(center: Point, radius: f64) -> Self {
        Self {
            shape: BoundaryShape::Circle { center, radius },
            pin: None,
        }
    }

    #[must_use]
    pub const fn rectangle(extent: Extent) -> Self {
        Self {
            shape: BoundaryShape::Box { extent },
            pin: None,
        }
    }

    #[must_use]
    pub fn polygon(ring: Vec<Point>) -> Self {
        Self {
            shape: BoundaryShape::Polygon { ring },
            pin: None,
        }
    }

    /// Attach or replace the reference pin.
    #[must_use]
    pub fn with_pin(mut self, pin: Point) -> Self {
        self.pin = Some(pin);
        self
    }

    pub fn set_pin(&mut self, pin: Option<Point>) {
        self.pin = pin;
    }

    #[must_use]
    pub fn extent(&self) -> Extent {
        match &self.shape {
            BoundaryShape::Circle { center, radius } => Extent::new(
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            ),
            BoundaryShape::Box { extent } => *extent,
            BoundaryShape::Polygon { ring } => Extent::from_points(ring),
        }
    }

    /// Whether a projected coordinate lies inside the boundary.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        match &self.shape {
            BoundaryShape::Circle { center, radius } => {
                point.planar_distance_sq(*center) <= radius * radius
            }
            BoundaryShape::Box { extent } => extent.contains(point),
            BoundaryShape::Polygon { ring } => ring_contains(ring, point),
        }
    }

    /// Great-circle length of the extent diagonal in metres.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.extent().diagonal_distance()
    }

    /// Scale against which street weights are normalized: the diagonal
    /// divided by `divisor`.
    #[must_use]
    pub fn normalization_radius(&self, divisor: f64) -> f64 {
        if divisor > 0.0 {
            self.diagonal() / divisor
        } else {
            0.0
        }
    }
}

// Even-odd ray casting.
fn ring_contains(ring: &[Point], point: Point) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut prev = ring[ring.len() - 1];
    for &curr in ring {
        if (curr.y > point.y) != (prev.y > point.y) {
            let cross_x = (prev.x - curr.x) * (point.y - curr.y) / (prev.y - curr.y) + curr.x;
            if point.x < cross_x {
                inside = !inside;
            }
        }
        prev = curr;
    }
    inside
}
