//! Street entities: one named street made of one or more polylines.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::geo::{Extent, Point, closest_point_on_line, real_line_distance};
use crate::numbers::sanitize_weight;

/// Polylines making up a street. Most streets arrive as one or two ways.
pub type StreetGeometry = SmallVec<[Vec<Point>; 2]>;

/// Normalized lookup key for a street name.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A named street in the play area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetEntity {
    pub key: String,
    pub name: String,
    /// Road classification (`highway` tag), e.g. `residential`.
    #[serde(default)]
    pub highway: Option<String>,
    pub geometry: StreetGeometry,
    /// Sum of geodesic segment lengths in metres.
    pub length: f64,
    weight: f64,
}

impl StreetEntity {
    #[must_use]
    pub fn new(name: impl Into<String>, highway: Option<String>, line: Vec<Point>) -> Self {
        let name = name.into();
        let length = real_line_distance(&line);
        let mut geometry = StreetGeometry::new();
        geometry.push(line);
        Self {
            key: normalize_name(&name),
            name,
            highway,
            geometry,
            length,
            weight: 1.0,
        }
    }

    /// Merge another way carrying the same name into this street.
    pub fn append_line(&mut self, line: Vec<Point>) {
        self.length += real_line_distance(&line);
        self.geometry.push(line);
    }

    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Replace the sampling weight; negative or non-finite values become 0.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = sanitize_weight(weight);
    }

    /// Multiply the sampling weight by a positive factor.
    pub fn scale_weight(&mut self, factor: f64) {
        self.set_weight(self.weight * factor);
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Point> {
        self.geometry.iter().flatten()
    }

    #[must_use]
    pub fn extent(&self) -> Extent {
        Extent::from_points(self.vertices())
    }

    /// Point on the street geometry closest to `target`.
    #[must_use]
    pub fn closest_point(&self, target: Point) -> Option<Point> {
        self.geometry
            .iter()
            .filter_map(|line| closest_point_on_line(target, line))
            .min_by(|a, b| {
                a.planar_distance_sq(target)
                    .total_cmp(&b.planar_distance_sq(target))
            })
    }

    /// Point on the street closest to the center of its bounding box.
    ///
    /// Used as the anchor for error lines and summary labels; it is not a
    /// centroid or a midpoint along the path.
    #[must_use]
    pub fn center(&self) -> Option<Point> {
        let extent = self.extent();
        if extent.is_empty() {
            return None;
        }
        self.closest_point(extent.center())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{LonLat, from_lon_lat, real_distance};

    fn line(points: &[(f64, f64)]) -> Vec<Point> {
        points.iter().map(|(x, y)| Point::new(*x, *y)).collect()
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_name("  Vesterbrogade "), "vesterbrogade");
        assert_eq!(normalize_name("ÅBOULEVARD"), "åboulevard");
    }

    #[test]
    fn length_is_geodesic_and_accumulates() {
        let a = from_lon_lat(LonLat::new(12.0, 55.0));
        let b = from_lon_lat(LonLat::new(12.0, 55.01));
        let c = from_lon_lat(LonLat::new(12.01, 55.01));
        let mut street = StreetEntity::new("Main Street", Some("primary".into()), vec![a, b]);
        assert_eq!(street.key, "main street");
        assert!((street.length - real_distance(a, b)).abs() < 1e-9);
        street.append_line(vec![b, c]);
        assert_eq!(street.geometry.len(), 2);
        assert!((street.length - real_distance(a, b) - real_distance(b, c)).abs() < 1e-6);
    }

    #[test]
    fn weight_never_goes_negative() {
        let mut street = StreetEntity::new("A", None, line(&[(0.0, 0.0), (1.0, 0.0)]));
        assert!((street.weight() - 1.0).abs() < f64::EPSILON);
        street.set_weight(-4.0);
        assert!(street.weight().abs() < f64::EPSILON);
        street.set_weight(2.0);
        street.scale_weight(1.5);
        assert!((street.weight() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn center_is_closest_point_to_extent_center() {
        // L-shaped street: extent center (5, 5) is nearest to (5, 0) and (10, 5).
        let street = StreetEntity::new(
            "Corner",
            None,
            line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]),
        );
        let center = street.center().unwrap();
        assert!(center == Point::new(5.0, 0.0) || center == Point::new(10.0, 5.0));
    }

    #[test]
    fn closest_point_spans_all_lines() {
        let mut street = StreetEntity::new("Split", None, line(&[(0.0, 0.0), (10.0, 0.0)]));
        street.append_line(line(&[(0.0, 20.0), (10.0, 20.0)]));
        assert_eq!(
            street.closest_point(Point::new(3.0, 18.0)),
            Some(Point::new(3.0, 20.0))
        );
    }
}
