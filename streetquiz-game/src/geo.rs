//! Projection, great-circle distance and planar helpers.
//!
//! Street and boundary geometry is kept in spherical Web Mercator metres
//! (EPSG:3857), the coordinate system the map renders in. Every distance that
//! is shown to the player or used for weighting is measured on the sphere
//! after reprojecting to longitude/latitude.
use serde::{Deserialize, Serialize};

use crate::constants::{
    EARTH_RADIUS_M, MERCATOR_MAX_LATITUDE, MERCATOR_RADIUS_M, METRES_PER_KILOMETRE,
};
use crate::numbers::{round_f64_to_u64, round_to_places};

/// A point in projected map coordinates (Web Mercator metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Arithmetic midpoint in projected space.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    #[must_use]
    pub fn planar_distance_sq(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Axis-aligned bounding box in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// An inverted extent that any point will grow.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY)
    }

    /// Smallest extent containing every point.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Self {
        points.into_iter().fold(Self::empty(), |mut extent, point| {
            extent.extend(*point);
            extent
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn extend(&mut self, point: Point) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    #[must_use]
    pub const fn lower_left(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    #[must_use]
    pub const fn upper_right(&self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Great-circle length of the extent diagonal in metres.
    #[must_use]
    pub fn diagonal_distance(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        real_distance(self.lower_left(), self.upper_right())
    }
}

/// Project a geographic coordinate into Web Mercator metres.
#[must_use]
pub fn from_lon_lat(coord: LonLat) -> Point {
    let lat = coord.lat.clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE);
    let x = MERCATOR_RADIUS_M * coord.lon.to_radians();
    let y = MERCATOR_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    Point::new(x, y)
}

/// Inverse of [`from_lon_lat`].
#[must_use]
pub fn to_lon_lat(point: Point) -> LonLat {
    let lon = (point.x / MERCATOR_RADIUS_M).to_degrees();
    let lat = (2.0 * (point.y / MERCATOR_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2)
        .to_degrees();
    LonLat::new(lon, lat)
}

/// Haversine distance between two geographic coordinates in metres.
#[must_use]
pub fn haversine_distance(a: LonLat, b: LonLat) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}

/// Great-circle distance between two projected points in metres.
#[must_use]
pub fn real_distance(p1: Point, p2: Point) -> f64 {
    haversine_distance(to_lon_lat(p1), to_lon_lat(p2))
}

/// Sum of great-circle distances between consecutive vertices of a path.
#[must_use]
pub fn real_line_distance(path: &[Point]) -> f64 {
    path.windows(2)
        .map(|pair| real_distance(pair[0], pair[1]))
        .sum()
}

/// Closest point to `target` on the segment `a`–`b`, in projected space.
#[must_use]
pub fn closest_point_on_segment(target: Point, a: Point, b: Point) -> Point {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return a;
    }
    let t = (((target.x - a.x) * dx + (target.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    Point::new(a.x + t * dx, a.y + t * dy)
}

/// Closest point to `target` on a polyline, or `None` for an empty path.
#[must_use]
pub fn closest_point_on_line(target: Point, path: &[Point]) -> Option<Point> {
    match path {
        [] => None,
        [only] => Some(*only),
        _ => path
            .windows(2)
            .map(|pair| closest_point_on_segment(target, pair[0], pair[1]))
            .min_by(|a, b| {
                a.planar_distance_sq(target)
                    .total_cmp(&b.planar_distance_sq(target))
            }),
    }
}

/// Human-readable distance label.
///
/// Whole metres below one kilometre, kilometres with up to two decimals
/// otherwise. A value that would round to "1000 m" is shown as "1 km".
#[must_use]
pub fn format_length(length_m: f64) -> String {
    let metres = round_f64_to_u64(length_m);
    if metres >= 1000 {
        let km = round_to_places(length_m / METRES_PER_KILOMETRE, 2);
        format!("{km} km")
    } else {
        format!("{metres} m")
    }
}
