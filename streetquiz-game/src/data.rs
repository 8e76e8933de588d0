//! Street data: the Overpass query for a boundary and the response document.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::boundary::BoundaryRegion;
use crate::constants::{OVERPASS_ENDPOINT, OVERPASS_TIMEOUT_SECS};
use crate::geo::{Extent, LonLat, from_lon_lat, to_lon_lat};
use crate::pool::SamplePool;
use crate::street::StreetEntity;

/// Errors raised while turning street data into a pool.
#[derive(Debug, Error)]
pub enum StreetDataError {
    #[error("failed to parse street data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("street element {index} inside the boundary has no name tag")]
    MissingName { index: usize },
}

/// Tags of a way element. Only the ones the game reads are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ElementTags {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub highway: Option<String>,
}

/// One way element with inline geometry (`out geom`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OverpassElement {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub geometry: Vec<LonLat>,
    #[serde(default)]
    pub tags: ElementTags,
}

/// Response document of the street query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

impl OverpassResponse {
    /// Parse a response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the response shape.
    pub fn from_json(json: &str) -> Result<Self, StreetDataError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the street pool for `boundary`.
    ///
    /// Elements with no vertex inside the boundary are skipped. Elements that
    /// share a normalized name are merged into one street.
    ///
    /// # Errors
    ///
    /// Returns [`StreetDataError::MissingName`] for an element inside the
    /// boundary that carries no name.
    pub fn into_pool(self, boundary: &BoundaryRegion) -> Result<SamplePool, StreetDataError> {
        let mut pool = SamplePool::new();
        let mut skipped = 0usize;
        for (index, element) in self.elements.into_iter().enumerate() {
            let line: Vec<_> = element.geometry.iter().copied().map(from_lon_lat).collect();
            if !line.iter().any(|point| boundary.contains(*point)) {
                skipped += 1;
                continue;
            }
            let name = element
                .tags
                .name
                .ok_or(StreetDataError::MissingName { index })?;
            pool.insert(StreetEntity::new(name, element.tags.highway, line));
        }
        log::debug!(
            "loaded {} streets ({} elements outside the boundary)",
            pool.len(),
            skipped
        );
        Ok(pool)
    }
}

/// Street query for the bounding box of a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverpassQuery {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
    pub timeout_secs: u32,
}

impl OverpassQuery {
    pub const ENDPOINT: &'static str = OVERPASS_ENDPOINT;

    /// Query covering a projected extent.
    #[must_use]
    pub fn for_extent(extent: &Extent) -> Self {
        let south_west = to_lon_lat(extent.lower_left());
        let north_east = to_lon_lat(extent.upper_right());
        Self {
            south: south_west.lat,
            west: south_west.lon,
            north: north_east.lat,
            east: north_east.lon,
            timeout_secs: OVERPASS_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub fn for_boundary(boundary: &BoundaryRegion) -> Self {
        Self::for_extent(&boundary.extent())
    }

    /// Overpass QL selecting every named highway way with its geometry.
    #[must_use]
    pub fn text(&self) -> String {
        format!(
            "[out:json][timeout:{timeout}];\n(\n    way[highway][name]({south},{west},{north},{east});\n);\nout geom;\n",
            timeout = self.timeout_secs,
            south = self.south,
            west = self.west,
            north = self.north,
            east = self.east,
        )
    }
}
