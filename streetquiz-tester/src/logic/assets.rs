use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use streetquiz_game::numbers::usize_to_f64;
use streetquiz_game::{
    BoundaryRegion, GameEngine, OverpassQuery, OverpassResponse, Point, SamplePool,
    StreetDataError, StreetEntity, StreetSource,
};
use thiserror::Error;

/// Errors raised while reading a saved street query response.
#[derive(Debug, Error)]
pub enum FileSourceError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Data(#[from] StreetDataError),
}

/// Street source backed by a saved Overpass response.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StreetSource for FileSource {
    type Error = FileSourceError;

    fn fetch_streets(&self, query: &OverpassQuery) -> Result<OverpassResponse, Self::Error> {
        log::debug!(
            "serving query from {} instead of {}:\n{}",
            self.path.display(),
            OverpassQuery::ENDPOINT,
            query.text()
        );
        let json = std::fs::read_to_string(&self.path).map_err(|source| FileSourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(OverpassResponse::from_json(&json)?)
    }
}

/// Load the pool for `boundary` from a saved response file.
pub fn load_file_pool(path: &Path, boundary: &BoundaryRegion) -> Result<SamplePool> {
    let engine = GameEngine::new(FileSource::new(path));
    engine
        .load_pool(boundary)
        .with_context(|| format!("failed to load streets from {}", path.display()))
}

/// Evenly spaced east-west streets across the middle of the boundary.
#[must_use]
pub fn synthetic_pool(boundary: &BoundaryRegion, count: usize) -> SamplePool {
    let extent = boundary.extent();
    let center = extent.center();
    let width = extent.max_x - extent.min_x;
    let height = extent.max_y - extent.min_y;
    let spacing = height * 0.6 / usize_to_f64(count.max(1));
    let half = usize_to_f64(count) / 2.0;

    SamplePool::from_streets((0..count).map(|i| {
        let y = center.y + (usize_to_f64(i) - half) * spacing;
        StreetEntity::new(
            format!("Grid Street {}", i + 1),
            Some("residential".to_string()),
            vec![
                Point::new(center.x - width * 0.25, y),
                Point::new(center.x, y),
                Point::new(center.x + width * 0.25, y),
            ],
        )
    }))
}
