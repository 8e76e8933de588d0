//! StreetQuiz Game Engine
//!
//! Platform-agnostic core of the StreetQuiz street-geography game: loading the
//! streets of a drawn boundary, weighting and sampling them, scoring guesses by
//! great-circle distance, and tracking a round in a [`GameSession`].
//! Fetching street data and drawing the map are left to the caller.

pub mod boundary;
pub mod config;
pub mod constants;
pub mod data;
pub mod geo;
pub mod numbers;
pub mod pool;
pub mod rng;
pub mod round;
pub mod sampler;
pub mod session;
pub mod street;
pub mod weights;

use thiserror::Error;

// Re-export commonly used types
pub use boundary::{BoundaryRegion, BoundaryShape};
pub use config::{GameConfig, GameConfigError};
pub use data::{OverpassElement, OverpassQuery, OverpassResponse, StreetDataError};
pub use geo::{
    Extent, LonLat, Point, format_length, from_lon_lat, haversine_distance, real_distance,
    real_line_distance, to_lon_lat,
};
pub use pool::SamplePool;
pub use rng::{RngBundle, SessionStream};
pub use round::{RoundLength, difficulty_levels};
pub use sampler::{SamplerError, sample_with_replacement, sample_without_replacement, shuffle};
pub use session::{
    GameSession, GuessOutcome, GuessRecord, RoundPhase, RoundProgress, RoundSummary,
    SessionError, SummaryMarker,
};
pub use street::StreetEntity;
pub use weights::{Adaptation, SamplingStrategy, WeightWarning, WeightingReport};

/// Trait for abstracting where street data comes from.
/// Platform-specific implementations should provide this (an HTTP client
/// against the Overpass endpoint, a cached file, a test fixture).
pub trait StreetSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run a street query and return the raw response document.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be fetched.
    fn fetch_streets(&self, query: &OverpassQuery) -> Result<OverpassResponse, Self::Error>;
}

/// Errors raised by [`GameEngine`].
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error("failed to fetch street data")]
    Source(#[source] E),
    #[error(transparent)]
    Data(#[from] StreetDataError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Main game engine for building sessions from a street source
pub struct GameEngine<S>
where
    S: StreetSource,
{
    source: S,
}

impl<S> GameEngine<S>
where
    S: StreetSource,
{
    /// Create a new game engine with the provided street source
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch and build the street pool for a boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails or the response is malformed.
    pub fn load_pool(&self, boundary: &BoundaryRegion) -> Result<SamplePool, EngineError<S::Error>> {
        let query = OverpassQuery::for_boundary(boundary);
        let response = self
            .source
            .fetch_streets(&query)
            .map_err(EngineError::Source)?;
        Ok(response.into_pool(boundary)?)
    }

    /// Round lengths to offer for a boundary's pool.
    #[must_use]
    pub fn difficulty_levels(pool: &SamplePool, config: &GameConfig) -> Vec<RoundLength> {
        difficulty_levels(pool.len(), config.base_round_length)
    }

    /// Load the streets for `boundary` and start a session over them.
    ///
    /// # Errors
    ///
    /// Returns an error if the streets cannot be loaded or the session
    /// cannot start.
    pub fn create_session(
        &self,
        boundary: BoundaryRegion,
        config: GameConfig,
        seed: u64,
    ) -> Result<GameSession, EngineError<S::Error>> {
        let pool = self.load_pool(&boundary)?;
        Ok(GameSession::start(pool, boundary, config, seed)?)
    }
}
