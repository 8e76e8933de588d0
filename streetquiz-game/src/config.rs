//! Session configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BASE_ROUND_LENGTH, CORRECT_GUESS_FACTOR, DIAGONAL_DIVISOR, INCORRECT_GUESS_FACTOR,
    PICK_RADIUS_M, RECENT_WINDOW,
};
use crate::round::RoundLength;
use crate::weights::{Adaptation, SamplingStrategy, WeightWarning};

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum GameConfigError {
    #[error("{field} must be positive and finite (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("base_round_length must be at least 1")]
    EmptyBaseRound,
    #[error("a fixed round must ask at least one street")]
    EmptyRound,
    #[error("failed to parse game config: {0}")]
    Parse(String),
}

/// Tunables for one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub strategy: SamplingStrategy,
    #[serde(default)]
    pub round_length: RoundLength,
    #[serde(default = "GameConfig::default_correct_factor")]
    pub correct_factor: f64,
    #[serde(default = "GameConfig::default_incorrect_factor")]
    pub incorrect_factor: f64,
    /// Recent free-play draws that may not repeat.
    #[serde(default = "GameConfig::default_recent_window")]
    pub recent_window: usize,
    /// Boundary diagonal divisor giving the weight normalization radius.
    #[serde(default = "GameConfig::default_diagonal_divisor")]
    pub diagonal_divisor: f64,
    #[serde(default = "GameConfig::default_base_round_length")]
    pub base_round_length: usize,
    /// Maximum click distance, in metres, that still selects a street.
    #[serde(default = "GameConfig::default_pick_radius_m")]
    pub pick_radius_m: f64,
}

impl GameConfig {
    const fn default_correct_factor() -> f64 {
        CORRECT_GUESS_FACTOR
    }

    const fn default_incorrect_factor() -> f64 {
        INCORRECT_GUESS_FACTOR
    }

    const fn default_recent_window() -> usize {
        RECENT_WINDOW
    }

    const fn default_diagonal_divisor() -> f64 {
        DIAGONAL_DIVISOR
    }

    const fn default_base_round_length() -> usize {
        BASE_ROUND_LENGTH
    }

    const fn default_pick_radius_m() -> f64 {
        PICK_RADIUS_M
    }

    #[must_use]
    pub fn default_config() -> Self {
        Self {
            strategy: SamplingStrategy::default(),
            round_length: RoundLength::default(),
            correct_factor: Self::default_correct_factor(),
            incorrect_factor: Self::default_incorrect_factor(),
            recent_window: Self::default_recent_window(),
            diagonal_divisor: Self::default_diagonal_divisor(),
            base_round_length: Self::default_base_round_length(),
            pick_radius_m: Self::default_pick_radius_m(),
        }
    }

    /// Parse and validate a JSON config; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, GameConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| GameConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: SamplingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Take the strategy from a UI selection string. Missing or unknown
    /// selections fall back to equal chance and return a warning.
    pub fn apply_selection(&mut self, selection: Option<&str>) -> Option<WeightWarning> {
        let (strategy, warning) = SamplingStrategy::resolve(selection);
        if let Some(warning) = &warning {
            log::warn!("{warning}");
        }
        self.strategy = strategy;
        warning
    }

    #[must_use]
    pub fn with_round_length(mut self, round_length: RoundLength) -> Self {
        self.round_length = round_length;
        self
    }

    /// Check that factors, divisor and radius are usable.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), GameConfigError> {
        for (field, value) in [
            ("correct_factor", self.correct_factor),
            ("incorrect_factor", self.incorrect_factor),
            ("diagonal_divisor", self.diagonal_divisor),
            ("pick_radius_m", self.pick_radius_m),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GameConfigError::NotPositive { field, value });
            }
        }
        if self.base_round_length == 0 {
            return Err(GameConfigError::EmptyBaseRound);
        }
        if self.round_length == RoundLength::Fixed(0) {
            return Err(GameConfigError::EmptyRound);
        }
        Ok(())
    }

    #[must_use]
    pub const fn adaptation(&self) -> Adaptation {
        Adaptation {
            correct_factor: self.correct_factor,
            incorrect_factor: self.incorrect_factor,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
