//! Street weighting: initial weights per strategy and adaptive reweighting.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::boundary::BoundaryRegion;
use crate::constants::{CORRECT_GUESS_FACTOR, INCORRECT_GUESS_FACTOR};
use crate::geo::{Point, real_distance};
use crate::pool::SamplePool;
use crate::round::RoundLength;
use crate::street::StreetEntity;

/// How initial street weights are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SamplingStrategy {
    /// Longer streets are asked more often, up to the normalization radius.
    StreetsOnly,
    /// Mean of the street-length and pin-proximity weights.
    StreetsAndPin,
    /// Streets near the pin are asked more often; streets beyond the
    /// normalization radius are never asked.
    PinOnly,
    #[default]
    EqualChance,
}

impl SamplingStrategy {
    pub const ALL: [Self; 4] = [
        Self::StreetsOnly,
        Self::StreetsAndPin,
        Self::PinOnly,
        Self::EqualChance,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StreetsOnly => "streets-only",
            Self::StreetsAndPin => "streets-and-pin",
            Self::PinOnly => "pin-only",
            Self::EqualChance => "equal-chance",
        }
    }

    #[must_use]
    pub const fn uses_pin(self) -> bool {
        matches!(self, Self::StreetsAndPin | Self::PinOnly)
    }

    /// Resolve a UI selection, falling back to [`SamplingStrategy::EqualChance`]
    /// with a warning when it is missing or unrecognized.
    #[must_use]
    pub fn resolve(selection: Option<&str>) -> (Self, Option<WeightWarning>) {
        match selection {
            None => (Self::EqualChance, Some(WeightWarning::MissingStrategy)),
            Some(value) => match value.parse::<Self>() {
                Ok(strategy) => (strategy, None),
                Err(UnknownStrategy(value)) => (
                    Self::EqualChance,
                    Some(WeightWarning::UnknownStrategy { value }),
                ),
            },
        }
    }
}

impl fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy string that names no known strategy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sampling strategy `{0}`")]
pub struct UnknownStrategy(pub String);

impl FromStr for SamplingStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// Non-fatal conditions met while weighting; the caller decides how to show them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeightWarning {
    #[error("no sampling strategy selected; all streets have equal probability")]
    MissingStrategy,
    #[error("unknown sampling strategy `{value}`; all streets have equal probability")]
    UnknownStrategy { value: String },
    #[error("strategy {requested} needs a pin; using {applied} instead")]
    MissingPin {
        requested: SamplingStrategy,
        applied: SamplingStrategy,
    },
}

/// Outcome of assigning initial weights to a pool.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightingReport {
    pub applied: SamplingStrategy,
    /// Boundary diagonal divided by the configured divisor, in metres.
    pub normalization_radius: f64,
    pub max_weight: f64,
    pub warnings: Vec<WeightWarning>,
}

fn length_term(street: &StreetEntity, radius: f64) -> f64 {
    street.length.min(radius)
}

fn pin_term(street: &StreetEntity, radius: f64, pin: Point) -> f64 {
    street
        .closest_point(pin)
        .map_or(0.0, |nearest| (radius - real_distance(nearest, pin)).max(0.0))
}

/// Initial weight of one street. `pin` is required by the pin strategies and
/// ignored otherwise; a pin strategy without a pin yields 0.
#[must_use]
pub fn street_weight(
    street: &StreetEntity,
    strategy: SamplingStrategy,
    radius: f64,
    pin: Option<Point>,
) -> f64 {
    let weight = match (strategy, pin) {
        (SamplingStrategy::EqualChance, _) => 1.0,
        (SamplingStrategy::StreetsOnly, _) => length_term(street, radius),
        (SamplingStrategy::PinOnly, Some(pin)) => pin_term(street, radius, pin),
        (SamplingStrategy::StreetsAndPin, Some(pin)) => {
            (length_term(street, radius) + pin_term(street, radius, pin)) / 2.0
        }
        (SamplingStrategy::PinOnly | SamplingStrategy::StreetsAndPin, None) => 0.0,
    };
    weight.max(0.0)
}

/// Strategy actually applied when `requested` meets a boundary with or without a pin.
#[must_use]
pub fn effective_strategy(
    requested: SamplingStrategy,
    has_pin: bool,
) -> (SamplingStrategy, Option<WeightWarning>) {
    if has_pin || !requested.uses_pin() {
        return (requested, None);
    }
    let applied = match requested {
        SamplingStrategy::StreetsAndPin => SamplingStrategy::StreetsOnly,
        _ => SamplingStrategy::EqualChance,
    };
    (applied, Some(WeightWarning::MissingPin { requested, applied }))
}

/// Compute fresh weights for every street in the pool and clear its drawn set.
pub fn assign_initial_weights(
    pool: &mut SamplePool,
    boundary: &BoundaryRegion,
    requested: SamplingStrategy,
    diagonal_divisor: f64,
) -> WeightingReport {
    let (applied, warning) = effective_strategy(requested, boundary.pin.is_some());
    let warnings: Vec<WeightWarning> = warning.into_iter().collect();
    for warning in &warnings {
        log::warn!("{warning}");
    }

    let radius = boundary.normalization_radius(diagonal_divisor);
    for street in pool.streets_mut() {
        let weight = street_weight(street, applied, radius, boundary.pin);
        street.set_weight(weight);
    }
    pool.reset_draws();

    let max_weight = pool.max_weight();
    log::debug!(
        "weighted {} streets with {applied} (radius {radius:.1} m, max weight {max_weight:.1})",
        pool.len()
    );

    WeightingReport {
        applied,
        normalization_radius: radius,
        max_weight,
        warnings,
    }
}

/// Free-play difficulty adaptation applied to the guessed street after a guess.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adaptation {
    pub correct_factor: f64,
    pub incorrect_factor: f64,
}

impl Default for Adaptation {
    fn default() -> Self {
        Self {
            correct_factor: CORRECT_GUESS_FACTOR,
            incorrect_factor: INCORRECT_GUESS_FACTOR,
        }
    }
}

impl Adaptation {
    /// Adaptation for a round, or `None` when weights stay fixed (fixed-length rounds).
    #[must_use]
    pub fn for_round(length: RoundLength, adaptation: Self) -> Option<Self> {
        length.is_unlimited().then_some(adaptation)
    }

    #[must_use]
    pub const fn factor(&self, correct: bool) -> f64 {
        if correct {
            self.correct_factor
        } else {
            self.incorrect_factor
        }
    }

    /// Scale the street's weight: down after a correct guess, up after a miss.
    pub fn apply(&self, street: &mut StreetEntity, correct: bool) {
        street.scale_weight(self.factor(correct));
    }
}
