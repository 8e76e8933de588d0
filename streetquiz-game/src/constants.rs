//! Centralized tuning constants for StreetQuiz game logic.
//!
//! These values define the sampling and scoring math. Most of them can be
//! overridden per session through [`crate::config::GameConfig`]; the defaults
//! live here so that tests and the tester agree on them.

// Geodesy ------------------------------------------------------------------
/// Mean Earth radius used for great-circle distances (metres).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;
/// Sphere radius of the Web Mercator projection (metres).
pub const MERCATOR_RADIUS_M: f64 = 6_378_137.0;
/// Latitude clamp of the Web Mercator projection (degrees).
pub const MERCATOR_MAX_LATITUDE: f64 = 85.051_128_779_806_6;

// Weighting ----------------------------------------------------------------
/// Divisor turning the boundary diagonal into the weight normalization radius.
/// Empirical tuning value kept for parity with existing play data.
pub const DIAGONAL_DIVISOR: f64 = 3.0;
/// Multiplier applied to a street's weight after a correct free-play guess.
pub const CORRECT_GUESS_FACTOR: f64 = 0.75;
/// Multiplier applied to a street's weight after an incorrect free-play guess.
pub const INCORRECT_GUESS_FACTOR: f64 = 1.5;

// Rounds -------------------------------------------------------------------
/// Number of recent free-play draws that may not be repeated.
pub const RECENT_WINDOW: usize = 5;
/// First rung of the difficulty ladder; each following rung doubles it.
pub const BASE_ROUND_LENGTH: usize = 5;
/// Maximum click distance (metres) for a click to select a street.
pub const PICK_RADIUS_M: f64 = 50.0;

// Street data --------------------------------------------------------------
/// Overpass interpreter endpoint the street query is posted to.
pub const OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";
/// Server-side query timeout embedded in the Overpass request (seconds).
pub const OVERPASS_TIMEOUT_SECS: u32 = 90;

// Formatting ---------------------------------------------------------------
pub(crate) const METRES_PER_KILOMETRE: f64 = 1000.0;
