use std::fmt;

use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use streetquiz_game::{GameSession, Point, StreetEntity};

/// Guess returned by a [`GuessPolicy`].
#[derive(Debug, Clone, PartialEq)]
pub enum GuessDecision {
    /// Type the street name.
    Name(String),
    /// Click the map at a projected point.
    Click(Point),
}

/// Policy interface for automated players.
pub trait GuessPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick a guess for the street currently asked.
    fn pick(&mut self, session: &GameSession) -> GuessDecision;
}

/// Built-in guessing strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum PolicyKind {
    /// Always names the asked street
    Perfect,
    /// Names the asked street with the given accuracy, otherwise a random street
    Random,
    /// Clicks the asked street with the given accuracy, otherwise its nearest neighbour
    Nearby,
}

impl PolicyKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PolicyKind::Perfect => "Perfect",
            PolicyKind::Random => "Random",
            PolicyKind::Nearby => "Nearby",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64, accuracy: f64) -> Box<dyn GuessPolicy + Send> {
        match self {
            PolicyKind::Perfect => Box::new(PerfectPolicy),
            PolicyKind::Random => Box::new(RandomPolicy::new(seed, accuracy)),
            PolicyKind::Nearby => Box::new(NearbyPolicy::new(seed, accuracy)),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct PerfectPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
    accuracy: f64,
}

impl RandomPolicy {
    fn new(seed: u64, accuracy: f64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            accuracy: clamp_probability(accuracy),
        }
    }
}

struct NearbyPolicy {
    rng: ChaCha20Rng,
    accuracy: f64,
}

impl NearbyPolicy {
    fn new(seed: u64, accuracy: f64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed ^ 0x4E45_4152),
            accuracy: clamp_probability(accuracy),
        }
    }
}

fn clamp_probability(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn target_name(session: &GameSession) -> String {
    session.current_target().unwrap_or_default().to_string()
}

impl GuessPolicy for PerfectPolicy {
    fn name(&self) -> &'static str {
        "Perfect"
    }

    fn pick(&mut self, session: &GameSession) -> GuessDecision {
        GuessDecision::Name(target_name(session))
    }
}

impl GuessPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick(&mut self, session: &GameSession) -> GuessDecision {
        let streets = session.pool().streets();
        let Some(target) = session.current_index() else {
            return GuessDecision::Name(String::new());
        };
        if streets.len() < 2 || self.rng.gen_bool(self.accuracy) {
            return GuessDecision::Name(target_name(session));
        }
        let mut idx = self.rng.gen_range(0..streets.len());
        if idx == target {
            idx = (idx + 1) % streets.len();
        }
        GuessDecision::Name(streets[idx].name.clone())
    }
}

impl GuessPolicy for NearbyPolicy {
    fn name(&self) -> &'static str {
        "Nearby"
    }

    fn pick(&mut self, session: &GameSession) -> GuessDecision {
        let streets = session.pool().streets();
        let Some(target) = session.current_index() else {
            return GuessDecision::Name(String::new());
        };
        let Some(target_center) = streets[target].center() else {
            return GuessDecision::Name(target_name(session));
        };
        if self.rng.gen_bool(self.accuracy) {
            return GuessDecision::Click(target_center);
        }
        nearest_neighbour(streets, target, target_center)
            .map_or(GuessDecision::Click(target_center), GuessDecision::Click)
    }
}

/// Center of the street closest to `from`, skipping `skip`.
fn nearest_neighbour(streets: &[StreetEntity], skip: usize, from: Point) -> Option<Point> {
    streets
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != skip)
        .filter_map(|(_, street)| street.center())
        .min_by(|a, b| {
            a.planar_distance_sq(from)
                .total_cmp(&b.planar_distance_sq(from))
        })
}
