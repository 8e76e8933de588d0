//! One game session: the round queue, guesses, reweighting and the summary.
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::boundary::BoundaryRegion;
use crate::config::{GameConfig, GameConfigError};
use crate::geo::{Extent, Point, format_length, real_distance};
use crate::pool::SamplePool;
use crate::rng::RngBundle;
use crate::round::RoundLength;
use crate::sampler::{self, SamplerError};
use crate::weights::{Adaptation, WeightingReport, assign_initial_weights};

/// Errors raised by session operations.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("no street named `{0}` in the current pool")]
    UnknownStreet(String),
    #[error("no street is waiting for a guess")]
    NotAwaitingGuess,
    #[error("the last guess has not been reviewed")]
    NotReviewing,
    #[error("the round is already finished")]
    RoundFinished,
    #[error("the street pool is empty")]
    EmptyPool,
    #[error(transparent)]
    Sampler(#[from] SamplerError),
    #[error(transparent)]
    Config(#[from] GameConfigError),
}

/// Where the session is within the current street.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// A street is asked and the player is looking for it.
    Searching,
    /// The guess has been scored and is shown to the player.
    Reviewing,
    Finished,
}

/// Round counter shown next to the asked street.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundProgress {
    /// Fixed rounds count down, including the street currently asked.
    Remaining(usize),
    /// Free play counts the streets asked so far.
    Asked(usize),
}

/// One scored guess, kept for the round summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessRecord {
    pub target_key: String,
    pub target_name: String,
    pub guessed_key: String,
    /// Distance between the two street centers, 0 for a correct guess.
    pub distance_m: f64,
    pub correct: bool,
}

/// Everything needed to present a scored guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessOutcome {
    pub record: GuessRecord,
    pub distance_label: String,
    pub guessed_center: Option<Point>,
    pub target_center: Option<Point>,
    /// Line from the guessed street to the asked street, drawn on a miss.
    pub error_line: Option<[Point; 2]>,
    /// Anchor of the distance label, the midpoint of the error line.
    pub label_anchor: Option<Point>,
    /// Extent to zoom to: both streets on a miss, the asked street otherwise.
    pub fit_extent: Extent,
    /// Weight of the guessed street after adaptation.
    pub weight_after: f64,
}

/// Label placed on an asked street in the summary view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMarker {
    pub name: String,
    pub position: Point,
    pub distance_m: f64,
    pub distance_label: String,
    pub correct: bool,
    /// Northern labels are drawn below southern ones.
    pub z_index: usize,
}

/// End-of-round totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub correct: usize,
    pub incorrect: usize,
    pub total_distance_m: f64,
    pub total_distance_label: String,
    pub guesses: Vec<GuessRecord>,
    /// Sorted north to south.
    pub markers: Vec<SummaryMarker>,
}

impl RoundSummary {
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let total = self.correct + self.incorrect;
        if total == 0 {
            return 0.0;
        }
        crate::numbers::usize_to_f64(self.correct) / crate::numbers::usize_to_f64(total)
    }
}

const MARKER_Z_BASE: usize = 10;

/// Game state for one boundary and one pool of streets.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    boundary: BoundaryRegion,
    pool: SamplePool,
    rng: RngBundle,
    weighting: WeightingReport,
    round_length: RoundLength,
    targets: Vec<usize>,
    cursor: usize,
    recent: VecDeque<usize>,
    current: Option<usize>,
    phase: RoundPhase,
    correct: usize,
    incorrect: usize,
    total_distance_m: f64,
    guesses: Vec<GuessRecord>,
}

impl GameSession {
    /// Weight the pool, sample the round and ask the first street.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, the pool is empty, or no
    /// street ends up with a positive weight.
    pub fn start(
        pool: SamplePool,
        boundary: BoundaryRegion,
        config: GameConfig,
        seed: u64,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        if pool.is_empty() {
            return Err(SessionError::EmptyPool);
        }
        let round_length = config.round_length;
        let round_strategy = config.strategy;
        let mut session = Self {
            config,
            boundary,
            pool,
            rng: RngBundle::from_user_seed(seed),
            weighting: WeightingReport {
                applied: round_strategy,
                normalization_radius: 0.0,
                max_weight: 0.0,
                warnings: Vec::new(),
            },
            round_length,
            targets: Vec::new(),
            cursor: 0,
            recent: VecDeque::new(),
            current: None,
            phase: RoundPhase::Searching,
            correct: 0,
            incorrect: 0,
            total_distance_m: 0.0,
            guesses: Vec::new(),
        };
        session.begin_round()?;
        Ok(session)
    }

    /// Recompute weights, clear the counters and sample a new round. The RNG
    /// streams carry on, so a restarted round differs from the first one.
    ///
    /// # Errors
    ///
    /// Returns an error if no street has a positive weight.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.begin_round()
    }

    fn begin_round(&mut self) -> Result<(), SessionError> {
        self.weighting = assign_initial_weights(
            &mut self.pool,
            &self.boundary,
            self.config.strategy,
            self.config.diagonal_divisor,
        );
        self.targets.clear();
        self.cursor = 0;
        self.recent.clear();
        self.current = None;
        self.correct = 0;
        self.incorrect = 0;
        self.total_distance_m = 0.0;
        self.guesses.clear();

        let eligible = self.pool.eligible_count();
        if eligible == 0 {
            return Err(SamplerError::NoEligible.into());
        }

        self.round_length = match self.config.round_length {
            RoundLength::Fixed(requested) => {
                let length = requested.min(eligible);
                if length < requested {
                    log::warn!(
                        "round of {requested} streets shortened to {length}: only {eligible} can be drawn"
                    );
                }
                let mut targets = self
                    .pool
                    .sample_without_replacement(length, self.rng.draw())?;
                sampler::shuffle(&mut targets, self.rng.shuffle());
                self.targets = targets;
                RoundLength::Fixed(length)
            }
            RoundLength::Unlimited => RoundLength::Unlimited,
        };
        log::debug!(
            "round started: {} with {} (seed {})",
            self.round_length,
            self.weighting.applied,
            self.rng.seed()
        );
        self.ask_next()?;
        Ok(())
    }

    fn exclusion_window(&self) -> usize {
        self.config
            .recent_window
            .min(self.pool.eligible_count().saturating_sub(1))
    }

    fn ask_next(&mut self) -> Result<Option<usize>, SessionError> {
        let next = match self.round_length {
            RoundLength::Fixed(_) => {
                let next = self.targets.get(self.cursor).copied();
                if next.is_some() {
                    self.cursor += 1;
                }
                next
            }
            RoundLength::Unlimited => {
                let window = self.exclusion_window();
                while self.recent.len() > window {
                    self.recent.pop_front();
                }
                let exclusions: Vec<usize> = self.recent.iter().copied().collect();
                let idx = self
                    .pool
                    .sample_with_replacement(&exclusions, self.rng.draw())?;
                self.recent.push_back(idx);
                while self.recent.len() > window {
                    self.recent.pop_front();
                }
                self.cursor += 1;
                Some(idx)
            }
        };
        self.current = next;
        self.phase = if next.is_some() {
            RoundPhase::Searching
        } else {
            RoundPhase::Finished
        };
        if let Some(idx) = next {
            log::debug!("asking street {} ({})", idx, self.pool.streets()[idx].name);
        }
        Ok(next)
    }

    /// Score a guess by street name or key.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownStreet`] if the name is not in the pool,
    /// or a phase error if no street is waiting for a guess.
    pub fn guess(&mut self, name: &str) -> Result<GuessOutcome, SessionError> {
        let target = self.awaiting_target()?;
        let guessed = self
            .pool
            .index_of(name)
            .ok_or_else(|| SessionError::UnknownStreet(name.to_string()))?;
        Ok(self.score(target, guessed))
    }

    /// Score a click on the map: the street nearest `point` within the pick
    /// radius is the guess. Returns `Ok(None)` when the click hit no street.
    ///
    /// # Errors
    ///
    /// Returns a phase error if no street is waiting for a guess.
    pub fn guess_at(&mut self, point: Point) -> Result<Option<GuessOutcome>, SessionError> {
        let target = self.awaiting_target()?;
        Ok(self.street_at(point).map(|guessed| self.score(target, guessed)))
    }

    /// Index of the street under a click, if any.
    #[must_use]
    pub fn street_at(&self, point: Point) -> Option<usize> {
        self.pool.closest_within(point, self.config.pick_radius_m)
    }

    fn awaiting_target(&self) -> Result<usize, SessionError> {
        match self.phase {
            RoundPhase::Finished => Err(SessionError::RoundFinished),
            RoundPhase::Reviewing => Err(SessionError::NotAwaitingGuess),
            RoundPhase::Searching => self.current.ok_or(SessionError::NotAwaitingGuess),
        }
    }

    fn score(&mut self, target: usize, guessed: usize) -> GuessOutcome {
        let correct = target == guessed;
        let streets = self.pool.streets();
        let target_street = &streets[target];
        let guessed_street = &streets[guessed];
        let target_center = target_street.center();
        let guessed_center = guessed_street.center();

        let (distance_m, error_line, label_anchor, fit_extent) = if correct {
            (0.0, None, None, target_street.extent())
        } else {
            let fit = guessed_street.extent().union(&target_street.extent());
            match (guessed_center, target_center) {
                (Some(from), Some(to)) => (
                    real_distance(from, to),
                    Some([from, to]),
                    Some(from.midpoint(to)),
                    fit,
                ),
                _ => (0.0, None, None, fit),
            }
        };

        let record = GuessRecord {
            target_key: target_street.key.clone(),
            target_name: target_street.name.clone(),
            guessed_key: guessed_street.key.clone(),
            distance_m,
            correct,
        };

        if correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        self.total_distance_m += distance_m;

        if let Some(adaptation) = Adaptation::for_round(self.round_length, self.config.adaptation())
            && let Some(street) = self.pool.street_mut(guessed)
        {
            adaptation.apply(street, correct);
        }
        let weight_after = self.pool.streets()[guessed].weight();

        log::debug!(
            "guess for {}: {} ({:.1} m, {} weight now {:.3})",
            record.target_name,
            if correct { "correct" } else { "missed" },
            distance_m,
            record.guessed_key,
            weight_after
        );

        self.guesses.push(record.clone());
        self.phase = RoundPhase::Reviewing;

        GuessOutcome {
            record,
            distance_label: format_length(distance_m),
            guessed_center,
            target_center,
            error_line,
            label_anchor,
            fit_extent,
            weight_after,
        }
    }

    /// Move past the reviewed guess. Returns the next street's name, or
    /// `None` once a fixed round has run out of streets.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReviewing`] unless a guess was just scored.
    pub fn advance(&mut self) -> Result<Option<&str>, SessionError> {
        match self.phase {
            RoundPhase::Reviewing => {}
            RoundPhase::Finished => return Err(SessionError::RoundFinished),
            RoundPhase::Searching => return Err(SessionError::NotReviewing),
        }
        let next = self.ask_next()?;
        Ok(next.map(|idx| self.pool.streets()[idx].name.as_str()))
    }

    /// End the round now, as the "give up" button does in free play.
    pub fn finish(&mut self) -> RoundSummary {
        self.current = None;
        self.phase = RoundPhase::Finished;
        self.summary()
    }

    /// Totals and summary markers for the guesses made so far.
    #[must_use]
    pub fn summary(&self) -> RoundSummary {
        let mut markers: Vec<SummaryMarker> = self
            .guesses
            .iter()
            .filter_map(|guess| {
                let street = self.pool.get(&guess.target_key)?;
                Some(SummaryMarker {
                    name: guess.target_name.clone(),
                    position: street.center()?,
                    distance_m: guess.distance_m,
                    distance_label: format_length(guess.distance_m),
                    correct: guess.correct,
                    z_index: 0,
                })
            })
            .collect();
        markers.sort_by(|a, b| b.position.y.total_cmp(&a.position.y));
        for (i, marker) in markers.iter_mut().enumerate() {
            marker.z_index = i + MARKER_Z_BASE;
        }

        RoundSummary {
            correct: self.correct,
            incorrect: self.incorrect,
            total_distance_m: self.total_distance_m,
            total_distance_label: format_length(self.total_distance_m),
            guesses: self.guesses.clone(),
            markers,
        }
    }

    /// Name of the street currently asked.
    #[must_use]
    pub fn current_target(&self) -> Option<&str> {
        self.current
            .and_then(|idx| self.pool.street(idx))
            .map(|street| street.name.as_str())
    }

    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    #[must_use]
    pub fn progress(&self) -> RoundProgress {
        match self.round_length {
            RoundLength::Fixed(_) if self.phase == RoundPhase::Finished => {
                RoundProgress::Remaining(0)
            }
            RoundLength::Fixed(_) => {
                RoundProgress::Remaining((self.targets.len() + 1).saturating_sub(self.cursor))
            }
            RoundLength::Unlimited => RoundProgress::Asked(self.cursor),
        }
    }

    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == RoundPhase::Finished
    }

    /// Round length actually played, after clamping to the drawable streets.
    #[must_use]
    pub const fn round_length(&self) -> RoundLength {
        self.round_length
    }

    /// Streets of a fixed round, in the order they are asked.
    #[must_use]
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    #[must_use]
    pub const fn weighting(&self) -> &WeightingReport {
        &self.weighting
    }

    #[must_use]
    pub const fn pool(&self) -> &SamplePool {
        &self.pool
    }

    #[must_use]
    pub const fn boundary(&self) -> &BoundaryRegion {
        &self.boundary
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    /// Hand the pool back, e.g. to reuse it with another config.
    #[must_use]
    pub fn into_pool(self) -> SamplePool {
        self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::street::StreetEntity;
    use crate::weights::SamplingStrategy;

    fn grid_pool(count: usize) -> SamplePool {
        SamplePool::from_streets((0..count).map(|i| {
            let y = 100.0 * crate::numbers::usize_to_f64(i);
            StreetEntity::new(
                format!("Street {i}"),
                None,
                vec![Point::new(0.0, y), Point::new(200.0, y)],
            )
        }))
    }

    fn boundary() -> BoundaryRegion {
        BoundaryRegion::circle(Point::new(100.0, 500.0), 3000.0)
    }

    fn session(count: usize, length: RoundLength) -> GameSession {
        let config = GameConfig::default().with_round_length(length);
        GameSession::start(grid_pool(count), boundary(), config, 11).unwrap()
    }

    #[test]
    fn fixed_round_asks_distinct_streets_then_finishes() {
        let mut game = session(10, RoundLength::Fixed(5));
        assert_eq!(game.progress(), RoundProgress::Remaining(5));
        let mut asked = Vec::new();
        loop {
            let name = game.current_target().unwrap().to_string();
            asked.push(name.clone());
            let outcome = game.guess(&name).unwrap();
            assert!(outcome.record.correct);
            assert_eq!(outcome.record.distance_m, 0.0);
            if game.advance().unwrap().is_none() {
                break;
            }
        }
        asked.sort();
        asked.dedup();
        assert_eq!(asked.len(), 5);
        assert!(game.is_finished());
        assert_eq!(game.progress(), RoundProgress::Remaining(0));
        assert_eq!(game.guess("Street 0"), Err(SessionError::RoundFinished));
    }

    #[test]
    fn fixed_round_keeps_weights() {
        let mut game = session(6, RoundLength::Fixed(3));
        let target = game.current_index().unwrap();
        let before = game.pool().weights();
        let wrong = if target == 0 { "Street 1" } else { "Street 0" };
        let wrong_idx = game.pool().index_of(wrong).unwrap();
        let outcome = game.guess(wrong).unwrap();
        assert!(!outcome.record.correct);
        assert!((outcome.weight_after - before[wrong_idx]).abs() < f64::EPSILON);
        assert_eq!(game.pool().weights(), before);
    }

    #[test]
    fn free_play_reweights_guessed_street() {
        let mut game = session(8, RoundLength::Unlimited);
        let name = game.current_target().unwrap().to_string();
        let outcome = game.guess(&name).unwrap();
        assert!((outcome.weight_after - 0.75).abs() < 1e-12);
        game.advance().unwrap();

        let target = game.current_index().unwrap();
        let target_before = game.pool().streets()[target].weight();
        let wrong_idx = (target + 1) % 8;
        let wrong_before = game.pool().streets()[wrong_idx].weight();
        let wrong = game.pool().streets()[wrong_idx].name.clone();
        let outcome = game.guess(&wrong).unwrap();
        assert!(!outcome.record.correct);
        assert!(outcome.record.distance_m > 0.0);
        assert!(outcome.error_line.is_some());
        assert!((game.pool().streets()[wrong_idx].weight() - wrong_before * 1.5).abs() < 1e-12);
        assert!((outcome.weight_after - wrong_before * 1.5).abs() < 1e-12);
        assert!((game.pool().streets()[target].weight() - target_before).abs() < 1e-12);
        assert_eq!(game.progress(), RoundProgress::Asked(2));
    }

    #[test]
    fn free_play_does_not_repeat_recent_streets() {
        let mut game = session(8, RoundLength::Unlimited);
        let mut history = vec![game.current_index().unwrap()];
        for _ in 0..40 {
            let name = game.current_target().unwrap().to_string();
            game.guess(&name).unwrap();
            game.advance().unwrap();
            let idx = game.current_index().unwrap();
            let recent = &history[history.len().saturating_sub(5)..];
            assert!(!recent.contains(&idx), "{idx} repeated within {recent:?}");
            history.push(idx);
        }
    }

    #[test]
    fn free_play_window_shrinks_for_small_pools() {
        let mut game = session(2, RoundLength::Unlimited);
        let mut previous = game.current_index().unwrap();
        for _ in 0..10 {
            let name = game.current_target().unwrap().to_string();
            game.guess(&name).unwrap();
            game.advance().unwrap();
            let idx = game.current_index().unwrap();
            assert_ne!(idx, previous);
            previous = idx;
        }
    }

    #[test]
    fn round_is_clamped_to_pool_size() {
        let game = session(3, RoundLength::Fixed(10));
        assert_eq!(game.round_length(), RoundLength::Fixed(3));
        assert_eq!(game.targets().len(), 3);
    }

    #[test]
    fn phase_errors() {
        let mut game = session(4, RoundLength::Fixed(2));
        assert_eq!(game.advance(), Err(SessionError::NotReviewing));
        assert_eq!(
            game.guess("Nowhere Lane"),
            Err(SessionError::UnknownStreet("Nowhere Lane".to_string()))
        );
        let name = game.current_target().unwrap().to_string();
        game.guess(&name).unwrap();
        assert_eq!(game.guess(&name), Err(SessionError::NotAwaitingGuess));
    }

    #[test]
    fn empty_pool_is_rejected() {
        let err = GameSession::start(SamplePool::new(), boundary(), GameConfig::default(), 1)
            .unwrap_err();
        assert_eq!(err, SessionError::EmptyPool);
    }

    #[test]
    fn click_guess_uses_pick_radius() {
        let mut game = session(5, RoundLength::Fixed(5));
        assert_eq!(game.guess_at(Point::new(5000.0, 5000.0)).unwrap(), None);
        let target = game.current_index().unwrap();
        let y = 100.0 * crate::numbers::usize_to_f64(target);
        let outcome = game.guess_at(Point::new(100.0, y + 10.0)).unwrap().unwrap();
        assert!(outcome.record.correct);
    }

    #[test]
    fn summary_sorts_markers_north_to_south() {
        let mut game = session(6, RoundLength::Fixed(4));
        while !game.is_finished() {
            let name = game.current_target().unwrap().to_string();
            game.guess(&name).unwrap();
            game.advance().unwrap();
        }
        let summary = game.summary();
        assert_eq!(summary.correct, 4);
        assert_eq!(summary.markers.len(), 4);
        assert!(
            summary
                .markers
                .windows(2)
                .all(|pair| pair[0].position.y >= pair[1].position.y)
        );
        assert_eq!(summary.markers[0].z_index, 10);
        assert_eq!(summary.total_distance_label, "0 m");
        assert!((summary.accuracy() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn finish_ends_free_play_and_restart_resets() {
        let mut game = session(6, RoundLength::Unlimited);
        let target = game.current_index().unwrap();
        let wrong = game.pool().streets()[(target + 1) % 6].name.clone();
        game.guess(&wrong).unwrap();
        let summary = game.finish();
        assert_eq!(summary.incorrect, 1);
        assert!(summary.total_distance_m > 0.0);
        assert!(game.is_finished());

        game.restart().unwrap();
        assert_eq!(game.phase(), RoundPhase::Searching);
        assert_eq!(game.summary().guesses.len(), 0);
        assert!(
            game.pool()
                .streets()
                .iter()
                .all(|street| (street.weight() - 1.0).abs() < f64::EPSILON)
        );
    }

    #[test]
    fn pin_strategy_without_pin_reports_fallback() {
        let config = GameConfig::default().with_strategy(SamplingStrategy::PinOnly);
        let game = GameSession::start(grid_pool(4), boundary(), config, 3).unwrap();
        assert_eq!(game.weighting().applied, SamplingStrategy::EqualChance);
        assert_eq!(game.weighting().warnings.len(), 1);
    }
}
