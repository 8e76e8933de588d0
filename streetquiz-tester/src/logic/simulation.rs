use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use streetquiz_game::{
    Adaptation, BoundaryRegion, GameConfig, GameSession, GuessOutcome, RoundLength, SamplePool,
    SamplingStrategy,
};

use crate::logic::policy::{GuessDecision, PolicyKind};

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Configuration for one simulated round.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: SamplingStrategy,
    pub round_length: RoundLength,
    pub policy: PolicyKind,
    pub accuracy: f64,
    /// Guesses after which a free-play round is ended.
    pub max_guesses: usize,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(strategy: SamplingStrategy, round_length: RoundLength, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            round_length,
            policy: PolicyKind::Random,
            accuracy: 0.6,
            max_guesses: 25,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PolicyKind, accuracy: f64) -> Self {
        self.policy = policy;
        self.accuracy = accuracy;
        self
    }

    #[must_use]
    pub fn with_max_guesses(mut self, max_guesses: usize) -> Self {
        self.max_guesses = max_guesses;
        self
    }
}

/// Outcome of one simulated round.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub seed: u64,
    pub strategy: String,
    pub applied_strategy: String,
    pub round_length: String,
    pub policy: String,
    pub asked: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub total_distance_m: f64,
    pub total_distance_label: String,
    pub rng_draws: u64,
    pub warnings: Vec<String>,
    pub failures: Vec<String>,
    #[serde(skip)]
    pub duration: Duration,
}

impl RunRecord {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Play one round with an automated policy and check the sampling invariants
/// along the way.
///
/// # Errors
///
/// Returns an error if the session cannot start or rejects a guess.
pub fn run_simulation(
    pool: &SamplePool,
    boundary: &BoundaryRegion,
    base: &GameConfig,
    config: &SimulationConfig,
) -> Result<RunRecord> {
    let started = Instant::now();
    let game_config = base
        .clone()
        .with_strategy(config.strategy)
        .with_round_length(config.round_length);
    let adaptation = game_config.adaptation();
    let window = game_config.recent_window;
    let mut session = GameSession::start(pool.clone(), boundary.clone(), game_config, config.seed)
        .with_context(|| {
            format!(
                "failed to start {} round for seed {}",
                config.strategy, config.seed
            )
        })?;
    let mut policy = config.policy.create_policy(config.seed, config.accuracy);
    let free_play = session.round_length().is_unlimited();

    let mut failures = Vec::new();
    check_weights(&session, &mut failures);

    let mut history: Vec<usize> = Vec::new();
    while let Some(target) = session.current_index() {
        if free_play && history.len() >= config.max_guesses {
            break;
        }
        check_repeat(&session, &history, target, window, &mut failures);
        history.push(target);

        let before = session.pool().weights();
        let outcome = match policy.pick(&session) {
            GuessDecision::Name(name) => Some(session.guess(&name)?),
            GuessDecision::Click(point) => session.guess_at(point)?,
        };
        let outcome = match outcome {
            Some(outcome) => outcome,
            None => {
                failures.push(format!("{} click missed every street", policy.name()));
                let name = session.current_target().unwrap_or_default().to_string();
                session.guess(&name)?
            }
        };

        check_adaptation(
            &session,
            &before,
            &outcome,
            free_play.then_some(adaptation),
            &mut failures,
        );

        if session.advance()?.is_none() {
            break;
        }
    }

    if let RoundLength::Fixed(length) = session.round_length()
        && history.len() != length
    {
        failures.push(format!("asked {} streets in a round of {length}", history.len()));
    }

    let summary = session.finish();
    log::debug!(
        "seed {} {}: {}/{} correct, {}",
        config.seed,
        config.strategy,
        summary.correct,
        history.len(),
        summary.total_distance_label
    );

    Ok(RunRecord {
        seed: config.seed,
        strategy: config.strategy.to_string(),
        applied_strategy: session.weighting().applied.to_string(),
        round_length: session.round_length().to_string(),
        policy: config.policy.label().to_string(),
        asked: history.len(),
        correct: summary.correct,
        incorrect: summary.incorrect,
        total_distance_m: summary.total_distance_m,
        total_distance_label: summary.total_distance_label,
        rng_draws: session.rng().total_draws(),
        warnings: session
            .weighting()
            .warnings
            .iter()
            .map(ToString::to_string)
            .collect(),
        failures,
        duration: started.elapsed(),
    })
}

fn check_weights(session: &GameSession, failures: &mut Vec<String>) {
    for street in session.pool().streets() {
        if !(street.weight().is_finite() && street.weight() >= 0.0) {
            failures.push(format!("{} has weight {}", street.name, street.weight()));
        }
    }
}

/// Only the guessed street may change weight, and only in free play.
fn check_adaptation(
    session: &GameSession,
    before: &[f64],
    outcome: &GuessOutcome,
    adaptation: Option<Adaptation>,
    failures: &mut Vec<String>,
) {
    let guessed = session.pool().index_of(&outcome.record.guessed_key);
    for (idx, street) in session.pool().streets().iter().enumerate() {
        let old = before.get(idx).copied().unwrap_or_default();
        let expected = match adaptation {
            Some(adaptation) if Some(idx) == guessed => {
                old * adaptation.factor(outcome.record.correct)
            }
            _ => old,
        };
        if (street.weight() - expected).abs() > WEIGHT_TOLERANCE {
            failures.push(format!(
                "weight of {} is {} after guess, expected {expected}",
                street.name,
                street.weight()
            ));
        }
    }
}

fn check_repeat(
    session: &GameSession,
    history: &[usize],
    target: usize,
    window: usize,
    failures: &mut Vec<String>,
) {
    let name = &session.pool().streets()[target].name;
    if session.round_length().is_unlimited() {
        let window = window.min(session.pool().eligible_count().saturating_sub(1));
        let recent = &history[history.len().saturating_sub(window)..];
        if recent.contains(&target) {
            failures.push(format!("{name} repeated within the last {window} streets"));
        }
    } else if history.contains(&target) {
        failures.push(format!("{name} asked twice in a fixed round"));
    }
}

/// Aggregated results for one strategy.
#[derive(Debug, Clone, Serialize)]
pub struct StrategySummary {
    pub strategy: String,
    pub runs: usize,
    pub passed_runs: usize,
    pub mean_accuracy: f64,
    pub mean_distance_m: f64,
    pub failures: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub average_duration: Duration,
}

impl StrategySummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed_runs == self.runs
    }
}

/// Group runs by requested strategy, in first-seen order.
#[must_use]
pub fn summarize_runs(records: &[RunRecord]) -> Vec<StrategySummary> {
    let mut order: Vec<&str> = Vec::new();
    for record in records {
        if !order.contains(&record.strategy.as_str()) {
            order.push(&record.strategy);
        }
    }

    order
        .into_iter()
        .map(|strategy| {
            let runs: Vec<&RunRecord> = records
                .iter()
                .filter(|record| record.strategy == strategy)
                .collect();
            let count = u32::try_from(runs.len()).unwrap_or(u32::MAX).max(1);
            let guesses: usize = runs.iter().map(|r| r.correct + r.incorrect).sum();
            let correct: usize = runs.iter().map(|r| r.correct).sum();
            let mean_accuracy = if guesses == 0 {
                0.0
            } else {
                streetquiz_game::numbers::usize_to_f64(correct)
                    / streetquiz_game::numbers::usize_to_f64(guesses)
            };
            let total_distance: f64 = runs.iter().map(|r| r.total_distance_m).sum();
            let total_duration: Duration = runs.iter().map(|r| r.duration).sum();

            let mut failures = Vec::new();
            let mut warnings = Vec::new();
            for run in &runs {
                failures.extend(run.failures.iter().map(|f| format!("seed {}: {f}", run.seed)));
                for warning in &run.warnings {
                    if !warnings.contains(warning) {
                        warnings.push(warning.clone());
                    }
                }
            }

            StrategySummary {
                strategy: strategy.to_string(),
                runs: runs.len(),
                passed_runs: runs.iter().filter(|r| r.passed()).count(),
                mean_accuracy,
                mean_distance_m: total_distance / f64::from(count),
                failures,
                warnings,
                average_duration: total_duration / count,
            }
        })
        .collect()
}
