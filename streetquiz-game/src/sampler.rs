//! Weighted draws over a pool of non-negative weights.
//!
//! All functions work on a plain weight slice in pool order and identify
//! entities by index. Exclusions (recent draws, entities already drawn this
//! round) are passed alongside the weights instead of being written into them,
//! so the original weights stay intact and introspectable.
use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

/// Errors raised when a draw cannot be satisfied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SamplerError {
    #[error("no entity with positive weight is eligible for drawing")]
    NoEligible,
    #[error("all {eligible} positively weighted entities are excluded ({excluded} exclusions)")]
    ExclusionsExhausted { excluded: usize, eligible: usize },
    #[error("requested {requested} draws but only {available} entities are eligible")]
    InsufficientPool { requested: usize, available: usize },
}

fn is_drawable(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0
}

fn eligible<'a, F>(weights: &'a [f64], excluded: &'a F) -> impl Iterator<Item = (usize, f64)> + 'a
where
    F: Fn(usize) -> bool,
{
    weights
        .iter()
        .copied()
        .enumerate()
        .filter(move |(idx, weight)| is_drawable(*weight) && !excluded(*idx))
}

/// Number of positively weighted entities not rejected by `excluded`.
#[must_use]
pub fn eligible_count<F>(weights: &[f64], excluded: F) -> usize
where
    F: Fn(usize) -> bool,
{
    eligible(weights, &excluded).count()
}

/// Sum of positive weights not rejected by `excluded`.
#[must_use]
pub fn eligible_weight<F>(weights: &[f64], excluded: F) -> f64
where
    F: Fn(usize) -> bool,
{
    eligible(weights, &excluded).map(|(_, weight)| weight).sum()
}

/// Draw one index with probability proportional to its weight.
///
/// Entities with weight ≤ 0 or rejected by `excluded` are never selected.
/// The walk returns the first index whose cumulative weight reaches the
/// uniform target in `[0, W)`. If rounding lets the walk fall through the top
/// of the range, the last eligible index is returned.
///
/// # Errors
///
/// Returns [`SamplerError::NoEligible`] when no entity can be drawn.
pub fn weighted_choice<R, F>(weights: &[f64], excluded: F, rng: &mut R) -> Result<usize, SamplerError>
where
    R: Rng + ?Sized,
    F: Fn(usize) -> bool,
{
    let total = eligible_weight(weights, &excluded);
    if !(total.is_finite() && total > 0.0) {
        return Err(SamplerError::NoEligible);
    }

    let target = rng.gen_range(0.0..total);
    let mut running = 0.0;
    let mut last = None;
    for (idx, weight) in eligible(weights, &excluded) {
        running += weight;
        if running >= target {
            return Ok(idx);
        }
        last = Some(idx);
    }

    last.ok_or(SamplerError::NoEligible)
}

/// Draw one index with replacement, never returning a member of `exclusions`.
///
/// Equivalent to redrawing until the result is outside the exclusion set, but
/// checks upfront that such a draw exists.
///
/// # Errors
///
/// Returns [`SamplerError::ExclusionsExhausted`] when every positively
/// weighted entity is excluded, or [`SamplerError::NoEligible`] when nothing
/// has positive weight.
pub fn sample_with_replacement<R>(
    weights: &[f64],
    exclusions: &[usize],
    rng: &mut R,
) -> Result<usize, SamplerError>
where
    R: Rng + ?Sized,
{
    let is_excluded = |idx: usize| exclusions.contains(&idx);
    if eligible_count(weights, is_excluded) == 0 {
        let eligible = eligible_count(weights, |_| false);
        if eligible == 0 {
            return Err(SamplerError::NoEligible);
        }
        return Err(SamplerError::ExclusionsExhausted {
            excluded: exclusions.len(),
            eligible,
        });
    }
    weighted_choice(weights, is_excluded, rng)
}

/// Draw `n` distinct indices, in draw order.
///
/// Every drawn index is added to `drawn` and indices already in `drawn` are
/// skipped, so repeated calls with the same set continue the same
/// without-replacement sequence. `weights` is never modified.
///
/// # Errors
///
/// Returns [`SamplerError::InsufficientPool`] when fewer than `n` eligible
/// entities remain; `drawn` is left untouched in that case.
pub fn sample_without_replacement<R>(
    weights: &[f64],
    n: usize,
    drawn: &mut BTreeSet<usize>,
    rng: &mut R,
) -> Result<Vec<usize>, SamplerError>
where
    R: Rng + ?Sized,
{
    let available = eligible_count(weights, |idx| drawn.contains(&idx));
    if n > available {
        return Err(SamplerError::InsufficientPool {
            requested: n,
            available,
        });
    }

    let mut sample = Vec::with_capacity(n);
    for _ in 0..n {
        let idx = weighted_choice(weights, |idx| drawn.contains(&idx), rng)?;
        drawn.insert(idx);
        sample.push(idx);
    }
    Ok(sample)
}

/// Uniform in-place Fisher–Yates shuffle.
pub fn shuffle<T, R>(items: &mut [T], rng: &mut R)
where
    R: Rng + ?Sized,
{
    items.shuffle(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn single_positive_entity_always_wins() {
        let weights = [0.0, 0.0, 3.5, 0.0];
        for seed in 0..200 {
            let mut rng = SmallRng::seed_from_u64(seed);
            assert_eq!(weighted_choice(&weights, |_| false, &mut rng), Ok(2));
        }
    }

    #[test]
    fn zero_total_is_an_error() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(
            weighted_choice(&[0.0, 0.0], |_| false, &mut rng),
            Err(SamplerError::NoEligible)
        );
        assert_eq!(
            weighted_choice(&[], |_| false, &mut rng),
            Err(SamplerError::NoEligible)
        );
    }

    #[test]
    fn excluded_entities_are_skipped() {
        let weights = [5.0, 5.0, 5.0];
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..100 {
            let idx = weighted_choice(&weights, |idx| idx != 1, &mut rng).unwrap();
            assert_eq!(idx, 1);
        }
    }

    #[test]
    fn with_replacement_reports_exhausted_exclusions() {
        let weights = [1.0, 0.0, 2.0];
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(
            sample_with_replacement(&weights, &[0, 2], &mut rng),
            Err(SamplerError::ExclusionsExhausted {
                excluded: 2,
                eligible: 2
            })
        );
        assert_eq!(sample_with_replacement(&weights, &[0], &mut rng), Ok(2));
        assert_eq!(
            sample_with_replacement(&[0.0], &[], &mut rng),
            Err(SamplerError::NoEligible)
        );
    }

    #[test]
    fn without_replacement_draws_distinct_indices() {
        let weights = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut rng = SmallRng::seed_from_u64(77);
        let mut drawn = BTreeSet::new();
        let sample = sample_without_replacement(&weights, 4, &mut drawn, &mut rng).unwrap();
        assert_eq!(sample.len(), 4);
        let unique: BTreeSet<usize> = sample.iter().copied().collect();
        assert_eq!(unique.len(), 4);
        assert_eq!(unique, drawn);

        let rest = sample_without_replacement(&weights, 2, &mut drawn, &mut rng).unwrap();
        let mut all: Vec<usize> = sample.into_iter().chain(rest).collect();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn without_replacement_rejects_oversized_requests() {
        let weights = [1.0, 0.0, 1.0];
        let mut rng = SmallRng::seed_from_u64(5);
        let mut drawn = BTreeSet::new();
        assert_eq!(
            sample_without_replacement(&weights, 3, &mut drawn, &mut rng),
            Err(SamplerError::InsufficientPool {
                requested: 3,
                available: 2
            })
        );
        assert!(drawn.is_empty());
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut items: Vec<u32> = (0..20).collect();
        let mut rng = SmallRng::seed_from_u64(11);
        shuffle(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }
}
