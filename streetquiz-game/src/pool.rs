//! The set of streets loaded for the current boundary.
use std::collections::{BTreeSet, HashMap};

use rand::Rng;

use crate::geo::{Point, real_distance};
use crate::sampler::{self, SamplerError};
use crate::street::{StreetEntity, normalize_name};

/// Streets indexed by normalized name, plus the set of streets already drawn
/// in the current without-replacement round.
///
/// Drawn streets keep their weight; they only report an effective weight of 0.
#[derive(Debug, Clone, Default)]
pub struct SamplePool {
    streets: Vec<StreetEntity>,
    index: HashMap<String, usize>,
    drawn: BTreeSet<usize>,
}

impl SamplePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool, merging streets that share a normalized name.
    #[must_use]
    pub fn from_streets(streets: impl IntoIterator<Item = StreetEntity>) -> Self {
        let mut pool = Self::new();
        for street in streets {
            pool.insert(street);
        }
        pool
    }

    /// Insert a street or merge its geometry into the existing entry with the
    /// same key. Returns the street's index.
    pub fn insert(&mut self, street: StreetEntity) -> usize {
        if let Some(&idx) = self.index.get(&street.key) {
            let existing = &mut self.streets[idx];
            for line in street.geometry {
                existing.append_line(line);
            }
            return idx;
        }
        let idx = self.streets.len();
        self.index.insert(street.key.clone(), idx);
        self.streets.push(street);
        idx
    }

    /// Drop every street, e.g. when the boundary is redrawn.
    pub fn clear(&mut self) {
        self.streets.clear();
        self.index.clear();
        self.drawn.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.streets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streets.is_empty()
    }

    #[must_use]
    pub fn streets(&self) -> &[StreetEntity] {
        &self.streets
    }

    pub fn streets_mut(&mut self) -> impl Iterator<Item = &mut StreetEntity> {
        self.streets.iter_mut()
    }

    #[must_use]
    pub fn street(&self, idx: usize) -> Option<&StreetEntity> {
        self.streets.get(idx)
    }

    pub fn street_mut(&mut self, idx: usize) -> Option<&mut StreetEntity> {
        self.streets.get_mut(idx)
    }

    /// Index of a street by display name or key.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(&normalize_name(name)).copied()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StreetEntity> {
        self.index_of(name).and_then(|idx| self.streets.get(idx))
    }

    /// Raw weights in pool order, ignoring the drawn set.
    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        self.streets.iter().map(StreetEntity::weight).collect()
    }

    /// Weight as seen by the sampler: 0 once the street has been drawn.
    #[must_use]
    pub fn effective_weight(&self, idx: usize) -> f64 {
        if self.drawn.contains(&idx) {
            return 0.0;
        }
        self.streets.get(idx).map_or(0.0, StreetEntity::weight)
    }

    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.streets.iter().map(StreetEntity::weight).sum()
    }

    /// Total weight of streets not yet drawn this round.
    #[must_use]
    pub fn remaining_weight(&self) -> f64 {
        (0..self.streets.len())
            .map(|idx| self.effective_weight(idx))
            .sum()
    }

    #[must_use]
    pub fn max_weight(&self) -> f64 {
        self.streets
            .iter()
            .map(StreetEntity::weight)
            .fold(0.0, f64::max)
    }

    /// Streets that can still be drawn (positive weight, not drawn).
    #[must_use]
    pub fn eligible_count(&self) -> usize {
        sampler::eligible_count(&self.weights(), |idx| self.drawn.contains(&idx))
    }

    #[must_use]
    pub fn is_drawn(&self, idx: usize) -> bool {
        self.drawn.contains(&idx)
    }

    #[must_use]
    pub const fn drawn(&self) -> &BTreeSet<usize> {
        &self.drawn
    }

    /// Make every street eligible again.
    pub fn reset_draws(&mut self) {
        self.drawn.clear();
    }

    /// One weighted draw among streets not yet drawn.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::NoEligible`] when nothing can be drawn.
    pub fn weighted_choice<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize, SamplerError> {
        sampler::weighted_choice(&self.weights(), |idx| self.drawn.contains(&idx), rng)
    }

    /// One draw with replacement that avoids `recent`.
    ///
    /// # Errors
    ///
    /// See [`sampler::sample_with_replacement`].
    pub fn sample_with_replacement<R: Rng + ?Sized>(
        &self,
        recent: &[usize],
        rng: &mut R,
    ) -> Result<usize, SamplerError> {
        sampler::sample_with_replacement(&self.weights(), recent, rng)
    }

    /// Draw `n` streets that have not been drawn before and mark them drawn.
    ///
    /// # Errors
    ///
    /// See [`sampler::sample_without_replacement`].
    pub fn sample_without_replacement<R: Rng + ?Sized>(
        &mut self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>, SamplerError> {
        let weights = self.weights();
        sampler::sample_without_replacement(&weights, n, &mut self.drawn, rng)
    }

    /// Street nearest to `point` if it lies within `max_distance_m` metres.
    #[must_use]
    pub fn closest_within(&self, point: Point, max_distance_m: f64) -> Option<usize> {
        let (idx, nearest) = self
            .streets
            .iter()
            .enumerate()
            .filter_map(|(idx, street)| street.closest_point(point).map(|p| (idx, p)))
            .min_by(|(_, a), (_, b)| {
                a.planar_distance_sq(point)
                    .total_cmp(&b.planar_distance_sq(point))
            })?;
        (real_distance(point, nearest) < max_distance_m).then_some(idx)
    }
}
