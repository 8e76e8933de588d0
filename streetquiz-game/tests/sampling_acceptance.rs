use std::collections::BTreeSet;
use std::convert::TryFrom;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use streetquiz_game::sampler::{self, SamplerError};
use streetquiz_game::{Point, SamplePool, StreetEntity};

const SAMPLE_SIZE: usize = 5000;
const TOLERANCE: f64 = 0.3;

fn ratio(a: usize, b: usize) -> f64 {
    let a = u32::try_from(a).expect("count fits");
    let b = u32::try_from(b).expect("count fits");
    f64::from(a) / f64::from(b)
}

#[test]
fn zero_weight_is_never_drawn_and_ratio_tracks_weights() {
    let weights = [10.0, 0.0, 5.0];
    let mut rng = SmallRng::seed_from_u64(0x5EED);
    let mut counts = [0usize; 3];
    for _ in 0..SAMPLE_SIZE {
        let idx = sampler::sample_with_replacement(&weights, &[], &mut rng).unwrap();
        counts[idx] += 1;
    }
    assert_eq!(counts[1], 0);
    let observed = ratio(counts[0], counts[2]);
    assert!(
        (observed - 2.0).abs() <= TOLERANCE,
        "weight ratio drifted: observed {observed:.3} from {counts:?}"
    );
}

#[test]
fn single_positive_entity_always_wins() {
    let weights = [0.0, 0.0, 3.5, 0.0];
    let mut rng = SmallRng::seed_from_u64(17);
    for _ in 0..200 {
        assert_eq!(
            sampler::weighted_choice(&weights, |_| false, &mut rng).unwrap(),
            2
        );
    }
}

#[test]
fn exclusions_are_respected_and_exhaustion_reported() {
    let weights = [1.0, 1.0, 1.0, 0.0];
    let mut rng = SmallRng::seed_from_u64(3);
    for _ in 0..200 {
        let idx = sampler::sample_with_replacement(&weights, &[0, 2], &mut rng).unwrap();
        assert_eq!(idx, 1);
    }
    assert_eq!(
        sampler::sample_with_replacement(&weights, &[0, 1, 2], &mut rng),
        Err(SamplerError::ExclusionsExhausted {
            excluded: 3,
            eligible: 3
        })
    );
}

#[test]
fn without_replacement_partitions_the_pool() {
    let weights: Vec<f64> = (1..=10u32).map(f64::from).collect();
    let mut drawn = BTreeSet::new();
    let mut rng = SmallRng::seed_from_u64(99);
    let first = sampler::sample_without_replacement(&weights, 5, &mut drawn, &mut rng).unwrap();
    let second = sampler::sample_without_replacement(&weights, 5, &mut drawn, &mut rng).unwrap();

    let first_set: BTreeSet<usize> = first.iter().copied().collect();
    let second_set: BTreeSet<usize> = second.iter().copied().collect();
    assert_eq!(first_set.len(), 5);
    assert_eq!(second_set.len(), 5);
    assert!(first_set.is_disjoint(&second_set));
    assert_eq!(first_set.union(&second_set).count(), 10);
    assert_eq!(
        sampler::sample_without_replacement(&weights, 1, &mut drawn, &mut rng),
        Err(SamplerError::InsufficientPool {
            requested: 1,
            available: 0
        })
    );
}

#[test]
fn remaining_weight_drops_by_sampled_weight() {
    let mut pool = SamplePool::from_streets((0..10u32).map(|i| {
        let y = f64::from(i) * 50.0;
        let line = vec![Point::new(0.0, y), Point::new(40.0, y)];
        let mut street = StreetEntity::new(format!("Road {i}"), None, line);
        street.set_weight(f64::from(i + 1));
        street
    }));
    let total = pool.total_weight();
    let mut rng = SmallRng::seed_from_u64(4);
    let sample = pool.sample_without_replacement(4, &mut rng).unwrap();
    let sampled: f64 = sample.iter().map(|&idx| pool.streets()[idx].weight()).sum();
    assert!((pool.remaining_weight() - (total - sampled)).abs() < 1e-9);
    assert!((pool.total_weight() - total).abs() < 1e-9);
}

#[test]
fn shuffle_is_a_permutation() {
    let mut items: Vec<usize> = (0..20).collect();
    let mut rng = SmallRng::seed_from_u64(8);
    sampler::shuffle(&mut items, &mut rng);
    let mut sorted = items.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..20).collect::<Vec<_>>());
}
