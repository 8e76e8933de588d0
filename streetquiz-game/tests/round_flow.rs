use std::collections::BTreeSet;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use streetquiz_game::{
    BoundaryRegion, GameConfig, GameSession, Point, RoundLength, RoundProgress, SamplePool,
    SessionError, StreetEntity,
};

fn pool(count: u32) -> SamplePool {
    SamplePool::from_streets((0..count).map(|i| {
        let x = f64::from(i) * 150.0;
        StreetEntity::new(
            format!("Avenue {i}"),
            Some("residential".to_string()),
            vec![Point::new(x, 0.0), Point::new(x, 120.0)],
        )
    }))
}

fn boundary() -> BoundaryRegion {
    BoundaryRegion::circle(Point::new(700.0, 60.0), 2500.0)
}

fn play_out(
    session: &mut GameSession,
    answer: impl Fn(&GameSession) -> String,
) -> Result<Vec<String>> {
    let mut asked = Vec::new();
    while let Some(target) = session.current_target().map(str::to_string) {
        let guess = answer(session);
        session.guess(&guess)?;
        asked.push(target);
        if session.advance()?.is_none() {
            break;
        }
    }
    Ok(asked)
}

#[test]
fn two_draws_of_five_cover_ten_streets() -> Result<()> {
    let mut pool = pool(10);
    let mut rng = SmallRng::seed_from_u64(2024);
    let first = pool.sample_without_replacement(5, &mut rng)?;
    let second = pool.sample_without_replacement(5, &mut rng)?;
    let first: BTreeSet<_> = first.into_iter().collect();
    let second: BTreeSet<_> = second.into_iter().collect();
    assert_eq!(first.len(), 5);
    assert!(first.is_disjoint(&second));
    let all: Vec<usize> = first.union(&second).copied().collect();
    assert_eq!(all, (0..10).collect::<Vec<_>>());
    assert_eq!(pool.eligible_count(), 0);
    Ok(())
}

#[test]
fn session_round_leaves_the_other_five_in_the_pool() -> Result<()> {
    let config = GameConfig::default().with_round_length(RoundLength::Fixed(5));
    let session = GameSession::start(pool(10), boundary(), config, 31)?;
    let asked: BTreeSet<usize> = session.targets().iter().copied().collect();
    assert_eq!(asked.len(), 5);

    let mut pool = session.into_pool();
    let mut rng = SmallRng::seed_from_u64(8);
    let rest: BTreeSet<usize> = pool.sample_without_replacement(5, &mut rng)?.into_iter().collect();
    assert_eq!(rest.len(), 5);
    assert!(asked.is_disjoint(&rest));
    assert_eq!(asked.union(&rest).count(), 10);
    assert!(pool.remaining_weight().abs() < 1e-12);
    Ok(())
}

#[test]
fn fixed_round_asks_five_unique_streets() -> Result<()> {
    let config = GameConfig::default().with_round_length(RoundLength::Fixed(5));
    let mut session = GameSession::start(pool(10), boundary(), config, 7)?;
    assert_eq!(session.progress(), RoundProgress::Remaining(5));
    let asked = play_out(&mut session, |s| {
        s.current_target().unwrap_or_default().to_string()
    })?;
    let unique: BTreeSet<_> = asked.iter().collect();
    assert_eq!(asked.len(), 5);
    assert_eq!(unique.len(), 5);
    assert!(session.is_finished());

    let summary = session.summary();
    assert_eq!(summary.correct, 5);
    assert_eq!(summary.incorrect, 0);
    assert_eq!(summary.total_distance_label, "0 m");
    Ok(())
}

#[test]
fn fixed_round_never_reweights() -> Result<()> {
    let config = GameConfig::default().with_round_length(RoundLength::Fixed(6));
    let mut session = GameSession::start(pool(8), boundary(), config, 5)?;
    let before: Vec<f64> = session.pool().weights();
    play_out(&mut session, |s| {
        let target = s.current_index().unwrap_or_default();
        s.pool().streets()[(target + 1) % 8].name.clone()
    })?;
    assert_eq!(session.pool().weights(), before);
    let summary = session.summary();
    assert_eq!(summary.incorrect, 6);
    assert!(summary.total_distance_m > 0.0);
    assert!(
        summary.total_distance_label.ends_with(" m")
            || summary.total_distance_label.ends_with(" km")
    );
    Ok(())
}

#[test]
fn free_play_scales_guessed_street_weight() -> Result<()> {
    let config = GameConfig::default().with_round_length(RoundLength::Unlimited);
    let mut session = GameSession::start(pool(10), boundary(), config, 42)?;

    for round in 0..20 {
        let target = session.current_index().context("street asked")?;
        let miss = round % 2 == 1;
        let guessed = if miss { (target + 3) % 10 } else { target };
        let before = session.pool().streets()[guessed].weight();
        let name = session.pool().streets()[guessed].name.clone();
        let outcome = session.guess(&name)?;
        let expected = if miss { before * 1.5 } else { before * 0.75 };
        assert!((outcome.weight_after - expected).abs() < 1e-9);
        assert_eq!(outcome.record.correct, !miss);
        if miss {
            let [from, to] = outcome.error_line.context("miss draws an error line")?;
            assert_eq!(outcome.label_anchor, Some(from.midpoint(to)));
        }
        session.advance()?;
    }
    assert_eq!(session.progress(), RoundProgress::Asked(21));

    let summary = session.finish();
    assert_eq!(summary.correct, 10);
    assert_eq!(summary.incorrect, 10);
    assert_eq!(summary.markers.len(), 20);
    assert_eq!(session.advance(), Err(SessionError::RoundFinished));
    Ok(())
}

#[test]
fn free_play_miss_boosts_clicked_street_only() -> Result<()> {
    let config = GameConfig::default().with_round_length(RoundLength::Unlimited);
    let mut session = GameSession::start(pool(10), boundary(), config, 42)?;
    let target = session.current_index().context("street asked")?;
    let clicked = (target + 3) % 10;
    let target_before = session.pool().streets()[target].weight();
    let clicked_before = session.pool().streets()[clicked].weight();

    let name = session.pool().streets()[clicked].name.clone();
    let outcome = session.guess(&name)?;
    assert!(!outcome.record.correct);
    let streets = session.pool().streets();
    assert!((streets[clicked].weight() - clicked_before * 1.5).abs() < 1e-12);
    assert!((streets[target].weight() - target_before).abs() < 1e-12);
    Ok(())
}

#[test]
fn restart_draws_a_fresh_round() -> Result<()> {
    let config = GameConfig::default().with_round_length(RoundLength::Fixed(5));
    let mut session = GameSession::start(pool(10), boundary(), config, 1)?;
    let name = session.current_target().context("street asked")?.to_string();
    session.guess(&name)?;
    session.restart()?;
    assert_eq!(session.targets().len(), 5);
    assert_eq!(session.progress(), RoundProgress::Remaining(5));
    assert_eq!(session.pool().drawn().len(), 5);
    assert!(session.summary().guesses.is_empty());
    Ok(())
}
