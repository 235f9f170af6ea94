use bracket_core::batch::generate_brackets;
use bracket_core::bracket::{Bracket, ScoringOptions};
use bracket_core::picker::{Chalk, Simulated};
use bracket_core::team::{Region, Team};
use bracket_core::topology::DEFAULT_TOPOLOGY;
use bracket_core::win_prob::calculate_win_prob;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use strum::IntoEnumIterator;

fn create_test_teams() -> (Team, Team) {
    let team1 = Team::new(1, "Duke", 91.3, 2, Region::West);
    let team2 = Team::new(2, "North Carolina", 87.9, 8, Region::East);
    (team1, team2)
}

fn create_68_team_field() -> Vec<Team> {
    let mut teams = Vec::new();
    for (r, region) in Region::iter().enumerate() {
        let base = 100 * (r as u32 + 1);
        for seed in 1..=16u8 {
            let id = base + u32::from(seed);
            let name = format!("{}{}", region, seed);
            let rating = 100.0 - 2.5 * f64::from(seed) + r as f64;
            if DEFAULT_TOPOLOGY.playin_game(region, seed).is_some() {
                teams.push(Team::entrant(id, name.clone(), rating, seed, region, Some(1)));
                let rival = format!("{}b", name);
                teams.push(Team::entrant(id + 50, rival, rating - 0.5, seed, region, Some(2)));
            } else {
                teams.push(Team::entrant(id, name, rating, seed, region, None));
            }
        }
    }
    teams
}

fn bench_calculate_win_prob(c: &mut Criterion) {
    let (team1, team2) = create_test_teams();

    c.bench_function("calculate_win_prob", |b| {
        b.iter(|| calculate_win_prob(black_box(&team1), black_box(&team2)))
    });
}

fn bench_play(c: &mut Criterion) {
    let teams = create_68_team_field();

    c.bench_function("bracket_build_and_play_chalk", |b| {
        b.iter(|| {
            let mut bracket = Bracket::new(black_box(teams.clone())).unwrap();
            bracket.play(&mut Chalk).unwrap().id
        })
    });

    c.bench_function("bracket_build_and_play_simulated", |b| {
        b.iter(|| {
            let mut bracket = Bracket::new(black_box(teams.clone())).unwrap();
            bracket.play(&mut Simulated::from_seed(Some(42))).unwrap().id
        })
    });
}

fn bench_scoring(c: &mut Criterion) {
    let teams = create_68_team_field();
    let mut reference = Bracket::new(teams.clone()).unwrap();
    reference.play(&mut Chalk).unwrap();
    let mut candidate = Bracket::new(teams).unwrap();
    candidate.play(&mut Simulated::from_seed(Some(7))).unwrap();
    let options = ScoringOptions::default();

    c.bench_function("bracket_score", |b| {
        b.iter(|| black_box(&candidate).score(black_box(&reference), &options))
    });
}

fn bench_batch(c: &mut Criterion) {
    // File output dominates; keep the batch small
    let teams = create_68_team_field();
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("brackets");

    c.bench_function("generate_100_brackets", |b| {
        b.iter(|| {
            let topology = Arc::clone(&DEFAULT_TOPOLOGY);
            generate_brackets(100, &teams, topology, &folder, Some(42)).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_calculate_win_prob,
    bench_play,
    bench_scoring,
    bench_batch,
);
criterion_main!(benches);
