#![allow(dead_code)]

use strum::IntoEnumIterator;

use bracket_core::bracket::Bracket;
use bracket_core::team::{Region, Team};
use bracket_core::topology::DEFAULT_TOPOLOGY;

/// 68-team field on the default layout. Ids are `100 * (region + 1) + seed`;
/// the second team of each play-in pair adds 50.
pub fn sample_field() -> Vec<Team> {
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

/// A forecast table for `bracket`'s field. Decided rounds are written as
/// 1.0 or 0.0, open ones as 0.5.
pub fn forecast_csv(bracket: &Bracket) -> String {
    let mut out = String::from(
        "gender,forecast_date,playin_flag,rd1_win,rd2_win,rd3_win,rd4_win,rd5_win,rd6_win,rd7_win,\
         team_alive,team_id,team_name,team_rating,team_region,team_seed\n",
    );
    for team in bracket.teams() {
        let wins = bracket.round_wins(team);
        let flags: Vec<&str> = wins
            .iter()
            .map(|&won| if won { "1.0" } else { "0.0" })
            .collect();
        out.push_str(&format!(
            "mens,2022-03-17,{},{},1,{},{},{},{},{}\n",
            u8::from(team.is_playin),
            flags.join(","),
            team.id,
            team.name,
            team.rating,
            team.region,
            team.seed_label(),
        ));
    }
    out
}
