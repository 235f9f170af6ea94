use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::constants::{NUM_GAMES, ROUND_COUNT, ROUND_POINTS, STANDARD_GAMES};
use crate::error::{Error, Result};
use crate::game::Game;
use crate::picker::{Picker, Slot};
use crate::team::Team;
use crate::topology::{GameId, Round, Topology, DEFAULT_TOPOLOGY};

/// Scoring rules applied when comparing a bracket to a reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringOptions {
    /// Credit a pick whose team lost the play-in game that the actual
    /// winner came out of.
    pub forgive_playin: bool,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        ScoringOptions {
            forgive_playin: true,
        }
    }
}

/// A full tournament bracket: the bracket heap plus the field it was built from.
#[derive(Clone, Debug)]
pub struct Bracket {
    teams: Vec<Team>,
    games: Vec<Game>,
    topology: Arc<Topology>,
}

impl Bracket {
    /// Build a bracket on the default NCAA layout.
    pub fn new(teams: Vec<Team>) -> Result<Self> {
        Bracket::with_topology(teams, Arc::clone(&DEFAULT_TOPOLOGY))
    }

    /// Place every team into its entry game: play-in teams into their play-in
    /// game, everyone else into the first-round game for their region and seed.
    pub fn with_topology(teams: Vec<Team>, topology: Arc<Topology>) -> Result<Self> {
        topology.validate()?;
        let mut games = vec![Game::new(); NUM_GAMES];
        let mut ids = HashSet::with_capacity(teams.len());

        for team in &teams {
            if !ids.insert(team.id) {
                return Err(Error::Topology(format!("duplicate team id {} ({})", team.id, team)));
            }
            let entry = topology.entry_game(team)?;
            if games[entry.index()].add_team(team.clone()).is_none() {
                return Err(Error::Topology(format!("{} is full, cannot place {}", entry, team)));
            }
        }

        Ok(Bracket {
            teams,
            games,
            topology,
        })
    }

    /// Play every remaining game and return the champion.
    ///
    /// Play-in games go first and their winners are injected into the first
    /// round; the standard tree is then resolved post-order from the
    /// championship down, so both children of a game are always decided
    /// before the game itself. Already decided games keep their winners.
    pub fn play<P: Picker + ?Sized>(&mut self, picker: &mut P) -> Result<&Team> {
        for id in Round::PlayIn.game_ids() {
            let game = &mut self.games[id.index()];
            if game.is_resolved() || (game.team_a().is_none() && game.team_b().is_none()) {
                continue;
            }
            if !game.is_ready() {
                return Err(Error::Topology(format!("play-in {} has a single team", id)));
            }
            let winner = game.resolve(picker)?.clone();
            let slot = self.topology.first_round_game(winner.region, winner.seed)?;
            debug!(game = id.index(), winner = %winner, "play-in decided");
            if self.games[slot.index()].add_team(winner).is_none() {
                return Err(Error::Topology(format!(
                    "{} is full, cannot seat play-in winner",
                    slot
                )));
            }
        }

        self.play_game(GameId::CHAMPIONSHIP, picker)?;
        self.champion()
            .ok_or_else(|| Error::Topology("championship left undecided".into()))
    }

    fn play_game<P: Picker + ?Sized>(&mut self, id: GameId, picker: &mut P) -> Result<Team> {
        if let Some(winner) = self.games[id.index()].winner() {
            return Ok(winner.clone());
        }
        if !self.games[id.index()].is_ready() {
            let Some((left, right)) = id.children() else {
                return Err(Error::Topology(format!("first-round {} is missing a team", id)));
            };
            let team_a = self.play_game(left, picker)?;
            let team_b = self.play_game(right, picker)?;
            let game = &mut self.games[id.index()];
            game.set_team(Slot::A, team_a);
            game.set_team(Slot::B, team_b);
        }
        Ok(self.games[id.index()].resolve(picker)?.clone())
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn game(&self, id: GameId) -> &Game {
        &self.games[id.index()]
    }

    pub(crate) fn game_mut(&mut self, id: GameId) -> &mut Game {
        &mut self.games[id.index()]
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn champion(&self) -> Option<&Team> {
        self.games[GameId::CHAMPIONSHIP.index()].winner()
    }

    /// Whether every standard game has a winner.
    pub fn is_complete(&self) -> bool {
        self.games[..STANDARD_GAMES].iter().all(Game::is_resolved)
    }

    /// Per-round win flags for `team`, play-in through championship.
    ///
    /// A team that needs no play-in game always has its play-in flag set.
    pub fn round_wins(&self, team: &Team) -> [bool; ROUND_COUNT] {
        let mut wins = [false; ROUND_COUNT];
        for round in Round::iter() {
            wins[round.column()] = if round == Round::PlayIn && !team.is_playin {
                true
            } else {
                round.games().any(|i| self.games[i].winner() == Some(team))
            };
        }
        wins
    }

    /// Points earned per standard round (first round through championship)
    /// for picks in `self` that match the winners in `reference`.
    ///
    /// Not symmetric: play-in forgiveness looks at `self`'s play-in games.
    pub fn score_by_round(
        &self,
        reference: &Bracket,
        options: &ScoringOptions,
    ) -> [u32; ROUND_POINTS.len()] {
        let mut by_round = [0; ROUND_POINTS.len()];
        let pairs = self.games.iter().zip(&reference.games).take(STANDARD_GAMES);
        for (index, (game, actual)) in pairs.enumerate() {
            let (Some(picked), Some(actual)) = (game.winner(), actual.winner()) else {
                continue;
            };
            let forgiven = options.forgive_playin && self.same_playin_game(picked, actual);
            if picked == actual || forgiven {
                let round = Round::of_index(index);
                by_round[round.column() - 1] += round.points();
            }
        }
        by_round
    }

    /// Total points for `self`'s picks against `reference`'s results.
    pub fn score(&self, reference: &Bracket, options: &ScoringOptions) -> u32 {
        self.score_by_round(reference, options).iter().sum()
    }

    fn same_playin_game(&self, picked: &Team, actual: &Team) -> bool {
        picked.is_playin
            && actual.is_playin
            && Round::PlayIn
                .games()
                .any(|i| self.games[i].contains(picked) && self.games[i].contains(actual))
    }

    /// Side-by-side rendering: lines that differ from `other` are padded and
    /// followed by `" | "` and the other bracket's line.
    pub fn diff(&self, other: &Bracket) -> String {
        let ours = self.to_string();
        let theirs = other.to_string();
        let width = ours
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for (line, other_line) in ours.lines().zip(theirs.lines()) {
            if line == other_line {
                out.push_str(line);
            } else {
                out.push_str(&format!("{:<width$} | {}", line, other_line, width = width));
            }
            out.push('\n');
        }
        out
    }
}

impl PartialEq for Bracket {
    fn eq(&self, other: &Self) -> bool {
        self.games == other.games
    }
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for round in Round::iter() {
            writeln!(f, "{}", round)?;
            for index in round.games() {
                writeln!(f, "{}", self.games[index])?;
            }
            writeln!(f)?;
        }
        match self.champion() {
            Some(champion) => write!(f, "WINNER: {}", champion),
            None => write!(f, "WINNER: TBD"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::constants::{FIRST_ROUND_START, MAX_SCORE};
    use crate::picker::{Chalk, Pick, Simulated};
    use crate::team::Region;

    /// 68-team field on the default layout. Ids are `100 * (region + 1) + seed`;
    /// the second team of each play-in pair adds 50.
    pub(crate) fn sample_field() -> Vec<Team> {
        let topology = Topology::ncaa_2022();
        let mut teams = Vec::new();
        for (r, region) in Region::iter().enumerate() {
            let base = 100 * (r as u32 + 1);
            for seed in 1..=16u8 {
                let id = base + u32::from(seed);
                let name = format!("{}{}", region, seed);
                let rating = 100.0 - 2.5 * f64::from(seed) + r as f64;
                if topology.playin_game(region, seed).is_some() {
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

    /// Chalk, except that one team wins its next `wins_left` games.
    pub(crate) struct Favor {
        pub team: u32,
        pub wins_left: usize,
    }

    impl Favor {
        pub fn new(team: u32, wins_left: usize) -> Self {
            Favor { team, wins_left }
        }
    }

    impl Picker for Favor {
        fn pick(&mut self, a: &Team, b: &Team, win_prob: f64) -> Pick {
            let favored = if a.id == self.team {
                Some(Slot::A)
            } else if b.id == self.team {
                Some(Slot::B)
            } else {
                None
            };
            match favored {
                Some(slot) if self.wins_left > 0 => {
                    self.wins_left -= 1;
                    Pick { slot, win_prob }
                }
                _ => Chalk.pick(a, b, win_prob),
            }
        }
    }

    fn team_by_id(bracket: &Bracket, id: u32) -> Team {
        bracket.teams().iter().find(|t| t.id == id).unwrap().clone()
    }

    fn chalk_bracket() -> Bracket {
        let mut bracket = Bracket::new(sample_field()).unwrap();
        bracket.play(&mut Chalk).unwrap();
        bracket
    }

    #[test]
    fn test_every_team_placed_once() {
        let teams = sample_field();
        assert_eq!(teams.len(), 68);
        let bracket = Bracket::new(teams.clone()).unwrap();
        let topology = Topology::ncaa_2022();

        for team in &teams {
            let holders: Vec<usize> = (0..NUM_GAMES)
                .filter(|&i| bracket.games()[i].contains(team))
                .collect();
            let entry = topology.entry_game(team).unwrap().index();
            assert_eq!(holders, vec![entry], "{}", team);
        }
        for index in FIRST_ROUND_START..STANDARD_GAMES {
            let game = &bracket.games()[index];
            assert!(game.team_a().is_some());
        }
        let upper = &bracket.games()[..FIRST_ROUND_START];
        assert!(upper.iter().all(|g| g.team_a().is_none()));
    }

    #[test]
    fn test_entrants_without_playin_id_fill_the_first_round() {
        let teams: Vec<Team> = Region::iter()
            .enumerate()
            .flat_map(|(r, region)| {
                (1..=16u8).map(move |seed| {
                    let id = 100 * (r as u32 + 1) + u32::from(seed);
                    let name = format!("{}{}", region, seed);
                    Team::entrant(id, name, 90.0 - f64::from(seed), seed, region, None)
                })
            })
            .collect();
        assert!(teams.iter().all(|t| !t.is_playin));

        let mut bracket = Bracket::new(teams).unwrap();
        assert_eq!(bracket.play(&mut Chalk).unwrap().id, 101);
        assert!(bracket.is_complete());
        let games = bracket.games();
        assert!(Round::PlayIn.games().all(|i| games[i].team_a().is_none()));
    }

    #[test]
    fn test_rejects_duplicate_ids_and_overflow() {
        let mut teams = sample_field();
        teams.push(teams[0].clone());
        assert!(matches!(Bracket::new(teams), Err(Error::Topology(_))));

        let mut teams = sample_field();
        teams.push(Team::new(999, "Extra", 50.0, 1, Region::West));
        assert!(matches!(Bracket::new(teams), Err(Error::Topology(_))));
    }

    #[test]
    fn test_rejects_playin_team_without_slot() {
        let mut teams = sample_field();
        teams.push(Team::new(999, "Stray", 50.0, 5, Region::East).with_playin(Some(1)));
        assert!(matches!(Bracket::new(teams), Err(Error::Topology(_))));
    }

    #[test]
    fn test_chalk_resolves_everything() {
        let bracket = chalk_bracket();
        assert!(bracket.is_complete());
        assert!(Round::PlayIn.games().all(|i| bracket.games()[i].is_resolved()));
        // West's 1 seed sits in slot A of every game it plays and wins seed ties.
        assert_eq!(bracket.champion().map(|t| t.id), Some(101));
        for index in 0..STANDARD_GAMES {
            let game = &bracket.games()[index];
            let winner = game.winner().unwrap();
            assert!(game.contains(winner));
        }
    }

    #[test]
    fn test_chalk_is_deterministic() {
        assert_eq!(chalk_bracket(), chalk_bracket());
        assert_eq!(chalk_bracket().to_string(), chalk_bracket().to_string());
    }

    #[test]
    fn test_seeded_simulation_is_reproducible() {
        let play = |seed| {
            let mut bracket = Bracket::new(sample_field()).unwrap();
            bracket.play(&mut Simulated::from_seed(Some(seed))).unwrap();
            bracket
        };
        assert_eq!(play(7), play(7));
        assert!(play(7).is_complete());
    }

    #[test]
    fn test_play_is_idempotent() {
        let mut bracket = chalk_bracket();
        let before = bracket.clone();
        bracket.play(&mut Simulated::from_seed(Some(1))).unwrap();
        assert_eq!(bracket, before);
    }

    #[test]
    fn test_missing_first_round_team_is_an_error() {
        let teams: Vec<Team> = sample_field().into_iter().filter(|t| t.id != 108).collect();
        let mut bracket = Bracket::new(teams).unwrap();
        assert!(matches!(bracket.play(&mut Chalk), Err(Error::Topology(_))));
    }

    #[test]
    fn test_score_against_self_is_maximal() {
        let bracket = chalk_bracket();
        assert_eq!(bracket.score(&bracket, &ScoringOptions::default()), MAX_SCORE);
        assert_eq!(bracket.score_by_round(&bracket, &ScoringOptions::default()), [32; 6]);

        let mut simulated = Bracket::new(sample_field()).unwrap();
        simulated.play(&mut Simulated::from_seed(Some(3))).unwrap();
        assert_eq!(simulated.score(&simulated, &ScoringOptions::default()), MAX_SCORE);
        assert!(simulated.score(&bracket, &ScoringOptions::default()) <= MAX_SCORE);
    }

    #[test]
    fn test_unplayed_reference_scores_zero() {
        let unplayed = Bracket::new(sample_field()).unwrap();
        assert_eq!(chalk_bracket().score(&unplayed, &ScoringOptions::default()), 0);
    }

    #[test]
    fn test_round_wins_for_playin_team() {
        // South 16b wins its play-in and upsets the 1 seed, then loses.
        let mut bracket = Bracket::new(sample_field()).unwrap();
        bracket.play(&mut Favor::new(366, 2)).unwrap();
        let team = team_by_id(&bracket, 366);
        let wins = bracket.round_wins(&team);
        assert_eq!(wins, [true, true, false, false, false, false, false]);
        assert_eq!(wins.iter().filter(|&&w| w).count(), 2);

        let seeded = team_by_id(&bracket, 301);
        let wins = bracket.round_wins(&seeded);
        assert_eq!(wins, [true, false, false, false, false, false, false]);
    }

    #[test]
    fn test_champion_wins_every_round() {
        let bracket = chalk_bracket();
        let champion = bracket.champion().unwrap().clone();
        assert_eq!(bracket.round_wins(&champion), [true; ROUND_COUNT]);
    }

    #[test]
    fn test_score_is_asymmetric_under_playin_forgiveness() {
        // Candidate: South 16b (366) wins the play-in and the first round.
        let mut candidate = Bracket::new(sample_field()).unwrap();
        candidate.play(&mut Favor::new(366, 2)).unwrap();

        // Reference: the 16b slot went to a late replacement (377) and 16a
        // (316) advanced instead.
        let reference_field: Vec<Team> = sample_field()
            .into_iter()
            .map(|t| {
                if t.id == 366 {
                    Team::new(377, "Replacement", t.rating, t.seed, t.region).with_playin(Some(2))
                } else {
                    t
                }
            })
            .collect();
        let mut reference = Bracket::new(reference_field).unwrap();
        reference.play(&mut Favor::new(316, 2)).unwrap();

        let options = ScoringOptions::default();
        // 366 and 316 shared a play-in game in the candidate, so the miss is forgiven...
        assert_eq!(candidate.score(&reference, &options), MAX_SCORE);
        // ...but 316 and 366 never met in the reference's play-in games.
        assert_eq!(reference.score(&candidate, &options), MAX_SCORE - 1);

        let strict = ScoringOptions {
            forgive_playin: false,
        };
        assert_eq!(candidate.score(&reference, &strict), MAX_SCORE - 1);
    }

    #[test]
    fn test_render_layout() {
        let unplayed = Bracket::new(sample_field()).unwrap();
        let text = unplayed.to_string();
        let is_header = |line: &&str| {
            !line.is_empty()
                && line
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == ' ' || c == '-')
        };
        let headers: Vec<&str> = text.lines().filter(is_header).collect();
        let expected = [
            "PLAY-IN",
            "1ST ROUND",
            "2ND ROUND",
            "SWEET 16",
            "ELITE EIGHT",
            "FINAL FOUR",
            "CHAMPIONSHIP",
        ];
        assert_eq!(headers, expected);
        assert!(text.ends_with("WINNER: TBD"));
        assert!(text.contains("(11)West11 (52.19%) vs. (11)West11b (47.81%)"));

        let played = chalk_bracket();
        assert!(played.to_string().ends_with("WINNER: (1)West1"));
    }

    #[test]
    fn test_diff_marks_changed_lines() {
        let chalk = chalk_bracket();
        let unplayed = Bracket::new(sample_field()).unwrap();

        assert!(!chalk.diff(&chalk).contains(" | "));

        let diff = unplayed.diff(&chalk);
        let changed: Vec<&str> = diff.lines().filter(|l| l.contains(" | ")).collect();
        assert!(!changed.is_empty());
        let widths: HashSet<usize> = changed.iter().map(|l| l.find(" | ").unwrap()).collect();
        assert_eq!(widths.len(), 1, "left column should be padded to one width");
        assert!(diff.lines().last().unwrap().starts_with("WINNER: TBD"));
    }
}
