//! Tabular input and output.
//!
//! Two CSV formats are handled here: the forecast table that supplies the
//! field (one row per team and forecast date), and the bracket file, one row
//! per team with a 0/1 win flag for each of the seven rounds.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bracket::Bracket;
use crate::constants::{BRACKET_HEADER, DEFAULT_GENDER, ROUND_COUNT};
use crate::error::{Error, Result};
use crate::picker::Slot;
use crate::team::Team;
use crate::topology::{GameId, Topology, DEFAULT_TOPOLOGY};

/// Which forecast rows make up the field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamFilter {
    pub gender: String,
    /// Only admit rows from this forecast date when set.
    pub forecast_date: Option<String>,
}

impl Default for TeamFilter {
    fn default() -> Self {
        TeamFilter {
            gender: DEFAULT_GENDER.to_string(),
            forecast_date: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastRow {
    gender: String,
    #[serde(default)]
    forecast_date: Option<String>,
    playin_flag: u8,
    team_id: u32,
    team_name: String,
    team_rating: f64,
    team_region: String,
    team_seed: String,
    #[serde(default)]
    rd1_win: Option<f64>,
    #[serde(default)]
    rd2_win: Option<f64>,
    #[serde(default)]
    rd3_win: Option<f64>,
    #[serde(default)]
    rd4_win: Option<f64>,
    #[serde(default)]
    rd5_win: Option<f64>,
    #[serde(default)]
    rd6_win: Option<f64>,
    #[serde(default)]
    rd7_win: Option<f64>,
}

impl ForecastRow {
    fn team(&self) -> Result<Team> {
        Team::from_columns(
            self.team_id,
            &self.team_name,
            &self.team_seed,
            self.team_rating,
            &self.team_region,
            self.playin_flag,
        )
    }

    /// Settled round outcomes; a probability only counts once it reaches 1.
    fn settled_wins(&self) -> Result<[bool; ROUND_COUNT]> {
        let columns = [
            self.rd1_win,
            self.rd2_win,
            self.rd3_win,
            self.rd4_win,
            self.rd5_win,
            self.rd6_win,
            self.rd7_win,
        ];
        let mut wins = [false; ROUND_COUNT];
        for (round, value) in columns.into_iter().enumerate() {
            let value = value.ok_or_else(|| {
                let column = format!("rd{}_win", round + 1);
                Error::parse("rd_win", column, format!("missing for {}", self.team_name))
            })?;
            wins[round] = value >= 1.0;
        }
        Ok(wins)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BracketRow {
    team_name: String,
    team_seed: String,
    team_rating: f64,
    team_region: String,
    playin_flag: u8,
    team_id: u32,
    rd1_win: u8,
    rd2_win: u8,
    rd3_win: u8,
    rd4_win: u8,
    rd5_win: u8,
    rd6_win: u8,
    rd7_win: u8,
}

impl BracketRow {
    fn new(team: &Team, wins: [bool; ROUND_COUNT]) -> Self {
        let flag = |round: usize| u8::from(wins[round]);
        BracketRow {
            team_name: team.name.clone(),
            team_seed: team.seed_label(),
            team_rating: team.rating,
            team_region: team.region.to_string(),
            playin_flag: u8::from(team.is_playin),
            team_id: team.id,
            rd1_win: flag(0),
            rd2_win: flag(1),
            rd3_win: flag(2),
            rd4_win: flag(3),
            rd5_win: flag(4),
            rd6_win: flag(5),
            rd7_win: flag(6),
        }
    }

    fn team(&self) -> Result<Team> {
        Team::from_columns(
            self.team_id,
            &self.team_name,
            &self.team_seed,
            self.team_rating,
            &self.team_region,
            self.playin_flag,
        )
    }

    fn wins(&self) -> Result<[bool; ROUND_COUNT]> {
        let flags = [
            self.rd1_win,
            self.rd2_win,
            self.rd3_win,
            self.rd4_win,
            self.rd5_win,
            self.rd6_win,
            self.rd7_win,
        ];
        let mut wins = [false; ROUND_COUNT];
        for (round, flag) in flags.into_iter().enumerate() {
            wins[round] = match flag {
                0 => false,
                1 => true,
                other => {
                    return Err(Error::parse(
                        "rd_win",
                        other.to_string(),
                        format!("rd{}_win for {} must be 0 or 1", round + 1, self.team_name),
                    ))
                }
            };
        }
        Ok(wins)
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::io(path, e))
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| Error::io(path, e))
}

/// Forecast rows admitted by `filter`, first row per team id.
fn read_forecasts<R: io::Read>(reader: R, filter: &TeamFilter) -> Result<Vec<ForecastRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut seen = HashSet::new();
    let mut duplicates = 0usize;
    let mut rows = Vec::new();

    for result in rdr.deserialize::<ForecastRow>() {
        let row = result?;
        if row.gender != filter.gender {
            continue;
        }
        if filter.forecast_date.is_some() && row.forecast_date != filter.forecast_date {
            continue;
        }
        if !seen.insert(row.team_id) {
            duplicates += 1;
            continue;
        }
        rows.push(row);
    }

    if duplicates > 0 {
        debug!(duplicates, "kept the first forecast row for each team");
    }
    Ok(rows)
}

/// Read the field from a forecast table.
pub fn read_teams_from<R: io::Read>(reader: R, filter: &TeamFilter) -> Result<Vec<Team>> {
    let rows = read_forecasts(reader, filter)?;
    rows.iter().map(ForecastRow::team).collect()
}

/// Read the field from a forecast table on disk.
pub fn read_teams(path: impl AsRef<Path>, filter: &TeamFilter) -> Result<Vec<Team>> {
    let path = path.as_ref();
    let teams = read_teams_from(open(path)?, filter)?;
    info!(path = %path.display(), teams = teams.len(), gender = %filter.gender, "loaded field");
    Ok(teams)
}

/// Write one row per team with its seven round flags.
pub fn write_bracket<W: io::Write>(bracket: &Bracket, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(BRACKET_HEADER)?;
    for team in bracket.teams() {
        wtr.serialize(BracketRow::new(team, bracket.round_wins(team)))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn save(bracket: &Bracket, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_bracket(bracket, create(path)?)?;
    debug!(path = %path.display(), "saved bracket");
    Ok(())
}

/// Rebuild a bracket from saved rows on the default layout.
pub fn read_bracket<R: io::Read>(reader: R) -> Result<Bracket> {
    read_bracket_with(reader, Arc::clone(&DEFAULT_TOPOLOGY))
}

/// Rebuild a bracket from saved rows.
///
/// The field is taken from the rows themselves; each team's win streak is
/// then replayed upward from its entry game. Inconsistent flags are reported
/// as [`Error::CorruptBracket`].
pub fn read_bracket_with<R: io::Read>(reader: R, topology: Arc<Topology>) -> Result<Bracket> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize::<BracketRow>() {
        let row = result?;
        rows.push((row.team()?, row.wins()?));
    }

    let teams = rows.iter().map(|(team, _)| team.clone()).collect();
    let mut bracket = Bracket::with_topology(teams, topology).map_err(|e| match e {
        Error::Topology(reason) => Error::corrupt("field", reason),
        other => other,
    })?;

    let mut replay = Replay::default();
    for (team, wins) in &rows {
        replay.trace(&bracket, team, wins)?;
    }
    replay.apply(&mut bracket)?;
    Ok(bracket)
}

pub fn load(path: impl AsRef<Path>, topology: Arc<Topology>) -> Result<Bracket> {
    let path = path.as_ref();
    let bracket = read_bracket_with(open(path)?, topology)?;
    debug!(path = %path.display(), complete = bracket.is_complete(), "loaded bracket");
    Ok(bracket)
}

/// Winners and slot occupants claimed by the saved rows, checked for
/// conflicts before any of them touch the bracket.
#[derive(Default)]
struct Replay {
    seated: Vec<(GameId, Team)>,
    slots: HashMap<(GameId, bool), Team>,
    winners: HashMap<GameId, Team>,
}

impl Replay {
    fn claim_winner(&mut self, game: GameId, team: &Team) -> Result<()> {
        match self.winners.get(&game) {
            Some(other) if other != team => Err(Error::corrupt(
                team,
                format!("{} also claims to have won {}", other, game),
            )),
            _ => {
                self.winners.insert(game, team.clone());
                Ok(())
            }
        }
    }

    fn claim_slot(&mut self, game: GameId, left: bool, team: &Team) -> Result<()> {
        match self.slots.get(&(game, left)) {
            Some(other) if other != team => Err(Error::corrupt(
                team,
                format!("{} already holds that slot of {}", other, game),
            )),
            _ => {
                self.slots.insert((game, left), team.clone());
                Ok(())
            }
        }
    }

    /// Follow one team's contiguous streak of wins up the tree.
    fn trace(&mut self, bracket: &Bracket, team: &Team, wins: &[bool; ROUND_COUNT]) -> Result<()> {
        let streak = wins.iter().take_while(|&&won| won).count();
        if wins[streak..].iter().any(|&won| won) {
            return Err(Error::corrupt(team, format!("round flags {:?} have a gap", wins)));
        }
        if !team.is_playin && !wins[0] {
            return Err(Error::corrupt(team, "a team without a play-in game must have rd1_win set"));
        }
        if streak == 0 {
            return Ok(());
        }

        let topology = bracket.topology();
        let mut game = topology.first_round_game(team.region, team.seed)?;
        if team.is_playin {
            let playin = topology
                .playin_game(team.region, team.seed)
                .ok_or_else(|| Error::corrupt(team, "no play-in game for this seed"))?;
            self.claim_winner(playin, team)?;
            self.seated.push((game, team.clone()));
        } else if !bracket.game(game).contains(team) {
            return Err(Error::corrupt(team, format!("not found in its first-round {}", game)));
        }

        for _ in 1..streak {
            self.claim_winner(game, team)?;
            match game.parent() {
                Some(parent) => {
                    self.claim_slot(parent, game.is_left_child(), team)?;
                    game = parent;
                }
                None => break,
            }
        }
        Ok(())
    }

    fn apply(self, bracket: &mut Bracket) -> Result<()> {
        for (game, team) in self.seated {
            if bracket.game_mut(game).add_team(team.clone()).is_none() {
                return Err(Error::corrupt(&team, format!("{} is already full", game)));
            }
        }
        for ((game, left), team) in self.slots {
            let slot = if left { Slot::A } else { Slot::B };
            bracket.game_mut(game).set_team(slot, team);
        }
        let mut winners: Vec<_> = self.winners.into_iter().collect();
        winners.sort_by_key(|(game, _)| std::cmp::Reverse(*game));
        for (game, team) in winners {
            let placed = bracket.game_mut(game).set_winner(team.clone());
            placed.map_err(|e| match e {
                Error::GameNotReady => {
                    let reason = format!("won {} before its opponent was decided", game);
                    Error::corrupt(&team, reason)
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

/// Convert a finished forecast table into the bracket file format.
///
/// Returns the number of teams written.
pub fn convert_forecasts<R: io::Read, W: io::Write>(
    reader: R,
    writer: W,
    filter: &TeamFilter,
) -> Result<usize> {
    let rows = read_forecasts(reader, filter)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(BRACKET_HEADER)?;
    for row in &rows {
        wtr.serialize(BracketRow::new(&row.team()?, row.settled_wins()?))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(rows.len())
}

pub fn convert_forecasts_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    filter: &TeamFilter,
) -> Result<usize> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let count = convert_forecasts(open(input)?, create(output)?, filter)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        teams = count,
        "converted forecasts"
    );
    Ok(count)
}
