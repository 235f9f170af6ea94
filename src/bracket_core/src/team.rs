use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{Error, Result};

/// One quarter of the field: sixteen seeds playing down to a Final Four team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum Region {
    West,
    East,
    South,
    Midwest,
}

/// A seeded team.
///
/// Identity is the team id alone: two values with the same id compare equal
/// whatever their other fields say.
#[derive(Clone, Debug)]
pub struct Team {
    pub id: u32,
    pub name: String,
    /// Power rating; differences feed the logistic win model.
    pub rating: f64,
    /// Seed within the region, 1 (best) to 16.
    pub seed: u8,
    pub region: Region,
    /// Team must win a play-in game before entering the first round.
    pub is_playin: bool,
    /// Ordinal of the play-in suffix (`16a` -> 1, `16b` -> 2).
    pub playin_id: Option<u32>,
}

impl Team {
    pub fn new(id: u32, name: impl Into<String>, rating: f64, seed: u8, region: Region) -> Self {
        Team {
            id,
            name: name.into(),
            rating,
            seed,
            region,
            is_playin: false,
            playin_id: None,
        }
    }

    /// Mark this team as a play-in participant.
    pub fn with_playin(mut self, playin_id: Option<u32>) -> Self {
        self.is_playin = true;
        self.playin_id = playin_id;
        self
    }

    /// A team entering by seed; it is a play-in participant exactly when it
    /// carries a play-in id.
    pub fn entrant(
        id: u32,
        name: impl Into<String>,
        rating: f64,
        seed: u8,
        region: Region,
        playin_id: Option<u32>,
    ) -> Self {
        let team = Team::new(id, name, rating, seed, region);
        match playin_id {
            Some(_) => team.with_playin(playin_id),
            None => team,
        }
    }

    /// Build a team from the raw string columns shared by the forecast and
    /// bracket tables.
    pub fn from_columns(
        id: u32,
        name: &str,
        seed: &str,
        rating: f64,
        region: &str,
        playin_flag: u8,
    ) -> Result<Self> {
        let (seed, playin_id) = parse_seed(seed)?;
        let region = Region::from_str(region.trim())
            .map_err(|_| Error::parse("team_region", region, "unknown region"))?;
        let team = Team::new(id, name, rating, seed, region);
        match playin_flag {
            0 => Ok(team),
            1 => Ok(team.with_playin(playin_id)),
            other => Err(Error::parse("playin_flag", other.to_string(), "expected 0 or 1")),
        }
    }

    /// Seed column as written to a bracket file: two digits plus the play-in suffix.
    pub fn seed_label(&self) -> String {
        format_seed(self.seed, self.playin_id)
    }
}

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Team {}

impl Hash for Team {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.seed, self.name)
    }
}

/// Parse a seed column such as `01`, `11` or `16b`.
///
/// The first two characters must be digits forming a seed in 1..=16. An
/// optional single trailing letter names the play-in slot and is returned as
/// its alphabet ordinal.
pub fn parse_seed(raw: &str) -> Result<(u8, Option<u32>)> {
    let raw = raw.trim();
    let digits = raw
        .get(..2)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()));
    let Some(digits) = digits else {
        return Err(Error::parse("team_seed", raw, "expected at least 2 leading digits"));
    };

    let seed: u8 = digits
        .parse()
        .map_err(|_| Error::parse("team_seed", raw, "invalid seed digits"))?;
    if !(1..=16).contains(&seed) {
        return Err(Error::parse("team_seed", raw, "seed must be between 1 and 16"));
    }

    let suffix = &raw[2..];
    let mut chars = suffix.chars();
    let playin_id = match (chars.next(), chars.next()) {
        (None, _) => None,
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Some(u32::from(c.to_ascii_lowercase() as u8 - b'a') + 1)
        }
        _ => return Err(Error::parse("team_seed", raw, "play-in suffix must be a single letter")),
    };

    Ok((seed, playin_id))
}

/// Inverse of [`parse_seed`].
pub fn format_seed(seed: u8, playin_id: Option<u32>) -> String {
    let suffix = playin_id
        .and_then(|id| u8::try_from(id).ok())
        .filter(|id| (1..=26).contains(id))
        .map(|id| char::from(b'a' + id - 1).to_string())
        .unwrap_or_default();
    format!("{:02}{}", seed, suffix)
}
