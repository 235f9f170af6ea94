//! Static bracket layout.
//!
//! The bracket heap is a fixed array of [`NUM_GAMES`] games. Indices 0..63
//! form a complete binary tree with the championship at 0 and the children of
//! game `i` at `2i + 1` and `2i + 2`; the 32 first-round games (31..63) are
//! its leaves. Indices 63..67 hold the play-in games, which sit outside the
//! tree and feed their winner into a first-round game.

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::constants::{FIRST_ROUND_START, NUM_GAMES, PLAYIN_START, ROUND_POINTS, STANDARD_GAMES};
use crate::error::{Error, Result};
use crate::team::{Region, Team};

/// Handle to a game in the bracket heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId(usize);

impl GameId {
    pub const CHAMPIONSHIP: GameId = GameId(0);

    pub fn new(index: usize) -> Option<Self> {
        (index < NUM_GAMES).then_some(GameId(index))
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// Parent in the standard tree; `None` for the championship and play-in games.
    pub fn parent(self) -> Option<GameId> {
        if self.0 == 0 || self.is_playin() {
            None
        } else {
            Some(GameId((self.0 - 1) / 2))
        }
    }

    /// Children in the standard tree; `None` for first-round and play-in games.
    pub fn children(self) -> Option<(GameId, GameId)> {
        if self.0 >= FIRST_ROUND_START {
            None
        } else {
            Some((GameId(2 * self.0 + 1), GameId(2 * self.0 + 2)))
        }
    }

    /// Whether this game feeds its parent's slot A (left child) or slot B.
    pub fn is_left_child(self) -> bool {
        self.0 % 2 == 1
    }

    pub fn is_playin(self) -> bool {
        self.0 >= PLAYIN_START
    }

    pub fn round(self) -> Round {
        Round::of_index(self.0)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game {}", self.0)
    }
}

/// Tournament rounds in playing order. The discriminant is the zero-based
/// column of the round's win flag in a saved bracket (`rd1_win` = play-in).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum Round {
    #[strum(to_string = "PLAY-IN")]
    PlayIn = 0,
    #[strum(to_string = "1ST ROUND")]
    First = 1,
    #[strum(to_string = "2ND ROUND")]
    Second = 2,
    #[strum(to_string = "SWEET 16")]
    SweetSixteen = 3,
    #[strum(to_string = "ELITE EIGHT")]
    EliteEight = 4,
    #[strum(to_string = "FINAL FOUR")]
    FinalFour = 5,
    #[strum(to_string = "CHAMPIONSHIP")]
    Championship = 6,
}

impl Round {
    /// Heap indices of the games played in this round.
    pub fn games(self) -> Range<usize> {
        match self {
            Round::PlayIn => PLAYIN_START..NUM_GAMES,
            Round::First => FIRST_ROUND_START..STANDARD_GAMES,
            Round::Second => 15..31,
            Round::SweetSixteen => 7..15,
            Round::EliteEight => 3..7,
            Round::FinalFour => 1..3,
            Round::Championship => 0..1,
        }
    }

    /// Points for a correct pick in this round; play-in games are not scored.
    pub fn points(self) -> u32 {
        match self {
            Round::PlayIn => 0,
            round => ROUND_POINTS[round as usize - 1],
        }
    }

    /// Handles of the games played in this round.
    pub fn game_ids(self) -> impl Iterator<Item = GameId> {
        self.games().map(GameId)
    }

    /// Zero-based win-flag column.
    pub fn column(self) -> usize {
        self as usize
    }

    pub fn of_index(index: usize) -> Round {
        Round::iter()
            .find(|round| round.games().contains(&index))
            .unwrap_or(Round::PlayIn)
    }
}

/// First first-round game of a region; a region owns eight consecutive
/// first-round games.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOffset {
    pub region: Region,
    pub offset: usize,
}

/// A play-in game and the (region, seed) slot its winner fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayinSlot {
    pub region: Region,
    pub seed: u8,
    pub game: usize,
}

/// Fixed mapping from (region, seed) to bracket heap positions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub region_offsets: Vec<RegionOffset>,
    /// First-round game within a region, indexed by `seed - 1`.
    pub seed_slots: Vec<usize>,
    pub playin_slots: Vec<PlayinSlot>,
}

/// The 2022 NCAA men's layout, shared by every bracket that does not get an
/// explicit topology.
pub static DEFAULT_TOPOLOGY: Lazy<Arc<Topology>> = Lazy::new(|| Arc::new(Topology::ncaa_2022()));

impl Topology {
    /// Region order West, East, South, Midwest; 1v16, 8v9, 5v12, 4v13,
    /// 6v11, 3v14, 7v10, 2v15 within each region.
    pub fn ncaa_2022() -> Self {
        let region_offsets = [
            (Region::West, 31),
            (Region::East, 39),
            (Region::South, 47),
            (Region::Midwest, 55),
        ]
        .into_iter()
        .map(|(region, offset)| RegionOffset { region, offset })
        .collect();

        //              1  2  3  4  5  6  7  8  9 10 11 12 13 14 15 16
        let seed_slots = vec![0, 7, 5, 3, 2, 4, 6, 1, 1, 6, 4, 2, 3, 5, 7, 0];

        let playin_slots = [
            (Region::West, 11, 63),
            (Region::East, 12, 64),
            (Region::South, 16, 65),
            (Region::Midwest, 16, 66),
        ]
        .into_iter()
        .map(|(region, seed, game)| PlayinSlot { region, seed, game })
        .collect();

        Topology {
            region_offsets,
            seed_slots,
            playin_slots,
        }
    }

    /// Check that the tables describe a well-formed bracket.
    pub fn validate(&self) -> Result<()> {
        if self.seed_slots.len() != 16 {
            return Err(Error::Topology(format!(
                "seed table must have 16 entries, found {}",
                self.seed_slots.len()
            )));
        }
        let mut uses = [0usize; 8];
        for &slot in &self.seed_slots {
            match uses.get_mut(slot) {
                Some(count) => *count += 1,
                None => return Err(Error::Topology(format!("seed slot {} is outside 0..8", slot))),
            }
        }
        if uses.iter().any(|&count| count != 2) {
            return Err(Error::Topology(
                "every first-round game must pair exactly two seeds".into(),
            ));
        }

        let mut taken = HashSet::new();
        for region in Region::iter() {
            let Some(offset) = self.region_offset(region) else {
                return Err(Error::Topology(format!("no offset for region {}", region)));
            };
            if offset < FIRST_ROUND_START || offset + 8 > STANDARD_GAMES {
                return Err(Error::Topology(format!(
                    "offset {} for region {} is outside the first round",
                    offset, region
                )));
            }
            for game in offset..offset + 8 {
                if !taken.insert(game) {
                    return Err(Error::Topology(format!(
                        "region {} overlaps another region",
                        region
                    )));
                }
            }
        }

        let mut playin_games = HashSet::new();
        let mut playin_seeds = HashSet::new();
        for slot in &self.playin_slots {
            if !(PLAYIN_START..NUM_GAMES).contains(&slot.game) || !playin_games.insert(slot.game) {
                return Err(Error::Topology(format!(
                    "play-in game {} is out of range or used twice",
                    slot.game
                )));
            }
            if !(1..=16).contains(&slot.seed) {
                return Err(Error::Topology(format!(
                    "play-in seed {} is out of range",
                    slot.seed
                )));
            }
            if !playin_seeds.insert((slot.region, slot.seed)) {
                return Err(Error::Topology(format!(
                    "{} seed {} has more than one play-in game",
                    slot.region, slot.seed
                )));
            }
        }
        Ok(())
    }

    /// First-round game holding `seed` of `region`.
    pub fn first_round_game(&self, region: Region, seed: u8) -> Result<GameId> {
        let slot = usize::from(seed)
            .checked_sub(1)
            .and_then(|i| self.seed_slots.get(i))
            .ok_or_else(|| Error::Topology(format!("seed {} has no first-round slot", seed)))?;
        let offset = self
            .region_offset(region)
            .ok_or_else(|| Error::Topology(format!("no offset for region {}", region)))?;
        GameId::new(offset + slot)
            .ok_or_else(|| Error::Topology(format!("slot {} is out of range", offset + slot)))
    }

    pub fn region_offset(&self, region: Region) -> Option<usize> {
        self.region_offsets
            .iter()
            .find(|entry| entry.region == region)
            .map(|entry| entry.offset)
    }

    /// Play-in game for `seed` of `region`, if that slot is decided by one.
    pub fn playin_game(&self, region: Region, seed: u8) -> Option<GameId> {
        self.playin_slots
            .iter()
            .find(|slot| slot.region == region && slot.seed == seed)
            .and_then(|slot| GameId::new(slot.game))
    }

    /// Game a team is placed into when a bracket is built.
    pub fn entry_game(&self, team: &Team) -> Result<GameId> {
        if team.is_playin {
            self.playin_game(team.region, team.seed).ok_or_else(|| {
                Error::Topology(format!(
                    "no play-in game for {} seed {} in {}",
                    team, team.seed, team.region
                ))
            })
        } else {
            self.first_round_game(team.region, team.seed)
        }
    }
}

impl Default for Topology {
    fn default() -> Self {
        Topology::ncaa_2022()
    }
}
