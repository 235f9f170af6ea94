use std::fmt;

use crate::error::{Error, Result};
use crate::picker::{Picker, Slot};
use crate::team::Team;
use crate::win_prob::calculate_win_prob;

/// One node of the bracket heap.
///
/// A game moves from empty to one slot filled to ready (both slots filled,
/// win probability known) to resolved (winner recorded).
#[derive(Clone, Debug, Default)]
pub struct Game {
    team_a: Option<Team>,
    team_b: Option<Team>,
    /// Probability that slot A wins.
    win_prob: Option<f64>,
    winner: Option<Team>,
}

impl Game {
    pub fn new() -> Self {
        Game::default()
    }

    /// Fill slot A if it is empty, else slot B.
    ///
    /// Returns the slot that was filled, or `None` when the game was already full.
    pub fn add_team(&mut self, team: Team) -> Option<Slot> {
        let slot = if self.team_a.is_none() {
            Slot::A
        } else if self.team_b.is_none() {
            Slot::B
        } else {
            return None;
        };
        self.set_team(slot, team);
        Some(slot)
    }

    /// Put `team` into a specific slot, replacing any previous occupant.
    pub fn set_team(&mut self, slot: Slot, team: Team) {
        match slot {
            Slot::A => self.team_a = Some(team),
            Slot::B => self.team_b = Some(team),
        }
        self.win_prob = match (&self.team_a, &self.team_b) {
            (Some(a), Some(b)) => Some(calculate_win_prob(a, b)),
            _ => None,
        };
    }

    pub fn is_ready(&self) -> bool {
        self.team_a.is_some() && self.team_b.is_some()
    }

    pub fn is_resolved(&self) -> bool {
        self.winner.is_some()
    }

    /// Let `picker` choose the winner, record it, and return it.
    pub fn resolve<P: Picker + ?Sized>(&mut self, picker: &mut P) -> Result<&Team> {
        let (Some(a), Some(b)) = (&self.team_a, &self.team_b) else {
            return Err(Error::GameNotReady);
        };
        let prob = self.win_prob.unwrap_or_else(|| calculate_win_prob(a, b));
        let pick = picker.pick(a, b, prob);
        let winner = match pick.slot {
            Slot::A => a.clone(),
            Slot::B => b.clone(),
        };
        self.win_prob = Some(pick.win_prob);
        Ok(self.winner.insert(winner))
    }

    /// Record `team` as the winner without playing the game; the team must
    /// already occupy one of the slots.
    pub fn set_winner(&mut self, team: Team) -> Result<()> {
        if !self.is_ready() {
            return Err(Error::GameNotReady);
        }
        if !self.contains(&team) {
            return Err(Error::corrupt(&team, "winner is not one of the game's teams"));
        }
        self.winner = Some(team);
        Ok(())
    }

    pub fn team(&self, slot: Slot) -> Option<&Team> {
        match slot {
            Slot::A => self.team_a.as_ref(),
            Slot::B => self.team_b.as_ref(),
        }
    }

    pub fn team_a(&self) -> Option<&Team> {
        self.team_a.as_ref()
    }

    pub fn team_b(&self) -> Option<&Team> {
        self.team_b.as_ref()
    }

    pub fn win_prob(&self) -> Option<f64> {
        self.win_prob
    }

    pub fn winner(&self) -> Option<&Team> {
        self.winner.as_ref()
    }

    /// Whether `team` occupies either slot.
    pub fn contains(&self, team: &Team) -> bool {
        self.team_a.as_ref() == Some(team) || self.team_b.as_ref() == Some(team)
    }
}

/// Games compare by occupants and winner; probabilities are display state.
impl PartialEq for Game {
    fn eq(&self, other: &Self) -> bool {
        self.team_a == other.team_a && self.team_b == other.team_b && self.winner == other.winner
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_side(f, self.team_a.as_ref(), self.win_prob)?;
        f.write_str(" vs. ")?;
        write_side(f, self.team_b.as_ref(), self.win_prob.map(|p| 1.0 - p))?;
        if let Some(winner) = &self.winner {
            write!(f, " -> {}", winner)?;
        }
        Ok(())
    }
}

fn write_side(f: &mut fmt::Formatter<'_>, team: Option<&Team>, prob: Option<f64>) -> fmt::Result {
    match (team, prob) {
        (None, _) => f.write_str("TBD"),
        (Some(team), None) => write!(f, "{}", team),
        (Some(team), Some(p)) => write!(f, "{} ({:.2}%)", team, p * 100.0),
    }
}
