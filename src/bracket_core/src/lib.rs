//! Bracket Core - NCAA tournament bracket simulation and scoring.
//!
//! Builds the 67-game men's bracket from a forecast table, resolves it by
//! chalk or Elo-weighted simulation, scores it against a reference bracket,
//! and reads/writes the per-team CSV bracket format. Python bindings are
//! available behind the `python` feature.

pub mod batch;
pub mod bracket;
pub mod config;
pub mod constants;
pub mod error;
pub mod game;
pub mod logging;
pub mod picker;
pub mod store;
pub mod team;
pub mod topology;
pub mod win_prob;

#[cfg(feature = "python")]
mod python;

pub use batch::{find_best_bracket, generate_brackets, BatchReport, ScoreStats, SearchResult};
pub use bracket::{Bracket, ScoringOptions};
pub use config::Config;
pub use constants::{MAX_SCORE, NUM_GAMES, ROUND_POINTS};
pub use error::{Error, Result};
pub use game::Game;
pub use picker::{Chalk, Pick, Picker, Simulated, Slot};
pub use team::{Region, Team};
pub use topology::{GameId, Round, Topology, DEFAULT_TOPOLOGY};
pub use win_prob::calculate_win_prob;
