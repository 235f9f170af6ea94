/// Total games in the bracket heap: 63 standard games plus 4 play-in games.
pub const NUM_GAMES: usize = 67;

/// Games in the standard 64-team tree (indices 0..63).
pub const STANDARD_GAMES: usize = 63;

/// First index of the first-round games (the leaves of the standard tree).
pub const FIRST_ROUND_START: usize = 31;

/// First index of the play-in games.
pub const PLAYIN_START: usize = 63;

/// Rounds recorded per team in a saved bracket (play-in through championship).
pub const ROUND_COUNT: usize = 7;

/// Logistic rating scale: rating points per Elo point, over the Elo divisor.
pub const ELO_SCALE: f64 = 30.464 / 400.0;

/// Points per correctly picked game, first round through championship.
pub const ROUND_POINTS: [u32; 6] = [1, 2, 4, 8, 16, 32];

/// Score of a bracket that picks every standard game correctly.
pub const MAX_SCORE: u32 = 192;

/// Only rows with this gender are admitted from the forecast table by default.
pub const DEFAULT_GENDER: &str = "mens";

/// Header of a saved bracket file.
pub const BRACKET_HEADER: [&str; 13] = [
    "team_name",
    "team_seed",
    "team_rating",
    "team_region",
    "playin_flag",
    "team_id",
    "rd1_win",
    "rd2_win",
    "rd3_win",
    "rd4_win",
    "rd5_win",
    "rd6_win",
    "rd7_win",
];
