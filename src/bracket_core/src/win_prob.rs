use crate::constants::ELO_SCALE;
use crate::team::Team;

/// Calculate the probability of team1 beating team2.
///
/// Logistic (Elo-style) model on the rating difference:
/// `1 / (1 + 10^(-(rating1 - rating2) * 30.464 / 400))`.
///
/// # Returns
/// Probability of team1 winning (0.0-1.0)
pub fn calculate_win_prob(team1: &Team, team2: &Team) -> f64 {
    let rating_diff = team1.rating - team2.rating;
    1.0 / (1.0 + 10f64.powf(-rating_diff * ELO_SCALE))
}

/// Whether team1 is the favorite under the seed-based "chalk" rule.
///
/// Two play-in teams are ordered by their play-in id; otherwise the lower
/// seed number wins. Ties go to team1.
pub fn chalk_favors_first(team1: &Team, team2: &Team) -> bool {
    if team1.is_playin && team2.is_playin {
        team1.playin_id <= team2.playin_id
    } else {
        team1.seed <= team2.seed
    }
}
