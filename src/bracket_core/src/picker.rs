use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::team::Team;
use crate::win_prob::chalk_favors_first;

/// Which slot of a game a team occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

/// Outcome chosen by a [`Picker`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pick {
    pub slot: Slot,
    /// Probability of slot A winning to record on the game.
    pub win_prob: f64,
}

/// Strategy that decides the winner of a ready game.
pub trait Picker {
    /// Choose a winner between `team_a` and `team_b`, given the model
    /// probability that `team_a` wins.
    fn pick(&mut self, team_a: &Team, team_b: &Team, win_prob: f64) -> Pick;
}

/// Deterministic policy: the favorite by seed always advances.
///
/// The recorded probability is pinned to 1.0 or 0.0 for display.
#[derive(Clone, Copy, Debug, Default)]
pub struct Chalk;

impl Picker for Chalk {
    fn pick(&mut self, team_a: &Team, team_b: &Team, _win_prob: f64) -> Pick {
        if chalk_favors_first(team_a, team_b) {
            Pick { slot: Slot::A, win_prob: 1.0 }
        } else {
            Pick { slot: Slot::B, win_prob: 0.0 }
        }
    }
}

/// Monte Carlo policy: draw `r` uniformly from [0, 1); slot A wins when
/// `r` falls below its win probability.
#[derive(Clone, Debug)]
pub struct Simulated<R> {
    rng: R,
}

impl<R: Rng> Simulated<R> {
    pub fn new(rng: R) -> Self {
        Simulated { rng }
    }
}

impl Simulated<ChaCha8Rng> {
    /// Seeded ChaCha8 stream, or entropy when no seed is given.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Simulated { rng }
    }
}

impl<R: Rng> Picker for Simulated<R> {
    fn pick(&mut self, _team_a: &Team, _team_b: &Team, win_prob: f64) -> Pick {
        let slot = if self.rng.gen::<f64>() < win_prob { Slot::A } else { Slot::B };
        Pick { slot, win_prob }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::team::Region;
    use crate::win_prob::calculate_win_prob;
    use rand::rngs::mock::StepRng;

    /// An rng whose every `gen::<f64>()` draw is (just under) `value`.
    pub(crate) fn fixed_draw(value: f64) -> StepRng {
        let bits = (value * (1u64 << 53) as f64) as u64;
        StepRng::new(bits << 11, 0)
    }

    fn one_vs_sixteen(rating1: f64, rating16: f64) -> (Team, Team) {
        (
            Team::new(1, "Favorite", rating1, 1, Region::West),
            Team::new(2, "Underdog", rating16, 16, Region::West),
        )
    }

    #[test]
    fn test_fixed_draw() {
        let mut rng = fixed_draw(0.99);
        let r: f64 = rng.gen();
        assert!((r - 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_chalk_pins_probability() {
        let (one, sixteen) = one_vs_sixteen(2000.0, 1500.0);
        let pick = Chalk.pick(&one, &sixteen, calculate_win_prob(&one, &sixteen));
        assert_eq!(pick, Pick {
            slot: Slot::A,
            win_prob: 1.0,
        });

        let pick = Chalk.pick(&sixteen, &one, 0.3);
        assert_eq!(pick, Pick {
            slot: Slot::B,
            win_prob: 0.0,
        });
    }

    #[test]
    fn test_simulated_upset_with_high_draw() {
        // p(seed 1) ~= 0.971, so a draw of 0.99 lands on the underdog.
        let (one, sixteen) = one_vs_sixteen(90.0, 70.0);
        let p = calculate_win_prob(&one, &sixteen);
        assert!(p < 0.99);

        let mut picker = Simulated::new(fixed_draw(0.99));
        let pick = picker.pick(&one, &sixteen, p);
        assert_eq!(pick.slot, Slot::B);
        assert_eq!(pick.win_prob, p);
    }

    #[test]
    fn test_simulated_favorite_with_low_draw() {
        let (one, sixteen) = one_vs_sixteen(90.0, 70.0);
        let p = calculate_win_prob(&one, &sixteen);

        let mut picker = Simulated::new(fixed_draw(0.5));
        assert_eq!(picker.pick(&one, &sixteen, p).slot, Slot::A);
    }

    #[test]
    fn test_seeded_simulation_is_reproducible() {
        let (one, sixteen) = one_vs_sixteen(80.0, 79.0);
        let mut first = Simulated::from_seed(Some(42));
        let mut second = Simulated::from_seed(Some(42));

        for _ in 0..100 {
            assert_eq!(first.pick(&one, &sixteen, 0.5), second.pick(&one, &sixteen, 0.5));
        }
    }
}
