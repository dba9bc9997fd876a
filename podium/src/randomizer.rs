//! Injectable randomness for participant ordering and final tie-breaks.

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::tournament::models::TeamId;

/// Source of the engine's only non-deterministic decisions
pub trait Randomizer: Send {
    /// Uniform coin flip used as the last tie-break step.
    /// Returns `true` when the first of the two compared entries wins.
    fn coin_flip(&mut self) -> bool;

    /// Shuffle participants before a round robin is scheduled
    fn shuffle(&mut self, teams: &mut [TeamId]);
}

/// Randomizer backed by a standard RNG, optionally seeded
pub struct SeededRandomizer {
    rng: StdRng,
}

impl SeededRandomizer {
    /// Create a randomizer; `None` seeds from the operating system
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl Default for SeededRandomizer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Randomizer for SeededRandomizer {
    fn coin_flip(&mut self) -> bool {
        rand::Rng::random_bool(&mut self.rng, 0.5)
    }

    fn shuffle(&mut self, teams: &mut [TeamId]) {
        teams.shuffle(&mut self.rng);
    }
}

/// Fully deterministic randomizer for tests: the coin always lands the same
/// way and shuffling keeps registration order.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandomizer {
    pub heads: bool,
}

impl FixedRandomizer {
    pub fn new(heads: bool) -> Self {
        Self { heads }
    }
}

impl Randomizer for FixedRandomizer {
    fn coin_flip(&mut self) -> bool {
        self.heads
    }

    fn shuffle(&mut self, _teams: &mut [TeamId]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_randomizer_is_reproducible() {
        let mut a = SeededRandomizer::new(Some(42));
        let mut b = SeededRandomizer::new(Some(42));

        let flips_a: Vec<bool> = (0..32).map(|_| a.coin_flip()).collect();
        let flips_b: Vec<bool> = (0..32).map(|_| b.coin_flip()).collect();
        assert_eq!(flips_a, flips_b);

        let mut teams_a: Vec<TeamId> = (1..=10).collect();
        let mut teams_b = teams_a.clone();
        a.shuffle(&mut teams_a);
        b.shuffle(&mut teams_b);
        assert_eq!(teams_a, teams_b);
    }

    #[test]
    fn test_shuffle_preserves_members() {
        let mut randomizer = SeededRandomizer::default();
        let mut teams: Vec<TeamId> = (1..=8).collect();
        randomizer.shuffle(&mut teams);
        teams.sort_unstable();
        assert_eq!(teams, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_fixed_randomizer() {
        let mut randomizer = FixedRandomizer::new(false);
        assert!(!randomizer.coin_flip());

        let mut teams = vec![3, 1, 2];
        randomizer.shuffle(&mut teams);
        assert_eq!(teams, vec![3, 1, 2]);
    }
}
