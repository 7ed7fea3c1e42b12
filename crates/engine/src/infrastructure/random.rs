//! Random sources backing dice evaluation.

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use sheetforge_domain::value_objects::{RandomSource, RandomSourceError};

/// Operating-system randomness.
///
/// Faces are drawn by rejection sampling so every face of a die is equally
/// likely, whatever the number of sides.
#[derive(Debug, Default)]
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl RandomSource for SystemRandom {
    fn roll_die(&mut self, sides: u32) -> Result<u32, RandomSourceError> {
        if sides == 0 {
            return Err(RandomSourceError::new("cannot roll a zero-sided die"));
        }
        // Largest multiple of `sides` that fits in u32's range.
        let zone = u64::from(u32::MAX) + 1 - (u64::from(u32::MAX) + 1) % u64::from(sides);
        loop {
            let mut bytes = [0u8; 4];
            OsRng
                .try_fill_bytes(&mut bytes)
                .map_err(|e| RandomSourceError::new(e.to_string()))?;
            let value = u64::from(u32::from_le_bytes(bytes));
            if value < zone {
                return Ok((value % u64::from(sides)) as u32 + 1);
            }
        }
    }
}

/// Reproducible randomness from a 64-bit seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    seed: u64,
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn roll_die(&mut self, sides: u32) -> Result<u32, RandomSourceError> {
        if sides == 0 {
            return Err(RandomSourceError::new("cannot roll a zero-sided die"));
        }
        Ok(self.rng.gen_range(1..=sides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_random_stays_on_the_die() {
        let mut rng = SystemRandom::new();
        for sides in [2, 3, 6, 20, 100] {
            for _ in 0..200 {
                let face = rng.roll_die(sides).expect("os randomness");
                assert!((1..=sides).contains(&face));
            }
        }
    }

    #[test]
    fn zero_sided_dice_are_rejected() {
        assert!(SystemRandom::new().roll_die(0).is_err());
        assert!(SeededRandom::new(1).roll_die(0).is_err());
    }

    #[test]
    fn same_seed_same_faces() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        let first: Vec<u32> = (0..20).map(|_| a.roll_die(20).expect("roll")).collect();
        let second: Vec<u32> = (0..20).map(|_| b.roll_die(20).expect("roll")).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|f| (1..=20).contains(f)));
        assert_eq!(a.seed(), 42);
    }
}
