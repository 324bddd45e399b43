//! Random operand generation.

use bigmul_unit::{OperandLimbs, OPERAND_LIMBS};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A multiplicand pair for one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandPair {
    /// Operand A, least-significant limb first.
    pub a: OperandLimbs,
    /// Operand B, least-significant limb first.
    pub b: OperandLimbs,
}

/// Seeded operand source; the same seed always yields the same pairs.
#[derive(Debug, Clone)]
pub struct OperandGenerator {
    seed: u64,
    rng: ChaCha8Rng,
}

impl OperandGenerator {
    /// Generator seeded with `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generator seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    /// Seed this generator started from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// 64 uniformly random limbs.
    pub fn operand(&mut self) -> OperandLimbs {
        let mut limbs = [0; OPERAND_LIMBS];
        self.rng.fill(&mut limbs[..]);
        limbs
    }

    /// Next `(A, B)` pair.
    pub fn pair(&mut self) -> OperandPair {
        let a = self.operand();
        let b = self.operand();
        OperandPair { a, b }
    }
}
