//! End-to-end check of the simulated unit against the schoolbook oracle.

use bigmul_unit::{
    schoolbook_product, BigmulUnit, FlatMemory, LatencyProfile, PipelineStats, ResultLimbs,
    UnitConfig, OPERAND_BYTES, RESULT_BYTES, RESULT_LIMBS,
};

use crate::error::TestgenError;
use crate::operands::OperandPair;

const A_ADDR: u64 = 0;
const B_ADDR: u64 = OPERAND_BYTES as u64;
const RES_ADDR: u64 = 2 * OPERAND_BYTES as u64;
const IMAGE_BYTES: usize = 2 * OPERAND_BYTES + RESULT_BYTES;

/// Outcome of a passing verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// Product read back from simulated memory.
    pub product: ResultLimbs,
    /// Cycles spent in the operand load phase.
    pub load_cycles: u32,
    /// `advance()` calls made during the multiply phase.
    pub multiply_advances: u32,
    /// Cycles spent writing the result back.
    pub write_cycles: u32,
    /// Pipeline counters for the multiply phase.
    pub stats: PipelineStats,
}

/// Runs `pair` through load, multiply and write-back on a unit configured
/// with `profile`, laid out in memory as the generated program does.
///
/// # Errors
///
/// Returns [`TestgenError::Unit`] if a bus transfer fails and
/// [`TestgenError::Mismatch`] at the first limb that differs from the
/// oracle.
pub fn verify_pair(pair: &OperandPair, profile: LatencyProfile) -> Result<Verified, TestgenError> {
    let mut memory = FlatMemory::new(IMAGE_BYTES);
    memory
        .write_limbs(A_ADDR, &pair.a)
        .map_err(bigmul_unit::UnitError::from)?;
    memory
        .write_limbs(B_ADDR, &pair.b)
        .map_err(bigmul_unit::UnitError::from)?;

    let mut unit = BigmulUnit::with_config(UnitConfig::with_profile(profile))?;

    unit.begin_load(A_ADDR, B_ADDR);
    let mut load_cycles = 1;
    while !unit.load_cycle(&mut memory)? {
        load_cycles += 1;
    }

    unit.issue(RES_ADDR);
    let outcome = unit.run_to_completion();

    let mut write_cycles = 1;
    while !unit.write_back_cycle(&mut memory)? {
        write_cycles += 1;
    }

    let written = memory
        .read_limbs(RES_ADDR, RESULT_LIMBS)
        .map_err(bigmul_unit::UnitError::from)?;
    let expected = schoolbook_product(&pair.a, &pair.b);
    if let Some((index, (&actual, &expected))) = written
        .iter()
        .zip(expected.iter())
        .enumerate()
        .find(|(_, (actual, expected))| actual != expected)
    {
        return Err(TestgenError::Mismatch {
            index,
            expected,
            actual,
        });
    }

    Ok(Verified {
        product: expected,
        load_cycles,
        multiply_advances: outcome.advances,
        write_cycles,
        stats: outcome.stats,
    })
}

#[cfg(test)]
mod tests {
    use bigmul_unit::LatencyProfile;

    use super::verify_pair;
    use crate::operands::{OperandGenerator, OperandPair};

    #[test]
    fn every_profile_verifies_random_pair() {
        let pair = OperandGenerator::from_seed(2024).pair();
        for profile in LatencyProfile::ALL {
            let verified = verify_pair(&pair, profile).expect("unit matches oracle");
            assert_eq!(verified.load_cycles, 64);
            assert_eq!(verified.write_cycles, 128);
        }
    }

    #[test]
    fn single_cycle_advances_once_per_diagonal_plus_start() {
        let pair = OperandPair {
            a: [u64::MAX; 64],
            b: [u64::MAX; 64],
        };
        let verified = verify_pair(&pair, LatencyProfile::SingleCycle).expect("matches");
        assert_eq!(verified.multiply_advances, 129);
        assert_eq!(verified.product[0], 1);
    }
}
