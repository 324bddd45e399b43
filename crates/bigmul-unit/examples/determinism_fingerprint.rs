//! Deterministic result fingerprint used for cross-host comparison.
//!
//! Hashes the product and cycle counts of every latency profile over a fixed
//! operand pair; two hosts agree iff they print the same line.

use bigmul_unit::{
    BigmulUnit, LatencyProfile, OperandLimbs, StepOutcome, UnitConfig, OPERAND_LIMBS,
};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fixed_operand(seed: u64) -> OperandLimbs {
    let mut state = seed;
    let mut limbs = [0; OPERAND_LIMBS];
    for limb in &mut limbs {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        *limb = state;
    }
    limbs
}

fn fingerprint() -> String {
    let a = fixed_operand(0x00C0_FFEE);
    let b = fixed_operand(0x0BAD_F00D);
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;

    for profile in LatencyProfile::ALL {
        let mut unit =
            BigmulUnit::with_config(UnitConfig::with_profile(profile)).expect("preset is valid");
        unit.load_operands(&a, &b);
        unit.issue(0);

        let cycles = loop {
            if let StepOutcome::Completed { cycles } = unit.advance() {
                break cycles;
            }
        };
        hash_bytes(&mut hash, profile.name().as_bytes());
        hash_bytes(&mut hash, &cycles.to_le_bytes());
        hash_bytes(&mut hash, &unit.results().to_le_bytes());
    }

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}
