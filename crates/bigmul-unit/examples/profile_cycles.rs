//! Cycles-to-completion per latency profile.
//!
//! ## Usage
//!
//! ```sh
//! cargo run -p bigmul-unit --example profile_cycles
//! ```

#![allow(clippy::pedantic)]

use bigmul_unit::{
    schoolbook_product, BigmulUnit, LatencyProfile, UnitConfig, OPERAND_LIMBS,
};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn main() {
    let mut a = [0u64; OPERAND_LIMBS];
    let mut b = [0u64; OPERAND_LIMBS];
    for (index, (x, y)) in a.iter_mut().zip(b.iter_mut()).enumerate() {
        *x = u64::MAX - index as u64;
        *y = (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    }
    let expected = schoolbook_product(&a, &b);

    println!(
        "{:<14} {:>6} {:>8} {:>8} {:>8} {:>6}",
        "profile", "width", "cycles", "batches", "drain", "queue"
    );
    for profile in LatencyProfile::ALL {
        let mut unit =
            BigmulUnit::with_config(UnitConfig::with_profile(profile)).expect("preset is valid");
        unit.load_operands(&a, &b);
        unit.issue(0);
        let outcome = unit.run_to_completion();
        assert_eq!(unit.finished_result(), Some(&expected));

        let stats = outcome.stats;
        println!(
            "{:<14} {:>6} {:>8} {:>8} {:>8} {:>6}",
            profile.name(),
            profile.config().batch_width,
            stats.cycles,
            stats.batches_issued,
            stats.drain_cycles,
            stats.peak_queue_depth
        );
    }
}
