//! Test-case generator and verifier for the big-multiply unit.
//!
//! Produces random 4096-bit operand pairs, the assembly program that feeds
//! them to a simulator, and the schoolbook product the simulator's result
//! buffer must match.

/// Harness error type.
pub mod error;
pub use error::TestgenError;

/// Seeded random operand pairs.
pub mod operands;
pub use operands::{OperandGenerator, OperandPair};

/// Assembly program emission and parsing.
pub mod asm;
pub use asm::{
    parse_assembly, render_assembly, write_assembly, AssemblyListing, DEFAULT_ASM_FILE,
};

/// Hex, raw and bit-count reports.
pub mod report;
pub use report::{count_bits, format_hex, raw_dump};

/// Simulated-unit verification.
pub mod verify;
pub use verify::{verify_pair, Verified};

#[cfg(test)]
use tempfile as _;
