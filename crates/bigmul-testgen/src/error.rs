//! Error type for the test-generation harness.

use std::io;
use std::path::PathBuf;

use bigmul_unit::UnitError;
use thiserror::Error;

/// Failures raised while generating, parsing or verifying test cases.
#[derive(Debug, Error)]
pub enum TestgenError {
    /// Reading or writing a file failed.
    #[error("{path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Writing to an in-memory or stream sink failed.
    #[error("write failed: {0}")]
    Write(#[from] io::Error),
    /// A `dword` literal could not be parsed.
    #[error("line {line}: invalid dword literal `{text}`")]
    InvalidDword {
        /// 1-based source line.
        line: usize,
        /// Offending text.
        text: String,
    },
    /// An operand label did not carry exactly 64 limbs.
    #[error("operand {label} has {actual} limbs, expected {expected}")]
    LimbCount {
        /// `A` or `B`.
        label: &'static str,
        /// Required limb count.
        expected: usize,
        /// Limbs found.
        actual: usize,
    },
    /// The unit rejected its configuration or a transfer failed.
    #[error(transparent)]
    Unit(#[from] UnitError),
    /// The simulated unit disagreed with the schoolbook oracle.
    #[error("result limb {index} is {actual:#018x}, expected {expected:#018x}")]
    Mismatch {
        /// First differing limb.
        index: usize,
        /// Oracle limb.
        expected: u64,
        /// Unit limb.
        actual: u64,
    },
}
