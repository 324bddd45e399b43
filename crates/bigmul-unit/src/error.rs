use thiserror::Error;

/// Identifies one of the two multiplicands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operand {
    /// First multiplicand (`A`).
    A,
    /// Second multiplicand (`B`).
    B,
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// Host memory bus failure categories reported by a [`crate::LimbBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum BusError {
    /// Host bus could not complete a read.
    #[error("limb read failed at {addr:#x}")]
    ReadFailed {
        /// Byte address of the failed read.
        addr: u64,
    },
    /// Host bus could not complete a write.
    #[error("limb write failed at {addr:#x}")]
    WriteFailed {
        /// Byte address of the failed write.
        addr: u64,
    },
}

/// Snapshot payload does not match the fixed cache geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SnapshotLayoutError {
    /// An operand cache image has the wrong number of limbs.
    #[error("operand {operand} image has {actual} limbs, expected {expected}")]
    OperandLimbs {
        /// Operand whose image is malformed.
        operand: Operand,
        /// Required limb count.
        expected: usize,
        /// Limb count found in the snapshot.
        actual: usize,
    },
    /// The result cache image has the wrong number of limbs.
    #[error("result image has {actual} limbs, expected {expected}")]
    ResultLimbs {
        /// Required limb count.
        expected: usize,
        /// Limb count found in the snapshot.
        actual: usize,
    },
    /// A transfer offset points past the end of its buffer.
    #[error("transfer offset {offset} exceeds {limit}")]
    TransferOffset {
        /// Offending offset.
        offset: usize,
        /// Largest legal offset.
        limit: usize,
    },
    /// A transfer offset sits at the end of its buffer while the phase is
    /// still pending.
    #[error("transfer offset {offset} reached {limit} but the phase is not done")]
    UnfinishedTransfer {
        /// Offending offset.
        offset: usize,
        /// Buffer length in limbs.
        limit: usize,
    },
}

/// Errors raised at the unit's host-facing boundary.
///
/// The multiply pipeline itself never fails; these cover configuration,
/// operand staging, snapshot import and host bus transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum UnitError {
    /// Batch width must be in `1..=64`.
    #[error("batch width {width} outside 1..=64")]
    InvalidBatchWidth {
        /// Rejected width.
        width: usize,
    },
    /// CSA depth cap must be at most 4.
    #[error("csa depth cap {cap} exceeds 4")]
    InvalidCsaDepthCap {
        /// Rejected cap.
        cap: u8,
    },
    /// An operand byte image is not exactly 512 bytes.
    #[error("operand {operand} is {actual} bytes, expected {expected}")]
    OperandLength {
        /// Operand whose buffer is malformed.
        operand: Operand,
        /// Required byte length.
        expected: usize,
        /// Byte length supplied.
        actual: usize,
    },
    /// Snapshot payload does not fit the unit.
    #[error("snapshot layout mismatch: {0}")]
    SnapshotLayout(#[from] SnapshotLayoutError),
    /// Snapshot was produced by an unknown schema revision.
    #[error("unsupported snapshot version {version}")]
    UnsupportedSnapshotVersion {
        /// Wire version found.
        version: u16,
    },
    /// Host memory bus failed during a load or write-back cycle.
    #[error("bus transfer failed: {0}")]
    Bus(#[from] BusError),
}
