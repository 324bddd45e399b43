use crate::cache::{LIMB_BYTES, OPERAND_LIMBS, RESULT_LIMBS};
use crate::error::SnapshotLayoutError;

/// Completion flags observed by the host simulator.
///
/// All three read `true` on an idle unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct UnitFlags {
    /// Multiply phase finished; result cache holds the product.
    pub multiply_done: bool,
    /// Operand load phase finished.
    pub load_done: bool,
    /// Result write-back finished.
    pub write_done: bool,
}

impl Default for UnitFlags {
    fn default() -> Self {
        Self::IDLE
    }
}

impl UnitFlags {
    /// Flags of an idle unit.
    pub const IDLE: Self = Self {
        multiply_done: true,
        load_done: true,
        write_done: true,
    };

    /// Returns `true` when no phase is pending.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        self.multiply_done && self.load_done && self.write_done
    }
}

/// Addresses and offsets used by the multi-cycle load and write-back phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TransferBookkeeping {
    /// Byte address of operand A in simulated memory.
    pub base_addr_a: u64,
    /// Byte address of operand B in simulated memory.
    pub base_addr_b: u64,
    /// Byte address of the 1024-byte result buffer.
    pub base_addr_res: u64,
    /// Next operand limb to load, `0..=64`.
    pub load_offset: usize,
    /// Next result limb to write back, `0..=128`.
    pub write_offset: usize,
}

impl TransferBookkeeping {
    /// Address of operand A limb `index`.
    #[must_use]
    pub const fn a_limb_addr(&self, index: usize) -> u64 {
        self.base_addr_a.wrapping_add((index * LIMB_BYTES) as u64)
    }

    /// Address of operand B limb `index`.
    #[must_use]
    pub const fn b_limb_addr(&self, index: usize) -> u64 {
        self.base_addr_b.wrapping_add((index * LIMB_BYTES) as u64)
    }

    /// Address of result limb `index`.
    #[must_use]
    pub const fn result_limb_addr(&self, index: usize) -> u64 {
        self.base_addr_res.wrapping_add((index * LIMB_BYTES) as u64)
    }

    /// Checks that both offsets lie within their buffers and agree with
    /// `flags`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotLayoutError::TransferOffset`] for an offset past the
    /// end of its buffer and [`SnapshotLayoutError::UnfinishedTransfer`] when
    /// a pending phase has no limb left to move.
    pub const fn validate(&self, flags: UnitFlags) -> Result<(), SnapshotLayoutError> {
        if self.load_offset > OPERAND_LIMBS {
            return Err(SnapshotLayoutError::TransferOffset {
                offset: self.load_offset,
                limit: OPERAND_LIMBS,
            });
        }
        if self.write_offset > RESULT_LIMBS {
            return Err(SnapshotLayoutError::TransferOffset {
                offset: self.write_offset,
                limit: RESULT_LIMBS,
            });
        }
        if !flags.load_done && self.load_offset == OPERAND_LIMBS {
            return Err(SnapshotLayoutError::UnfinishedTransfer {
                offset: self.load_offset,
                limit: OPERAND_LIMBS,
            });
        }
        if flags.multiply_done && !flags.write_done && self.write_offset == RESULT_LIMBS {
            return Err(SnapshotLayoutError::UnfinishedTransfer {
                offset: self.write_offset,
                limit: RESULT_LIMBS,
            });
        }
        Ok(())
    }
}
