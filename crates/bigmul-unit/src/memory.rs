//! Host memory bus contract used by the load and write-back phases.

use crate::cache::LIMB_BYTES;
use crate::error::BusError;

/// Deterministic limb-wide bus into the host simulator's memory.
pub trait LimbBus {
    /// Reads a little-endian 64-bit limb at byte address `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ReadFailed`] when the host cannot complete the
    /// read.
    fn read_u64(&mut self, addr: u64) -> Result<u64, BusError>;

    /// Writes a little-endian 64-bit limb at byte address `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::WriteFailed`] when the host cannot complete the
    /// write.
    fn write_u64(&mut self, addr: u64, value: u64) -> Result<(), BusError>;
}

/// Flat byte-addressed memory image starting at address 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMemory {
    bytes: Box<[u8]>,
}

impl FlatMemory {
    /// Allocates `size` zeroed bytes.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size].into_boxed_slice(),
        }
    }

    /// Backing bytes.
    #[must_use]
    pub const fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copies limbs into memory starting at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::WriteFailed`] at the first limb that does not fit.
    pub fn write_limbs(&mut self, addr: u64, limbs: &[u64]) -> Result<(), BusError> {
        let mut cursor = addr;
        for limb in limbs {
            self.write_u64(cursor, *limb)?;
            cursor = cursor.wrapping_add(LIMB_BYTES as u64);
        }
        Ok(())
    }

    /// Reads `count` limbs starting at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ReadFailed`] at the first limb out of range.
    pub fn read_limbs(&mut self, addr: u64, count: usize) -> Result<Vec<u64>, BusError> {
        let mut limbs = Vec::with_capacity(count);
        let mut cursor = addr;
        for _ in 0..count {
            limbs.push(self.read_u64(cursor)?);
            cursor = cursor.wrapping_add(LIMB_BYTES as u64);
        }
        Ok(limbs)
    }

    fn span(&self, addr: u64) -> Option<std::ops::Range<usize>> {
        let start = usize::try_from(addr).ok()?;
        let end = start.checked_add(LIMB_BYTES)?;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

impl LimbBus for FlatMemory {
    fn read_u64(&mut self, addr: u64) -> Result<u64, BusError> {
        let span = self.span(addr).ok_or(BusError::ReadFailed { addr })?;
        let mut word = [0; LIMB_BYTES];
        word.copy_from_slice(&self.bytes[span]);
        Ok(u64::from_le_bytes(word))
    }

    fn write_u64(&mut self, addr: u64, value: u64) -> Result<(), BusError> {
        let span = self.span(addr).ok_or(BusError::WriteFailed { addr })?;
        self.bytes[span].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}
