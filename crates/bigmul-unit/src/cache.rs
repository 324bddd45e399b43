//! Operand and result limb storage owned by the multiply unit.

use crate::error::{Operand, UnitError};

/// Limbs per operand (4096 bits).
pub const OPERAND_LIMBS: usize = 64;

/// Limbs in the product (8192 bits).
pub const RESULT_LIMBS: usize = OPERAND_LIMBS * 2;

/// Bytes per limb in simulated memory.
pub const LIMB_BYTES: usize = 8;

/// Bytes per operand in simulated memory (512).
pub const OPERAND_BYTES: usize = OPERAND_LIMBS * LIMB_BYTES;

/// Bytes in the product buffer in simulated memory (1024).
pub const RESULT_BYTES: usize = RESULT_LIMBS * LIMB_BYTES;

/// A 4096-bit operand, least-significant limb first.
pub type OperandLimbs = [u64; OPERAND_LIMBS];

/// An 8192-bit product, least-significant limb first.
pub type ResultLimbs = [u64; RESULT_LIMBS];

/// Input caches for the two multiplicands.
///
/// Filled in full before a run starts and left untouched until the next load
/// or reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandCache {
    a: OperandLimbs,
    b: OperandLimbs,
}

impl Default for OperandCache {
    fn default() -> Self {
        Self {
            a: [0; OPERAND_LIMBS],
            b: [0; OPERAND_LIMBS],
        }
    }
}

impl OperandCache {
    /// Operand A.
    #[must_use]
    pub const fn a(&self) -> &OperandLimbs {
        &self.a
    }

    /// Operand B.
    #[must_use]
    pub const fn b(&self) -> &OperandLimbs {
        &self.b
    }

    /// Fetches the limb pair `(A[i], B[j])`.
    ///
    /// Indices come from the diagonal cursor and are always in `0..64`.
    #[must_use]
    pub const fn pair(&self, i: u8, j: u8) -> (u64, u64) {
        (self.a[i as usize], self.b[j as usize])
    }

    /// Replaces both operands.
    #[allow(clippy::missing_const_for_fn)]
    pub fn load(&mut self, a: &OperandLimbs, b: &OperandLimbs) {
        self.a = *a;
        self.b = *b;
    }

    /// Writes one limb of each operand, as a multi-cycle load does.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_limb(&mut self, index: usize, a: u64, b: u64) {
        self.a[index] = a;
        self.b[index] = b;
    }

    /// Replaces both operands from little-endian byte images.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::OperandLength`] when either buffer is not exactly
    /// [`OPERAND_BYTES`] long; the cache is left unchanged in that case.
    pub fn load_bytes(&mut self, a: &[u8], b: &[u8]) -> Result<(), UnitError> {
        let a = limbs_from_le_bytes(Operand::A, a)?;
        let b = limbs_from_le_bytes(Operand::B, b)?;
        self.load(&a, &b);
        Ok(())
    }

    /// Zeroes both operands.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn limbs_from_le_bytes(operand: Operand, bytes: &[u8]) -> Result<OperandLimbs, UnitError> {
    if bytes.len() != OPERAND_BYTES {
        return Err(UnitError::OperandLength {
            operand,
            expected: OPERAND_BYTES,
            actual: bytes.len(),
        });
    }

    let mut limbs = [0; OPERAND_LIMBS];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(LIMB_BYTES)) {
        let mut word = [0; LIMB_BYTES];
        word.copy_from_slice(chunk);
        *limb = u64::from_le_bytes(word);
    }
    Ok(limbs)
}

/// Output cache for the 128-limb product.
///
/// Written one limb per closed diagonal in increasing order; only meaningful
/// once the unit reports the multiply phase done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCache {
    limbs: ResultLimbs,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self {
            limbs: [0; RESULT_LIMBS],
        }
    }
}

impl ResultCache {
    /// All result limbs.
    #[must_use]
    pub const fn limbs(&self) -> &ResultLimbs {
        &self.limbs
    }

    /// Reads one limb.
    #[must_use]
    pub const fn limb(&self, index: usize) -> u64 {
        self.limbs[index]
    }

    /// Stores the finished limb for a diagonal.
    #[allow(clippy::missing_const_for_fn)]
    pub fn store(&mut self, index: usize, value: u64) {
        self.limbs[index] = value;
    }

    /// Replaces the whole buffer.
    #[allow(clippy::missing_const_for_fn)]
    pub fn overwrite(&mut self, limbs: &ResultLimbs) {
        self.limbs = *limbs;
    }

    /// Little-endian byte image as written back to simulated memory.
    #[must_use]
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.limbs.iter().flat_map(|limb| limb.to_le_bytes()).collect()
    }

    /// Zeroes every limb.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
