//! Anti-diagonal enumeration of the 64x64 limb cross product.
//!
//! Diagonal `s` owns every pair `(i, j)` with `i + j = s`. Diagonals
//! `0..=126` carry products; diagonal 127 is empty and only flushes the
//! residual carry into the top result limb.

use crate::cache::{OPERAND_LIMBS, RESULT_LIMBS};

/// Number of diagonals, one per result limb.
pub const DIAGONAL_COUNT: usize = RESULT_LIMBS;

/// Index of the final (carry-only) diagonal.
#[allow(clippy::cast_possible_truncation)]
pub const LAST_DIAGONAL: u8 = (DIAGONAL_COUNT - 1) as u8;

/// Widest batch a single GEN cycle can emit (a full diagonal).
pub const MAX_BATCH_WIDTH: usize = OPERAND_LIMBS;

/// Batch width of the default multiplier array.
pub const DEFAULT_BATCH_WIDTH: usize = 25;

#[allow(clippy::cast_possible_truncation)]
const TOP_INDEX: u8 = (OPERAND_LIMBS - 1) as u8;

/// One limb pair `(A[i], B[j])` scheduled for multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IndexPair {
    /// Index into operand A.
    pub i: u8,
    /// Index into operand B.
    pub j: u8,
}

/// Fixed-capacity group of index pairs issued in one GEN cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    pairs: [IndexPair; MAX_BATCH_WIDTH],
    len: u8,
    diagonal: u8,
    closes_diagonal: bool,
}

impl Batch {
    /// Valid pairs, in ascending `i` order.
    #[must_use]
    pub fn pairs(&self) -> &[IndexPair] {
        &self.pairs[..usize::from(self.len)]
    }

    /// Number of valid pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` when the batch holds no pairs.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Diagonal the batch belongs to.
    #[must_use]
    pub const fn diagonal(&self) -> u8 {
        self.diagonal
    }

    /// Returns `true` when this batch carries the last pairs of its diagonal.
    #[must_use]
    pub const fn closes_diagonal(&self) -> bool {
        self.closes_diagonal
    }
}

/// Progress marker `(s, i_min, i_max, k)` through the diagonals.
///
/// Invariant: `i_min <= k <= i_max + 1`. `k == i_max + 1` means every pair of
/// diagonal `s` has been issued, though some may still be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagonalCursor {
    s: u8,
    i_min: u8,
    i_max: u8,
    k: u8,
}

impl Default for DiagonalCursor {
    fn default() -> Self {
        Self::at(0)
    }
}

impl DiagonalCursor {
    /// Positions the cursor at the start of diagonal `s`.
    ///
    /// `s` must be at most [`LAST_DIAGONAL`].
    #[must_use]
    pub const fn at(s: u8) -> Self {
        debug_assert!(s <= LAST_DIAGONAL);
        let i_min = s.saturating_sub(TOP_INDEX);
        let i_max = if s < TOP_INDEX { s } else { TOP_INDEX };
        Self {
            s,
            i_min,
            i_max,
            k: i_min,
        }
    }

    /// Current diagonal index.
    #[must_use]
    pub const fn diagonal(&self) -> u8 {
        self.s
    }

    /// Smallest valid `i` on this diagonal.
    #[must_use]
    pub const fn i_min(&self) -> u8 {
        self.i_min
    }

    /// Largest valid `i` on this diagonal.
    #[must_use]
    pub const fn i_max(&self) -> u8 {
        self.i_max
    }

    /// Next `i` to issue.
    #[must_use]
    pub const fn next_i(&self) -> u8 {
        self.k
    }

    /// Total pairs owned by the current diagonal.
    #[must_use]
    pub const fn pairs_in_diagonal(&self) -> usize {
        (self.i_max as usize + 1) - self.i_min as usize
    }

    /// Pairs of the current diagonal not yet issued.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        (self.i_max as usize + 1) - self.k as usize
    }

    /// Returns `true` once every pair of the current diagonal was issued.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.k > self.i_max
    }

    /// Returns `true` on the final diagonal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.s == LAST_DIAGONAL
    }

    /// Issues up to `width` of the pairs still owed for this diagonal.
    ///
    /// Returns `None` once the diagonal is exhausted. `width` must be in
    /// `1..=MAX_BATCH_WIDTH`.
    pub fn next_batch(&mut self, width: usize) -> Option<Batch> {
        debug_assert!((1..=MAX_BATCH_WIDTH).contains(&width));
        if self.is_exhausted() {
            return None;
        }

        let take = self.remaining().min(width);
        let mut pairs = [IndexPair::default(); MAX_BATCH_WIDTH];
        for (slot, i) in pairs.iter_mut().zip(self.k..).take(take) {
            *slot = IndexPair { i, j: self.s - i };
        }
        let len = u8::try_from(take).unwrap_or(u8::MAX);
        self.k += len;

        Some(Batch {
            pairs,
            len,
            diagonal: self.s,
            closes_diagonal: self.is_exhausted(),
        })
    }

    /// Moves to the next diagonal. Returns `false` on the terminal diagonal.
    pub fn advance_diagonal(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = Self::at(self.s + 1);
        true
    }
}
