//! Fixed-width multi-precision primitives used by the multiply pipeline.
//!
//! Everything that has to be overflow-aware lives here: the 64x64 -> 128-bit
//! limb product, 128/192-bit carry-propagating addition, and the 192-bit
//! running accumulator that carries between diagonals.

/// Multiplies two limbs into their full 128-bit product.
#[must_use]
pub const fn mul_wide(a: u64, b: u64) -> u128 {
    (a as u128) * (b as u128)
}

/// Splits a 128-bit value into `(low, high)` limbs.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn split_u128(value: u128) -> (u64, u64) {
    (value as u64, (value >> 64) as u64)
}

/// Adds two limbs plus an incoming carry, returning `(sum, carry_out)`.
#[must_use]
pub const fn add_with_carry(a: u64, b: u64, carry: bool) -> (u64, bool) {
    let (sum, c1) = a.overflowing_add(b);
    let (sum, c2) = sum.overflowing_add(carry as u64);
    (sum, c1 || c2)
}

/// Unsigned 192-bit value stored as three limbs, least significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wide192 {
    lo: u64,
    mid: u64,
    hi: u64,
}

impl Wide192 {
    /// The value zero.
    pub const ZERO: Self = Self {
        lo: 0,
        mid: 0,
        hi: 0,
    };

    /// Builds a value from its three limbs, least significant first.
    #[must_use]
    pub const fn from_limbs(lo: u64, mid: u64, hi: u64) -> Self {
        Self { lo, mid, hi }
    }

    /// Widens a 128-bit value.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        let (lo, mid) = split_u128(value);
        Self { lo, mid, hi: 0 }
    }

    /// Returns the limbs as `[lo, mid, hi]`.
    #[must_use]
    pub const fn limbs(self) -> [u64; 3] {
        [self.lo, self.mid, self.hi]
    }

    /// Low 64 bits.
    #[must_use]
    pub const fn low(self) -> u64 {
        self.lo
    }

    /// Returns `true` when all three limbs are zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.lo == 0 && self.mid == 0 && self.hi == 0
    }

    /// Adds a 128-bit value, propagating the carry into the top limb.
    #[must_use]
    pub fn add_u128(self, value: u128) -> Self {
        self.add(Self::from_u128(value))
    }

    /// 192-bit addition.
    ///
    /// Callers keep every sum below 2^192; a carry out of the top limb is a
    /// pipeline bookkeeping bug and trips a debug assertion.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: Self) -> Self {
        let (lo, carry) = add_with_carry(self.lo, other.lo, false);
        let (mid, carry) = add_with_carry(self.mid, other.mid, carry);
        let (hi, overflow) = add_with_carry(self.hi, other.hi, carry);
        debug_assert!(!overflow, "192-bit sum overflowed");
        Self { lo, mid, hi }
    }

    /// Shifts right by one limb and returns the limb shifted out.
    #[allow(clippy::missing_const_for_fn)]
    pub fn shift_right_64(&mut self) -> u64 {
        let emitted = self.lo;
        self.lo = self.mid;
        self.mid = self.hi;
        self.hi = 0;
        emitted
    }
}

/// Running 192-bit carry register for the diagonal being finished.
///
/// Holds the sum of every retired partial product of the current diagonal
/// plus the carry handed over from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accumulator {
    value: Wide192,
}

impl Accumulator {
    /// Creates a zeroed accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: Wide192::ZERO,
        }
    }

    /// Folds a 192-bit partial sum into the accumulator.
    pub fn add_192(&mut self, partial: Wide192) {
        self.value = self.value.add(partial);
    }

    /// Reads the low 64 bits without shifting.
    #[must_use]
    pub const fn low(&self) -> u64 {
        self.value.low()
    }

    /// Emits the low limb as a finished result limb and carries the rest
    /// down into the next diagonal.
    pub fn emit_limb(&mut self) -> u64 {
        self.value.shift_right_64()
    }

    /// Current contents.
    #[must_use]
    pub const fn value(&self) -> Wide192 {
        self.value
    }

    /// Returns `true` when no carry is pending.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Clears the register.
    #[allow(clippy::missing_const_for_fn)]
    pub fn clear(&mut self) {
        self.value = Wide192::ZERO;
    }
}
