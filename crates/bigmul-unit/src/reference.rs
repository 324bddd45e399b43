//! Row-by-row schoolbook product used as the correctness oracle.

use crate::arith::{mul_wide, split_u128};
use crate::cache::{OperandLimbs, ResultLimbs, OPERAND_LIMBS, RESULT_LIMBS};

/// Computes `a * b` one row at a time with a full 128-bit carry chain.
///
/// Shares nothing with the pipeline beyond the limb multiply, so the two can
/// be checked against each other.
#[must_use]
pub fn schoolbook_product(a: &OperandLimbs, b: &OperandLimbs) -> ResultLimbs {
    let mut result = [0; RESULT_LIMBS];
    for (i, &a_limb) in a.iter().enumerate() {
        let mut carry = 0u64;
        for (j, &b_limb) in b.iter().enumerate() {
            let sum = mul_wide(a_limb, b_limb) + u128::from(result[i + j]) + u128::from(carry);
            let (lo, hi) = split_u128(sum);
            result[i + j] = lo;
            carry = hi;
        }
        result[i + OPERAND_LIMBS] = carry;
    }
    result
}

/// Bit length of a little-endian limb string (0 for zero).
#[must_use]
pub fn bit_length(limbs: &[u64]) -> usize {
    limbs
        .iter()
        .rposition(|limb| *limb != 0)
        .map_or(0, |top| top * 64 + (64 - limbs[top].leading_zeros() as usize))
}

#[cfg(test)]
mod tests {
    use super::{bit_length, schoolbook_product};
    use crate::cache::{OPERAND_LIMBS, RESULT_LIMBS};

    #[test]
    fn zero_times_anything_is_zero() {
        let product = schoolbook_product(&[0; OPERAND_LIMBS], &[u64::MAX; OPERAND_LIMBS]);
        assert!(product.iter().all(|limb| *limb == 0));
    }

    #[test]
    fn one_times_top_bit_keeps_limb_63() {
        let mut one = [0; OPERAND_LIMBS];
        one[0] = 1;
        let mut top = [0; OPERAND_LIMBS];
        top[63] = 1 << 63;

        let product = schoolbook_product(&one, &top);
        assert_eq!(product[63], 1 << 63);
        assert_eq!(product.iter().filter(|limb| **limb != 0).count(), 1);
    }

    #[test]
    fn all_ones_squared_matches_closed_form() {
        // (2^4096 - 1)^2 = 2^8192 - 2^4097 + 1
        let product = schoolbook_product(&[u64::MAX; OPERAND_LIMBS], &[u64::MAX; OPERAND_LIMBS]);
        assert_eq!(product[0], 1);
        assert!(product[1..OPERAND_LIMBS].iter().all(|limb| *limb == 0));
        assert_eq!(product[OPERAND_LIMBS], u64::MAX - 1);
        assert!(product[OPERAND_LIMBS + 1..RESULT_LIMBS]
            .iter()
            .all(|limb| *limb == u64::MAX));
    }

    #[test]
    fn bit_length_counts_from_top_set_limb() {
        assert_eq!(bit_length(&[0, 0]), 0);
        assert_eq!(bit_length(&[1]), 1);
        assert_eq!(bit_length(&[0, 1 << 63]), 128);
        assert_eq!(bit_length(&[u64::MAX; OPERAND_LIMBS]), 4096);
    }
}
