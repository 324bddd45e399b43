//! Human-readable renderings of operands and products.

use bigmul_unit::bit_length;

/// Renders `limbs` most-significant first under `label`.
///
/// Leading zero limbs are skipped; the top limb is unpadded and every lower
/// limb is printed as 16 hex digits on its own line.
#[must_use]
pub fn format_hex(label: &str, limbs: &[u64]) -> String {
    let top = limbs.iter().rposition(|limb| *limb != 0).unwrap_or(0);
    let head = limbs.get(top).copied().unwrap_or(0);
    let mut out = format!("{label}:\n0x{head:x}\n");
    for limb in limbs[..top].iter().rev() {
        out.push_str(&format!("{limb:016x}\n"));
    }
    out
}

/// Renders `limbs` in storage order, one `result[i] = 0x...` line each.
#[must_use]
pub fn raw_dump(limbs: &[u64]) -> String {
    limbs
        .iter()
        .enumerate()
        .map(|(index, limb)| format!("result[{index}] = 0x{limb:016x}\n"))
        .collect()
}

/// Significant bits in a little-endian limb string.
#[must_use]
pub fn count_bits(limbs: &[u64]) -> usize {
    bit_length(limbs)
}

#[cfg(test)]
mod tests {
    use super::{count_bits, format_hex, raw_dump};

    #[test]
    fn hex_skips_leading_zero_limbs() {
        assert_eq!(
            format_hex("Number A", &[0x2, 0xabc, 0, 0]),
            "Number A:\n0xabc\n0000000000000002\n"
        );
    }

    #[test]
    fn hex_of_zero_prints_single_digit() {
        assert_eq!(format_hex("Result", &[0, 0, 0]), "Result:\n0x0\n");
    }

    #[test]
    fn raw_dump_is_lsw_first() {
        assert_eq!(
            raw_dump(&[1, u64::MAX]),
            "result[0] = 0x0000000000000001\nresult[1] = 0xffffffffffffffff\n"
        );
    }

    #[test]
    fn bit_counts_match_top_limb() {
        assert_eq!(count_bits(&[0; 4]), 0);
        assert_eq!(count_bits(&[u64::MAX, 1]), 65);
    }
}
