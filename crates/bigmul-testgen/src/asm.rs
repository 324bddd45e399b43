//! Assembly program emission and parsing.
//!
//! The emitted file declares `A` and `B` as 64 `dword` lines each, reserves a
//! 1024-byte `RES` buffer, and runs `ldbm` followed by `bigmul` before
//! exiting through `ecall` 93.

use std::fmt;
use std::io::Write;

use bigmul_unit::{OperandLimbs, OPERAND_LIMBS, RESULT_BYTES};

use crate::error::TestgenError;
use crate::operands::OperandPair;

/// File name used when no output path is given.
pub const DEFAULT_ASM_FILE: &str = "bignum_data.s";

const PROGRAM: &[&str] = &[
    "la x3, A",
    "la x4, B",
    "la x5, RES",
    "ldbm x0, x3, x4",
    "bigmul x0, 0(x5)",
    "li a7, 93",
    "li a0, 0",
    "ecall",
];

/// Data section and driver program for one operand pair.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyListing<'a>(pub &'a OperandPair);

impl fmt::Display for AssemblyListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Auto-generated 4096-bit values for simulator")?;
        writeln!(f)?;
        writeln!(f, ".data")?;
        writeln!(f)?;
        write_operand(f, "A", &self.0.a)?;
        write_operand(f, "B", &self.0.b)?;
        writeln!(f, "RES:")?;
        writeln!(f, "    .zero {RESULT_BYTES}")?;
        writeln!(f)?;
        writeln!(f, ".text")?;
        writeln!(f, "main:")?;
        for line in PROGRAM {
            writeln!(f, "    {line}")?;
        }
        Ok(())
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, label: &str, limbs: &OperandLimbs) -> fmt::Result {
    writeln!(f, "{label}:")?;
    for limb in limbs {
        writeln!(f, "    dword 0x{limb:016x}")?;
    }
    Ok(())
}

/// Writes the data section and driver program for `pair`.
///
/// # Errors
///
/// Propagates failures from `out`.
pub fn write_assembly(out: &mut impl Write, pair: &OperandPair) -> Result<(), TestgenError> {
    write!(out, "{}", AssemblyListing(pair))?;
    Ok(())
}

/// Renders the assembly file into a string.
#[must_use]
pub fn render_assembly(pair: &OperandPair) -> String {
    AssemblyListing(pair).to_string()
}

/// Recovers the operand pair from a file produced by [`write_assembly`].
///
/// # Errors
///
/// Returns [`TestgenError::InvalidDword`] for a malformed literal and
/// [`TestgenError::LimbCount`] when `A` or `B` does not hold 64 limbs.
pub fn parse_assembly(source: &str) -> Result<OperandPair, TestgenError> {
    let mut a = Vec::with_capacity(OPERAND_LIMBS);
    let mut b = Vec::with_capacity(OPERAND_LIMBS);
    let mut current: Option<&mut Vec<u64>> = None;

    for (index, raw) in source.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        if let Some(label) = line.strip_suffix(':') {
            current = match label {
                "A" => Some(&mut a),
                "B" => Some(&mut b),
                _ => None,
            };
            continue;
        }
        let Some(literal) = line.strip_prefix("dword") else {
            current = None;
            continue;
        };
        if let Some(limbs) = current.as_deref_mut() {
            limbs.push(parse_dword(index + 1, literal.trim())?);
        }
    }

    Ok(OperandPair {
        a: into_operand("A", &a)?,
        b: into_operand("B", &b)?,
    })
}

fn parse_dword(line: usize, text: &str) -> Result<u64, TestgenError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).map_err(|_| TestgenError::InvalidDword {
        line,
        text: text.to_string(),
    })
}

fn into_operand(label: &'static str, limbs: &[u64]) -> Result<OperandLimbs, TestgenError> {
    limbs.try_into().map_err(|_| TestgenError::LimbCount {
        label,
        expected: OPERAND_LIMBS,
        actual: limbs.len(),
    })
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{parse_assembly, render_assembly, write_assembly};
    use crate::error::TestgenError;
    use crate::operands::{OperandGenerator, OperandPair};

    #[test]
    fn layout_matches_simulator_loader() {
        let pair = OperandPair {
            a: [0x1; 64],
            b: [0xdead_beef; 64],
        };
        let text = render_assembly(&pair);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "# Auto-generated 4096-bit values for simulator");
        assert_eq!(lines[2], ".data");
        assert_eq!(lines[4], "A:");
        assert_eq!(lines[5], "    dword 0x0000000000000001");
        assert_eq!(lines[69], "B:");
        assert_eq!(lines[70], "    dword 0x00000000deadbeef");
        assert_eq!(lines[134], "RES:");
        assert_eq!(lines[135], "    .zero 1024");
        assert_eq!(
            &lines[137..],
            &[
                ".text",
                "main:",
                "    la x3, A",
                "    la x4, B",
                "    la x5, RES",
                "    ldbm x0, x3, x4",
                "    bigmul x0, 0(x5)",
                "    li a7, 93",
                "    li a0, 0",
                "    ecall",
            ]
        );
    }

    struct FullDisk;

    impl io::Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_output_matches_rendered_text_and_reports_failures() {
        let pair = OperandGenerator::from_seed(4).pair();
        let mut buffer = Vec::new();
        write_assembly(&mut buffer, &pair).expect("vec sink accepts writes");
        assert_eq!(String::from_utf8(buffer).expect("ascii"), render_assembly(&pair));

        assert!(matches!(
            write_assembly(&mut FullDisk, &pair),
            Err(TestgenError::Write(error)) if error.kind() == io::ErrorKind::Other
        ));
    }

    #[test]
    fn parse_recovers_generated_operands() {
        let pair = OperandGenerator::from_seed(9).pair();
        assert_eq!(parse_assembly(&render_assembly(&pair)).expect("well-formed"), pair);
    }

    #[test]
    fn parse_rejects_bad_literals_and_short_operands() {
        let bad = "A:\n    dword 0xnothex\n";
        assert!(matches!(
            parse_assembly(bad),
            Err(TestgenError::InvalidDword { line: 2, .. })
        ));

        let short = "A:\n    dword 0x1\nB:\n    dword 0x2\n";
        assert!(matches!(
            parse_assembly(short),
            Err(TestgenError::LimbCount {
                label: "A",
                actual: 1,
                ..
            })
        ));
    }
}
