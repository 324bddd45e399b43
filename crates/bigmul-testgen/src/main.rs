//! CLI entry point for the big-multiply test generator.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bigmul_testgen::{
    count_bits, format_hex, parse_assembly, raw_dump, verify_pair, write_assembly,
    OperandGenerator, OperandPair, TestgenError, DEFAULT_ASM_FILE,
};
use bigmul_unit::{schoolbook_product, LatencyProfile};
use rand as _;
use rand_chacha as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

const USAGE_TEXT: &str = "\
Usage: bigmul-testgen <command> [options]

Commands:
  generate [-o <file>] [--seed <u64>]              Emit operands, product and assembly
  verify   [--seed <u64>] [--profile <name>]       Check the simulated unit against
           [--input <file>]                        the schoolbook product

Options:
  -o, --output <file>  Assembly output path (default: bignum_data.s)
  -s, --seed <u64>     RNG seed (default: OS entropy)
  -p, --profile <name> single-cycle, streaming, staged, delay-queue, systolic
                       (default: all)
  -i, --input <file>   Verify operands read from a generated assembly file
  -h, --help           Show this help message

Examples:
  bigmul-testgen generate --seed 7
  bigmul-testgen verify --profile systolic
  bigmul-testgen verify --input bignum_data.s
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Generate(GenerateArgs),
    Verify(VerifyArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct GenerateArgs {
    output: PathBuf,
    seed: Option<u64>,
}

#[derive(Debug, PartialEq, Eq)]
struct VerifyArgs {
    seed: Option<u64>,
    profile: Option<LatencyProfile>,
    input: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "generate" => parse_generate_args(args)
            .map(Command::Generate)
            .map(ParseResult::Command),
        "verify" => parse_verify_args(args)
            .map(Command::Verify)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn option_value(
    args: &mut impl Iterator<Item = OsString>,
    flag: &OsString,
) -> Result<String, String> {
    args.next()
        .map(|value| value.to_string_lossy().to_string())
        .ok_or_else(|| format!("missing value for {}", flag.to_string_lossy()))
}

fn parse_seed(value: &str) -> Result<u64, String> {
    let parsed = value.strip_prefix("0x").map_or_else(
        || value.parse::<u64>(),
        |hex| u64::from_str_radix(hex, 16),
    );
    parsed.map_err(|_| format!("invalid seed: {value}"))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_generate_args(mut args: impl Iterator<Item = OsString>) -> Result<GenerateArgs, String> {
    let mut output: Option<PathBuf> = None;
    let mut seed = None;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "-o" || arg == "--output" {
            output = Some(PathBuf::from(option_value(&mut args, &arg)?));
            continue;
        }

        if arg == "-s" || arg == "--seed" {
            seed = Some(parse_seed(&option_value(&mut args, &arg)?)?);
            continue;
        }

        return Err(format!("unknown option: {}", arg.to_string_lossy()));
    }

    Ok(GenerateArgs {
        output: output.unwrap_or_else(|| PathBuf::from(DEFAULT_ASM_FILE)),
        seed,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_verify_args(mut args: impl Iterator<Item = OsString>) -> Result<VerifyArgs, String> {
    let mut parsed = VerifyArgs {
        seed: None,
        profile: None,
        input: None,
    };

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "-s" || arg == "--seed" {
            parsed.seed = Some(parse_seed(&option_value(&mut args, &arg)?)?);
            continue;
        }

        if arg == "-p" || arg == "--profile" {
            let name = option_value(&mut args, &arg)?;
            let profile = LatencyProfile::from_name(&name)
                .ok_or_else(|| format!("unknown profile: {name}"))?;
            parsed.profile = Some(profile);
            continue;
        }

        if arg == "-i" || arg == "--input" {
            parsed.input = Some(PathBuf::from(option_value(&mut args, &arg)?));
            continue;
        }

        return Err(format!("unknown option: {}", arg.to_string_lossy()));
    }

    if parsed.seed.is_some() && parsed.input.is_some() {
        return Err("--seed and --input are mutually exclusive".to_string());
    }
    Ok(parsed)
}

fn generator(seed: Option<u64>) -> OperandGenerator {
    seed.map_or_else(OperandGenerator::from_entropy, OperandGenerator::from_seed)
}

fn write_assembly_file(path: &Path, pair: &OperandPair) -> Result<(), TestgenError> {
    let io_error = |source| TestgenError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::create(path).map_err(io_error)?;
    let mut out = BufWriter::new(file);
    write_assembly(&mut out, pair)?;
    out.flush().map_err(io_error)
}

fn run_generate(args: &GenerateArgs) -> Result<(), i32> {
    let mut generator = generator(args.seed);
    let pair = generator.pair();

    println!("=== 4096-bit Number Multiplication Tester ===");
    println!("seed: {}", generator.seed());
    println!();
    println!("{}", format_hex("Number A", &pair.a));
    println!("{}", format_hex("Number B", &pair.b));

    println!("Computing A * B...");
    println!();
    let product = schoolbook_product(&pair.a, &pair.b);

    println!("Raw result in limb order (LSW -> MSW):");
    println!("{}", raw_dump(&product));
    println!("{}", format_hex("Result", &product));

    println!("Writing numbers to {}...", args.output.display());
    if let Err(error) = write_assembly_file(&args.output, &pair) {
        eprintln!("error: {error}");
        return Err(1);
    }
    println!("Done!");

    println!();
    println!("Actual bit usage:");
    println!("A: {} bits", count_bits(&pair.a));
    println!("B: {} bits", count_bits(&pair.b));
    println!("Result: {} bits", count_bits(&product));
    Ok(())
}

fn load_pair(args: &VerifyArgs) -> Result<(OperandPair, String), TestgenError> {
    if let Some(path) = &args.input {
        let source = fs::read_to_string(path).map_err(|source| TestgenError::Io {
            path: path.clone(),
            source,
        })?;
        let pair = parse_assembly(&source)?;
        return Ok((pair, path.display().to_string()));
    }
    let mut generator = generator(args.seed);
    let pair = generator.pair();
    Ok((pair, format!("seed {}", generator.seed())))
}

fn run_verify(args: &VerifyArgs) -> Result<(), i32> {
    let (pair, origin) = load_pair(args).map_err(|error| {
        eprintln!("error: {error}");
        1
    })?;

    let profiles = args
        .profile
        .map_or_else(|| LatencyProfile::ALL.to_vec(), |profile| vec![profile]);

    let mut failed = false;
    for profile in profiles {
        match verify_pair(&pair, profile) {
            Ok(verified) => println!(
                "ok   {:<13} {origin}: {} cycles ({} load, {} write-back)",
                profile.name(),
                verified.stats.cycles,
                verified.load_cycles,
                verified.write_cycles
            ),
            Err(error) => {
                println!("FAIL {:<13} {origin}: {error}", profile.name());
                failed = true;
            }
        }
    }

    if failed {
        Err(1)
    } else {
        Ok(())
    }
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Generate(args))) => match run_generate(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Ok(ParseResult::Command(Command::Verify(args))) => match run_verify(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
