//! Command-line front end for the special-size Hadamard oracle.

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use special_hadamard::{
    Direction,
    SpecialSize,
    verify::{SelfTestConfig, Tolerance, self_test},
};

#[derive(Parser, Debug)]
#[command(name = "special-hadamard", version, about)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transform a vector read as a JSON array or whitespace-separated numbers
    Apply {
        /// Transform size (12, 20, 28 or 40)
        #[arg(short, long)]
        size: usize,
        /// Multiply by the transposed matrix instead
        #[arg(short, long)]
        transposed: bool,
        /// Working precision
        #[arg(short, long, value_enum, default_value_t = Precision::F32)]
        precision: Precision,
        /// Input file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },
    /// Print a sign table as rows of '+' and '-'
    Table {
        /// Transform size (12, 20, 28 or 40)
        #[arg(short, long)]
        size: usize,
    },
    /// Check the oracle's invariants on random vectors
    SelfTest {
        /// Random vectors per size
        #[arg(short, long, default_value_t = 256)]
        trials: usize,
        /// Seed for the vector generator
        #[arg(long, default_value_t = 0x5eed)]
        seed: u64,
        /// Relative tolerance
        #[arg(long, default_value_t = 1e-3)]
        rel: f64,
        /// Absolute tolerance
        #[arg(long, default_value_t = 1e-5)]
        abs: f64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Precision {
    F32,
    F64,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logger(cli.verbose)?;

    match cli.command {
        Command::Apply {
            size,
            transposed,
            precision,
            input,
        } => {
            let size = SpecialSize::try_from(size)?;
            let direction = if transposed {
                Direction::Transposed
            } else {
                Direction::Forward
            };
            let mut values = read_values(&input)?;
            if values.len() != size.len() {
                bail!(
                    "size {} needs {} values, got {}",
                    size,
                    size.len(),
                    values.len()
                );
            }
            match precision {
                Precision::F32 => size.transform::<f32, f64>(direction, &mut values)?,
                Precision::F64 => size.transform::<f64, f64>(direction, &mut values)?,
            }
            println!("{}", serde_json::to_string(&values)?);
        }
        Command::Table { size } => {
            println!("{}", SpecialSize::try_from(size)?.table());
        }
        Command::SelfTest {
            trials,
            seed,
            rel,
            abs,
        } => {
            let report = self_test(SelfTestConfig {
                trials,
                seed,
                tolerance: Tolerance { abs, rel },
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.passed() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logger(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message));
        })
        .level(level)
        .chain(io::stderr())
        .apply()
        .context("failed to install logger")
}

fn read_values(path: &Path) -> Result<Vec<f64>> {
    let mut reader: Box<dyn Read> = if path.as_os_str() == "-" {
        Box::new(io::stdin())
    } else {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Box::new(BufReader::new(file))
    };
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_values(&text)
}

fn parse_values(text: &str) -> Result<Vec<f64>> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("input is not a JSON array of numbers");
    }
    trimmed
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .with_context(|| format!("not a number: {token:?}"))
        })
        .collect()
}
