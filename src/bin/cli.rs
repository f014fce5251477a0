//! # Cli
//!
//! Command-line argument parsing for `gracec`: a `clap`-derived struct plus
//! a `LogLevel` enum wired into `simple_logger`.
//!
//! By default the compiler writes both a textual-IR (`.imm`) and an
//! assembly (`.asm`) file next to the source; `--stdout-ir` / `--stdout-asm`
//! redirect one of those to stdout instead of writing either file;
//! optimization is on unless `--no-optimize` is given.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Specify the log level of the compiler.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    #[default]
    #[value(alias("0"))]
    Error,
    #[value(alias("1"))]
    Warn,
    #[value(alias("2"))]
    Info,
    #[value(alias("3"))]
    Debug,
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// The path to the Grace source file.
    #[arg(index = 1)]
    pub file: PathBuf,

    /// Whether to dump the parsed (untyped) AST, for debugging.
    #[arg(long)]
    pub dump_parsed: bool,

    /// Whether to dump the semantically-annotated AST, for debugging.
    #[arg(long)]
    pub dump_typed: bool,

    /// Write textual LLVM IR to stdout instead of `<file>.imm`.
    #[arg(long)]
    pub stdout_ir: bool,

    /// Write target assembly to stdout instead of `<file>.asm`.
    #[arg(long)]
    pub stdout_asm: bool,

    /// Disable the fixed optimization pipeline (mem2reg, reassociate, GVN,
    /// CFG-simplify). Optimization runs by default.
    #[arg(short = 'O', long = "no-optimize", action = clap::ArgAction::SetFalse)]
    pub optimize: bool,

    /// Override the output file stem (`<output>.imm` / `<output>.asm`);
    /// defaults to the input file with its extension stripped.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
