//! # gracec
//!
//! This binary is the compiler of Grace. It combines parsing, semantic
//! analysis, and LLVM code generation into a single application, wiring
//! `lex → parse → check → codegen → optimize → emit`.

mod cli;

use cli::*;

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use log::{error, info};

fn main() {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    if let Err(err) = run(args) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Cli) -> anyhow::Result<()> {
    let BuildArgs {
        file,
        dump_parsed,
        dump_typed,
        output: output_override,
        stdout_ir,
        stdout_asm,
        optimize,
    } = args.build;

    let source = fs::read_to_string(&file)
        .map_err(|e| anyhow::anyhow!("could not read '{}': {e}", file.display()))?;

    info!("compiling {}", file.display());

    let program = gracec::parser::parse(&source)
        .map_err(|e| anyhow::anyhow!("{}", format!("parse error: {e}").red()))?;

    if dump_parsed {
        info!("parsed AST:\n{program:#?}");
    }

    let typed = gracec::semantic::SemanticAnalyzer::analyze(&program).map_err(|errors| {
        let rendered = errors
            .iter()
            .map(|e| format!("{}", e.to_string().red()))
            .collect::<Vec<_>>()
            .join("\n");
        anyhow::anyhow!("{rendered}")
    })?;

    if dump_typed {
        info!("typed AST:\n{typed:#?}");
    }

    let module_name = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "grace_module".to_string());

    let emitted = gracec::codegen::emit(&typed, &module_name, optimize)
        .map_err(|e| anyhow::anyhow!("{}", format!("codegen error: {e}").red()))?;

    let stem = output_stem(output_override, &file);
    emit_ir(&emitted.ir, stdout_ir, &stem)?;
    emit_asm(&emitted.asm, stdout_asm, &stem)?;

    Ok(())
}

fn output_stem(override_path: Option<PathBuf>, source: &PathBuf) -> PathBuf {
    override_path.unwrap_or_else(|| source.with_extension(""))
}

fn emit_ir(ir: &str, to_stdout: bool, stem: &PathBuf) -> anyhow::Result<()> {
    if to_stdout {
        println!("{ir}");
        return Ok(());
    }
    let path = stem.with_extension("imm");
    fs::write(&path, ir)
        .map_err(|e| anyhow::anyhow!("could not write '{}': {e}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

fn emit_asm(asm: &str, to_stdout: bool, stem: &PathBuf) -> anyhow::Result<()> {
    if to_stdout {
        println!("{asm}");
        return Ok(());
    }
    let path = stem.with_extension("asm");
    fs::write(&path, asm)
        .map_err(|e| anyhow::anyhow!("could not write '{}': {e}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}
