//! Compiler front-end and LLVM code generator for the Grace programming
//! language: a hashed multi-scope symbol table, a semantic analyzer over
//! a typed AST, and an SSA/LLVM IR code generator using closure
//! conversion by argument threading for nested functions.
//!
//! Lexing and parsing (`lexer`, `parser`) exist only so [`compile_source`]
//! is callable end-to-end from `.gr` source text; the engineering focus
//! of this crate is `symtab`, `semantic`, and `codegen`.

pub mod ast;
pub mod codegen;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod symtab;

use semantic::error::SemanticError;

#[derive(Debug)]
pub enum CompileError {
    Parse(parser::ParseError),
    Semantic(Vec<SemanticError>),
    Codegen(codegen::CodegenError),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Parse(e) => write!(f, "{e}"),
            CompileError::Semantic(errors) => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
            CompileError::Codegen(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Runs the full pipeline -- parse, check, generate -- over one Grace
/// source file and returns the textual LLVM IR for its module.
pub fn compile_source(source: &str, module_name: &str) -> Result<String, CompileError> {
    let program = parser::parse(source).map_err(CompileError::Parse)?;
    let typed = semantic::SemanticAnalyzer::analyze(&program).map_err(CompileError::Semantic)?;
    codegen::codegen_program(&typed, module_name).map_err(CompileError::Codegen)
}
