//! Diagnostics raised by the semantic analyzer.
//!
//! One struct per diagnostic kind, each with its own `Display`, wrapped by
//! an outer enum carrying a `Span`.

use std::fmt::{self, Display};

use crate::ast::{PrimitiveType, Span};
use crate::symtab::SymbolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndeclaredIdentifier {
    pub name: String,
}

impl Display for UndeclaredIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identifier '{}' is not declared", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndeclaredFunction {
    pub name: String,
}

impl Display for UndeclaredFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function '{}' is not declared", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotAFunction {
    pub name: String,
}

impl Display for NotAFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a function", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotAVariable {
    pub name: String,
}

impl Display for NotAVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is a function, not a variable", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeclaration {
    pub name: String,
}

impl Display for Redeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is already declared in this scope", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArityMismatch {
    pub name: String,
    pub expected: usize,
    pub found: usize,
}

impl Display for ArityMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' expects {} argument(s), found {}",
            self.name, self.expected, self.found
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentTypeMismatch {
    pub name: String,
    pub position: usize,
    pub expected: PrimitiveType,
    pub found: PrimitiveType,
}

impl Display for ArgumentTypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' argument {} expects type {}, found {}",
            self.name,
            self.position + 1,
            self.expected,
            self.found
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentShapeMismatch {
    pub name: String,
    pub position: usize,
}

impl Display for ArgumentShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' argument {} has an incompatible array shape",
            self.name,
            self.position + 1
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceArgumentNotLvalue {
    pub name: String,
    pub position: usize,
}

impl Display for ReferenceArgumentNotLvalue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' argument {} is passed by reference and must be an l-value",
            self.name,
            self.position + 1
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotAnArray {
    pub found: PrimitiveType,
}

impl Display for NotAnArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "indexed expression is not an array (has type {})", self.found)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNotInt {
    pub found: PrimitiveType,
}

impl Display for IndexNotInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "array index must be of type int, found {}", self.found)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandTypeMismatch {
    pub op: &'static str,
    pub expected: PrimitiveType,
    pub left: PrimitiveType,
    pub right: PrimitiveType,
}

impl Display for OperandTypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "operator '{}' expects operands of type {}, found {} and {}",
            self.op, self.expected, self.left, self.right
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignTypeMismatch {
    pub expected: PrimitiveType,
    pub found: PrimitiveType,
}

impl Display for AssignTypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot assign value of type {} to target of type {}",
            self.found, self.expected
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignToWholeArray;

impl Display for AssignToWholeArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot assign to a whole array, only to an indexed element")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignToNonLvalue;

impl Display for AssignToNonLvalue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "assignment target is not an l-value")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionNotInt {
    pub found: PrimitiveType,
}

impl Display for ConditionNotInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "condition must be of type int, found {}", self.found)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnTypeMismatch {
    pub expected: PrimitiveType,
    pub found: Option<PrimitiveType>,
}

impl Display for ReturnTypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.found {
            Some(found) => write!(
                f,
                "returned value of type {} does not match declared return type {}",
                found, self.expected
            ),
            None => write!(
                f,
                "empty return in function declared to return {}",
                self.expected
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingReturn {
    pub name: String,
}

impl Display for MissingReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function '{}' may fall through without a return", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoidValueUsed;

impl Display for VoidValueUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a value of type nothing cannot be used in an expression")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArraySize {
    pub name: String,
}

impl Display for InvalidArraySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' has a non-positive array dimension", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionStillUndefined {
    pub name: String,
    pub declared_line: u32,
}

impl Display for FunctionStillUndefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "function '{}' (declared at line {}) is never defined",
            self.name, self.declared_line
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionMismatch {
    pub name: String,
}

impl Display for DefinitionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "definition of '{}' does not match its prior declaration",
            self.name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMainSignature;

impl Display for InvalidMainSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the outermost function must return nothing and take no parameters"
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticErrorKind {
    UndeclaredIdentifier(UndeclaredIdentifier),
    UndeclaredFunction(UndeclaredFunction),
    NotAFunction(NotAFunction),
    NotAVariable(NotAVariable),
    Redeclaration(Redeclaration),
    ArityMismatch(ArityMismatch),
    ArgumentTypeMismatch(ArgumentTypeMismatch),
    ArgumentShapeMismatch(ArgumentShapeMismatch),
    ReferenceArgumentNotLvalue(ReferenceArgumentNotLvalue),
    NotAnArray(NotAnArray),
    IndexNotInt(IndexNotInt),
    OperandTypeMismatch(OperandTypeMismatch),
    AssignTypeMismatch(AssignTypeMismatch),
    AssignToWholeArray(AssignToWholeArray),
    AssignToNonLvalue(AssignToNonLvalue),
    ConditionNotInt(ConditionNotInt),
    ReturnTypeMismatch(ReturnTypeMismatch),
    MissingReturn(MissingReturn),
    VoidValueUsed(VoidValueUsed),
    InvalidArraySize(InvalidArraySize),
    FunctionStillUndefined(FunctionStillUndefined),
    DefinitionMismatch(DefinitionMismatch),
    InvalidMainSignature(InvalidMainSignature),
}

impl Display for SemanticErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticErrorKind::UndeclaredIdentifier(e) => e.fmt(f),
            SemanticErrorKind::UndeclaredFunction(e) => e.fmt(f),
            SemanticErrorKind::NotAFunction(e) => e.fmt(f),
            SemanticErrorKind::NotAVariable(e) => e.fmt(f),
            SemanticErrorKind::Redeclaration(e) => e.fmt(f),
            SemanticErrorKind::ArityMismatch(e) => e.fmt(f),
            SemanticErrorKind::ArgumentTypeMismatch(e) => e.fmt(f),
            SemanticErrorKind::ArgumentShapeMismatch(e) => e.fmt(f),
            SemanticErrorKind::ReferenceArgumentNotLvalue(e) => e.fmt(f),
            SemanticErrorKind::NotAnArray(e) => e.fmt(f),
            SemanticErrorKind::IndexNotInt(e) => e.fmt(f),
            SemanticErrorKind::OperandTypeMismatch(e) => e.fmt(f),
            SemanticErrorKind::AssignTypeMismatch(e) => e.fmt(f),
            SemanticErrorKind::AssignToWholeArray(e) => e.fmt(f),
            SemanticErrorKind::AssignToNonLvalue(e) => e.fmt(f),
            SemanticErrorKind::ConditionNotInt(e) => e.fmt(f),
            SemanticErrorKind::ReturnTypeMismatch(e) => e.fmt(f),
            SemanticErrorKind::MissingReturn(e) => e.fmt(f),
            SemanticErrorKind::VoidValueUsed(e) => e.fmt(f),
            SemanticErrorKind::InvalidArraySize(e) => e.fmt(f),
            SemanticErrorKind::FunctionStillUndefined(e) => e.fmt(f),
            SemanticErrorKind::DefinitionMismatch(e) => e.fmt(f),
            SemanticErrorKind::InvalidMainSignature(e) => e.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub span: Span,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, span: Span) -> Self {
        SemanticError { kind, span }
    }
}

impl Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.span.line, self.kind)
    }
}

impl std::error::Error for SemanticError {}

impl From<SymbolError> for SemanticErrorKind {
    fn from(err: SymbolError) -> Self {
        match err {
            SymbolError::AlreadyDeclaredInScope { name } => {
                SemanticErrorKind::Redeclaration(Redeclaration { name })
            }
            SymbolError::NotDeclared { name } => {
                SemanticErrorKind::UndeclaredIdentifier(UndeclaredIdentifier { name })
            }
            SymbolError::NoOpenScope => {
                SemanticErrorKind::UndeclaredIdentifier(UndeclaredIdentifier {
                    name: "<no open scope>".into(),
                })
            }
            SymbolError::InvalidArraySize { name } => {
                SemanticErrorKind::InvalidArraySize(InvalidArraySize { name })
            }
            SymbolError::FunctionStillUndefined { name, line } => {
                SemanticErrorKind::FunctionStillUndefined(FunctionStillUndefined {
                    name,
                    declared_line: line,
                })
            }
            SymbolError::DefinitionMismatch { name } => {
                SemanticErrorKind::DefinitionMismatch(DefinitionMismatch { name })
            }
        }
    }
}
