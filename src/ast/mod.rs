//! Untyped AST produced by [`crate::parser`].
//!
//! A staged AST: nodes here carry no semantic decoration (type, shape,
//! l-value/r-value) at all. The semantic analyzer (`crate::semantic`)
//! consumes these and produces the annotated nodes in
//! `crate::semantic::typed`.
//!
//! How this AST comes into being (lexing, parsing) is immaterial to the
//! rest of the crate; the types below are the *interface* the rest of the
//! crate is built against, not a point of engineering effort.

mod types;

pub use types::{ArrayShape, PassingMode, PrimitiveType};

/// Source position. Grace diagnostics are line-granular, so we only carry
/// a line number, not column/byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub line: u32,
}

impl Span {
    pub fn new(line: u32) -> Self {
        Span { line }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// `true` for the comparison/logical operators that produce a boolean
    /// (1-bit) result used only in conditions.
    pub fn is_boolean_producing(self) -> bool {
        matches!(
            self,
            BinOp::Eq
                | BinOp::NotEq
                | BinOp::Lt
                | BinOp::Gt
                | BinOp::Le
                | BinOp::Ge
                | BinOp::And
                | BinOp::Or
        )
    }

    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    IntLiteral {
        value: i32,
        span: Span,
    },
    CharLiteral {
        value: u8,
        span: Span,
    },
    StringLiteral {
        /// Decoded bytes, without the terminating NUL (the NUL is an
        /// implementation detail of codegen's shape, `len + 1`).
        value: Vec<u8>,
        span: Span,
    },
    Id {
        name: String,
        span: Span,
    },
    ArrayAccess {
        base: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    UnaryMinus {
        operand: Box<Expr>,
        span: Span,
    },
    Not {
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntLiteral { span, .. }
            | Expr::CharLiteral { span, .. }
            | Expr::StringLiteral { span, .. }
            | Expr::Id { span, .. }
            | Expr::ArrayAccess { span, .. }
            | Expr::Call { span, .. }
            | Expr::UnaryMinus { span, .. }
            | Expr::Not { span, .. }
            | Expr::Binary { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    Assign {
        target: Expr,
        value: Expr,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    /// A function call used for its side effects; the result is discarded.
    ExprStmt(Expr),
    Empty,
}

/// A single formal parameter of a function header.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub element_type: PrimitiveType,
    pub shape: ArrayShape,
    pub passing: PassingMode,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionHeader {
    pub name: String,
    pub return_type: PrimitiveType,
    pub params: Vec<Param>,
    pub span: Span,
}

/// A member of a function's local-definition list: a variable, a forward
/// function declaration, or a fully nested function definition.
#[derive(Debug, Clone)]
pub enum LocalDef {
    Variable {
        name: String,
        element_type: PrimitiveType,
        shape: ArrayShape,
        span: Span,
    },
    FunctionDeclaration(FunctionHeader),
    FunctionDefinition(FunctionDef),
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub header: FunctionHeader,
    pub locals: Vec<LocalDef>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A Grace compilation unit: one outermost function definition.
#[derive(Debug, Clone)]
pub struct Program {
    pub main: FunctionDef,
}
