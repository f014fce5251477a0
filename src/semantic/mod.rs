//! Semantic analysis: type checking and capture computation over the raw
//! AST, producing the annotated tree in [`typed`].
//!
//! The shape of this module -- a checker struct wrapping a
//! [`crate::symtab::SymbolTable`], one method per node kind, errors
//! collected rather than aborting on the first -- adapts to Grace's
//! single-pass (no inference) setting: a "shallow" pass pre-registers a
//! function body's own local headers so forward and mutually recursive
//! calls resolve, mirroring the declare-then-define split codegen uses
//! one level later (declare every sibling's LLVM header, then lower every
//! body).

pub mod error;
pub mod typed;

use std::collections::HashSet;

use crate::ast::{self, ArrayShape, BinOp, PassingMode, PrimitiveType, Span};
use crate::symtab::{EntryKind, ParamSig, SymbolTable};

use error::*;
use typed::*;

/// Per-function bookkeeping used only while that function's body is being
/// checked: which scope number is "local" to it, and the set of
/// enclosing-scope names its body (directly, or transitively through
/// nested functions it defines) must receive as threaded reference
/// parameters.
struct FunctionCtx {
    scope_number: u32,
    own_names: HashSet<String>,
    captures: Vec<String>,
    capture_set: HashSet<String>,
}

impl FunctionCtx {
    fn record_capture(&mut self, name: &str) {
        if self.capture_set.insert(name.to_string()) {
            self.captures.push(name.to_string());
        }
    }
}

pub struct SemanticAnalyzer {
    symbols: SymbolTable,
    errors: Vec<SemanticError>,
    stack: Vec<FunctionCtx>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        SemanticAnalyzer {
            symbols: SymbolTable::new(),
            errors: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn analyze(program: &ast::Program) -> Result<TypedProgram, Vec<SemanticError>> {
        let mut analyzer = SemanticAnalyzer::new();
        let main = analyzer.check_function_def(&program.main, true);
        if analyzer.errors.is_empty() {
            Ok(TypedProgram { main })
        } else {
            Err(analyzer.errors)
        }
    }

    fn push_error(&mut self, kind: SemanticErrorKind, span: Span) {
        self.errors.push(SemanticError::new(kind, span));
    }

    fn param_sigs(params: &[ast::Param]) -> Vec<ParamSig> {
        params
            .iter()
            .map(|p| ParamSig {
                element_type: p.element_type,
                shape: p.shape.clone(),
                passing: p.passing,
            })
            .collect()
    }

    /// Register every local header in `locals` before checking any body,
    /// so forward declarations and mutual recursion between sibling
    /// nested functions resolve regardless of textual order.
    fn shallow_register_locals(&mut self, locals: &[ast::LocalDef]) {
        for local in locals {
            match local {
                ast::LocalDef::Variable {
                    name,
                    element_type,
                    shape,
                    span,
                } => {
                    if let Err(e) =
                        self.symbols
                            .insert_variable(name, span.line, *element_type, shape.clone())
                    {
                        self.push_error(e.into(), *span);
                    } else {
                        self.current_ctx_mut().own_names.insert(name.clone());
                    }
                }
                ast::LocalDef::FunctionDeclaration(header) => {
                    let params = Self::param_sigs(&header.params);
                    if let Err(e) = self.symbols.insert_function_declaration(
                        &header.name,
                        header.span.line,
                        header.return_type,
                        params,
                    ) {
                        self.push_error(e.into(), header.span);
                    } else {
                        self.current_ctx_mut().own_names.insert(header.name.clone());
                    }
                }
                ast::LocalDef::FunctionDefinition(def) => {
                    let params = Self::param_sigs(&def.header.params);
                    if let Err(e) = self.symbols.insert_function_definition(
                        &def.header.name,
                        def.header.span.line,
                        def.header.return_type,
                        params,
                    ) {
                        self.push_error(e.into(), def.header.span);
                    } else {
                        self.current_ctx_mut()
                            .own_names
                            .insert(def.header.name.clone());
                    }
                }
            }
        }
    }

    fn current_ctx_mut(&mut self) -> &mut FunctionCtx {
        self.stack.last_mut().expect("function context must be open")
    }

    fn check_function_def(&mut self, def: &ast::FunctionDef, is_outermost: bool) -> TypedFunctionDef {
        let scope_number = self.symbols.open_scope(def.header.return_type);
        self.stack.push(FunctionCtx {
            scope_number,
            own_names: HashSet::new(),
            captures: Vec::new(),
            capture_set: HashSet::new(),
        });

        let mut typed_params = Vec::with_capacity(def.header.params.len());
        for param in &def.header.params {
            if let Err(e) = self.symbols.insert_parameter(
                &param.name,
                param.span.line,
                param.element_type,
                param.shape.clone(),
                param.passing,
            ) {
                self.push_error(e.into(), param.span);
            } else {
                self.current_ctx_mut().own_names.insert(param.name.clone());
            }
            typed_params.push(TypedParam {
                name: param.name.clone(),
                element_type: param.element_type,
                shape: param.shape.clone(),
                passing: param.passing,
            });
        }

        self.shallow_register_locals(&def.locals);

        let mut typed_locals = Vec::with_capacity(def.locals.len());
        for local in &def.locals {
            match local {
                ast::LocalDef::Variable {
                    name,
                    element_type,
                    shape,
                    ..
                } => {
                    typed_locals.push(TypedLocalDef::Variable {
                        name: name.clone(),
                        element_type: *element_type,
                        shape: shape.clone(),
                    });
                }
                ast::LocalDef::FunctionDeclaration(header) => {
                    typed_locals.push(TypedLocalDef::FunctionDeclaration(TypedFunctionHeader {
                        name: header.name.clone(),
                        return_type: header.return_type,
                        params: header
                            .params
                            .iter()
                            .map(|p| TypedParam {
                                name: p.name.clone(),
                                element_type: p.element_type,
                                shape: p.shape.clone(),
                                passing: p.passing,
                            })
                            .collect(),
                    }));
                }
                ast::LocalDef::FunctionDefinition(nested) => {
                    let typed_nested = self.check_function_def(nested, false);
                    // Anything the nested function still needs from
                    // further out (not satisfied by *this* function's own
                    // scope) must be threaded through this function too.
                    let own_names = self.current_ctx_mut().own_names.clone();
                    for captured in &typed_nested.captures {
                        if !own_names.contains(captured) {
                            self.current_ctx_mut().record_capture(captured);
                        }
                    }
                    typed_locals.push(TypedLocalDef::FunctionDefinition(typed_nested));
                }
            }
        }

        let mut typed_body = Vec::with_capacity(def.body.len());
        for stmt in &def.body {
            typed_body.push(self.check_stmt(stmt));
        }

        if def.header.return_type != PrimitiveType::Nothing && !self.symbols.return_exists() {
            self.push_error(
                SemanticErrorKind::MissingReturn(MissingReturn {
                    name: def.header.name.clone(),
                }),
                def.span,
            );
        }

        if is_outermost
            && (def.header.return_type != PrimitiveType::Nothing || !def.header.params.is_empty())
        {
            self.push_error(
                SemanticErrorKind::InvalidMainSignature(InvalidMainSignature),
                def.header.span,
            );
        }

        let ctx = self.stack.pop().expect("pushed above");
        if let Err(e) = self.symbols.close_scope() {
            self.push_error(e.into(), def.span);
        }

        // The outermost function has no enclosing scope, so `ctx.captures`
        // is always empty by construction -- `resolve_id` only records a
        // capture when an identifier resolves to an outer scope number.
        TypedFunctionDef {
            header: TypedFunctionHeader {
                name: def.header.name.clone(),
                return_type: def.header.return_type,
                params: typed_params,
            },
            locals: typed_locals,
            body: typed_body,
            captures: ctx.captures,
            span: def.span,
        }
    }

    fn check_stmt(&mut self, stmt: &ast::Stmt) -> TypedStmt {
        match stmt {
            ast::Stmt::Block(stmts) => {
                TypedStmt::Block(stmts.iter().map(|s| self.check_stmt(s)).collect())
            }
            ast::Stmt::If {
                cond,
                then_branch,
                else_branch,
                span,
            } => {
                let cond = self.check_condition(cond, *span);
                let then_branch = Box::new(self.check_stmt(then_branch));
                let else_branch = else_branch
                    .as_ref()
                    .map(|e| Box::new(self.check_stmt(e)));
                TypedStmt::If {
                    cond,
                    then_branch,
                    else_branch,
                }
            }
            ast::Stmt::While { cond, body, span } => {
                let cond = self.check_condition(cond, *span);
                let body = Box::new(self.check_stmt(body));
                TypedStmt::While { cond, body }
            }
            ast::Stmt::Assign { target, value, span } => {
                let target = self.check_expr(target);
                let value = self.check_value(value);
                if !target.is_lvalue {
                    self.push_error(
                        SemanticErrorKind::AssignToNonLvalue(AssignToNonLvalue),
                        *span,
                    );
                }
                if value.element_type == PrimitiveType::Nothing {
                    // already reported by check_value
                } else if target.element_type != value.element_type {
                    self.push_error(
                        SemanticErrorKind::AssignTypeMismatch(AssignTypeMismatch {
                            expected: target.element_type,
                            found: value.element_type,
                        }),
                        *span,
                    );
                } else if !target.shape.is_scalar() {
                    // Whole arrays are never assignable, only scalar
                    // elements reached by indexing down to rank 0.
                    self.push_error(
                        SemanticErrorKind::AssignToWholeArray(AssignToWholeArray),
                        *span,
                    );
                }
                TypedStmt::Assign { target, value }
            }
            ast::Stmt::Return { value, span } => {
                self.symbols.set_return_exists();
                let expected = self
                    .symbols
                    .current_return_type()
                    .unwrap_or(PrimitiveType::Nothing);
                let typed_value = value.as_ref().map(|v| self.check_value(v));
                let found_type = typed_value.as_ref().map(|v| v.element_type);
                let mismatched = match (expected, found_type) {
                    (PrimitiveType::Nothing, None) => false,
                    (PrimitiveType::Nothing, Some(_)) => true,
                    (expected, Some(found)) => expected != found,
                    (_, None) => true,
                };
                if mismatched {
                    self.push_error(
                        SemanticErrorKind::ReturnTypeMismatch(ReturnTypeMismatch {
                            expected,
                            found: found_type,
                        }),
                        *span,
                    );
                }
                TypedStmt::Return { value: typed_value }
            }
            ast::Stmt::ExprStmt(expr) => TypedStmt::ExprStmt(self.check_expr(expr)),
            ast::Stmt::Empty => TypedStmt::Empty,
        }
    }

    fn check_condition(&mut self, expr: &ast::Expr, span: Span) -> TypedExpr {
        let typed = self.check_value(expr);
        if typed.element_type != PrimitiveType::Int && typed.element_type != PrimitiveType::Nothing {
            self.push_error(
                SemanticErrorKind::ConditionNotInt(ConditionNotInt {
                    found: typed.element_type,
                }),
                span,
            );
        }
        typed
    }

    /// Check an expression that must produce a usable value -- anywhere
    /// other than a bare `Stmt::ExprStmt` -- and flag a `nothing`-typed
    /// result: an expression-position call into a `nothing` function is
    /// ill-formed.
    fn check_value(&mut self, expr: &ast::Expr) -> TypedExpr {
        let typed = self.check_expr(expr);
        if typed.element_type == PrimitiveType::Nothing {
            self.push_error(SemanticErrorKind::VoidValueUsed(VoidValueUsed), typed.span);
        }
        typed
    }

    /// Resolve an identifier, recording it as a capture on the active
    /// function context if it belongs to an enclosing (not the current)
    /// user scope.
    fn resolve_id(&mut self, name: &str, span: Span) -> Option<crate::symtab::Entry> {
        let entry = self.symbols.lookup(name);
        if entry.is_none() {
            self.push_error(
                SemanticErrorKind::UndeclaredIdentifier(UndeclaredIdentifier {
                    name: name.to_string(),
                }),
                span,
            );
            return None;
        }
        let entry = entry.unwrap();
        if matches!(entry.kind, EntryKind::Variable { .. } | EntryKind::Parameter { .. }) {
            if let Some(ctx) = self.stack.last() {
                if entry.scope_number != 0 && entry.scope_number != ctx.scope_number {
                    let name = entry.name.clone();
                    self.current_ctx_mut().record_capture(&name);
                }
            }
        }
        Some(entry)
    }

    fn check_expr(&mut self, expr: &ast::Expr) -> TypedExpr {
        match expr {
            ast::Expr::IntLiteral { value, span } => TypedExpr {
                kind: TypedExprKind::IntLiteral(*value),
                element_type: PrimitiveType::Int,
                shape: ArrayShape::scalar(),
                is_lvalue: false,
                span: *span,
            },
            ast::Expr::CharLiteral { value, span } => TypedExpr {
                kind: TypedExprKind::CharLiteral(*value),
                element_type: PrimitiveType::Char,
                shape: ArrayShape::scalar(),
                is_lvalue: false,
                span: *span,
            },
            ast::Expr::StringLiteral { value, span } => TypedExpr {
                shape: ArrayShape::fixed(vec![value.len() as u32 + 1]),
                kind: TypedExprKind::StringLiteral(value.clone()),
                element_type: PrimitiveType::Char,
                is_lvalue: false,
                span: *span,
            },
            ast::Expr::Id { name, span } => {
                let Some(entry) = self.resolve_id(name, *span) else {
                    return TypedExpr {
                        kind: TypedExprKind::Id(name.clone()),
                        element_type: PrimitiveType::Int,
                        shape: ArrayShape::scalar(),
                        is_lvalue: true,
                        span: *span,
                    };
                };
                match entry.kind {
                    EntryKind::Variable { element_type, shape } => TypedExpr {
                        kind: TypedExprKind::Id(name.clone()),
                        element_type,
                        shape,
                        is_lvalue: true,
                        span: *span,
                    },
                    EntryKind::Parameter {
                        element_type, shape, ..
                    } => TypedExpr {
                        kind: TypedExprKind::Id(name.clone()),
                        element_type,
                        shape,
                        is_lvalue: true,
                        span: *span,
                    },
                    EntryKind::Function { .. } => {
                        self.push_error(
                            SemanticErrorKind::NotAVariable(NotAVariable {
                                name: name.clone(),
                            }),
                            *span,
                        );
                        TypedExpr {
                            kind: TypedExprKind::Id(name.clone()),
                            element_type: PrimitiveType::Int,
                            shape: ArrayShape::scalar(),
                            is_lvalue: true,
                            span: *span,
                        }
                    }
                }
            }
            ast::Expr::ArrayAccess { base, index, span } => {
                let base_typed = self.check_value(base);
                let index_typed = self.check_value(index);
                if index_typed.element_type != PrimitiveType::Int
                    && index_typed.element_type != PrimitiveType::Nothing
                {
                    self.push_error(
                        SemanticErrorKind::IndexNotInt(IndexNotInt {
                            found: index_typed.element_type,
                        }),
                        *span,
                    );
                }
                let result_shape = if base_typed.shape.is_scalar() {
                    self.push_error(
                        SemanticErrorKind::NotAnArray(NotAnArray {
                            found: base_typed.element_type,
                        }),
                        *span,
                    );
                    ArrayShape::scalar()
                } else {
                    base_typed.shape.tail()
                };
                TypedExpr {
                    element_type: base_typed.element_type,
                    is_lvalue: true,
                    shape: result_shape,
                    kind: TypedExprKind::ArrayAccess {
                        base: Box::new(base_typed),
                        index: Box::new(index_typed),
                    },
                    span: *span,
                }
            }
            ast::Expr::Call { name, args, span } => self.check_call(name, args, *span),
            ast::Expr::UnaryMinus { operand, span } => {
                let typed = self.check_value(operand);
                if typed.element_type != PrimitiveType::Int && typed.element_type != PrimitiveType::Nothing {
                    self.push_error(
                        SemanticErrorKind::OperandTypeMismatch(OperandTypeMismatch {
                            op: "-",
                            expected: PrimitiveType::Int,
                            left: typed.element_type,
                            right: typed.element_type,
                        }),
                        *span,
                    );
                }
                TypedExpr {
                    element_type: PrimitiveType::Int,
                    shape: ArrayShape::scalar(),
                    is_lvalue: false,
                    kind: TypedExprKind::UnaryMinus(Box::new(typed)),
                    span: *span,
                }
            }
            ast::Expr::Not { operand, span } => {
                let typed = self.check_value(operand);
                if typed.element_type != PrimitiveType::Int && typed.element_type != PrimitiveType::Nothing {
                    self.push_error(
                        SemanticErrorKind::OperandTypeMismatch(OperandTypeMismatch {
                            op: "not",
                            expected: PrimitiveType::Int,
                            left: typed.element_type,
                            right: typed.element_type,
                        }),
                        *span,
                    );
                }
                TypedExpr {
                    element_type: PrimitiveType::Int,
                    shape: ArrayShape::scalar(),
                    is_lvalue: false,
                    kind: TypedExprKind::Not(Box::new(typed)),
                    span: *span,
                }
            }
            ast::Expr::Binary {
                op, left, right, span,
            } => {
                let left_typed = self.check_value(left);
                let right_typed = self.check_value(right);
                if (left_typed.element_type != PrimitiveType::Int
                    || right_typed.element_type != PrimitiveType::Int)
                    && left_typed.element_type != PrimitiveType::Nothing
                    && right_typed.element_type != PrimitiveType::Nothing
                {
                    self.push_error(
                        SemanticErrorKind::OperandTypeMismatch(OperandTypeMismatch {
                            op: op_symbol(*op),
                            expected: PrimitiveType::Int,
                            left: left_typed.element_type,
                            right: right_typed.element_type,
                        }),
                        *span,
                    );
                }
                TypedExpr {
                    element_type: PrimitiveType::Int,
                    shape: ArrayShape::scalar(),
                    is_lvalue: false,
                    kind: TypedExprKind::Binary {
                        op: *op,
                        left: Box::new(left_typed),
                        right: Box::new(right_typed),
                    },
                    span: *span,
                }
            }
        }
    }

    fn check_call(&mut self, name: &str, args: &[ast::Expr], span: Span) -> TypedExpr {
        let typed_args: Vec<TypedExpr> = args.iter().map(|a| self.check_value(a)).collect();
        let entry = self.symbols.lookup(name);
        let Some(entry) = entry else {
            self.push_error(
                SemanticErrorKind::UndeclaredFunction(UndeclaredFunction {
                    name: name.to_string(),
                }),
                span,
            );
            return TypedExpr {
                kind: TypedExprKind::Call {
                    name: name.to_string(),
                    args: typed_args,
                },
                element_type: PrimitiveType::Int,
                shape: ArrayShape::scalar(),
                is_lvalue: false,
                span,
            };
        };
        let EntryKind::Function {
            return_type, params, ..
        } = entry.kind
        else {
            self.push_error(
                SemanticErrorKind::NotAFunction(NotAFunction {
                    name: name.to_string(),
                }),
                span,
            );
            return TypedExpr {
                kind: TypedExprKind::Call {
                    name: name.to_string(),
                    args: typed_args,
                },
                element_type: PrimitiveType::Int,
                shape: ArrayShape::scalar(),
                is_lvalue: false,
                span,
            };
        };

        if params.len() != typed_args.len() {
            self.push_error(
                SemanticErrorKind::ArityMismatch(ArityMismatch {
                    name: name.to_string(),
                    expected: params.len(),
                    found: typed_args.len(),
                }),
                span,
            );
        } else {
            for (i, (param, arg)) in params.iter().zip(typed_args.iter()).enumerate() {
                if param.element_type != arg.element_type {
                    self.push_error(
                        SemanticErrorKind::ArgumentTypeMismatch(ArgumentTypeMismatch {
                            name: name.to_string(),
                            position: i,
                            expected: param.element_type,
                            found: arg.element_type,
                        }),
                        span,
                    );
                } else if !param.shape.matches(&arg.shape) {
                    self.push_error(
                        SemanticErrorKind::ArgumentShapeMismatch(ArgumentShapeMismatch {
                            name: name.to_string(),
                            position: i,
                        }),
                        span,
                    );
                }
                // Array-typed arguments always decay to an address (string
                // literals included), so the l-value requirement for a
                // by-reference parameter only bites for scalar arguments.
                if param.passing == PassingMode::ByReference
                    && arg.shape.is_scalar()
                    && !arg.is_lvalue
                {
                    self.push_error(
                        SemanticErrorKind::ReferenceArgumentNotLvalue(ReferenceArgumentNotLvalue {
                            name: name.to_string(),
                            position: i,
                        }),
                        span,
                    );
                }
            }
        }

        TypedExpr {
            kind: TypedExprKind::Call {
                name: name.to_string(),
                args: typed_args,
            },
            element_type: return_type,
            shape: ArrayShape::scalar(),
            is_lvalue: false,
            span,
        }
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "div",
        BinOp::Mod => "mod",
        BinOp::Eq => "=",
        BinOp::NotEq => "<>",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::Le => "<=",
        BinOp::Ge => ">=",
        BinOp::And => "and",
        BinOp::Or => "or",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    fn span() -> Span {
        Span::new(1)
    }

    fn int_lit(v: i32) -> Expr {
        Expr::IntLiteral { value: v, span: span() }
    }

    fn simple_main(body: Vec<Stmt>, locals: Vec<LocalDef>) -> Program {
        Program {
            main: FunctionDef {
                header: FunctionHeader {
                    name: "main".into(),
                    return_type: PrimitiveType::Nothing,
                    params: vec![],
                    span: span(),
                },
                locals,
                body,
                span: span(),
            },
        }
    }

    #[test]
    fn test_accepts_trivial_main() {
        let program = simple_main(vec![], vec![]);
        assert!(SemanticAnalyzer::analyze(&program).is_ok());
    }

    #[test]
    fn test_rejects_undeclared_identifier() {
        let program = simple_main(
            vec![Stmt::ExprStmt(Expr::Id {
                name: "missing".into(),
                span: span(),
            })],
            vec![],
        );
        let errors = SemanticAnalyzer::analyze(&program).unwrap_err();
        assert!(matches!(
            errors[0].kind,
            SemanticErrorKind::UndeclaredIdentifier(_)
        ));
    }

    #[test]
    fn test_assign_type_mismatch() {
        let program = simple_main(
            vec![Stmt::Assign {
                target: Expr::Id {
                    name: "x".into(),
                    span: span(),
                },
                value: Expr::CharLiteral { value: b'a', span: span() },
                span: span(),
            }],
            vec![LocalDef::Variable {
                name: "x".into(),
                element_type: PrimitiveType::Int,
                shape: ArrayShape::scalar(),
                span: span(),
            }],
        );
        let errors = SemanticAnalyzer::analyze(&program).unwrap_err();
        assert!(matches!(
            errors[0].kind,
            SemanticErrorKind::AssignTypeMismatch(_)
        ));
    }

    #[test]
    fn test_missing_return_detected() {
        let program = Program {
            main: FunctionDef {
                header: FunctionHeader {
                    name: "f".into(),
                    return_type: PrimitiveType::Int,
                    params: vec![],
                    span: span(),
                },
                locals: vec![],
                body: vec![],
                span: span(),
            },
        };
        let errors = SemanticAnalyzer::analyze(&program).unwrap_err();
        assert!(matches!(errors[0].kind, SemanticErrorKind::MissingReturn(_)));
    }

    #[test]
    fn test_nested_function_captures_outer_variable() {
        let nested = FunctionDef {
            header: FunctionHeader {
                name: "inner".into(),
                return_type: PrimitiveType::Nothing,
                params: vec![],
                span: span(),
            },
            locals: vec![],
            body: vec![Stmt::Assign {
                target: Expr::Id {
                    name: "counter".into(),
                    span: span(),
                },
                value: int_lit(1),
                span: span(),
            }],
            span: span(),
        };
        let program = simple_main(
            vec![Stmt::ExprStmt(Expr::Call {
                name: "inner".into(),
                args: vec![],
                span: span(),
            })],
            vec![
                LocalDef::Variable {
                    name: "counter".into(),
                    element_type: PrimitiveType::Int,
                    shape: ArrayShape::scalar(),
                    span: span(),
                },
                LocalDef::FunctionDefinition(nested),
            ],
        );
        let typed = SemanticAnalyzer::analyze(&program).unwrap();
        let TypedLocalDef::FunctionDefinition(inner) = &typed.main.locals[1] else {
            panic!("expected nested function definition");
        };
        assert_eq!(inner.captures, vec!["counter".to_string()]);
    }

    #[test]
    fn test_void_call_rejected_in_expression_position() {
        let program = simple_main(
            vec![Stmt::Assign {
                target: Expr::Id {
                    name: "x".into(),
                    span: span(),
                },
                value: Expr::Call {
                    name: "writeInteger".into(),
                    args: vec![int_lit(1)],
                    span: span(),
                },
                span: span(),
            }],
            vec![LocalDef::Variable {
                name: "x".into(),
                element_type: PrimitiveType::Int,
                shape: ArrayShape::scalar(),
                span: span(),
            }],
        );
        let errors = SemanticAnalyzer::analyze(&program).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, SemanticErrorKind::VoidValueUsed(_))));
    }

    #[test]
    fn test_void_call_accepted_as_bare_statement() {
        let program = simple_main(
            vec![Stmt::ExprStmt(Expr::Call {
                name: "writeInteger".into(),
                args: vec![int_lit(1)],
                span: span(),
            })],
            vec![],
        );
        assert!(SemanticAnalyzer::analyze(&program).is_ok());
    }

    #[test]
    fn test_main_with_params_rejected() {
        let program = Program {
            main: FunctionDef {
                header: FunctionHeader {
                    name: "main".into(),
                    return_type: PrimitiveType::Nothing,
                    params: vec![Param {
                        name: "n".into(),
                        element_type: PrimitiveType::Int,
                        shape: ArrayShape::scalar(),
                        passing: PassingMode::ByValue,
                        span: span(),
                    }],
                    span: span(),
                },
                locals: vec![],
                body: vec![],
                span: span(),
            },
        };
        let errors = SemanticAnalyzer::analyze(&program).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, SemanticErrorKind::InvalidMainSignature(_))));
    }

    #[test]
    fn test_array_shape_mismatch_on_call() {
        let program = simple_main(
            vec![Stmt::ExprStmt(Expr::Call {
                name: "writeInteger".into(),
                args: vec![Expr::Id {
                    name: "arr".into(),
                    span: span(),
                }],
                span: span(),
            })],
            vec![LocalDef::Variable {
                name: "arr".into(),
                element_type: PrimitiveType::Int,
                shape: ArrayShape::fixed(vec![4]),
                span: span(),
            }],
        );
        let errors = SemanticAnalyzer::analyze(&program).unwrap_err();
        assert!(matches!(
            errors[0].kind,
            SemanticErrorKind::ArgumentShapeMismatch(_)
        ));
    }
}
