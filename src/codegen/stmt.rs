//! Lowering of [`crate::semantic::typed::TypedStmt`] to LLVM IR.

use crate::codegen::error::CodegenError;
use crate::codegen::expr::{lower_address, lower_expr};
use crate::codegen::CodegenContext;
use crate::semantic::typed::TypedStmt;

/// Lowers a statement. Returns `true` if the current block already ended
/// in a terminator (a `return` was emitted, or both arms of an `if`
/// terminated) -- callers use this to avoid appending dead code after an
/// unconditional return.
pub fn lower_stmt<'ctx>(ctx: &CodegenContext<'ctx>, stmt: &TypedStmt) -> Result<bool, CodegenError> {
    match stmt {
        TypedStmt::Block(stmts) => {
            for s in stmts {
                if lower_stmt(ctx, s)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        TypedStmt::If {
            cond,
            then_branch,
            else_branch,
        } => lower_if(ctx, cond, then_branch, else_branch.as_deref()),
        TypedStmt::While { cond, body } => lower_while(ctx, cond, body),
        TypedStmt::Assign { target, value } => {
            let addr = lower_address(ctx, target)?;
            let val = lower_expr(ctx, value)?;
            ctx.builder
                .build_store(addr, val)
                .map_err(|e| CodegenError::new(e.to_string()))?;
            Ok(false)
        }
        TypedStmt::Return { value } => {
            match value {
                Some(expr) => {
                    let val = lower_expr(ctx, expr)?;
                    ctx.builder
                        .build_return(Some(&val))
                        .map_err(|e| CodegenError::new(e.to_string()))?;
                }
                None => {
                    ctx.builder
                        .build_return(None)
                        .map_err(|e| CodegenError::new(e.to_string()))?;
                }
            }
            Ok(true)
        }
        TypedStmt::ExprStmt(expr) => {
            lower_expr(ctx, expr)?;
            Ok(false)
        }
        TypedStmt::Empty => Ok(false),
    }
}

fn lower_if<'ctx>(
    ctx: &CodegenContext<'ctx>,
    cond: &crate::semantic::typed::TypedExpr,
    then_branch: &TypedStmt,
    else_branch: Option<&TypedStmt>,
) -> Result<bool, CodegenError> {
    let function = ctx.current_function();
    let cond_value = lower_expr(ctx, cond)?.into_int_value();
    let zero = cond_value.get_type().const_zero();
    let cond_bool = ctx
        .builder
        .build_int_compare(inkwell::IntPredicate::NE, cond_value, zero, "if_cond")
        .map_err(|e| CodegenError::new(e.to_string()))?;

    let then_block = ctx.context.append_basic_block(function, "then");
    let else_block = ctx.context.append_basic_block(function, "else");
    let merge_block = ctx.context.append_basic_block(function, "endif");

    ctx.builder
        .build_conditional_branch(cond_bool, then_block, else_block)
        .map_err(|e| CodegenError::new(e.to_string()))?;

    ctx.builder.position_at_end(then_block);
    let then_terminated = lower_stmt(ctx, then_branch)?;
    if !then_terminated {
        ctx.builder
            .build_unconditional_branch(merge_block)
            .map_err(|e| CodegenError::new(e.to_string()))?;
    }

    ctx.builder.position_at_end(else_block);
    let else_terminated = match else_branch {
        Some(stmt) => lower_stmt(ctx, stmt)?,
        None => false,
    };
    if !else_terminated {
        ctx.builder
            .build_unconditional_branch(merge_block)
            .map_err(|e| CodegenError::new(e.to_string()))?;
    }

    if then_terminated && else_terminated {
        merge_block
            .remove_from_function()
            .map_err(|()| CodegenError::new("failed to drop unreachable merge block"))?;
        ctx.builder.position_at_end(else_block);
        return Ok(true);
    }

    ctx.builder.position_at_end(merge_block);
    Ok(false)
}

fn lower_while<'ctx>(
    ctx: &CodegenContext<'ctx>,
    cond: &crate::semantic::typed::TypedExpr,
    body: &TypedStmt,
) -> Result<bool, CodegenError> {
    let function = ctx.current_function();
    let cond_block = ctx.context.append_basic_block(function, "while_cond");
    let body_block = ctx.context.append_basic_block(function, "while_body");
    let after_block = ctx.context.append_basic_block(function, "while_end");

    ctx.builder
        .build_unconditional_branch(cond_block)
        .map_err(|e| CodegenError::new(e.to_string()))?;

    ctx.builder.position_at_end(cond_block);
    let cond_value = lower_expr(ctx, cond)?.into_int_value();
    let zero = cond_value.get_type().const_zero();
    let cond_bool = ctx
        .builder
        .build_int_compare(inkwell::IntPredicate::NE, cond_value, zero, "while_test")
        .map_err(|e| CodegenError::new(e.to_string()))?;
    ctx.builder
        .build_conditional_branch(cond_bool, body_block, after_block)
        .map_err(|e| CodegenError::new(e.to_string()))?;

    ctx.builder.position_at_end(body_block);
    if !lower_stmt(ctx, body)? {
        ctx.builder
            .build_unconditional_branch(cond_block)
            .map_err(|e| CodegenError::new(e.to_string()))?;
    }

    ctx.builder.position_at_end(after_block);
    Ok(false)
}
