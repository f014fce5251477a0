//! Lowering of [`crate::semantic::typed::TypedExpr`] to LLVM IR values.

use inkwell::values::{BasicValue, BasicValueEnum, PointerValue};
use inkwell::IntPredicate;

use crate::ast::BinOp;
use crate::codegen::error::CodegenError;
use crate::codegen::types::llvm_scalar_type;
use crate::codegen::CodegenContext;
use crate::semantic::typed::{TypedExpr, TypedExprKind};

/// Computes the address of an l-value expression. Every array value --
/// parameter, threaded capture, or local -- is represented uniformly as a
/// pointer to its element type pointing at the first element in row-major
/// order, so indexing is plain pointer arithmetic regardless of where the
/// storage actually lives.
pub fn lower_address<'ctx>(
    ctx: &CodegenContext<'ctx>,
    expr: &TypedExpr,
) -> Result<PointerValue<'ctx>, CodegenError> {
    match &expr.kind {
        TypedExprKind::Id(name) => ctx
            .lookup_variable(name)
            .map(|slot| slot.ptr)
            .ok_or_else(|| CodegenError::new(format!("unresolved variable '{name}' in codegen"))),
        TypedExprKind::ArrayAccess { base, index } => {
            let base_ptr = lower_address(ctx, base)?;
            let index_value = lower_expr(ctx, index)?.into_int_value();
            let stride: u32 = base.shape.tail().dims.iter().product();
            let stride_value = ctx.context.i32_type().const_int(stride as u64, false);
            let offset = ctx
                .builder
                .build_int_mul(index_value, stride_value, "idx_off")
                .map_err(|e| CodegenError::new(e.to_string()))?;
            let elem_ty = llvm_scalar_type(ctx.context, expr.element_type);
            unsafe {
                ctx.builder
                    .build_gep(elem_ty, base_ptr, &[offset], "arr_elem")
                    .map_err(|e| CodegenError::new(e.to_string()))
            }
        }
        other => Err(CodegenError::new(format!(
            "expression {other:?} is not addressable"
        ))),
    }
}

pub fn lower_expr<'ctx>(
    ctx: &CodegenContext<'ctx>,
    expr: &TypedExpr,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    match &expr.kind {
        TypedExprKind::IntLiteral(v) => Ok(ctx
            .context
            .i32_type()
            .const_int(*v as u64, true)
            .as_basic_value_enum()),
        TypedExprKind::CharLiteral(v) => Ok(ctx
            .context
            .i8_type()
            .const_int(*v as u64, false)
            .as_basic_value_enum()),
        TypedExprKind::StringLiteral(bytes) => {
            let global = ctx.intern_string(bytes);
            Ok(global.as_basic_value_enum())
        }
        TypedExprKind::Id(_) | TypedExprKind::ArrayAccess { .. } => {
            let addr = lower_address(ctx, expr)?;
            if !expr.shape.is_scalar() {
                // An array-shaped expression's "value" is its address --
                // arrays always decay to a pointer, never a loaded blob.
                return Ok(addr.as_basic_value_enum());
            }
            let elem_ty = llvm_scalar_type(ctx.context, expr.element_type);
            ctx.builder
                .build_load(elem_ty, addr, "load")
                .map_err(|e| CodegenError::new(e.to_string()))
        }
        TypedExprKind::Call { name, args } => crate::codegen::call::lower_call(ctx, name, args)
            .map(|v| v.expect("non-void call used as a value")),
        TypedExprKind::UnaryMinus(operand) => {
            let value = lower_expr(ctx, operand)?.into_int_value();
            ctx.builder
                .build_int_neg(value, "neg")
                .map(|v| v.as_basic_value_enum())
                .map_err(|e| CodegenError::new(e.to_string()))
        }
        TypedExprKind::Not(operand) => {
            let value = lower_expr(ctx, operand)?.into_int_value();
            let zero = value.get_type().const_zero();
            ctx.builder
                .build_int_compare(IntPredicate::EQ, value, zero, "not")
                .and_then(|b| ctx.builder.build_int_z_extend(b, ctx.context.i32_type(), "not_ext"))
                .map(|v| v.as_basic_value_enum())
                .map_err(|e| CodegenError::new(e.to_string()))
        }
        TypedExprKind::Binary { op, left, right } if op.is_short_circuit() => {
            lower_short_circuit(ctx, *op, left, right)
        }
        TypedExprKind::Binary { op, left, right } => {
            let l = lower_expr(ctx, left)?.into_int_value();
            let r = lower_expr(ctx, right)?.into_int_value();
            lower_arithmetic_or_comparison(ctx, *op, l, r)
        }
    }
}

fn lower_arithmetic_or_comparison<'ctx>(
    ctx: &CodegenContext<'ctx>,
    op: BinOp,
    l: inkwell::values::IntValue<'ctx>,
    r: inkwell::values::IntValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let b = &ctx.builder;
    let result = match op {
        BinOp::Add => b.build_int_add(l, r, "add"),
        BinOp::Sub => b.build_int_sub(l, r, "sub"),
        BinOp::Mul => b.build_int_mul(l, r, "mul"),
        BinOp::Div => b.build_int_signed_div(l, r, "div"),
        BinOp::Mod => b.build_int_signed_rem(l, r, "mod"),
        BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
            let predicate = match op {
                BinOp::Eq => IntPredicate::EQ,
                BinOp::NotEq => IntPredicate::NE,
                BinOp::Lt => IntPredicate::SLT,
                BinOp::Gt => IntPredicate::SGT,
                BinOp::Le => IntPredicate::SLE,
                BinOp::Ge => IntPredicate::SGE,
                _ => unreachable!(),
            };
            let cmp = b
                .build_int_compare(predicate, l, r, "cmp")
                .map_err(|e| CodegenError::new(e.to_string()))?;
            return b
                .build_int_z_extend(cmp, ctx.context.i32_type(), "cmp_ext")
                .map(|v| v.as_basic_value_enum())
                .map_err(|e| CodegenError::new(e.to_string()));
        }
        BinOp::And | BinOp::Or => unreachable!("short-circuit ops handled separately"),
    };
    result
        .map(|v| v.as_basic_value_enum())
        .map_err(|e| CodegenError::new(e.to_string()))
}

/// `and`/`or` short-circuit: the right operand is only evaluated if the
/// left doesn't already decide the result, lowered as a conditional
/// branch merging into a phi.
fn lower_short_circuit<'ctx>(
    ctx: &CodegenContext<'ctx>,
    op: BinOp,
    left: &TypedExpr,
    right: &TypedExpr,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let function = ctx.current_function();
    let left_value = lower_expr(ctx, left)?.into_int_value();
    let zero = left_value.get_type().const_zero();
    let left_bool = ctx
        .builder
        .build_int_compare(IntPredicate::NE, left_value, zero, "lhs_bool")
        .map_err(|e| CodegenError::new(e.to_string()))?;

    let rhs_block = ctx.context.append_basic_block(function, "sc_rhs");
    let merge_block = ctx.context.append_basic_block(function, "sc_merge");

    let (short_circuit_to_rhs, short_value) = match op {
        BinOp::And => (left_bool, ctx.context.i32_type().const_int(0, false)),
        BinOp::Or => (
            ctx.builder
                .build_not(left_bool, "lhs_not")
                .map_err(|e| CodegenError::new(e.to_string()))?,
            ctx.context.i32_type().const_int(1, false),
        ),
        _ => unreachable!(),
    };
    let entry_block = ctx.builder.get_insert_block().expect("inside a function");
    ctx.builder
        .build_conditional_branch(short_circuit_to_rhs, rhs_block, merge_block)
        .map_err(|e| CodegenError::new(e.to_string()))?;

    ctx.builder.position_at_end(rhs_block);
    let right_value = lower_expr(ctx, right)?.into_int_value();
    let right_bool = ctx
        .builder
        .build_int_compare(IntPredicate::NE, right_value, zero, "rhs_bool")
        .map_err(|e| CodegenError::new(e.to_string()))?;
    let right_result = ctx
        .builder
        .build_int_z_extend(right_bool, ctx.context.i32_type(), "rhs_ext")
        .map_err(|e| CodegenError::new(e.to_string()))?;
    let rhs_end_block = ctx.builder.get_insert_block().expect("inside rhs block");
    ctx.builder
        .build_unconditional_branch(merge_block)
        .map_err(|e| CodegenError::new(e.to_string()))?;

    ctx.builder.position_at_end(merge_block);
    let phi = ctx
        .builder
        .build_phi(ctx.context.i32_type(), "sc_result")
        .map_err(|e| CodegenError::new(e.to_string()))?;
    phi.add_incoming(&[
        (&short_value, entry_block),
        (&right_result, rhs_end_block),
    ]);
    Ok(phi.as_basic_value())
}
