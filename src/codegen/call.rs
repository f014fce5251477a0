//! Call-site lowering, shared by expression calls and call statements.
//!
//! Argument convention: a non-scalar (array) argument always decays to an
//! address regardless of how it's written (variable, indexed element, or
//! string literal); a scalar argument is passed by address only when the
//! callee declared that parameter `ref`. A user-defined callee's LLVM
//! signature additionally carries one trailing pointer per name in its
//! `captures` list, supplied here from the *caller's* own scope as part
//! of the argument-threading rewrite.

use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum};

use crate::codegen::error::CodegenError;
use crate::codegen::expr::{lower_address, lower_expr};
use crate::codegen::library::is_library_function;
use crate::codegen::CodegenContext;
use crate::semantic::typed::TypedExpr;

pub fn lower_call<'ctx>(
    ctx: &CodegenContext<'ctx>,
    name: &str,
    args: &[TypedExpr],
) -> Result<Option<BasicValueEnum<'ctx>>, CodegenError> {
    if is_library_function(name) {
        return lower_library_call(ctx, name, args);
    }

    let info = ctx
        .lookup_function(name)
        .ok_or_else(|| CodegenError::new(format!("unresolved function '{name}' in codegen")))?;

    let mut llvm_args: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(args.len() + info.captures.len());
    for (param, arg) in info.params.iter().zip(args.iter()) {
        let value = if !param.shape.is_scalar() {
            lower_expr(ctx, arg)?
        } else if param.passing == crate::ast::PassingMode::ByReference {
            lower_address(ctx, arg)?.into()
        } else {
            lower_expr(ctx, arg)?
        };
        llvm_args.push(value.into());
    }
    for captured in &info.captures {
        let slot = ctx.lookup_variable(captured).ok_or_else(|| {
            CodegenError::new(format!(
                "capture '{captured}' of '{name}' not visible at call site"
            ))
        })?;
        llvm_args.push(slot.ptr.into());
    }

    let call = ctx
        .builder
        .build_call(info.llvm, &llvm_args, "call")
        .map_err(|e| CodegenError::new(e.to_string()))?;
    Ok(call.try_as_basic_value().left())
}

fn lower_library_call<'ctx>(
    ctx: &CodegenContext<'ctx>,
    name: &str,
    args: &[TypedExpr],
) -> Result<Option<BasicValueEnum<'ctx>>, CodegenError> {
    let function = ctx
        .module
        .get_function(name)
        .ok_or_else(|| CodegenError::new(format!("library function '{name}' not declared")))?;

    let mut llvm_args: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(args.len());
    for arg in args {
        // No library routine takes a scalar by reference, so the blanket
        // shape-driven rule (array => address, scalar => value) is
        // sufficient without consulting a per-parameter passing mode.
        let value = lower_expr(ctx, arg)?;
        llvm_args.push(value.into());
    }

    let call = ctx
        .builder
        .build_call(function, &llvm_args, "libcall")
        .map_err(|e| CodegenError::new(e.to_string()))?;
    Ok(call.try_as_basic_value().left())
}
